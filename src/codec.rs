use bytes::{buf::Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing as log;

use pad_core::ControlSample;

/// Lines longer than this without a newline are discarded.
const MAX_LINE_LEN: usize = 64 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    #[error("input line longer than {0} bytes")]
    LineTooLong(usize),
}

// -------------------------

/// Newline-delimited JSON [ControlSample]s.
///
/// Blank lines are ignored. Lines that do not parse are logged and skipped so
/// that one bad line does not end the stream.
#[derive(Default)]
pub struct SampleLinesCodec {}

impl SampleLinesCodec {
    pub fn new() -> Self {
        Self {}
    }
}

fn parse_line(line: &[u8]) -> Option<ControlSample> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(line) {
        Ok(sample) => Some(sample),
        Err(e) => {
            log::warn!(
                "skipping malformed input line \"{}\": {e}",
                String::from_utf8_lossy(line).trim()
            );
            None
        }
    }
}

impl Decoder for SampleLinesCodec {
    type Item = ControlSample;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(pos) = memchr::memchr(b'\n', &buf[..]) {
            let line = buf.split_to(pos + 1);
            if let Some(sample) = parse_line(&line) {
                return Ok(Some(sample));
            }
        }
        if buf.len() > MAX_LINE_LEN {
            // Drop the partial line so decoding can resynchronize.
            buf.advance(buf.remaining());
            return Err(Error::LineTooLong(MAX_LINE_LEN));
        }
        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(sample) = self.decode(buf)? {
            return Ok(Some(sample));
        }
        // final line without a trailing newline
        let rest = buf.split();
        Ok(parse_line(&rest))
    }
}

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{Command, Inquiry, ViscaError, TERMINATOR};

/// Longest reply the camera sends is 16 bytes. Anything longer without a
/// terminator is line noise.
const MAX_FRAME_LEN: usize = 16;

/// Convert a hex command string to the raw bytes written to the link.
pub fn hex_to_bytes(hex: &str) -> Result<Bytes, ViscaError> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(ViscaError::InvalidHex(hex.to_string()));
    }
    let mut buf = BytesMut::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let b = u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| ViscaError::InvalidHex(hex.to_string()))?;
        buf.put_u8(b);
    }
    Ok(buf.freeze())
}

/// Frames the serial link: commands and inquiries out, `FF`-terminated reply
/// packets in.
#[derive(Default)]
pub struct ViscaCodec {}

impl ViscaCodec {
    pub fn new() -> Self {
        Self {}
    }
}

impl Decoder for ViscaCodec {
    type Item = Bytes;
    type Error = ViscaError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match memchr::memchr(TERMINATOR, &src[..]) {
            Some(pos) => Ok(Some(src.split_to(pos + 1).freeze())),
            None if src.len() > MAX_FRAME_LEN => {
                let len = src.len();
                // Drop the garbage so the next reply can sync.
                src.clear();
                Err(ViscaError::FrameTooLong { len })
            }
            None => Ok(None),
        }
    }
}

// We encode `T` and not `&T` because we do not want to deal with
// the lifetime issues (this is used in async contexts.)
impl Encoder<Command> for ViscaCodec {
    type Error = ViscaError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_slice(&hex_to_bytes(&item.to_hex())?);
        Ok(())
    }
}

impl Encoder<Inquiry> for ViscaCodec {
    type Error = ViscaError;

    fn encode(&mut self, item: Inquiry, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_slice(&hex_to_bytes(item.to_hex())?);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_command_bytes() -> Result<(), ViscaError> {
        let mut codec = ViscaCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Command::PresetRecall(300), &mut buf)?;
        assert_eq!(&buf[..], &[0x81, 0x01, 0x04, 0x3F, 0x02, 0xFF, 0xFF]);
        buf.clear();
        codec.encode(Inquiry::Zoom, &mut buf)?;
        assert_eq!(&buf[..], &[0x81, 0x09, 0x04, 0x47, 0xFF]);
        Ok(())
    }

    #[test]
    fn bad_hex() {
        assert!(matches!(hex_to_bytes("810"), Err(ViscaError::InvalidHex(_))));
        assert!(matches!(hex_to_bytes("81ZZ"), Err(ViscaError::InvalidHex(_))));
        assert_eq!(&hex_to_bytes("8101").unwrap()[..], &[0x81, 0x01]);
    }

    #[test]
    fn decode_splits_on_terminator() -> Result<(), ViscaError> {
        let mut codec = ViscaCodec::new();
        let mut buf = BytesMut::new();
        // ack, completion, then the first half of a zoom reply
        buf.put_slice(&[0x90, 0x41, 0xFF, 0x90, 0x51, 0xFF, 0x90, 0x50, 0x01]);
        assert_eq!(&codec.decode(&mut buf)?.unwrap()[..], &[0x90, 0x41, 0xFF]);
        assert_eq!(&codec.decode(&mut buf)?.unwrap()[..], &[0x90, 0x51, 0xFF]);
        assert!(codec.decode(&mut buf)?.is_none());
        buf.put_slice(&[0x02, 0x03, 0x04, 0xFF]);
        let frame = codec.decode(&mut buf)?.unwrap();
        assert_eq!(crate::decode_zoom(&frame)?, 0x1234);
        assert!(buf.is_empty());
        Ok(())
    }

    #[test]
    fn decode_rejects_runaway_frame() {
        let mut codec = ViscaCodec::new();
        let mut buf = BytesMut::from(&[0x11u8; 20][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ViscaError::FrameTooLong { len: 20 })
        ));
        assert!(buf.is_empty());
    }
}

use color_eyre::eyre::{self as anyhow, Result, WrapErr};
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio_util::codec::FramedRead;
use tracing as log;

use pad_core::ControlSample;

use crate::codec::{self, SampleLinesCodec};

/// Open the control input: a file or FIFO, or stdin when `path` is `None`.
pub(crate) async fn open_input(
    path: Option<&std::path::Path>,
) -> Result<Box<dyn AsyncRead + Send + Unpin>> {
    Ok(match path {
        Some(path) => {
            log::info!("Reading control samples from {}", path.display());
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening input {}", path.display()))?;
            Box::new(file)
        }
        None => {
            log::info!("Reading control samples from stdin");
            Box::new(tokio::io::stdin())
        }
    })
}

/// Publish every decoded sample into `tx`, overwriting the previous one.
///
/// Over-long lines are logged and discarded. Returns an error when the input
/// ends or fails to read. Returns `Ok` only when no one is listening any more.
pub(crate) async fn run_input_loop<R: AsyncRead + Unpin>(
    reader: R,
    tx: watch::Sender<Option<ControlSample>>,
) -> Result<()> {
    let mut samples = FramedRead::new(reader, SampleLinesCodec::new());
    loop {
        let sample = match samples.next().await {
            Some(Ok(sample)) => sample,
            Some(Err(e @ codec::Error::LineTooLong(_))) => {
                log::warn!("control input: {e}, discarding it");
                // A framed stream ends after any decode error, so start a new
                // one on the same reader. The codec already dropped the line.
                samples = FramedRead::new(samples.into_inner(), SampleLinesCodec::new());
                continue;
            }
            Some(Err(e)) => {
                log::error!("control input error: {e}");
                return Err(e).context("reading control input");
            }
            None => anyhow::bail!("control input ended"),
        };
        log::trace!("input sample {sample:?}");
        if tx.send(Some(sample)).is_err() {
            log::debug!("no session listening to control input");
            return Ok(());
        }
    }
}

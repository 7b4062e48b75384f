use std::time::Duration;

use bytes::Bytes;
use futures::{FutureExt, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::{
    decode_pan, decode_tilt, decode_zoom, Command, Inquiry, SignedOffsetValue, ViscaCodec,
    ViscaError, ABSOLUTE_MODULUS, MAX_ZOOM_POSITION,
};

/// Length of the bare acknowledge (`90 4y FF`) and completion (`90 5y FF`)
/// replies that follow every command.
const ACK_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraTimeouts {
    /// Bound on writing and flushing one command.
    pub write: Duration,
    /// Bound on waiting for an inquiry reply.
    pub inquiry: Duration,
}

impl Default for CameraTimeouts {
    fn default() -> Self {
        Self {
            write: Duration::from_secs(1),
            inquiry: Duration::from_secs(1),
        }
    }
}

/// A VISCA camera on a point-to-point link.
///
/// Commands are fire-and-forget: acknowledge and completion replies are
/// never awaited, and a failed write is not retried.
pub struct Camera<S> {
    framed: Framed<S, ViscaCodec>,
    timeouts: CameraTimeouts,
}

impl<S> Camera<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, timeouts: CameraTimeouts) -> Self {
        Self {
            framed: Framed::new(stream, ViscaCodec::new()),
            timeouts,
        }
    }

    async fn write<T>(&mut self, item: T, hex: &str) -> Result<(), ViscaError>
    where
        ViscaCodec: tokio_util::codec::Encoder<T, Error = ViscaError>,
    {
        // `send` flushes after writing.
        tokio::time::timeout(self.timeouts.write, self.framed.send(item))
            .await
            .map_err(|_| ViscaError::WriteTimeout {
                command: hex.to_string(),
            })?
    }

    /// Send one command. Returns `false` if the write failed, after logging
    /// the attempted command. The command is dropped in that case.
    pub async fn command(&mut self, cmd: Command) -> bool {
        let hex = cmd.to_hex();
        match self.write(cmd, &hex).await {
            Ok(()) => {
                tracing::trace!("sent {hex}");
                true
            }
            Err(e) => {
                tracing::error!("failed to send command {hex}: {e}");
                false
            }
        }
    }

    /// Discard replies that have already arrived. Returns the number of
    /// frames dropped.
    pub fn clear_input_buffer(&mut self) -> usize {
        let mut dropped = 0;
        while let Some(Some(frame)) = self.framed.next().now_or_never() {
            if let Err(e) = frame {
                tracing::debug!("discarding bad reply: {e}");
            }
            dropped += 1;
        }
        self.framed.read_buffer_mut().clear();
        dropped
    }

    /// Send an inquiry and wait for its reply frame.
    pub async fn inquire(&mut self, inquiry: Inquiry) -> Result<Bytes, ViscaError> {
        let dropped = self.clear_input_buffer();
        if dropped > 0 {
            tracing::trace!("dropped {dropped} stale replies before inquiry");
        }
        self.write(inquiry, inquiry.to_hex()).await?;

        let limit = self.timeouts.inquiry;
        let framed = &mut self.framed;
        tokio::time::timeout(limit, async {
            loop {
                match framed.next().await {
                    Some(Ok(frame)) if frame.len() == ACK_LEN => {
                        tracing::trace!("skipping reply {frame:02X?} while awaiting inquiry");
                    }
                    Some(Ok(frame)) => return Ok(frame),
                    Some(Err(e)) => return Err(e),
                    None => return Err(ViscaError::Disconnected),
                }
            }
        })
        .await
        .map_err(|_| ViscaError::InquiryTimeout {
            millis: limit.as_millis(),
        })?
    }

    /// Current absolute (pan, tilt) wire values.
    pub async fn pan_tilt(&mut self) -> Result<(u16, u16), ViscaError> {
        let frame = self.inquire(Inquiry::PanTilt).await?;
        Ok((decode_pan(&frame)?, decode_tilt(&frame)?))
    }

    pub async fn pan(&mut self) -> Result<u16, ViscaError> {
        Ok(self.pan_tilt().await?.0)
    }

    pub async fn tilt(&mut self) -> Result<u16, ViscaError> {
        Ok(self.pan_tilt().await?.1)
    }

    pub async fn zoom(&mut self) -> Result<u16, ViscaError> {
        let frame = self.inquire(Inquiry::Zoom).await?;
        decode_zoom(&frame)
    }

    /// Move to an absolute pan position, keeping the current tilt.
    pub async fn set_pan(&mut self, value: i32, speed: i32) -> Result<bool, ViscaError> {
        let tilt = self.tilt().await?;
        let pan = SignedOffsetValue::new(value).to_wire(ABSOLUTE_MODULUS);
        Ok(self
            .command(Command::AbsolutePosition { speed, pan, tilt })
            .await)
    }

    /// Move to an absolute tilt position, keeping the current pan.
    pub async fn set_tilt(&mut self, value: i32, speed: i32) -> Result<bool, ViscaError> {
        let pan = self.pan().await?;
        let tilt = SignedOffsetValue::new(value).to_wire(ABSOLUTE_MODULUS);
        Ok(self
            .command(Command::AbsolutePosition { speed, pan, tilt })
            .await)
    }

    pub async fn set_pan_rel(&mut self, value: i32, speed: i32) -> bool {
        self.command(Command::RelativeShift {
            speed,
            pan: SignedOffsetValue::new(value),
            tilt: SignedOffsetValue::new(0),
        })
        .await
    }

    pub async fn set_tilt_rel(&mut self, value: i32, speed: i32) -> bool {
        self.command(Command::RelativeShift {
            speed,
            pan: SignedOffsetValue::new(0),
            tilt: SignedOffsetValue::new(value),
        })
        .await
    }

    pub async fn set_zoom(&mut self, value: i32) -> bool {
        self.command(Command::ZoomPosition(value)).await
    }

    /// Zoom by `delta` from the current position. Targets outside the zoom
    /// range are pinned to its ends.
    pub async fn set_zoom_rel(&mut self, delta: i32) -> Result<bool, ViscaError> {
        let current = i32::from(self.zoom().await?);
        let delta = SignedOffsetValue::new(delta).value();
        let target = (current + delta).clamp(0, MAX_ZOOM_POSITION);
        Ok(self.command(Command::ZoomPosition(target)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pan_tilt_reply, zoom_reply};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    fn camera() -> (Camera<DuplexStream>, DuplexStream) {
        let (ours, theirs) = tokio::io::duplex(256);
        let timeouts = CameraTimeouts {
            write: Duration::from_millis(200),
            inquiry: Duration::from_millis(200),
        };
        (Camera::new(ours, timeouts), theirs)
    }

    async fn read_n(dev: &mut DuplexStream, n: usize) -> eyre::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        dev.read_exact(&mut buf).await?;
        Ok(buf)
    }

    #[tokio::test]
    async fn command_writes_bytes() -> eyre::Result<()> {
        let (mut cam, mut dev) = camera();
        assert!(cam.command(Command::PresetRecall(300)).await);
        assert_eq!(
            read_n(&mut dev, 7).await?,
            [0x81, 0x01, 0x04, 0x3F, 0x02, 0xFF, 0xFF]
        );
        Ok(())
    }

    #[tokio::test]
    async fn command_reports_failure_when_link_closed() {
        let (mut cam, dev) = camera();
        drop(dev);
        assert!(!cam.command(Command::Stop).await);
    }

    #[tokio::test]
    async fn inquiry_skips_stale_and_ack_replies() -> eyre::Result<()> {
        let (mut cam, mut dev) = camera();
        // stale completion from an earlier command, already buffered
        dev.write_all(&[0x90, 0x51, 0xFF]).await?;
        tokio::task::yield_now().await;

        let device = tokio::spawn(async move {
            let rq = read_n(&mut dev, 5).await?;
            assert_eq!(rq, [0x81, 0x09, 0x06, 0x12, 0xFF]);
            dev.write_all(&[0x90, 0x41, 0xFF]).await?;
            dev.write_all(&pan_tilt_reply(0x1234, 0xFFF0)).await?;
            eyre::Result::<_>::Ok(dev)
        });
        assert_eq!(cam.pan_tilt().await?, (0x1234, 0xFFF0));
        device.await??;
        Ok(())
    }

    #[tokio::test]
    async fn inquiry_times_out() {
        let (mut cam, _dev) = camera();
        match cam.zoom().await {
            Err(ViscaError::InquiryTimeout { millis }) => assert_eq!(millis, 200),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn inquiry_short_reply() -> eyre::Result<()> {
        let (mut cam, mut dev) = camera();
        let device = tokio::spawn(async move {
            read_n(&mut dev, 5).await?;
            // error reply: 90 60 02 FF
            dev.write_all(&[0x90, 0x60, 0x02, 0xFF]).await?;
            eyre::Result::<_>::Ok(dev)
        });
        assert!(matches!(
            cam.pan().await,
            Err(ViscaError::ShortResponse {
                expected: 22,
                actual: 8
            })
        ));
        device.await??;
        Ok(())
    }

    #[tokio::test]
    async fn set_pan_keeps_current_tilt() -> eyre::Result<()> {
        let (mut cam, mut dev) = camera();
        let device = tokio::spawn(async move {
            read_n(&mut dev, 5).await?;
            dev.write_all(&pan_tilt_reply(0x0000, 0x0ABC)).await?;
            let cmd = read_n(&mut dev, 15).await?;
            eyre::Result::<_>::Ok(cmd)
        });
        assert!(cam.set_pan(-1, 5).await?);
        let cmd = device.await??;
        assert_eq!(
            cmd,
            [
                0x81, 0x01, 0x06, 0x02, 0x05, 0x05, 0x0F, 0x0F, 0x0F, 0x0E, 0x00, 0x0A, 0x0B,
                0x0C, 0xFF
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn set_tilt_keeps_current_pan() -> eyre::Result<()> {
        let (mut cam, mut dev) = camera();
        let device = tokio::spawn(async move {
            let rq = read_n(&mut dev, 5).await?;
            assert_eq!(rq, [0x81, 0x09, 0x06, 0x12, 0xFF]);
            dev.write_all(&pan_tilt_reply(0x0123, 0x0000)).await?;
            let cmd = read_n(&mut dev, 15).await?;
            eyre::Result::<_>::Ok(cmd)
        });
        assert!(cam.set_tilt(2, 7).await?);
        let cmd = device.await??;
        assert_eq!(
            cmd,
            [
                0x81, 0x01, 0x06, 0x02, 0x07, 0x07, 0x00, 0x01, 0x02, 0x03, 0x00, 0x00, 0x00,
                0x02, 0xFF
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn set_pan_rel_negative() -> eyre::Result<()> {
        let (mut cam, mut dev) = camera();
        assert!(cam.set_pan_rel(-16, 5).await);
        assert_eq!(
            read_n(&mut dev, 15).await?,
            [
                0x81, 0x01, 0x06, 0x03, 0x05, 0x05, 0x0F, 0x0F, 0x0E, 0x0F, 0x00, 0x00, 0x00,
                0x00, 0xFF
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn set_zoom_rel_pins_at_zero() -> eyre::Result<()> {
        let (mut cam, mut dev) = camera();
        let device = tokio::spawn(async move {
            read_n(&mut dev, 5).await?;
            dev.write_all(&zoom_reply(0x0100)).await?;
            let cmd = read_n(&mut dev, 9).await?;
            eyre::Result::<_>::Ok(cmd)
        });
        assert!(cam.set_zoom_rel(-1000).await?);
        assert_eq!(
            device.await??,
            [0x81, 0x01, 0x04, 0x47, 0x00, 0x00, 0x00, 0x00, 0xFF]
        );
        Ok(())
    }
}

use color_eyre::eyre::{Result, WrapErr};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing as log;

use pad_core::SerialConfig;
use visca::Camera;

/// Open the camera's serial port. VISCA links run 8N1 without flow control,
/// which is the builder default.
pub(crate) fn open_camera(port: &str, cfg: &SerialConfig) -> Result<Camera<SerialStream>> {
    let serial_device = tokio_serial::new(port, cfg.baud_rate)
        .open_native_async()
        .with_context(|| format!("Failed to open VISCA serial device {port}"))?;
    log::info!("Opened {port} at {} baud", cfg.baud_rate);
    Ok(Camera::new(serial_device, cfg.timeouts()))
}

use color_eyre::eyre::{self as anyhow, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tracing as log;

use pad_core::{ControlSample, PadConfig};
use visca::Camera;

use crate::session::{self, SessionError};

/// Run control sessions on cameras from `open`, reopening after link
/// failures as allowed by the restart policy.
///
/// Input loss ends supervision with an error. Shutdown ends it with `Ok`,
/// also while waiting to restart.
pub(crate) async fn supervise<S, F>(
    cfg: &PadConfig,
    mut open: F,
    input_rx: watch::Receiver<Option<ControlSample>>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FnMut() -> Result<Camera<S>>,
{
    let mut restarts = 0;
    loop {
        if *shutdown_rx.borrow_and_update() {
            return Ok(());
        }
        let result = match open() {
            Ok(mut camera) => {
                session::run_session(&mut camera, cfg, input_rx.clone(), shutdown_rx.clone())
                    .await
            }
            Err(e) => Err(SessionError::TransportLost(format!("{e:#}"))),
        };
        match result {
            Ok(()) => return Ok(()),
            Err(e @ SessionError::InputLost) => return Err(e.into()),
            Err(SessionError::TransportLost(msg)) => {
                if !cfg.restart.allows(restarts) {
                    anyhow::bail!("camera link lost after {restarts} restarts: {msg}");
                }
                restarts += 1;
                log::error!(
                    "Camera link lost: {msg}. Restart {restarts} in {:?}.",
                    cfg.restart.delay()
                );
                tokio::select! {
                    _ = tokio::time::sleep(cfg.restart.delay()) => {}
                    res = shutdown_rx.changed() => {
                        if res.is_err() || *shutdown_rx.borrow() {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

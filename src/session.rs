use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing as log;

use pad_core::{Action, ControlSample, Debouncer, PadConfig};
use visca::{Camera, Command};

#[derive(thiserror::Error, Debug)]
pub(crate) enum SessionError {
    /// The control input is gone. Not worth restarting.
    #[error("control input lost")]
    InputLost,
    /// The camera link failed. Reopening it may help.
    #[error("camera link lost: {0}")]
    TransportLost(String),
}

struct ControlSession<'a, S> {
    camera: &'a mut Camera<S>,
    debouncer: Debouncer,
    max_failures: u32,
    consecutive_failures: u32,
}

impl<S> ControlSession<'_, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn execute(&mut self, actions: Vec<Action>) -> Result<(), SessionError> {
        for action in actions {
            match action {
                Action::Dispatch(cmd) => {
                    if self.camera.command(cmd).await {
                        self.consecutive_failures = 0;
                    } else {
                        self.consecutive_failures += 1;
                        if self.consecutive_failures >= self.max_failures {
                            return Err(SessionError::TransportLost(format!(
                                "{} consecutive writes failed",
                                self.consecutive_failures
                            )));
                        }
                    }
                }
                Action::Pause(dur) => tokio::time::sleep(dur).await,
            }
        }
        Ok(())
    }

    async fn stop_all(&mut self) {
        log::info!("Stopping pan-tilt and zoom");
        self.camera.command(Command::Stop).await;
        self.camera.command(Command::ZoomStop).await;
    }
}

/// Drive `camera` from the latest control sample until shutdown, input loss
/// or link failure.
///
/// Motion is stopped before returning unless the link itself failed.
pub(crate) async fn run_session<S>(
    camera: &mut Camera<S>,
    cfg: &PadConfig,
    mut input_rx: watch::Receiver<Option<ControlSample>>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut session = ControlSession {
        camera,
        debouncer: Debouncer::new(cfg),
        max_failures: cfg.max_consecutive_failures.max(1),
        consecutive_failures: 0,
    };
    let mut tick = tokio::time::interval(cfg.poll_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        if *shutdown_rx.borrow_and_update() {
            log::info!("Shutdown requested");
            break Ok(());
        }
        tokio::select! {
            _ = tick.tick() => {}
            res = shutdown_rx.changed() => {
                if res.is_err() {
                    log::info!("Shutdown channel closed");
                    break Ok(());
                }
                continue;
            }
        }

        if input_rx.has_changed().is_err() {
            log::error!("control input channel closed");
            break Err(SessionError::InputLost);
        }
        // hold lock on watch channel only briefly and not across `await`.
        let sample = input_rx.borrow_and_update().clone();
        let Some(sample) = sample else {
            continue;
        };
        let actions = session.debouncer.observe(&sample);
        if let Err(e) = session.execute(actions).await {
            break Err(e);
        }
    };

    if !matches!(result, Err(SessionError::TransportLost(_))) {
        session.stop_all().await;
    }
    result
}

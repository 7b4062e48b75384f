pub mod config;
pub use config::{AxisMode, ConfigError, PadConfig, RestartPolicy, SerialConfig, TierValues};

pub mod input;
pub use input::{quantize, ControlSample, FaceButtons, Hat, TierButtons, PRESET_INPUTS};

pub mod speed;
pub use speed::{speed, SpeedTier};

mod latch;
pub use latch::ControlLatch;

pub mod debounce;
pub use debounce::{Action, Debouncer};

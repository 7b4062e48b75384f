//! Turns level-triggered controller state into edge-triggered commands.
//!
//! Preset inputs dispatch once per press. In [AxisMode::Latched] an axis
//! leaving rest starts motion once and its return to rest stops it once. In
//! [AxisMode::Pulsed] every poll with a deflected axis produces a short move
//! followed by a stop.

use std::time::Duration;

use visca::{Command, Direction};

use crate::latch::arm;
use crate::{
    quantize, speed, AxisMode, ControlLatch, ControlSample, PadConfig, SpeedTier, TierValues,
};

/// Step for the session to execute, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Dispatch(Command),
    Pause(Duration),
}

#[derive(Debug, Clone)]
struct AxisSettings {
    mode: AxisMode,
    rest: f64,
    decimals: u32,
    motion_speed: TierValues<i32>,
    zoom_speed: TierValues<i32>,
    motion_pulse_ms: TierValues<u64>,
    zoom_pulse_ms: TierValues<u64>,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    latch: ControlLatch,
    settings: AxisSettings,
}

fn dispatch(actions: &mut Vec<Action>, label: &str, cmd: Command) {
    tracing::info!("Dispatched command: {label} ({cmd})");
    actions.push(Action::Dispatch(cmd));
}

impl Debouncer {
    pub fn new(cfg: &PadConfig) -> Self {
        Self {
            latch: ControlLatch::default(),
            settings: AxisSettings {
                mode: cfg.axis_mode,
                rest: quantize(cfg.rest_value, cfg.axis_decimals),
                decimals: cfg.axis_decimals,
                motion_speed: cfg.motion_speed,
                zoom_speed: cfg.zoom_speed,
                motion_pulse_ms: cfg.motion_pulse_ms,
                zoom_pulse_ms: cfg.zoom_pulse_ms,
            },
        }
    }

    pub fn latch(&self) -> &ControlLatch {
        &self.latch
    }

    /// Feed one poll of controller state and collect the resulting actions.
    pub fn observe(&mut self, sample: &ControlSample) -> Vec<Action> {
        let mut actions = Vec::new();
        if sample.has_nan() {
            tracing::warn!("ignoring malformed sample {sample:?}");
            return actions;
        }

        self.presets(sample, &mut actions);

        let motion_tier = SpeedTier::select(sample.tiers.motion_medium, sample.tiers.motion_high);
        let zoom_tier = SpeedTier::select(sample.tiers.zoom_medium, sample.tiers.zoom_high);
        let d = self.settings.decimals;
        let (pan, tilt, zoom) = (
            quantize(sample.pan, d),
            quantize(sample.tilt, d),
            quantize(sample.zoom, d),
        );

        match self.settings.mode {
            AxisMode::Latched => {
                self.latched_pan_tilt(pan, tilt, motion_tier, &mut actions);
                self.latched_zoom(zoom, zoom_tier, &mut actions);
            }
            AxisMode::Pulsed => {
                self.pulsed_pan_tilt(pan, tilt, motion_tier, &mut actions);
                self.pulsed_zoom(zoom, zoom_tier, &mut actions);
            }
        }
        actions
    }

    fn presets(&mut self, sample: &ControlSample, actions: &mut Vec<Action>) {
        for (idx, state) in sample.preset_inputs().into_iter().enumerate() {
            match state {
                Some(true) if !self.latch.preset_held(idx) => {}
                Some(false) if self.latch.preset_held(idx) => {
                    tracing::debug!("preset input {idx} released");
                    self.latch.release_preset(idx);
                    continue;
                }
                _ => continue,
            }
            let preset = idx as i32;
            if sample.menu {
                self.latch.set[idx] = true;
                dispatch(
                    actions,
                    &format!("OVERWRITING PRESET {idx}"),
                    Command::PresetSet(preset),
                );
            } else {
                self.latch.recall[idx] = true;
                dispatch(
                    actions,
                    &format!("RECALLING PRESET {idx}"),
                    Command::PresetRecall(preset),
                );
            }
        }
    }

    fn latched_pan_tilt(
        &mut self,
        pan: f64,
        tilt: f64,
        tier: SpeedTier,
        actions: &mut Vec<Action>,
    ) {
        let rest = self.settings.rest;
        let s = speed(1.0, self.settings.motion_speed.get(tier));
        let l = &mut self.latch;

        if pan < rest {
            if arm(&mut l.left) {
                l.right = false;
                dispatch(actions, &format!("LEFT at {s}"), drive(Direction::Left, s, 0));
            }
        } else if pan > rest && arm(&mut l.right) {
            l.left = false;
            dispatch(actions, &format!("RIGHT at {s}"), drive(Direction::Right, s, 0));
        }

        if tilt < rest {
            if arm(&mut l.up) {
                l.down = false;
                dispatch(actions, &format!("UP at {s}"), drive(Direction::Up, 0, s));
            }
        } else if tilt > rest && arm(&mut l.down) {
            l.up = false;
            dispatch(actions, &format!("DOWN at {s}"), drive(Direction::Down, 0, s));
        }

        if pan == rest && tilt == rest {
            if arm(&mut l.pan_tilt_rest) {
                dispatch(actions, "PAN-TILT REST", Command::Stop);
                l.clear_pan_tilt();
            }
        } else if l.pan_tilt_rest {
            tracing::debug!("pan-tilt left rest");
            l.pan_tilt_rest = false;
        }
    }

    fn latched_zoom(&mut self, zoom: f64, tier: SpeedTier, actions: &mut Vec<Action>) {
        let rest = self.settings.rest;
        let s = speed(1.0, self.settings.zoom_speed.get(tier));
        let l = &mut self.latch;

        if zoom < rest {
            if arm(&mut l.zoom_in) {
                l.zoom_out = false;
                dispatch(actions, &format!("ZOOM IN at {s}"), Command::ZoomIn(s));
            }
        } else if zoom > rest && arm(&mut l.zoom_out) {
            l.zoom_in = false;
            dispatch(actions, &format!("ZOOM OUT at {s}"), Command::ZoomOut(s));
        }

        if zoom == rest {
            if arm(&mut l.zoom_rest) {
                dispatch(actions, "ZOOM REST", Command::ZoomStop);
                l.clear_zoom();
            }
        } else if l.zoom_rest {
            tracing::debug!("zoom left rest");
            l.zoom_rest = false;
        }
    }

    fn pulsed_pan_tilt(&self, pan: f64, tilt: f64, tier: SpeedTier, actions: &mut Vec<Action>) {
        let rest = self.settings.rest;
        let ceiling = self.settings.motion_speed.get(tier);
        let (pan_speed, tilt_speed) = (speed(pan - rest, ceiling), speed(tilt - rest, ceiling));

        use Direction::*;
        let direction = match (pan < rest, pan > rest, tilt < rest, tilt > rest) {
            (true, _, true, _) => UpLeft,
            (true, _, _, true) => DownLeft,
            (_, true, true, _) => UpRight,
            (_, true, _, true) => DownRight,
            (true, _, _, _) => Left,
            (_, true, _, _) => Right,
            (_, _, true, _) => Up,
            (_, _, _, true) => Down,
            _ => return,
        };
        if pan_speed == 0 && tilt_speed == 0 {
            tracing::trace!("skipping zero-speed {direction:?} pulse");
            return;
        }
        let cmd = drive(direction, pan_speed, tilt_speed);
        tracing::debug!("pulse {direction:?} ({cmd})");
        actions.push(Action::Dispatch(cmd));
        actions.push(Action::Pause(Duration::from_millis(
            self.settings.motion_pulse_ms.get(tier),
        )));
        actions.push(Action::Dispatch(Command::Stop));
    }

    fn pulsed_zoom(&self, zoom: f64, tier: SpeedTier, actions: &mut Vec<Action>) {
        let rest = self.settings.rest;
        let s = speed(zoom - rest, self.settings.zoom_speed.get(tier));
        let cmd = if zoom < rest {
            Command::ZoomIn(s)
        } else if zoom > rest {
            Command::ZoomOut(s)
        } else {
            return;
        };
        if s == 0 {
            tracing::trace!("skipping zero-speed zoom pulse");
            return;
        }
        tracing::debug!("zoom pulse ({cmd})");
        actions.push(Action::Dispatch(cmd));
        actions.push(Action::Pause(Duration::from_millis(
            self.settings.zoom_pulse_ms.get(tier),
        )));
        actions.push(Action::Dispatch(Command::ZoomStop));
    }
}

fn drive(direction: Direction, pan_speed: i32, tilt_speed: i32) -> Command {
    Command::Move {
        direction,
        pan_speed,
        tilt_speed,
    }
}

use crate::PRESET_INPUTS;

/// Debounce state of every control, owned by one [crate::Debouncer].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlLatch {
    pub recall: [bool; PRESET_INPUTS],
    pub set: [bool; PRESET_INPUTS],
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
    pub pan_tilt_rest: bool,
    pub zoom_rest: bool,
}

impl Default for ControlLatch {
    /// Axes start at rest so that startup sends no stop.
    fn default() -> Self {
        Self {
            recall: [false; PRESET_INPUTS],
            set: [false; PRESET_INPUTS],
            up: false,
            down: false,
            left: false,
            right: false,
            zoom_in: false,
            zoom_out: false,
            pan_tilt_rest: true,
            zoom_rest: true,
        }
    }
}

/// Set `latch`, returning true if it was clear.
pub(crate) fn arm(latch: &mut bool) -> bool {
    !std::mem::replace(latch, true)
}

impl ControlLatch {
    /// Whether preset input `idx` is held in either group.
    pub fn preset_held(&self, idx: usize) -> bool {
        self.recall[idx] || self.set[idx]
    }

    pub(crate) fn release_preset(&mut self, idx: usize) {
        self.recall[idx] = false;
        self.set[idx] = false;
    }

    pub(crate) fn clear_pan_tilt(&mut self) {
        self.up = false;
        self.down = false;
        self.left = false;
        self.right = false;
    }

    pub(crate) fn clear_zoom(&mut self) {
        self.zoom_in = false;
        self.zoom_out = false;
    }
}

use serde::{Deserialize, Deserializer, Serialize};

/// Number of inputs bound to presets: four face buttons then four hat
/// directions.
pub const PRESET_INPUTS: usize = 8;

/// The face buttons, in preset order 0..=3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceButtons {
    pub y: bool,
    pub b: bool,
    pub a: bool,
    pub x: bool,
}

/// Directional pad. `y = 1` is up, `x = 1` is right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hat {
    pub x: i8,
    pub y: i8,
}

impl Hat {
    pub const CENTRE: Hat = Hat { x: 0, y: 0 };
    pub const UP: Hat = Hat { x: 0, y: 1 };
    pub const RIGHT: Hat = Hat { x: 1, y: 0 };
    pub const DOWN: Hat = Hat { x: 0, y: -1 };
    pub const LEFT: Hat = Hat { x: -1, y: 0 };
}

/// Shoulder buttons selecting the speed tier of each axis group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierButtons {
    pub motion_medium: bool,
    pub motion_high: bool,
    pub zoom_medium: bool,
    pub zoom_high: bool,
}

/// One poll of the controller.
///
/// Axes are normalized to -1..=1. Negative `tilt` is up and negative `zoom`
/// is zoom in. A JSON `null` axis deserializes to NaN and the sample is then
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSample {
    #[serde(deserialize_with = "float_null_as_nan")]
    pub pan: f64,
    #[serde(deserialize_with = "float_null_as_nan")]
    pub tilt: f64,
    #[serde(deserialize_with = "float_null_as_nan")]
    pub zoom: f64,
    pub buttons: FaceButtons,
    pub hat: Hat,
    /// Held: preset buttons store instead of recall.
    pub menu: bool,
    pub tiers: TierButtons,
}

impl ControlSample {
    /// State of each preset input: `Some(true)` pressed, `Some(false)`
    /// released, `None` neither.
    ///
    /// A hat direction is pressed only on its exact cardinal and released
    /// only once the hat is centred. Any other reading leaves it as it was.
    pub fn preset_inputs(&self) -> [Option<bool>; PRESET_INPUTS] {
        let b = &self.buttons;
        let hat = |dir: Hat| {
            if self.hat == dir {
                Some(true)
            } else if self.hat == Hat::CENTRE {
                Some(false)
            } else {
                None
            }
        };
        [
            Some(b.y),
            Some(b.b),
            Some(b.a),
            Some(b.x),
            hat(Hat::UP),
            hat(Hat::RIGHT),
            hat(Hat::DOWN),
            hat(Hat::LEFT),
        ]
    }

    pub fn has_nan(&self) -> bool {
        self.pan.is_nan() || self.tilt.is_nan() || self.zoom.is_nan()
    }
}

/// Round to `decimals` places, as the controller readout is printed.
pub fn quantize(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// JSON has no NaN. See https://github.com/serde-rs/json/issues/202
fn float_null_as_nan<'de, D: Deserializer<'de>>(des: D) -> Result<f64, D::Error> {
    let optional = Option::<f64>::deserialize(des)?;
    Ok(optional.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_from_json() -> eyre::Result<()> {
        let s: ControlSample =
            serde_json::from_str(r#"{"pan":-0.25,"buttons":{"a":true},"hat":{"x":-1}}"#)?;
        assert_eq!(s.pan, -0.25);
        assert_eq!(s.tilt, 0.0);
        let f = Some(false);
        assert_eq!(
            s.preset_inputs(),
            [f, f, Some(true), f, None, None, None, Some(true)]
        );
        assert!(!s.has_nan());
        Ok(())
    }

    #[test]
    fn null_axis_is_nan() -> eyre::Result<()> {
        let s: ControlSample = serde_json::from_str(r#"{"zoom":null}"#)?;
        assert!(s.zoom.is_nan());
        assert!(s.has_nan());
        Ok(())
    }

    #[test]
    fn diagonal_hat_neither_presses_nor_releases() {
        let s = ControlSample {
            hat: Hat { x: 1, y: 1 },
            ..Default::default()
        };
        assert_eq!(s.preset_inputs()[4..], [None::<bool>; 4]);
        assert_eq!(s.preset_inputs()[..4], [Some(false); 4]);
    }

    #[test]
    fn centred_hat_releases_all_directions() {
        let s = ControlSample::default();
        assert_eq!(s.preset_inputs(), [Some(false); PRESET_INPUTS]);
    }

    #[test]
    fn quantize_to_rest() {
        assert_eq!(quantize(0.0004, 3), 0.0);
        assert_eq!(quantize(-0.0004, 3), 0.0);
        assert_eq!(quantize(0.0006, 3), 0.001);
        assert_eq!(quantize(-0.99987, 3), -1.0);
    }
}

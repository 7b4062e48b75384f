use crate::params::{clamp_param, hex_field, nibble_pack, SignedOffsetValue};
use crate::{ABSOLUTE_MODULUS, RELATIVE_PAN_MODULUS, RELATIVE_TILT_MODULUS};

/// Pan and tilt drive speed, 0x00..=0x18.
pub const MAX_MOTION_SPEED: i32 = 24;
/// Zoom and focus drive speed.
pub const MAX_DRIVE_SPEED: i32 = 7;
pub const MAX_PRESET: i32 = 255;
pub const MAX_ZOOM_POSITION: i32 = 65535;

/// Speed byte sent for the axis that is not moving in a single-axis drive.
const IDLE_AXIS_SPEED: &str = "15";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    fn code(self) -> &'static str {
        use Direction::*;
        match self {
            Up => "0301",
            Down => "0302",
            Left => "0103",
            Right => "0203",
            UpLeft => "0101",
            UpRight => "0201",
            DownLeft => "0102",
            DownRight => "0202",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    Auto,
    Manual,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfSensitivity {
    High,
    Low,
}

/// Image settings adjustable by fixed steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustable {
    Aperture,
    Iris,
    Gain,
    Bright,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Up,
    Down,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteBalance {
    Auto,
    Indoor,
    Outdoor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureEffect {
    Off,
    Pastel,
    Negative,
    Sepia,
    BlackWhite,
    Solarize,
    Mosaic,
    Slim,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WideMode {
    Off,
    Cinema,
    Full169,
}

/// One outbound camera command.
///
/// Out-of-range parameters are clamped when the command is encoded, never
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Power(bool),
    Cancel,
    Home,
    Reset,
    /// Continuous pan/tilt drive. For single-axis directions the speed of the
    /// idle axis is ignored.
    Move {
        direction: Direction,
        pan_speed: i32,
        tilt_speed: i32,
    },
    Stop,
    ZoomIn(i32),
    ZoomOut(i32),
    ZoomStop,
    FocusFar(i32),
    FocusNear(i32),
    FocusStop,
    FocusMode(FocusMode),
    AfSensitivity(AfSensitivity),
    /// Absolute pan-tilt position. The fields are wire values, see
    /// [Command::absolute_position] to build one from signed positions.
    AbsolutePosition { speed: i32, pan: u16, tilt: u16 },
    /// Relative pan-tilt shift at one speed, fields offset by
    /// [ABSOLUTE_MODULUS].
    RelativeShift {
        speed: i32,
        pan: SignedOffsetValue,
        tilt: SignedOffsetValue,
    },
    /// Combined relative move with independent speeds. Negative pan is
    /// offset by [RELATIVE_PAN_MODULUS], negative tilt by
    /// [RELATIVE_TILT_MODULUS].
    RelativePosition {
        pan_speed: i32,
        tilt_speed: i32,
        pan: SignedOffsetValue,
        tilt: SignedOffsetValue,
    },
    ZoomPosition(i32),
    PresetSet(i32),
    PresetRecall(i32),
    Adjust(Adjustable, Step),
    ExposureFullAuto,
    WhiteBalance(WhiteBalance),
    Backlight(bool),
    Freeze(bool),
    PictureEffect(PictureEffect),
    WideMode(WideMode),
}

fn on_off(on: bool) -> &'static str {
    if on {
        "02"
    } else {
        "03"
    }
}

fn motion_speed(speed: i32) -> String {
    hex_field("motion speed", speed, MAX_MOTION_SPEED, 2)
}

fn drive_speed(speed: i32) -> String {
    hex_field("drive speed", speed, MAX_DRIVE_SPEED, 1)
}

impl Command {
    /// Absolute position from signed pan and tilt, negative values offset by
    /// [ABSOLUTE_MODULUS].
    pub fn absolute_position(speed: i32, pan: i32, tilt: i32) -> Self {
        Command::AbsolutePosition {
            speed,
            pan: SignedOffsetValue::new(pan).to_wire(ABSOLUTE_MODULUS),
            tilt: SignedOffsetValue::new(tilt).to_wire(ABSOLUTE_MODULUS),
        }
    }

    /// The complete command as an uppercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        use Command::*;
        match self {
            Power(on) => format!("81010400{}FF", on_off(*on)),
            Cancel => "81010001FF".into(),
            Home => "81010604FF".into(),
            Reset => "81010605FF".into(),
            Move {
                direction,
                pan_speed,
                tilt_speed,
            } => {
                let (vv, ww) = match direction {
                    Direction::Up | Direction::Down => {
                        (IDLE_AXIS_SPEED.to_string(), motion_speed(*tilt_speed))
                    }
                    Direction::Left | Direction::Right => {
                        (motion_speed(*pan_speed), IDLE_AXIS_SPEED.to_string())
                    }
                    _ => (motion_speed(*pan_speed), motion_speed(*tilt_speed)),
                };
                format!("81010601{vv}{ww}{}FF", direction.code())
            }
            Stop => "8101060115150303FF".into(),
            ZoomIn(speed) => format!("810104072{}FF", drive_speed(*speed)),
            ZoomOut(speed) => format!("810104073{}FF", drive_speed(*speed)),
            ZoomStop => "8101040700FF".into(),
            FocusFar(speed) => format!("810104082{}FF", drive_speed(*speed)),
            FocusNear(speed) => format!("810104083{}FF", drive_speed(*speed)),
            FocusStop => "8101040800FF".into(),
            Command::FocusMode(mode) => {
                let code = match mode {
                    self::FocusMode::Auto => "02",
                    self::FocusMode::Manual => "03",
                    self::FocusMode::Toggle => "10",
                };
                format!("81010438{code}FF")
            }
            Command::AfSensitivity(sens) => {
                let code = match sens {
                    self::AfSensitivity::High => "02",
                    self::AfSensitivity::Low => "03",
                };
                format!("81010458{code}FF")
            }
            AbsolutePosition { speed, pan, tilt } => {
                let s = motion_speed(*speed);
                format!("81010602{s}{s}{}{}FF", nibble_pack(*pan), nibble_pack(*tilt))
            }
            RelativeShift { speed, pan, tilt } => {
                let s = motion_speed(*speed);
                format!(
                    "81010603{s}{s}{}{}FF",
                    nibble_pack(pan.to_wire(ABSOLUTE_MODULUS)),
                    nibble_pack(tilt.to_wire(ABSOLUTE_MODULUS))
                )
            }
            RelativePosition {
                pan_speed,
                tilt_speed,
                pan,
                tilt,
            } => format!(
                "81010603{}{}{}{}FF",
                motion_speed(*pan_speed),
                motion_speed(*tilt_speed),
                nibble_pack(pan.to_wire(RELATIVE_PAN_MODULUS)),
                nibble_pack(tilt.to_wire(RELATIVE_TILT_MODULUS))
            ),
            ZoomPosition(pos) => {
                let pos = clamp_param("zoom position", *pos, 0, MAX_ZOOM_POSITION);
                format!("81010447{}FF", nibble_pack(pos as u16))
            }
            PresetSet(idx) => {
                format!("8101043F01{}FF", hex_field("preset", *idx, MAX_PRESET, 2))
            }
            PresetRecall(idx) => {
                format!("8101043F02{}FF", hex_field("preset", *idx, MAX_PRESET, 2))
            }
            Adjust(what, step) => {
                let what = match what {
                    Adjustable::Aperture => "02",
                    Adjustable::Iris => "0B",
                    Adjustable::Gain => "0C",
                    Adjustable::Bright => "0D",
                };
                let step = match step {
                    Step::Up => "02",
                    Step::Down => "03",
                    Step::Reset => "00",
                };
                format!("810104{what}{step}FF")
            }
            ExposureFullAuto => "8101043900FF".into(),
            Command::WhiteBalance(wb) => {
                let code = match wb {
                    self::WhiteBalance::Auto => "00",
                    self::WhiteBalance::Indoor => "01",
                    self::WhiteBalance::Outdoor => "02",
                };
                format!("81010435{code}FF")
            }
            Backlight(on) => format!("81010433{}FF", on_off(*on)),
            Freeze(on) => format!("81010462{}FF", on_off(*on)),
            Command::PictureEffect(effect) => format!("81010463{:02X}FF", *effect as u8),
            Command::WideMode(mode) => format!("81010460{:02X}FF", *mode as u8),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_str(&self.to_hex())
    }
}

/// The two supported position inquiries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inquiry {
    PanTilt,
    Zoom,
}

impl Inquiry {
    pub fn to_hex(self) -> &'static str {
        match self {
            Inquiry::PanTilt => "81090612FF",
            Inquiry::Zoom => "81090447FF",
        }
    }

    /// Length of the reply, counted in hex characters.
    pub fn expected_len(self) -> usize {
        match self {
            Inquiry::PanTilt => 22,
            Inquiry::Zoom => 14,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(spaced: &str) -> String {
        spaced.replace(' ', "")
    }

    fn mv(direction: Direction, pan_speed: i32, tilt_speed: i32) -> String {
        Command::Move {
            direction,
            pan_speed,
            tilt_speed,
        }
        .to_hex()
    }

    #[test]
    fn preset_recall_clamps_to_255() {
        assert_eq!(Command::PresetRecall(300).to_hex(), "8101043F02FFFF");
        assert_eq!(Command::PresetRecall(-4).to_hex(), "8101043F0200FF");
        assert_eq!(Command::PresetRecall(10).to_hex(), "8101043F020AFF");
        assert_eq!(Command::PresetSet(3).to_hex(), "8101043F0103FF");
    }

    #[test]
    fn motion_speed_field() {
        for a in -5..40 {
            let hex = mv(Direction::Left, a, 0);
            let field = i32::from_str_radix(&hex[8..10], 16).unwrap();
            assert_eq!(field, a.clamp(0, MAX_MOTION_SPEED), "speed {a}");
            assert_eq!(hex.len(), 18);
        }
    }

    #[test]
    fn single_axis_moves_fix_idle_speed() {
        assert_eq!(mv(Direction::Left, 7, 3), packed("81010601 07 15 0103 FF"));
        assert_eq!(mv(Direction::Right, 14, 3), packed("81010601 0E 15 0203 FF"));
        assert_eq!(mv(Direction::Up, 3, 1), packed("81010601 15 01 0301 FF"));
        assert_eq!(mv(Direction::Down, 3, 24), packed("81010601 15 18 0302 FF"));
        assert_eq!(mv(Direction::UpRight, 2, 4), packed("81010601 02 04 0201 FF"));
        assert_eq!(mv(Direction::DownLeft, 2, 4), packed("81010601 02 04 0102 FF"));
        assert_eq!(Command::Stop.to_hex(), "8101060115150303FF");
    }

    #[test]
    fn drive_speed_clamps_to_seven() {
        for a in -3..12 {
            let hex = Command::ZoomIn(a).to_hex();
            let expected = format!("810104072{:X}FF", a.clamp(0, MAX_DRIVE_SPEED));
            assert_eq!(hex, expected);
        }
        assert_eq!(Command::ZoomOut(3).to_hex(), "8101040733FF");
        assert_eq!(Command::FocusFar(9).to_hex(), "8101040827FF");
        assert_eq!(Command::FocusNear(5).to_hex(), "8101040835FF");
    }

    #[test]
    fn relative_negative_pan_matches_offset_amount() {
        let left = Command::RelativePosition {
            pan_speed: 5,
            tilt_speed: 5,
            pan: SignedOffsetValue::from_amount(100, false),
            tilt: SignedOffsetValue::from_amount(0, true),
        };
        let raw = Command::RelativePosition {
            pan_speed: 5,
            tilt_speed: 5,
            pan: SignedOffsetValue::new(0),
            tilt: SignedOffsetValue::new(0),
        };
        let left = left.to_hex();
        // 65532 - 100 = 65432 = 0xFF98
        assert_eq!(&left[12..20], "0F0F0908");
        assert_eq!(&left[..12], &raw.to_hex()[..12]);
        assert_eq!(&left[20..], "00000000FF");
    }

    #[test]
    fn relative_negative_tilt_uses_own_modulus() {
        let down = Command::RelativePosition {
            pan_speed: 20,
            tilt_speed: 3,
            pan: SignedOffsetValue::from_amount(16, true),
            tilt: SignedOffsetValue::from_amount(100, false),
        };
        // 65500 - 100 = 65400 = 0xFF78
        assert_eq!(
            down.to_hex(),
            packed("81010603 14 03 00000100 0F0F0708 FF")
        );
    }

    #[test]
    fn absolute_position_layout() {
        let cmd = Command::absolute_position(5, -1, 0x0123);
        assert_eq!(cmd.to_hex(), packed("81010602 0505 0F0F0F0E 00010203 FF"));
        let cmd = Command::RelativeShift {
            speed: 30,
            pan: SignedOffsetValue::new(0),
            tilt: SignedOffsetValue::new(-2),
        };
        assert_eq!(cmd.to_hex(), packed("81010603 1818 00000000 0F0F0F0D FF"));
    }

    #[test]
    fn zoom_position_layout() {
        assert_eq!(Command::ZoomPosition(0x4000).to_hex(), "8101044704000000FF");
        assert_eq!(Command::ZoomPosition(70000).to_hex(), "810104470F0F0F0FFF");
        assert_eq!(Command::ZoomPosition(-5).to_hex(), "8101044700000000FF");
    }

    #[test]
    fn fixed_opcodes() {
        assert_eq!(Command::Power(true).to_hex(), "8101040002FF");
        assert_eq!(Command::Power(false).to_hex(), "8101040003FF");
        assert_eq!(Command::Cancel.to_hex(), "81010001FF");
        assert_eq!(Command::FocusMode(FocusMode::Auto).to_hex(), "8101043802FF");
        assert_eq!(Command::FocusMode(FocusMode::Toggle).to_hex(), "8101043810FF");
        assert_eq!(
            Command::AfSensitivity(AfSensitivity::Low).to_hex(),
            "8101045803FF"
        );
        assert_eq!(
            Command::Adjust(Adjustable::Iris, Step::Down).to_hex(),
            "8101040B03FF"
        );
        assert_eq!(
            Command::Adjust(Adjustable::Aperture, Step::Reset).to_hex(),
            "8101040200FF"
        );
        assert_eq!(
            Command::WhiteBalance(WhiteBalance::Outdoor).to_hex(),
            "8101043502FF"
        );
        assert_eq!(Command::Backlight(false).to_hex(), "8101043303FF");
        assert_eq!(Command::Freeze(true).to_hex(), "8101046202FF");
        assert_eq!(
            Command::PictureEffect(PictureEffect::Stretch).to_hex(),
            "8101046308FF"
        );
        assert_eq!(
            Command::PictureEffect(PictureEffect::BlackWhite).to_hex(),
            "8101046304FF"
        );
        assert_eq!(Command::WideMode(WideMode::Full169).to_hex(), "8101046002FF");
    }

    #[test]
    fn every_command_is_framed() {
        let all = [
            Command::Home,
            Command::Reset,
            Command::ZoomStop,
            Command::FocusStop,
            Command::ExposureFullAuto,
            Command::ZoomIn(3),
            Command::PresetSet(255),
        ];
        for cmd in all {
            let hex = cmd.to_hex();
            assert!(hex.starts_with("81"), "{hex}");
            assert!(hex.ends_with("FF"), "{hex}");
            assert_eq!(hex.len() % 2, 0, "{hex}");
        }
    }
}

use std::{fmt, str::FromStr};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::LampError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);
    };
}

id_newtype!(PresetId);

/// Luminance above which a background gets dark text.
const CONTRAST_TRIGGER: f64 = 0.45;

/// A 24-bit RGB color as exchanged with the lamp backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    r: u8,
    g: u8,
    b: u8,
}

impl HexColor {
    pub const WHITE: HexColor = HexColor::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: HexColor = HexColor::new(0x00, 0x00, 0x00);
    /// Foreground used on light backgrounds.
    pub const DARK_TEXT: HexColor = HexColor::new(0x20, 0x20, 0x20);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// `RRGGBB` without the leading `#`, as the `set` parameter expects.
    pub fn bare(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Relative luminance with a flat 2.2 gamma, in `0.0..=1.0`.
    pub fn luminance(&self) -> f64 {
        let channel = |c: u8| (f64::from(c) / 255.0).powf(2.2);
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    /// Approximate display color of a black body at `kelvin`.
    ///
    /// Curve fit over the CIE 1964 10° blackbody table; channels are clamped,
    /// so temperatures below ~1000K saturate to red.
    pub fn from_kelvin(kelvin: u32) -> Self {
        let temp = f64::from(kelvin) / 100.0;
        let red = if temp <= 66.0 {
            255.0
        } else {
            329.698727446 * (temp - 60.0).powf(-0.1332047592)
        };
        let green = if temp <= 66.0 {
            99.4708025861 * temp.ln() - 161.1195681661
        } else {
            288.1221695283 * (temp - 60.0).powf(-0.0755148492)
        };
        let blue = if temp >= 66.0 {
            255.0
        } else if temp <= 19.0 {
            0.0
        } else {
            138.5177312231 * (temp - 10.0).ln() - 305.0447927307
        };
        let channel = |v: f64| v.clamp(0.0, 255.0).round() as u8;
        Self::new(channel(red), channel(green), channel(blue))
    }

    /// Suggested text color for legibility over this color.
    pub fn contrast(&self) -> HexColor {
        if self.luminance() >= CONTRAST_TRIGGER {
            Self::DARK_TEXT
        } else {
            Self::WHITE
        }
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.bare())
    }
}

impl FromStr for HexColor {
    type Err = LampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LampError::InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| LampError::InvalidColor(s.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for HexColor {
    type Error = LampError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.to_string()
    }
}

/// The lamp's confirmed color as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorState {
    pub hex: HexColor,
    pub rgb_readable: String,
    /// CSS color chosen by the backend for text drawn over `hex`.
    pub contrast: String,
}

/// What a clicked preset button asks the backend for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSelection {
    pub button: PresetId,
    pub query_string: String,
    pub color_query_string: String,
    pub is_sequence: bool,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_css: Option<String>,
}

impl PresetSelection {
    /// Backend query for this preset, skipping empty halves.
    pub fn query(&self) -> String {
        join_query([self.query_string.as_str(), self.color_query_string.as_str()])
    }
}

/// Joins raw query fragments with `&`, dropping empty ones.
pub fn join_query<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|part| part.trim_matches('&'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("&")
}

/// Wall-clock time an alarm fires at, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmTime(NaiveTime);

impl AlarmTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, LampError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| LampError::InvalidTime(format!("{hour}:{minute}")))
    }

    /// Parses raw `HH:MM` input text.
    pub fn parse(raw: &str) -> Result<Self, LampError> {
        NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| LampError::InvalidTime(raw.to_string()))
    }

    /// Converts a sunrise-sunset API time such as `7:12:33 PM`; seconds are dropped.
    pub fn from_twilight(raw: &str) -> Result<Self, LampError> {
        let trimmed = raw.trim();
        let parsed = NaiveTime::parse_from_str(trimmed, "%I:%M:%S %p")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map_err(|_| LampError::InvalidTime(raw.to_string()))?;
        Self::new(parsed.hour(), parsed.minute())
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for AlarmTime {
    type Err = LampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

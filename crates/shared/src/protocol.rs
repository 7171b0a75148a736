use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::{
    domain::{join_query, AlarmTime, ColorState, HexColor, PresetSelection},
    error::LampError,
};

/// One request to the lamp backend's `/` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LampCommand {
    Set { color: HexColor },
    Preset { query: String },
    Alarm(AlarmRequest),
}

impl LampCommand {
    pub fn preset(selection: &PresetSelection) -> Self {
        LampCommand::Preset {
            query: selection.query(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LampCommand::Set { .. } => "set",
            LampCommand::Preset { .. } => "preset",
            LampCommand::Alarm(_) => "alarm",
        }
    }

    /// Query string appended to `/?`.
    pub fn query_string(&self) -> String {
        match self {
            LampCommand::Set { color } => form_urlencoded::Serializer::new(String::new())
                .append_pair("set", &color.bare())
                .finish(),
            LampCommand::Preset { query } => query.clone(),
            LampCommand::Alarm(alarm) => alarm.query_string(),
        }
    }
}

/// One half of the alarm form: the chosen preset option and its time input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSlot {
    pub query_string: String,
    pub color_query_string: String,
    pub is_sequence: bool,
    pub time: AlarmTime,
}

impl AlarmSlot {
    pub fn from_selection(selection: &PresetSelection, time: AlarmTime) -> Self {
        Self {
            query_string: selection.query_string.clone(),
            color_query_string: selection.color_query_string.clone(),
            is_sequence: selection.is_sequence,
            time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRequest {
    pub morning: AlarmSlot,
    pub dawn: AlarmSlot,
}

impl AlarmRequest {
    pub fn query_string(&self) -> String {
        let morning_seq = format!("sequence={}", self.morning.is_sequence);
        let dawn_seq = format!("sequence={}", self.dawn.is_sequence);
        let morning_time = format!("time={}", self.morning.time);
        let dawn_time = format!("time={}", self.dawn.time);
        join_query([
            self.morning.query_string.as_str(),
            self.dawn.query_string.as_str(),
            self.morning.color_query_string.as_str(),
            self.dawn.color_query_string.as_str(),
            morning_seq.as_str(),
            dawn_seq.as_str(),
            morning_time.as_str(),
            dawn_time.as_str(),
        ])
    }
}

/// JSON document returned by the backend after every command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorStateResponse {
    #[serde(default, alias = "current", skip_serializing_if = "Option::is_none")]
    pub current_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rgb_readable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rgb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast: Option<String>,
}

impl ColorStateResponse {
    pub fn new(hex: HexColor, rgb: impl Into<String>, contrast: impl Into<String>) -> Self {
        Self {
            current_hex: Some(hex.to_string()),
            current_rgb_readable: None,
            current_rgb: Some(rgb.into()),
            contrast: Some(contrast.into()),
        }
    }

    /// Validates the consumed fields. The readable form wins over the raw one;
    /// a missing contrast falls back to one computed from the hex value.
    pub fn into_state(self) -> Result<ColorState, LampError> {
        let raw_hex = self
            .current_hex
            .ok_or_else(|| LampError::MalformedResponse("missing current_hex".into()))?;
        let hex: HexColor = raw_hex
            .parse()
            .map_err(|_| LampError::MalformedResponse(format!("bad current_hex {raw_hex:?}")))?;
        let rgb_readable = self
            .current_rgb_readable
            .or(self.current_rgb)
            .unwrap_or_default();
        let contrast = self
            .contrast
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| hex.contrast().to_string());
        Ok(ColorState {
            hex,
            rgb_readable,
            contrast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PresetId;

    fn slot(qs: &str, color: &str, is_sequence: bool, time: &str) -> AlarmSlot {
        AlarmSlot {
            query_string: qs.into(),
            color_query_string: color.into(),
            is_sequence,
            time: AlarmTime::parse(time).unwrap(),
        }
    }

    #[test]
    fn set_query_uses_bare_hex() {
        let cmd = LampCommand::Set {
            color: HexColor::new(0xFF, 0x88, 0x00),
        };
        assert_eq!(cmd.query_string(), "set=FF8800");
    }

    #[test]
    fn preset_query_joins_both_fragments() {
        let selection = PresetSelection {
            button: PresetId(3),
            query_string: "rotate=cyan%2Cyellow&milliseconds=1250".into(),
            color_query_string: "color=cyan".into(),
            is_sequence: true,
            display_name: "Party".into(),
            foreground_css: None,
            background_css: None,
        };
        assert_eq!(
            LampCommand::preset(&selection).query_string(),
            "rotate=cyan%2Cyellow&milliseconds=1250&color=cyan"
        );
    }

    #[test]
    fn alarm_query_orders_components() {
        let alarm = AlarmRequest {
            morning: slot("sunrise=3600", "c=morning", true, "06:30"),
            dawn: slot("sunset=1800", "c=dawn", false, "21:05"),
        };
        assert_eq!(
            alarm.query_string(),
            "sunrise=3600&sunset=1800&c=morning&c=dawn&sequence=true&sequence=false&time=06:30&time=21:05"
        );
    }

    #[test]
    fn alarm_query_skips_empty_components() {
        let alarm = AlarmRequest {
            morning: slot("sunrise=60", "", true, "07:00"),
            dawn: slot("", "", false, "20:00"),
        };
        assert_eq!(
            alarm.query_string(),
            "sunrise=60&sequence=true&sequence=false&time=07:00&time=20:00"
        );
    }

    #[test]
    fn response_prefers_readable_rgb() {
        let response: ColorStateResponse = serde_json::from_str(
            r##"{"current_hex":"#FF0000","current_rgb":"255,0,0","current_rgb_readable":"(255, 0, 0)","contrast":"#FFFFFF"}"##,
        )
        .unwrap();
        let state = response.into_state().unwrap();
        assert_eq!(state.hex, HexColor::new(255, 0, 0));
        assert_eq!(state.rgb_readable, "(255, 0, 0)");
        assert_eq!(state.contrast, "#FFFFFF");
    }

    #[test]
    fn response_accepts_legacy_current_key() {
        let response: ColorStateResponse =
            serde_json::from_str(r##"{"current":"#00FF00","current_rgb":"0,255,0"}"##).unwrap();
        let state = response.into_state().unwrap();
        assert_eq!(state.hex, HexColor::new(0, 255, 0));
        assert_eq!(state.contrast, "#202020");
    }

    #[test]
    fn response_without_hex_is_malformed() {
        let response: ColorStateResponse =
            serde_json::from_str(r##"{"current_rgb":"0,0,0","contrast":"#FFFFFF"}"##).unwrap();
        assert!(matches!(
            response.into_state(),
            Err(LampError::MalformedResponse(_))
        ));
    }
}

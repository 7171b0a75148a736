//! Preset buttons offered by the lamp UI and how each one renders.

use url::form_urlencoded;

use crate::domain::{HexColor, PresetId, PresetSelection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetDisplay {
    None,
    Solid(HexColor),
    Gradient(Vec<HexColor>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub label: String,
    pub display: PresetDisplay,
    pub is_sequence: bool,
    /// Backend parameters; an empty value renders as a bare flag (`off=`).
    pub params: Vec<(String, String)>,
}

impl Preset {
    pub fn solid(label: &str, display: HexColor, params: &[(&str, &str)]) -> Self {
        Self {
            label: label.to_string(),
            display: PresetDisplay::Solid(display),
            is_sequence: false,
            params: owned_params(params),
        }
    }

    pub fn sequence(label: &str, gradient: &[HexColor], params: &[(&str, &str)]) -> Self {
        Self {
            label: label.to_string(),
            display: PresetDisplay::Gradient(gradient.to_vec()),
            is_sequence: true,
            params: owned_params(params),
        }
    }

    /// The label without its leading glyph, e.g. `Party` for `🎉 Party`.
    pub fn name(&self) -> &str {
        self.label
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim_start()
    }

    pub fn query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    pub fn css_background(&self) -> String {
        match &self.display {
            PresetDisplay::None => "transparent".to_string(),
            PresetDisplay::Solid(color) => color.to_string(),
            PresetDisplay::Gradient(colors) => match colors.as_slice() {
                [] => "transparent".to_string(),
                [single] => single.to_string(),
                many => format!(
                    "linear-gradient(-40deg, {})",
                    many.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            },
        }
    }

    pub fn foreground_css(&self) -> Option<String> {
        match &self.display {
            PresetDisplay::None => None,
            PresetDisplay::Solid(color) => Some(color.contrast().to_string()),
            PresetDisplay::Gradient(_) => Some(HexColor::WHITE.to_string()),
        }
    }

    /// What clicking this preset's button yields.
    pub fn selection(&self, button: PresetId) -> PresetSelection {
        let styled = !matches!(self.display, PresetDisplay::None);
        PresetSelection {
            button,
            query_string: self.query_string(),
            color_query_string: String::new(),
            is_sequence: self.is_sequence,
            display_name: self.label.clone(),
            foreground_css: self.foreground_css(),
            background_css: styled.then(|| self.css_background()),
        }
    }
}

fn owned_params(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Debug, Clone)]
pub struct PresetGroup {
    pub name: String,
    pub presets: Vec<Preset>,
}

/// Flat, id-addressable view over the preset groups.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    groups: Vec<PresetGroup>,
}

impl PresetCatalog {
    pub fn new(groups: Vec<PresetGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[PresetGroup] {
        &self.groups
    }

    /// Every preset with its button id, numbered in display order.
    pub fn iter(&self) -> impl Iterator<Item = (PresetId, &Preset)> {
        self.groups
            .iter()
            .flat_map(|group| group.presets.iter())
            .enumerate()
            .map(|(idx, preset)| (PresetId(idx as u32), preset))
    }

    pub fn get(&self, id: PresetId) -> Option<&Preset> {
        self.iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, preset)| preset)
    }

    /// Case-insensitive label lookup. An exact label wins; otherwise the
    /// first preset whose glyph-less name matches.
    pub fn find(&self, label: &str) -> Option<(PresetId, &Preset)> {
        let wanted = label.trim();
        self.iter()
            .find(|(_, preset)| preset.label.eq_ignore_ascii_case(wanted))
            .or_else(|| {
                self.iter()
                    .find(|(_, preset)| preset.name().eq_ignore_ascii_case(wanted))
            })
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::new(default_groups())
    }
}

const fn hex(value: u32) -> HexColor {
    HexColor::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
}

fn kelvins(temps: &[u32]) -> Vec<HexColor> {
    temps.iter().copied().map(HexColor::from_kelvin).collect()
}

/// Sunrise fades run from this temperature up to `DAYLIGHT_K`; sunsets reverse it.
const WARM_K: u32 = 2000;
const DAYLIGHT_K: u32 = 5000;

fn default_groups() -> Vec<PresetGroup> {
    // Swatch temperatures differ from the strip's so the two look alike.
    let whites = [
        ("Candle", 1500, "1000K"),
        ("Tungsten", 3200, "2000K"),
        ("Bulb match", 3900, "ff821c"),
        ("Warm white", 4800, "2600k"),
        ("Strip white", 6000, "3200K"),
        ("Daylight", 6900, "5800K"),
        ("Cool white", 9500, "10500K"),
    ]
    .into_iter()
    .map(|(label, display_k, fade)| {
        Preset::solid(label, HexColor::from_kelvin(display_k), &[("fade", fade)])
    })
    .collect();

    let rising = kelvins(&[WARM_K, DAYLIGHT_K]);
    let falling = kelvins(&[DAYLIGHT_K, WARM_K]);
    let mut transitions = Vec::new();
    for (label, seconds) in [("2hr", "7200"), ("1hr", "3600"), ("30m", "1800"), ("1m", "60")] {
        transitions.push(Preset::sequence(
            &format!("\u{2191} {label}"),
            &rising,
            &[("sunrise", seconds)],
        ));
    }
    for (label, seconds) in [("1m", "60"), ("30m", "1800"), ("1hr", "3600"), ("2hr", "7200")] {
        transitions.push(Preset::sequence(
            &format!("\u{2193} {label}"),
            &falling,
            &[("sunset", seconds)],
        ));
    }

    let colours = [
        ("Red", 0xFF0000, "#FF0000"),
        ("Orange", 0xFF8800, "#FF8800"),
        ("Yellow", 0xFFFF00, "#FFFF00"),
        ("Lime", 0x88FF00, "#88FF00"),
        ("Green", 0x00BB00, "#00FF00"),
        ("Aqua", 0x00FF88, "#00FF88"),
        ("Cyan", 0x00FFFF, "#00FFFF"),
        ("Blue", 0x0088FF, "#0088FF"),
        ("Indigo", 0x0000FF, "#0000FF"),
        ("Purple", 0x8800FF, "#7A00FF"),
        ("Magenta", 0xFF00FF, "#FF00FF"),
        ("Crimson", 0xFF0088, "#FF0088"),
    ]
    .into_iter()
    .map(|(label, display, fade)| Preset::solid(label, hex(display), &[("fade", fade)]))
    .collect();

    let sequences = vec![
        Preset::sequence(
            "\u{1F525} Campfire",
            &kelvins(&[600, 400, 1000, 400]),
            &[
                ("rotate", "700K,500K,1100K,600K,800K,1000K,500K,1200K"),
                ("milliseconds", "1800"),
            ],
        ),
        Preset::sequence(
            "\u{1F41F} Fish tank",
            &[hex(0x00FF88), hex(0x0088FF), hex(0x007ACC), hex(0x00FFFF)],
            &[("rotate", "00FF88,0088FF,007ACC,00FFFF"), ("milliseconds", "2500")],
        ),
        Preset::sequence(
            "\u{1F389} Party",
            &[hex(0x00FFFF), hex(0xFFFF00), hex(0xFF00FF)],
            &[("rotate", "cyan,yellow,magenta"), ("milliseconds", "1250")],
        ),
        Preset::sequence(
            "\u{1F33B} Flamboyant",
            &[hex(0xFFFF00), hex(0xFF00FF)],
            &[("jump", "yellow,magenta"), ("milliseconds", "150")],
        ),
        Preset::sequence(
            "\u{1F6A8} NeeNaw",
            &[hex(0x00FFFF), hex(0x0000FF)],
            &[("jump", "cyan,blue"), ("milliseconds", "100")],
        ),
        Preset::sequence(
            "\u{1F6A8} NeeNaw USA",
            &[hex(0xFF0000), hex(0x0000FF)],
            &[("jump", "red,blue"), ("milliseconds", "100")],
        ),
        Preset::sequence(
            "\u{1F308} Full circle",
            &[
                hex(0xFF0000),
                hex(0xFF8800),
                hex(0xFFFF00),
                hex(0x88FF00),
                hex(0x00FF00),
                hex(0x00FF88),
                hex(0x00FFFF),
                hex(0x0088FF),
                hex(0x0000FF),
                hex(0x8800FF),
                hex(0xFF00FF),
                hex(0xFF0088),
            ],
            &[
                (
                    "rotate",
                    "#FF0000,FF8800,FFFF00,88FF00,00FF00,00FF88,00FFFF,0088FF,0000FF,8800FF,FF00FF,FF0088",
                ),
                ("milliseconds", "500"),
            ],
        ),
    ];

    vec![
        PresetGroup {
            name: "Power".into(),
            presets: vec![Preset::solid("\u{23FB} Off", HexColor::BLACK, &[("off", "")])],
        },
        PresetGroup {
            name: "Whites".into(),
            presets: whites,
        },
        PresetGroup {
            name: "Sunrise / Sunset".into(),
            presets: transitions,
        },
        PresetGroup {
            name: "Colours".into(),
            presets: colours,
        },
        PresetGroup {
            name: "Sequences".into(),
            presets: sequences,
        },
    ]
}

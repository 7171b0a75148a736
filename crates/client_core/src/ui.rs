//! Seams to the widgets the controller drives, and the pure rendering of the
//! status label from a confirmed color state.

use shared::domain::{ColorState, HexColor, PresetId, PresetSelection};

/// The color wheel widget.
pub trait ColorWheel: Send + Sync {
    /// Moves the wheel. Implementations may report the move back through
    /// their change callback; the controller suppresses that echo.
    fn set_color(&self, color: HexColor);
    /// Re-points the saturation ring at its gradient fill after a redraw reset it.
    fn restore_saturation_gradient(&self);
}

/// The current-color label.
pub trait StatusLabel: Send + Sync {
    fn render(&self, view: &LabelView);
}

/// The row of preset buttons.
pub trait PresetBoard: Send + Sync {
    fn clear_selection(&self);
    fn mark_selected(&self, button: PresetId);
    fn mark_error(&self, button: PresetId);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelFill {
    /// Plain background color.
    Solid(String),
    /// Free-form CSS background (gradients allowed), drawn with a text shadow.
    Pattern(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelView {
    pub text: String,
    pub foreground: String,
    pub fill: LabelFill,
}

/// How a confirmed state should be reflected in the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    pub is_preset: bool,
    pub is_sequence: bool,
    pub display_name: Option<String>,
    pub foreground: Option<String>,
    pub background: Option<String>,
}

impl ApplyOptions {
    pub fn wheel() -> Self {
        Self::default()
    }

    /// Preset swatch colors, when present, take over the label's look.
    pub fn preset(selection: &PresetSelection) -> Self {
        let display_name =
            Some(selection.display_name.trim().to_string()).filter(|n| !n.is_empty());
        Self {
            is_preset: true,
            is_sequence: selection.is_sequence,
            display_name,
            foreground: selection.foreground_css.clone(),
            background: selection.background_css.clone(),
        }
    }
}

pub fn label_view(state: &ColorState, options: &ApplyOptions) -> LabelView {
    let text = match (&options.display_name, options.is_sequence) {
        (Some(name), true) => name.clone(),
        (Some(name), false) => format!("{name} {}", state.rgb_readable),
        (None, _) => format!("{} {}", state.hex, state.rgb_readable),
    };
    let foreground = options
        .foreground
        .clone()
        .unwrap_or_else(|| state.contrast.clone());
    let background = options
        .background
        .clone()
        .unwrap_or_else(|| state.hex.to_string());
    let fill = if options.is_sequence {
        LabelFill::Pattern(background)
    } else {
        LabelFill::Solid(background)
    };

    LabelView {
        text,
        foreground,
        fill,
    }
}

//! Headless stand-ins for the browser widgets: the label prints to stdout,
//! everything else is logged.

use std::sync::{Arc, Mutex, PoisonError};

use client_core::ui::{ColorWheel, LabelFill, LabelView, PresetBoard, StatusLabel};
use shared::{
    domain::{HexColor, PresetId},
    preset::PresetCatalog,
};
use tracing::{debug, info, warn};

pub struct TerminalUi {
    catalog: Arc<PresetCatalog>,
    wheel: Mutex<Option<HexColor>>,
}

impl TerminalUi {
    pub fn new(catalog: Arc<PresetCatalog>) -> Self {
        Self {
            catalog,
            wheel: Mutex::new(None),
        }
    }

    pub fn wheel_color(&self) -> Option<HexColor> {
        *self.wheel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn preset_label(&self, button: PresetId) -> String {
        self.catalog
            .get(button)
            .map(|preset| preset.label.clone())
            .unwrap_or_else(|| format!("#{}", button.0))
    }
}

impl ColorWheel for TerminalUi {
    fn set_color(&self, color: HexColor) {
        *self.wheel.lock().unwrap_or_else(PoisonError::into_inner) = Some(color);
        debug!(%color, "wheel moved");
    }

    fn restore_saturation_gradient(&self) {}
}

impl StatusLabel for TerminalUi {
    fn render(&self, view: &LabelView) {
        let background = match &view.fill {
            LabelFill::Solid(css) | LabelFill::Pattern(css) => css,
        };
        println!("{}  (text {} on {})", view.text, view.foreground, background);
    }
}

impl PresetBoard for TerminalUi {
    fn clear_selection(&self) {}

    fn mark_selected(&self, button: PresetId) {
        info!(preset = %self.preset_label(button), "preset selected");
    }

    fn mark_error(&self, button: PresetId) {
        warn!(preset = %self.preset_label(button), "preset failed");
    }
}

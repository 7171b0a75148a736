use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{ColorState, HexColor, PresetId, PresetSelection},
    error::LampError,
    protocol::{AlarmRequest, LampCommand},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod debounce;
pub mod http;
pub mod menu;
pub mod suppression;
pub mod ui;

use debounce::{Debouncer, RequestSequence};
pub use http::HttpLampBackend;
use suppression::Suppression;
use ui::{label_view, ApplyOptions, ColorWheel, PresetBoard, StatusLabel};

pub const WHEEL_DEBOUNCE: Duration = Duration::from_millis(250);
pub const PRESET_DEBOUNCE: Duration = Duration::from_millis(150);
/// Wheel position shown while a sequence runs; a sequence has no single color.
pub const NEUTRAL_WHEEL_COLOR: HexColor = HexColor::WHITE;

#[async_trait]
pub trait LampBackend: Send + Sync {
    async fn send(&self, command: LampCommand) -> Result<ColorState, LampError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncSlot {
    Wheel,
    Preset,
    Alarm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    RequestDispatched {
        slot: SyncSlot,
        seq: u64,
        query: String,
    },
    StateApplied {
        slot: SyncSlot,
        state: ColorState,
    },
    RequestFailed {
        slot: SyncSlot,
        error: LampError,
    },
    StaleResponseDropped {
        slot: SyncSlot,
        seq: u64,
    },
    AlarmScheduled {
        state: ColorState,
    },
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub wheel_debounce: Duration,
    pub preset_debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            wheel_debounce: WHEEL_DEBOUNCE,
            preset_debounce: PRESET_DEBOUNCE,
        }
    }
}

/// The widgets the controller reconciles into.
#[derive(Clone)]
pub struct UiSurface {
    pub wheel: Arc<dyn ColorWheel>,
    pub label: Arc<dyn StatusLabel>,
    pub presets: Arc<dyn PresetBoard>,
}

/// Mediates between the color wheel, the preset buttons and the lamp backend.
///
/// Wheel and preset input each own an independent debounce slot. Within a
/// slot only the newest dispatched request may reconcile the UI; older
/// responses that arrive late are dropped.
pub struct ColorSyncController {
    backend: Arc<dyn LampBackend>,
    ui: UiSurface,
    suppression: Suppression,
    wheel_timer: Debouncer,
    preset_timer: Debouncer,
    wheel_seq: RequestSequence,
    preset_seq: RequestSequence,
    alarm_seq: RequestSequence,
    selected_preset: Mutex<Option<PresetId>>,
    events: broadcast::Sender<SyncEvent>,
}

impl ColorSyncController {
    pub fn new(backend: Arc<dyn LampBackend>, ui: UiSurface) -> Arc<Self> {
        Self::with_config(backend, ui, SyncConfig::default())
    }

    pub fn with_config(
        backend: Arc<dyn LampBackend>,
        ui: UiSurface,
        config: SyncConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            backend,
            ui,
            suppression: Suppression::default(),
            wheel_timer: Debouncer::new(config.wheel_debounce),
            preset_timer: Debouncer::new(config.preset_debounce),
            wheel_seq: RequestSequence::default(),
            preset_seq: RequestSequence::default(),
            alarm_seq: RequestSequence::default(),
            selected_preset: Mutex::new(None),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppression.is_active()
    }

    pub fn selected_preset(&self) -> Option<PresetId> {
        *self
            .selected_preset
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a debounce timer is armed for `slot`.
    pub fn is_pending(&self, slot: SyncSlot) -> bool {
        match slot {
            SyncSlot::Wheel => self.wheel_timer.is_pending(),
            SyncSlot::Preset => self.preset_timer.is_pending(),
            SyncSlot::Alarm => false,
        }
    }

    /// User moved the wheel. Echoes of programmatic wheel writes are ignored.
    pub fn on_wheel_change(self: &Arc<Self>, color: HexColor) {
        if self.suppression.is_active() {
            debug!(%color, "ignoring wheel change raised by a programmatic write");
            return;
        }

        let controller = Arc::clone(self);
        self.wheel_timer.arm(async move {
            controller
                .dispatch(
                    SyncSlot::Wheel,
                    LampCommand::Set { color },
                    ApplyOptions::wheel(),
                    None,
                )
                .await;
        });
    }

    pub fn on_preset_click(self: &Arc<Self>, selection: PresetSelection) {
        {
            let mut selected = self
                .selected_preset
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.ui.presets.clear_selection();
            self.ui.presets.mark_selected(selection.button);
            *selected = Some(selection.button);
        }

        let controller = Arc::clone(self);
        self.preset_timer.arm(async move {
            let command = LampCommand::preset(&selection);
            let options = ApplyOptions::preset(&selection);
            controller
                .dispatch(SyncSlot::Preset, command, options, Some(selection.button))
                .await;
        });
    }

    /// Sends the alarm form right away; the label is left alone.
    pub async fn submit_alarm(&self, request: AlarmRequest) -> Result<ColorState, LampError> {
        let command = LampCommand::Alarm(request);
        let seq = self.alarm_seq.next();
        let query = command.query_string();
        debug!(seq, %query, "dispatching alarm request");
        let _ = self.events.send(SyncEvent::RequestDispatched {
            slot: SyncSlot::Alarm,
            seq,
            query,
        });

        match self.backend.send(command).await {
            Ok(state) => {
                info!(color = %state.hex, "alarm scheduled");
                let _ = self.events.send(SyncEvent::AlarmScheduled {
                    state: state.clone(),
                });
                Ok(state)
            }
            Err(error) => {
                warn!(%error, "alarm request failed");
                let _ = self.events.send(SyncEvent::RequestFailed {
                    slot: SyncSlot::Alarm,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Reflects a confirmed lamp state in the label and, for presets, the wheel.
    pub fn apply_server_state(&self, state: &ColorState, options: &ApplyOptions) {
        self.ui.label.render(&label_view(state, options));

        if !options.is_sequence {
            self.ui.wheel.restore_saturation_gradient();
        }

        if options.is_preset {
            let target = if options.is_sequence {
                NEUTRAL_WHEEL_COLOR
            } else {
                state.hex
            };
            sync_wheel(self.ui.wheel.as_ref(), &self.suppression, target);
        }
    }

    async fn dispatch(
        &self,
        slot: SyncSlot,
        command: LampCommand,
        options: ApplyOptions,
        origin: Option<PresetId>,
    ) {
        let sequence = self.sequence(slot);
        let seq = sequence.next();
        let query = command.query_string();
        debug!(?slot, seq, %query, "dispatching lamp request");
        let _ = self.events.send(SyncEvent::RequestDispatched { slot, seq, query });

        let outcome = self.backend.send(command).await;
        if !sequence.is_latest(seq) {
            debug!(
                ?slot,
                seq,
                ok = outcome.is_ok(),
                "dropping response superseded by a newer request"
            );
            let _ = self.events.send(SyncEvent::StaleResponseDropped { slot, seq });
            return;
        }

        match outcome {
            Ok(state) => {
                self.apply_server_state(&state, &options);
                let _ = self.events.send(SyncEvent::StateApplied { slot, state });
            }
            Err(error) => {
                match origin {
                    Some(button) => {
                        warn!(?button, %error, "preset request failed");
                        self.ui.presets.mark_error(button);
                    }
                    None => warn!(%error, "wheel request failed; UI left unchanged"),
                }
                let _ = self.events.send(SyncEvent::RequestFailed { slot, error });
            }
        }
    }

    fn sequence(&self, slot: SyncSlot) -> &RequestSequence {
        match slot {
            SyncSlot::Wheel => &self.wheel_seq,
            SyncSlot::Preset => &self.preset_seq,
            SyncSlot::Alarm => &self.alarm_seq,
        }
    }
}

/// Moves the wheel without letting its change callback reach the lamp.
fn sync_wheel(wheel: &dyn ColorWheel, suppression: &Suppression, color: HexColor) {
    let _guard = suppression.engage();
    wheel.set_color(color);
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use super::*;
use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex as StdMutex, OnceLock, Weak,
    },
};

use shared::{domain::AlarmTime, protocol::AlarmSlot};
use ui::{LabelFill, LabelView};

type Responder = Box<dyn Fn(&LampCommand) -> Result<ColorState, LampError> + Send + Sync>;

struct FakeBackend {
    requests: StdMutex<Vec<String>>,
    delays: StdMutex<VecDeque<Duration>>,
    respond: Responder,
}

impl FakeBackend {
    fn new(respond: Responder) -> Self {
        Self {
            requests: StdMutex::new(Vec::new()),
            delays: StdMutex::new(VecDeque::new()),
            respond,
        }
    }

    /// Answers every command with the lamp showing solid red.
    fn red() -> Self {
        Self::new(Box::new(|_| Ok(red_state())))
    }

    /// Answers `set` with the requested color; presets with red.
    fn echo() -> Self {
        Self::new(Box::new(|command| match command {
            LampCommand::Set { color } => {
                let (r, g, b) = color.rgb();
                Ok(ColorState {
                    hex: *color,
                    rgb_readable: format!("{r},{g},{b}"),
                    contrast: color.contrast().to_string(),
                })
            }
            _ => Ok(red_state()),
        }))
    }

    fn failing() -> Self {
        Self::new(Box::new(|_| {
            Err(LampError::Transport("connection refused".into()))
        }))
    }

    fn with_delays(self, delays: &[u64]) -> Self {
        *self.delays.lock().unwrap() = delays
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect();
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LampBackend for FakeBackend {
    async fn send(&self, command: LampCommand) -> Result<ColorState, LampError> {
        self.requests.lock().unwrap().push(command.query_string());
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(&command)
    }
}

#[derive(Default)]
struct FakeWheel {
    colors: StdMutex<Vec<HexColor>>,
    suppressed_during_write: StdMutex<Vec<bool>>,
    gradient_restores: AtomicUsize,
    controller: OnceLock<Weak<ColorSyncController>>,
}

impl ColorWheel for FakeWheel {
    fn set_color(&self, color: HexColor) {
        self.colors.lock().unwrap().push(color);
        if let Some(controller) = self.controller.get().and_then(Weak::upgrade) {
            self.suppressed_during_write
                .lock()
                .unwrap()
                .push(controller.is_suppressed());
            // The real widget reports every move, programmatic or not.
            controller.on_wheel_change(color);
        }
    }

    fn restore_saturation_gradient(&self) {
        self.gradient_restores.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeLabel {
    views: StdMutex<Vec<LabelView>>,
    suppressed_at_render: StdMutex<Vec<bool>>,
    controller: OnceLock<Weak<ColorSyncController>>,
}

impl FakeLabel {
    fn last(&self) -> Option<LabelView> {
        self.views.lock().unwrap().last().cloned()
    }
}

impl StatusLabel for FakeLabel {
    fn render(&self, view: &LabelView) {
        if let Some(controller) = self.controller.get().and_then(Weak::upgrade) {
            self.suppressed_at_render
                .lock()
                .unwrap()
                .push(controller.is_suppressed());
        }
        self.views.lock().unwrap().push(view.clone());
    }
}

#[derive(Default)]
struct FakeBoard {
    selected: StdMutex<HashSet<PresetId>>,
    errors: StdMutex<HashSet<PresetId>>,
}

impl FakeBoard {
    fn selected(&self) -> HashSet<PresetId> {
        self.selected.lock().unwrap().clone()
    }

    fn errors(&self) -> HashSet<PresetId> {
        self.errors.lock().unwrap().clone()
    }
}

impl PresetBoard for FakeBoard {
    fn clear_selection(&self) {
        self.selected.lock().unwrap().clear();
    }

    fn mark_selected(&self, button: PresetId) {
        self.selected.lock().unwrap().insert(button);
    }

    fn mark_error(&self, button: PresetId) {
        self.errors.lock().unwrap().insert(button);
    }
}

struct Harness {
    controller: Arc<ColorSyncController>,
    backend: Arc<FakeBackend>,
    wheel: Arc<FakeWheel>,
    label: Arc<FakeLabel>,
    board: Arc<FakeBoard>,
}

fn harness(backend: FakeBackend) -> Harness {
    let backend = Arc::new(backend);
    let wheel = Arc::new(FakeWheel::default());
    let label = Arc::new(FakeLabel::default());
    let board = Arc::new(FakeBoard::default());
    let controller = ColorSyncController::new(
        backend.clone(),
        UiSurface {
            wheel: wheel.clone(),
            label: label.clone(),
            presets: board.clone(),
        },
    );
    let _ = wheel.controller.set(Arc::downgrade(&controller));
    let _ = label.controller.set(Arc::downgrade(&controller));

    Harness {
        controller,
        backend,
        wheel,
        label,
        board,
    }
}

fn red_state() -> ColorState {
    ColorState {
        hex: HexColor::new(0xFF, 0, 0),
        rgb_readable: "255,0,0".into(),
        contrast: "#FFFFFF".into(),
    }
}

fn selection(id: u32, name: &str, is_sequence: bool) -> PresetSelection {
    PresetSelection {
        button: PresetId(id),
        query_string: format!("preset={id}"),
        color_query_string: String::new(),
        is_sequence,
        display_name: name.into(),
        foreground_css: None,
        background_css: None,
    }
}

fn drain(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn wheel_burst_sends_one_request_with_the_last_color() {
    let h = harness(FakeBackend::echo());
    let burst = [0xFF0000, 0xFF8800, 0x00FF00, 0x00FFFF, 0x0000FF];

    for value in burst {
        h.controller.on_wheel_change(HexColor::new(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ));
        sleep_ms(20).await;
    }
    assert!(h.backend.requests().is_empty());
    assert!(h.controller.is_pending(SyncSlot::Wheel));

    sleep_ms(400).await;
    assert_eq!(h.backend.requests(), vec!["set=0000FF".to_string()]);
    assert!(!h.controller.is_pending(SyncSlot::Wheel));
}

#[tokio::test(start_paused = true)]
async fn wheel_debounce_fires_on_the_trailing_edge() {
    let h = harness(FakeBackend::echo());

    h.controller.on_wheel_change(HexColor::new(1, 2, 3));
    sleep_ms(200).await;
    h.controller.on_wheel_change(HexColor::new(4, 5, 6));
    sleep_ms(100).await;
    assert!(
        h.backend.requests().is_empty(),
        "a leading-edge debounce would already have fired"
    );

    sleep_ms(200).await;
    assert_eq!(h.backend.requests(), vec!["set=040506".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn separate_wheel_bursts_send_separate_requests() {
    let h = harness(FakeBackend::echo());

    h.controller.on_wheel_change(HexColor::new(0x11, 0x11, 0x11));
    sleep_ms(400).await;
    h.controller.on_wheel_change(HexColor::new(0x22, 0x22, 0x22));
    sleep_ms(400).await;

    assert_eq!(
        h.backend.requests(),
        vec!["set=111111".to_string(), "set=222222".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn wheel_success_updates_label_but_not_the_wheel() {
    let h = harness(FakeBackend::echo());
    let mut events = h.controller.subscribe();

    h.controller.on_wheel_change(HexColor::new(0, 0, 0xFF));
    sleep_ms(300).await;

    let view = h.label.last().expect("label rendered");
    assert_eq!(view.text, "#0000FF 0,0,255");
    assert_eq!(view.foreground, "#FFFFFF");
    assert_eq!(view.fill, LabelFill::Solid("#0000FF".into()));
    assert!(h.wheel.colors.lock().unwrap().is_empty());
    assert_eq!(h.wheel.gradient_restores.load(Ordering::SeqCst), 1);

    let events = drain(&mut events);
    assert!(matches!(
        events.as_slice(),
        [
            SyncEvent::RequestDispatched { slot: SyncSlot::Wheel, seq: 1, .. },
            SyncEvent::StateApplied { slot: SyncSlot::Wheel, .. }
        ]
    ));
}

#[tokio::test(start_paused = true)]
async fn failed_wheel_request_leaves_ui_unchanged() {
    let h = harness(FakeBackend::failing());
    let mut events = h.controller.subscribe();

    h.controller.on_wheel_change(HexColor::new(0x12, 0x34, 0x56));
    sleep_ms(400).await;

    assert_eq!(h.backend.requests(), vec!["set=123456".to_string()]);
    assert!(h.label.views.lock().unwrap().is_empty());
    assert!(h.wheel.colors.lock().unwrap().is_empty());
    assert_eq!(h.wheel.gradient_restores.load(Ordering::SeqCst), 0);
    assert!(h.board.errors().is_empty());
    assert!(!h.controller.is_suppressed());

    let events = drain(&mut events);
    assert!(events.iter().any(|event| matches!(
        event,
        SyncEvent::RequestFailed {
            slot: SyncSlot::Wheel,
            error: LampError::Transport(_)
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn named_preset_renders_label_and_moves_wheel() {
    let h = harness(FakeBackend::red());

    h.controller.on_preset_click(selection(4, "Sunset", false));
    sleep_ms(200).await;

    let view = h.label.last().expect("label rendered");
    assert_eq!(view.text, "Sunset 255,0,0");
    assert_eq!(view.foreground, "#FFFFFF");
    assert_eq!(view.fill, LabelFill::Solid("#FF0000".into()));
    assert_eq!(
        *h.wheel.colors.lock().unwrap(),
        vec![HexColor::new(0xFF, 0, 0)]
    );
    assert_eq!(h.wheel.gradient_restores.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn sequence_preset_parks_wheel_on_neutral_white() {
    let h = harness(FakeBackend::red());

    h.controller.on_preset_click(selection(9, "Sunset", true));
    sleep_ms(200).await;

    let view = h.label.last().expect("label rendered");
    assert_eq!(view.text, "Sunset");
    assert_eq!(view.fill, LabelFill::Pattern("#FF0000".into()));
    assert_eq!(*h.wheel.colors.lock().unwrap(), vec![NEUTRAL_WHEEL_COLOR]);
    assert_eq!(h.wheel.gradient_restores.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn preset_swatch_colors_override_server_contrast() {
    let h = harness(FakeBackend::red());
    let mut party = selection(2, "Party", true);
    party.foreground_css = Some("#FFFFFF".into());
    party.background_css = Some("linear-gradient(-40deg, #00FFFF, #FF00FF)".into());
    let mut lime = selection(3, "Lime", false);
    lime.foreground_css = Some("#202020".into());
    lime.background_css = Some("#88FF00".into());

    h.controller.on_preset_click(party);
    sleep_ms(200).await;
    assert_eq!(
        h.label.last().unwrap().fill,
        LabelFill::Pattern("linear-gradient(-40deg, #00FFFF, #FF00FF)".into())
    );

    h.controller.on_preset_click(lime);
    sleep_ms(200).await;
    let view = h.label.last().unwrap();
    assert_eq!(view.foreground, "#202020");
    assert_eq!(view.fill, LabelFill::Solid("#88FF00".into()));
}

#[tokio::test(start_paused = true)]
async fn programmatic_wheel_write_is_not_sent_back() {
    let h = harness(FakeBackend::red());

    h.controller.on_preset_click(selection(1, "Red", false));
    sleep_ms(1000).await;

    assert_eq!(h.backend.requests(), vec!["preset=1".to_string()]);
    assert_eq!(*h.wheel.suppressed_during_write.lock().unwrap(), vec![true]);
    assert_eq!(*h.label.suppressed_at_render.lock().unwrap(), vec![false]);
    assert!(!h.controller.is_suppressed());
    assert!(!h.controller.is_pending(SyncSlot::Wheel));
}

#[tokio::test(start_paused = true)]
async fn user_wheel_input_still_works_after_a_preset_sync() {
    let h = harness(FakeBackend::echo());

    h.controller.on_preset_click(selection(1, "Red", false));
    sleep_ms(200).await;
    h.controller.on_wheel_change(HexColor::new(0, 0xFF, 0));
    sleep_ms(300).await;

    assert_eq!(
        h.backend.requests(),
        vec!["preset=1".to_string(), "set=00FF00".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_preset_marks_error_and_keeps_selection() {
    let h = harness(FakeBackend::failing());

    h.controller.on_preset_click(selection(7, "Purple", false));
    sleep_ms(200).await;

    assert_eq!(h.board.errors(), HashSet::from([PresetId(7)]));
    assert_eq!(h.board.selected(), HashSet::from([PresetId(7)]));
    assert_eq!(h.controller.selected_preset(), Some(PresetId(7)));
    assert!(h.label.views.lock().unwrap().is_empty());
    assert!(h.wheel.colors.lock().unwrap().is_empty());
    assert!(!h.controller.is_suppressed());
}

#[tokio::test(start_paused = true)]
async fn rapid_clicks_collapse_to_the_second_preset() {
    let h = harness(FakeBackend::red());

    h.controller.on_preset_click(selection(1, "First", false));
    sleep_ms(50).await;
    h.controller.on_preset_click(selection(2, "Second", false));
    sleep_ms(400).await;

    assert_eq!(h.backend.requests(), vec!["preset=2".to_string()]);
    assert_eq!(h.board.selected(), HashSet::from([PresetId(2)]));
    assert_eq!(h.label.last().unwrap().text, "Second 255,0,0");
}

#[tokio::test(start_paused = true)]
async fn exactly_one_preset_is_selected_after_any_clicks() {
    let h = harness(FakeBackend::red());
    let clicks = [(1, 0), (2, 30), (3, 300), (2, 10), (1, 500), (4, 0)];

    for (id, pause) in clicks {
        h.controller.on_preset_click(selection(id, "P", false));
        assert_eq!(h.board.selected(), HashSet::from([PresetId(id)]));
        sleep_ms(pause).await;
    }
    sleep_ms(300).await;

    assert_eq!(h.board.selected(), HashSet::from([PresetId(4)]));
    assert_eq!(h.controller.selected_preset(), Some(PresetId(4)));
}

#[tokio::test(start_paused = true)]
async fn stale_preset_response_is_dropped() {
    let backend = FakeBackend::new(Box::new(|command| {
        let name = command.query_string();
        Ok(ColorState {
            hex: if name == "preset=1" {
                HexColor::new(0xFF, 0, 0)
            } else {
                HexColor::new(0, 0, 0xFF)
            },
            rgb_readable: name,
            contrast: "#FFFFFF".into(),
        })
    }))
    .with_delays(&[500, 10]);
    let h = harness(backend);
    let mut events = h.controller.subscribe();

    h.controller.on_preset_click(selection(1, "Slow", false));
    sleep_ms(200).await;
    h.controller.on_preset_click(selection(2, "Fast", false));
    sleep_ms(1000).await;

    assert_eq!(
        h.backend.requests(),
        vec!["preset=1".to_string(), "preset=2".to_string()]
    );
    let views = h.label.views.lock().unwrap().clone();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].text, "Fast preset=2");
    assert_eq!(
        *h.wheel.colors.lock().unwrap(),
        vec![HexColor::new(0, 0, 0xFF)]
    );

    let events = drain(&mut events);
    assert!(events.contains(&SyncEvent::StaleResponseDropped {
        slot: SyncSlot::Preset,
        seq: 1
    }));
}

#[tokio::test(start_paused = true)]
async fn superseded_preset_failure_leaves_no_error_marker() {
    let backend = FakeBackend::new(Box::new(|command| {
        if command.query_string() == "preset=1" {
            Err(LampError::Status(503))
        } else {
            Ok(red_state())
        }
    }))
    .with_delays(&[500, 10]);
    let h = harness(backend);
    let mut events = h.controller.subscribe();

    h.controller.on_preset_click(selection(1, "Slow", false));
    sleep_ms(200).await;
    h.controller.on_preset_click(selection(2, "Fast", false));
    sleep_ms(1000).await;

    assert!(h.board.errors().is_empty());
    assert_eq!(h.board.selected(), HashSet::from([PresetId(2)]));
    assert_eq!(h.label.last().unwrap().text, "Fast 255,0,0");

    let events = drain(&mut events);
    assert!(events.contains(&SyncEvent::StaleResponseDropped {
        slot: SyncSlot::Preset,
        seq: 1
    }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, SyncEvent::RequestFailed { .. })));
}

#[tokio::test(start_paused = true)]
async fn wheel_and_preset_slots_are_independent() {
    let h = harness(FakeBackend::echo());

    h.controller.on_wheel_change(HexColor::new(0, 0, 0x10));
    h.controller.on_preset_click(selection(5, "Blue", false));
    sleep_ms(400).await;

    let mut requests = h.backend.requests();
    requests.sort();
    assert_eq!(requests, vec!["preset=5".to_string(), "set=000010".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn alarm_submission_sends_composed_query_without_touching_label() {
    let h = harness(FakeBackend::red());
    let mut events = h.controller.subscribe();
    let request = AlarmRequest {
        morning: AlarmSlot {
            query_string: "sunrise=3600".into(),
            color_query_string: String::new(),
            is_sequence: true,
            time: AlarmTime::parse("06:30").unwrap(),
        },
        dawn: AlarmSlot {
            query_string: "sunset=1800".into(),
            color_query_string: String::new(),
            is_sequence: true,
            time: AlarmTime::parse("21:00").unwrap(),
        },
    };

    let state = h.controller.submit_alarm(request).await.expect("alarm accepted");

    assert_eq!(state, red_state());
    assert_eq!(
        h.backend.requests(),
        vec![
            "sunrise=3600&sunset=1800&sequence=true&sequence=true&time=06:30&time=21:00".to_string()
        ]
    );
    assert!(h.label.views.lock().unwrap().is_empty());
    assert!(drain(&mut events)
        .iter()
        .any(|event| matches!(event, SyncEvent::AlarmScheduled { .. })));
}

#[tokio::test(start_paused = true)]
async fn failed_alarm_is_reported_to_the_caller() {
    let h = harness(FakeBackend::failing());
    let request = AlarmRequest {
        morning: AlarmSlot {
            query_string: "sunrise=60".into(),
            color_query_string: String::new(),
            is_sequence: true,
            time: AlarmTime::parse("07:00").unwrap(),
        },
        dawn: AlarmSlot {
            query_string: "sunset=60".into(),
            color_query_string: String::new(),
            is_sequence: true,
            time: AlarmTime::parse("20:00").unwrap(),
        },
    };

    let err = h.controller.submit_alarm(request).await.unwrap_err();
    assert_eq!(err, LampError::Transport("connection refused".into()));
    assert!(h.board.errors().is_empty());
}

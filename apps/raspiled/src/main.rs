mod config;
mod terminal;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ColorSyncController, HttpLampBackend, SyncEvent, SyncSlot, UiSurface};
use shared::{
    domain::{AlarmTime, ColorState, HexColor},
    preset::{PresetCatalog, PresetDisplay},
    protocol::{AlarmRequest, AlarmSlot},
};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use terminal::TerminalUi;

#[derive(Parser, Debug)]
#[command(name = "raspiled", about = "Drive a Raspiled lamp from the terminal")]
struct Args {
    /// Lamp server, e.g. http://192.168.0.33:9090/
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file; defaults to ./raspiled.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Move the wheel through one or more colors; only the last is sent.
    Set {
        #[arg(required = true)]
        colors: Vec<String>,
    },
    /// Click a preset button by label.
    Preset { name: String },
    /// List the preset buttons.
    Presets,
    /// Schedule the morning and evening alarms.
    Alarm {
        morning: String,
        morning_time: String,
        dawn: String,
        dawn_time: String,
        /// Times are sunrise/sunset strings such as "7:12:33 PM".
        #[arg(long)]
        twilight: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }

    let catalog = Arc::new(PresetCatalog::default());
    if let Command::Presets = args.command {
        print_catalog(&catalog);
        return Ok(());
    }

    let backend = HttpLampBackend::with_timeout(&settings.server_url, settings.request_timeout())
        .context("failed to build lamp backend")?;
    let ui = Arc::new(TerminalUi::new(catalog.clone()));
    let controller = ColorSyncController::with_config(
        Arc::new(backend),
        UiSurface {
            wheel: ui.clone(),
            label: ui.clone(),
            presets: ui.clone(),
        },
        settings.sync_config(),
    );
    let deadline = settings.request_timeout()
        + settings.sync_config().wheel_debounce.max(settings.sync_config().preset_debounce)
        + Duration::from_secs(1);

    match args.command {
        Command::Set { colors } => {
            let colors = colors
                .iter()
                .map(|raw| raw.parse::<HexColor>())
                .collect::<Result<Vec<_>, _>>()?;
            let events = controller.subscribe();
            for color in colors {
                controller.on_wheel_change(color);
            }
            wait_for_outcome(events, SyncSlot::Wheel, deadline).await?;
        }
        Command::Preset { name } => {
            let (button, preset) = catalog
                .find(&name)
                .ok_or_else(|| anyhow!("no preset named {name:?}"))?;
            let events = controller.subscribe();
            controller.on_preset_click(preset.selection(button));
            let state = wait_for_outcome(events, SyncSlot::Preset, deadline).await?;
            if let Some(color) = ui.wheel_color() {
                info!(wheel = %color, lamp = %state.hex, "wheel synced to preset");
            }
        }
        Command::Alarm {
            morning,
            morning_time,
            dawn,
            dawn_time,
            twilight,
        } => {
            let request = AlarmRequest {
                morning: alarm_slot(&catalog, &morning, &morning_time, twilight)?,
                dawn: alarm_slot(&catalog, &dawn, &dawn_time, twilight)?,
            };
            let state = controller
                .submit_alarm(request)
                .await
                .context("alarm request failed")?;
            println!("Alarm set; lamp currently {} {}", state.hex, state.rgb_readable);
        }
        Command::Presets => {}
    }

    Ok(())
}

fn alarm_slot(
    catalog: &PresetCatalog,
    name: &str,
    time: &str,
    twilight: bool,
) -> Result<AlarmSlot> {
    let (button, preset) = catalog
        .find(name)
        .ok_or_else(|| anyhow!("no preset named {name:?}"))?;
    let time = if twilight {
        AlarmTime::from_twilight(time)?
    } else {
        AlarmTime::parse(time)?
    };
    Ok(AlarmSlot::from_selection(&preset.selection(button), time))
}

async fn wait_for_outcome(
    mut events: broadcast::Receiver<SyncEvent>,
    slot: SyncSlot,
    deadline: Duration,
) -> Result<ColorState> {
    tokio::time::timeout(deadline, async {
        loop {
            match events.recv().await {
                Ok(SyncEvent::StateApplied { slot: s, state }) if s == slot => return Ok(state),
                Ok(SyncEvent::RequestFailed { slot: s, error }) if s == slot => {
                    return Err(anyhow::Error::new(error).context("lamp request failed"))
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => bail!("controller stopped"),
            }
        }
    })
    .await
    .map_err(|_| anyhow!("no answer from the lamp within {deadline:?}"))?
}

fn print_catalog(catalog: &PresetCatalog) {
    let mut ids = catalog.iter();
    for group in catalog.groups() {
        println!("{}", group.name);
        for (id, preset) in ids.by_ref().take(group.presets.len()) {
            let look = match &preset.display {
                PresetDisplay::None => String::new(),
                PresetDisplay::Solid(color) => color.to_string(),
                PresetDisplay::Gradient(_) => "sequence".to_string(),
            };
            println!(
                "  [{:>2}] {:<16} {:<10} {}",
                id.0,
                preset.label,
                look,
                preset.query_string()
            );
        }
    }
}

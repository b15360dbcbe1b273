mod action;
mod app;
mod auth;
mod bitbucket;
mod cache;
mod config;
mod error;
mod event;
mod executor;
mod fetch;
mod filter;
mod launcher;
mod picker;
mod poll;
mod provider;
mod state;
mod tui;
mod types;
mod ui;
mod view;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::{Action, Command};
use crate::bitbucket::Bitbucket;
use crate::config::{Config, ProfileChoice, ProfileConfig};
use crate::event::Event;
use crate::executor::Executor;
use crate::picker::{Picked, ProfilePicker};
use crate::state::{AppState, Settings};
use crate::tui::{EventHandler, Tui};

const RENDER_RATE: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "bbtui", about = "Browse Bitbucket repositories, pull requests and pipelines")]
struct Cli {
    /// Profile from the config file to use
    #[arg(short, long)]
    profile: Option<String>,

    /// Override the profile's workspace
    #[arg(short, long)]
    workspace: Option<String>,

    /// Seconds between refreshes of a running pipeline
    #[arg(long)]
    poll_interval: Option<u64>,
}

/// Log to a file under the cache dir; the terminal belongs to the UI.
fn init_logging() -> Option<WorkerGuard> {
    let dir = dirs::cache_dir()?.join("bbtui");
    std::fs::create_dir_all(&dir).ok()?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir,
        "bbtui.log",
    ));
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _log_guard = init_logging();

    tui::install_panic_hook();

    let config = Config::load();
    let profile = match config.select_profile(cli.profile.as_deref())? {
        ProfileChoice::Chosen(profile) => profile,
        ProfileChoice::Ask(profiles) => match pick_profile(profiles).await? {
            Some(profile) => profile,
            None => {
                println!("Cancelled");
                return Ok(());
            }
        },
    };
    let token = auth::resolve_token(profile)?;
    let workspace = cli
        .workspace
        .clone()
        .unwrap_or_else(|| profile.workspace.clone());
    let poll_interval = cli
        .poll_interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.poll_interval());

    info!(profile = %profile.name, workspace = %workspace, "starting");
    let bitbucket = Bitbucket::new(workspace.clone(), token, config.timeout())?;

    let settings = Settings {
        workspace,
        poll_interval,
    };
    let result = run(Arc::new(bitbucket), settings).await;

    tui::restore()?;

    result
}

/// Ask for a profile in a short terminal session of its own, so token
/// errors after it still print on a normal screen.
async fn pick_profile(
    profiles: &[ProfileConfig],
) -> Result<Option<&ProfileConfig>, Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;
    let mut picker = ProfilePicker::new(profiles);
    let picked = picker_loop(&mut terminal, &mut picker).await;
    tui::restore()?;

    Ok(match picked? {
        Picked::Profile(index) => profiles.get(index),
        Picked::Cancelled => None,
    })
}

async fn picker_loop(terminal: &mut Tui, picker: &mut ProfilePicker) -> std::io::Result<Picked> {
    let mut events = EventHandler::new(RENDER_RATE);
    loop {
        match events.next().await {
            Some(Event::Render) => {
                terminal.draw(|frame| ui::render_picker(frame, picker))?;
            }
            Some(Event::Key(key)) => {
                if let Some(picked) = picker.handle_key(key) {
                    return Ok(picked);
                }
            }
            Some(Event::Resize(..)) => {}
            None => return Ok(Picked::Cancelled),
        }
    }
}

async fn run(
    bitbucket: Arc<Bitbucket>,
    settings: Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let executor = Executor::new(bitbucket, action_tx.clone());

    let mut state = AppState::new(settings);
    let size = terminal.size()?;
    state.viewport = (size.width, size.height);

    let mut events = EventHandler::new(RENDER_RATE);
    action_tx.send(Action::Init)?;

    loop {
        let action = tokio::select! {
            Some(event) = events.next() => match event {
                Event::Render => {
                    terminal.draw(|frame| ui::render(frame, &state))?;
                    continue;
                }
                other => match other.into_action() {
                    Some(action) => action,
                    None => continue,
                },
            },
            Some(action) = action_rx.recv() => action,
            else => return Ok(()),
        };

        for command in app::update(&mut state, action) {
            match executor.dispatch(command) {
                None => {}
                Some(Command::Quit) => return Ok(()),
                Some(Command::OpenInViewer { text, title }) => {
                    // the viewer needs stdin, so stop reading keys until it exits.
                    // action_rx is not pumped meanwhile on purpose: results of
                    // in-flight jobs queue there and are applied once the loop resumes.
                    drop(events);
                    let result = open_viewer(&mut terminal, &text, &title)?;
                    events = EventHandler::new(RENDER_RATE);
                    action_tx.send(Action::ViewerClosed(result))?;
                }
                Some(other) => warn!(?other, "unhandled command"),
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}

fn open_viewer(
    terminal: &mut Tui,
    text: &str,
    title: &str,
) -> std::io::Result<error::Result<()>> {
    tui::suspend(terminal, || launcher::open_in_viewer(text, title))
}

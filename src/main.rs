use crossterm::{
    cursor::Show,
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    env,
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tokio::{sync::mpsc, time::MissedTickBehavior};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod branch;
mod commit;
mod config;
mod diff;
mod dispatch;
mod error;
mod events;
mod git;
mod git_ops;
mod reconcile;
mod search;
mod text;
mod theme;
mod ui;
mod view;
mod viewport;

use app::{App, Command};
use config::Config;
use dispatch::Dispatcher;
use events::AppEvent;
use git_ops::{GitCli, Repository};
use theme::Palette;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LOG_PATH_VAR: &str = "GITBOARD_LOG";

/// Installs a file logger when `GITBOARD_LOG` is set. The terminal belongs to
/// the dashboard, so nothing is ever logged to it.
fn init_logging() -> io::Result<()> {
    let Some(path) = env::var_os(LOG_PATH_VAR) else {
        return Ok(());
    };
    let file = File::options().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init only happens in tests; keep the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .try_init();
    Ok(())
}

/// Best-effort undo of raw mode and the alternate screen when setup fails
/// part way through.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let (config, config_problem) = Config::load();

    let arg = env::args().nth(1);
    if matches!(arg.as_deref(), Some("--version" | "-V")) {
        println!("gitboard {}", VERSION);
        return Ok(());
    }

    if let Err(e) = init_logging() {
        eprintln!("gitboard: cannot open log file: {}", e);
    }
    if let Some(problem) = config_problem {
        tracing::warn!(error = %problem, "config ignored");
        eprintln!("gitboard: {}; using defaults", problem);
    }

    let start_path = arg
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let repo = match GitCli::discover(&start_path) {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("gitboard: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(root = %repo.root().display(), version = VERSION, "starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        restore_terminal();
        return Err(e);
    }
    let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => terminal,
        Err(e) => {
            restore_terminal();
            return Err(e);
        }
    };

    let result = run(&mut terminal, Arc::new(repo), config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "event loop failed");
    }
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    repo: Arc<dyn Repository>,
    config: Config,
) -> io::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let dispatcher = Dispatcher::new(repo, tx.clone());
    let palette = Palette::default();

    let mut tick = tokio::time::interval(config.tick());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut event_stream = EventStream::new();
    let mut app = App::new(config);

    let size = terminal.size()?;
    let mut commands = app.update(AppEvent::Resize {
        width: size.width,
        height: size.height,
    });
    commands.extend(app.init());

    loop {
        for command in commands.drain(..) {
            match command {
                Command::Dispatch { id, op } => dispatcher.dispatch(id, op),
                Command::ClearStatusAfter { id, after } => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(AppEvent::ClearStatus(id));
                    });
                }
                Command::Quit => app.should_quit = true,
            }
        }
        if app.should_quit {
            break;
        }

        terminal.draw(|f| ui::draw(f, &view::project(&app), &palette))?;

        let event = tokio::select! {
            Some(event) = rx.recv() => event,
            maybe_event = event_stream.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Some(Ok(Event::Resize(width, height))) => AppEvent::Resize { width, height },
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e),
                None => break,
            },
            _ = tick.tick() => AppEvent::Tick,
        };
        commands = app.update(event);
    }

    tracing::info!("quit");
    Ok(())
}

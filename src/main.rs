use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use envpaper::data::duration::parse_duration;
use envpaper::events;
use envpaper::ui;
use envpaper::{
    App, DataSource, FileSource, Persister, Settings, SnapshotFile, StreamSource, SystemctlProbe,
};

/// How often the loop wakes to drain sources and check the render tick.
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "envpaper")]
#[command(about = "Classify bus telemetry and compose an e-paper status display")]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long, default_value = "envpaper.toml")]
    config: PathBuf,

    /// Connect to a TCP bridge emitting envelopes (host:port)
    #[arg(long, conflicts_with = "replay")]
    connect: Option<String>,

    /// Replay a recorded envelope file
    #[arg(long, conflicts_with = "connect")]
    replay: Option<PathBuf>,

    /// Run without the terminal preview
    #[arg(long)]
    headless: bool,

    /// Write each composed screen to this JSON file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Render interval override (e.g., "300", "5m", "90s")
    #[arg(short, long)]
    interval: Option<String>,

    /// Log file for preview mode (default: <base_directory>/envpaper.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(Some(args.config.as_path()))
        .with_context(|| format!("loading settings from {}", args.config.display()))?;

    if args.headless {
        init_logging(None)?;
    } else {
        let log_file = args
            .log_file
            .clone()
            .unwrap_or_else(|| settings.base_directory.join("envpaper.log"));
        init_logging(Some(&log_file))?;
    }
    settings.check();

    let interval = match &args.interval {
        Some(text) => parse_duration(text)?,
        None => settings.render_interval(),
    };

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let source = open_source(&rt, &args)?;
    let snapshot_file = SnapshotFile::new(settings.snapshot_path());
    let snapshot = snapshot_file.load();
    let persister = Persister::spawn(snapshot_file, settings.persist_debounce());

    let mut app = App::new(source, settings, snapshot, Box::new(SystemctlProbe))
        .with_persister(persister)
        .with_render_interval(interval);
    if let Some(path) = args.export {
        app = app.with_export(path);
    }

    info!(
        "Starting with {} (render every {})",
        app.source_description(),
        envpaper::data::duration::format_duration(interval)
    );

    if args.headless {
        run_headless(&rt, &mut app)
    } else {
        run_preview(app.with_theme(ui::Theme::auto_detect()), &rt)
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

/// Pick the delivery source from the command line; stdin by default.
fn open_source(rt: &tokio::runtime::Runtime, args: &Args) -> Result<Box<dyn DataSource>> {
    if let Some(addr) = &args.connect {
        let stream = rt
            .block_on(tokio::net::TcpStream::connect(addr))
            .with_context(|| format!("connecting to {}", addr))?;
        info!("Connected to {}", addr);
        return Ok(Box::new(StreamSource::spawn(stream, addr)));
    }
    if let Some(path) = &args.replay {
        return Ok(Box::new(FileSource::new(path)));
    }
    Ok(Box::new(StreamSource::stdin()))
}

/// One iteration of the shared loop body.
fn step(app: &mut App) {
    app.pump();
    if app.render_due() {
        app.render(SystemTime::now());
    }
}

fn shutdown(rt: &tokio::runtime::Runtime, app: &mut App) {
    if let Some(persister) = app.take_persister() {
        rt.block_on(persister.shutdown());
    }
    info!("Stopped after {} deliveries", app.deliveries);
}

fn run_headless(rt: &tokio::runtime::Runtime, app: &mut App) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    rt.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => flag.store(true, Ordering::SeqCst),
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let flag = stop.clone();
        rt.spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    term.recv().await;
                    flag.store(true, Ordering::SeqCst);
                }
                Err(e) => warn!("Cannot listen for SIGTERM: {}", e),
            }
        });
    }

    while app.running {
        step(app);
        if stop.load(Ordering::SeqCst) {
            info!("Interrupted, shutting down");
            app.quit();
        }
        std::thread::sleep(TICK);
    }

    // Apply anything that arrived during the last sleep before the final flush
    app.pump();
    shutdown(rt, app);
    Ok(())
}

fn run_preview(mut app: App, rt: &tokio::runtime::Runtime) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    shutdown(rt, &mut app);
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        step(app);

        terminal.draw(|frame| {
            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(7),    // Panel
                Constraint::Length(1), // Channel ages
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

            ui::common::render_header(frame, app, chunks[0]);
            ui::panel::render(frame, app, chunks[1]);
            ui::panel::render_ages(frame, app, chunks[2]);
            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, frame.area());
            }
        })?;

        if let Some(Event::Key(key)) = events::poll_event(TICK)? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}

//! Application state and the render cycle.

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, error, info};

use crate::config::Settings;
use crate::data::{Monitor, ServiceProbe};
use crate::persist::{PersistedSnapshot, Persister};
use crate::source::DataSource;
use crate::ui::{compose, export_screen, LineLayout, Screen, Theme};

/// Upper bound on deliveries applied per pump so a flood cannot starve rendering.
const MAX_DELIVERIES_PER_PUMP: usize = 512;

/// How long a status bar message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
///
/// The only owner of the engine; everything runs on the thread that owns it.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    source: Box<dyn DataSource>,
    pub monitor: Monitor,
    settings: Settings,
    probe: Box<dyn ServiceProbe>,
    persister: Option<Persister>,
    export_path: Option<PathBuf>,

    pub layout: LineLayout,
    render_interval: Duration,
    pub screen: Option<Screen>,
    pub last_render: Option<Instant>,
    awaiting_first_data: bool,
    force_render: bool,

    pub deliveries: u64,
    pub accepted: u64,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an app resuming from `snapshot`.
    pub fn new(
        source: Box<dyn DataSource>,
        settings: Settings,
        snapshot: PersistedSnapshot,
        probe: Box<dyn ServiceProbe>,
    ) -> Self {
        let awaiting_first_data = snapshot.is_empty();
        Self {
            running: true,
            show_help: false,
            source,
            monitor: Monitor::restore(&settings, snapshot),
            layout: LineLayout {
                width: settings.display.line_width,
            },
            render_interval: settings.render_interval(),
            settings,
            probe,
            persister: None,
            export_path: None,
            screen: None,
            last_render: None,
            awaiting_first_data,
            force_render: false,
            deliveries: 0,
            accepted: 0,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    pub fn with_persister(mut self, persister: Persister) -> Self {
        self.persister = Some(persister);
        self
    }

    pub fn with_export(mut self, path: PathBuf) -> Self {
        self.export_path = Some(path);
        self
    }

    pub fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn source_error(&self) -> Option<&str> {
        self.source.error()
    }

    pub fn render_interval(&self) -> Duration {
        self.render_interval
    }

    /// Hand the persister back for an orderly shutdown.
    pub fn take_persister(&mut self) -> Option<Persister> {
        self.persister.take()
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Drain pending deliveries into the engine.
    ///
    /// Returns the number of deliveries processed. If any of them changed
    /// state, the new snapshot is handed to the persister.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        let mut changed = false;

        while processed < MAX_DELIVERIES_PER_PUMP {
            let Some(delivery) = self.source.poll() else {
                break;
            };
            processed += 1;

            let outcome = self.monitor.deliver(&delivery);
            self.accepted += outcome.accepted as u64;
            changed |= outcome.changed();
        }

        self.deliveries += processed as u64;
        if changed {
            if let Some(persister) = &self.persister {
                persister.submit(self.monitor.snapshot());
            }
        }
        processed
    }

    pub fn render_due(&self) -> bool {
        self.force_render
            || self
                .last_render
                .is_none_or(|t| t.elapsed() >= self.render_interval)
    }

    /// Render on the next loop iteration regardless of the interval.
    pub fn request_render(&mut self) {
        self.force_render = true;
    }

    /// Probe services, compose the screen and export it.
    pub fn render(&mut self, now: SystemTime) -> &Screen {
        let services = self.settings.services_to_probe().to_vec();
        for name in &services {
            let active = self.probe.is_active(name);
            self.monitor.report_service(name, active);
        }
        self.monitor.retain_services(&services);

        let mut view = self.monitor.view(now);
        if self.awaiting_first_data {
            self.awaiting_first_data = false;
            if self.monitor.is_empty() {
                view.waiting = Some(self.render_interval);
            }
        }

        let screen = compose(&view, &self.layout);
        if self.screen.as_ref() != Some(&screen) {
            info!("Display: {}", screen.lines(&self.layout).join(" | "));
        } else {
            debug!("Display unchanged");
        }

        if let Some(path) = self.export_path.clone() {
            if let Err(e) = export_screen(&screen, &self.layout, &path) {
                error!("Failed to export screen to {}: {:#}", path.display(), e);
                self.set_status_message(format!("Export failed: {}", e));
            }
        }

        self.last_render = Some(Instant::now());
        self.force_render = false;
        self.screen.insert(screen)
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::SnapshotFile;
    use crate::source::{ChannelSource, Delivery};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct FakeProbe {
        down: Arc<AtomicBool>,
    }

    impl ServiceProbe for FakeProbe {
        fn is_active(&self, _name: &str) -> bool {
            !self.down.load(Ordering::SeqCst)
        }
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.topics.environment = Some("home/env4".to_string());
        settings
    }

    fn app_with(
        snapshot: PersistedSnapshot,
    ) -> (tokio::sync::mpsc::Sender<Delivery>, FakeProbe, App) {
        let (tx, source) = ChannelSource::create("test");
        let probe = FakeProbe::default();
        let app = App::new(Box::new(source), settings(), snapshot, Box::new(probe.clone()));
        (tx, probe, app)
    }

    fn env(temp: f64) -> Delivery {
        Delivery::new(
            "home/env4",
            format!(r#"{{"temperature": {}, "humidity": 40.0}}"#, temp),
            SystemTime::now(),
        )
    }

    #[test]
    fn test_first_render_waits_without_data() {
        let (_tx, _probe, mut app) = app_with(PersistedSnapshot::default());
        assert!(app.render_due());

        let screen = app.render(SystemTime::now()).clone();
        assert_eq!(screen.kind(), "waiting");
        assert!(!app.render_due());

        app.request_render();
        assert!(app.render_due());
        assert_eq!(app.render(SystemTime::now()).kind(), "status");
    }

    #[test]
    fn test_first_render_shows_data_that_already_arrived() {
        let (tx, _probe, mut app) = app_with(PersistedSnapshot::default());
        tx.try_send(env(21.4)).unwrap();

        assert_eq!(app.pump(), 1);
        assert_eq!(app.accepted, 2);

        let layout = app.layout;
        let lines = app.render(SystemTime::now()).lines(&layout);
        assert_eq!(lines[0], "Temp: 21.4°C");
    }

    #[test]
    fn test_service_down_shows_alert() {
        let (tx, probe, mut app) = app_with(PersistedSnapshot::default());
        tx.try_send(env(21.4)).unwrap();
        app.pump();

        probe.down.store(true, Ordering::SeqCst);
        assert_eq!(app.render(SystemTime::now()).kind(), "alert");

        probe.down.store(false, Ordering::SeqCst);
        assert_eq!(app.render(SystemTime::now()).kind(), "status");
    }

    #[test]
    fn test_render_exports_screen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.json");
        let (tx, _probe, app) = app_with(PersistedSnapshot::default());
        let mut app = app.with_export(path.clone());
        tx.try_send(env(18.0)).unwrap();
        app.pump();
        app.render(SystemTime::now());

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("Temp: 18.0°C"));
    }

    #[tokio::test]
    async fn test_accepted_updates_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("state.json"));
        let (tx, _probe, app) = app_with(PersistedSnapshot::default());
        let mut app = app.with_persister(Persister::spawn(file.clone(), Duration::from_secs(60)));

        tx.try_send(env(22.5)).unwrap();
        app.pump();
        app.take_persister().unwrap().shutdown().await;

        let restored = file.load();
        let record = restored.channels.get(&crate::data::Channel::Temperature).unwrap();
        assert_eq!(record.value, 22.5);
    }

    #[test]
    fn test_restored_snapshot_skips_waiting() {
        let (tx, _probe, mut first) = app_with(PersistedSnapshot::default());
        tx.try_send(env(20.0)).unwrap();
        first.pump();
        let snapshot = first.monitor.snapshot();

        let (_tx, _probe, mut second) = app_with(snapshot);
        assert_eq!(second.render(SystemTime::now()).kind(), "status");
    }
}

//! Interactive navigation session
//!
//! A session owns the engine, the navigation history and the host. All
//! work arrives as [`Event`]s on a single queue, so index updates from the
//! periodic refresh and interactive jumps never overlap.
//!
//! Failures never end the session: expected ones (no symbol, no definition)
//! become a host message, anything else also goes to the error log.
//!
//! @module session

mod error_log;

pub use error_log::ErrorLog;

use std::io::BufRead;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::history::{NavigationEntry, NavigationHistory};
use crate::host::{Action, Host, Input};
use crate::inventory::canonical_path;
use crate::parse::Language;
use crate::resolve::Engine;

/// Work items for the session queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One line of raw host input
    Input(String),
    Key(Action),
    /// Reparse modified open buffers
    Refresh,
    Shutdown,
}

pub struct Session<H: Host> {
    engine: Engine,
    history: NavigationHistory,
    host: H,
    error_log: ErrorLog,
}

impl<H: Host> Session<H> {
    /// Full startup: discovery, define harvesting, fingerprinting, key registration
    pub fn start(root: &Path, config: Config, host: H) -> Result<Self> {
        let engine = Engine::open(root, config)?;
        Ok(Self::new(engine, host))
    }

    /// Wrap an already opened engine and register the configured keys
    pub fn new(engine: Engine, mut host: H) -> Self {
        let config = engine.config();
        let keys = &config.keys;
        host.subscribe_key(&keys.jump, Action::JumpToDefinition);
        host.subscribe_key(&keys.back, Action::GoBack);
        host.subscribe_key(&keys.forward, Action::GoForward);

        let error_log = ErrorLog::new(config.error_log_path(engine.root()));
        let history = NavigationHistory::new(config.history.max_depth);

        info!(
            jump = %keys.jump,
            back = %keys.back,
            forward = %keys.forward,
            "Key bindings registered"
        );

        Self {
            engine,
            history,
            host,
            error_log,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Handle one event; `Break` ends the session
    pub fn dispatch(&mut self, event: Event) -> ControlFlow<()> {
        debug!(?event, "Dispatching");
        match event {
            Event::Input(line) => match self.host.interpret(&line) {
                Ok(Input::Action(action)) => self.handle_action(action),
                Ok(Input::Handled) => {}
                Ok(Input::Quit) => return ControlFlow::Break(()),
                Err(e) => self.report("input", e),
            },
            Event::Key(action) => self.handle_action(action),
            Event::Refresh => {
                self.refresh_open_buffers();
            }
            Event::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Run an action through the top-level reporter
    pub fn handle_action(&mut self, action: Action) {
        let result = match action {
            Action::JumpToDefinition => self.jump_to_definition(),
            Action::GoBack => self.go_back(),
            Action::GoForward => self.go_forward(),
        };
        if let Err(e) = result {
            self.report(action.as_str(), e);
        }
    }

    /// Resolve the symbol under the cursor and jump to its definition
    pub fn jump_to_definition(&mut self) -> Result<()> {
        let Some(file) = self.host.current_file() else {
            self.host.output_message("No file open");
            return Ok(());
        };
        let (line, column) = self.host.current_position();

        let resolution = self.engine.resolve(&self.host, &file, line, column)?;
        if resolution.is_self {
            self.host.output_message(&format!(
                "{} ({}) declared here",
                resolution.symbol, resolution.kind
            ));
            return Ok(());
        }

        let current = NavigationEntry::new(file, line, column);
        let target = NavigationEntry::from(&resolution.target);
        self.history.record_and_jump(&mut self.host, current, &target)?;
        self.host.output_message(&format!(
            "{} ({}) -> {}",
            resolution.symbol, resolution.kind, resolution.target
        ));
        Ok(())
    }

    pub fn go_back(&mut self) -> Result<()> {
        if !self.history.go_back(&mut self.host)? {
            self.host.output_message("No previous position");
        }
        Ok(())
    }

    pub fn go_forward(&mut self) -> Result<()> {
        if !self.history.go_forward(&mut self.host)? {
            self.host.output_message("No next position");
        }
        Ok(())
    }

    /// Reparse every modified open C/C++ buffer whose content changed
    ///
    /// A buffer that fails is reported and skipped; the rest are still
    /// refreshed. Returns the number of buffers reparsed.
    pub fn refresh_open_buffers(&mut self) -> usize {
        let mut reparsed = 0;
        for buffer in self.host.open_buffers() {
            if Language::from_path(&buffer).is_none() || !self.host.is_modified(&buffer) {
                continue;
            }
            match self.engine.refresh(&self.host, &buffer) {
                Ok(true) => reparsed += 1,
                Ok(false) => {}
                Err(e) => self.report("refresh", e),
            }
        }
        if reparsed > 0 {
            debug!(reparsed, "Refreshed open buffers");
        }
        reparsed
    }

    fn report(&mut self, context: &str, error: Error) {
        if error.is_expected() {
            debug!(%error, context, "Expected failure");
            self.host.output_message(&error.to_string());
            return;
        }

        warn!(%error, context, "Action failed");
        if let Err(log_error) = self.error_log.append(context, &error) {
            warn!(error = %log_error, "Could not write error log");
        }
        self.host.output_message(&format!(
            "Error (details in {})",
            self.error_log.path().display()
        ));
    }
}

/// Drain the event queue until a `Break` or until every sender is gone
pub async fn run<H: Host>(mut session: Session<H>, mut events: mpsc::Receiver<Event>) {
    info!("Session running");
    while let Some(event) = events.recv().await {
        if session.dispatch(event).is_break() {
            break;
        }
    }
    info!("Session ended");
}

/// Feed `Event::Refresh` into the queue every `period`
pub fn spawn_refresh_ticker(events: mpsc::Sender<Event>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            if events.send(Event::Refresh).await.is_err() {
                break;
            }
        }
    })
}

/// Feed stdin lines into the queue; EOF becomes `Event::Shutdown`
///
/// Reads on a plain thread: a blocking stdin read cannot be cancelled and
/// would otherwise hold up runtime shutdown.
pub fn spawn_stdin_reader(events: mpsc::Sender<Event>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if events.blocking_send(Event::Input(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
            }
        }
        let _ = events.blocking_send(Event::Shutdown);
    })
}

/// Open a file in the session's host before the loop starts
pub fn open_initial<H: Host>(session: &mut Session<H>, file: &Path) -> Result<()> {
    let file = canonical_path(file);
    session.host_mut().open_file(&file)
}

use crate::cli::{project_root, SessionArgs};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::host::{Host, TerminalHost};
use crate::session::{self, Event, Session};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Run the interactive session
pub async fn run(args: SessionArgs) -> Result<()> {
    let root = project_root(args.root)?;
    let mut config = Config::load(&root)?;
    if args.refresh {
        config.refresh.enabled = true;
    }
    let refresh = config.refresh.clone();

    let mut session = Session::start(&root, config, TerminalHost::stdout())?;
    if let Some(file) = &args.file {
        session::open_initial(&mut session, file)?;
    }
    let files = session.engine().inventory().len();
    let defines = session.engine().defines().len();
    session.host_mut().output_message(&format!(
        "cjump ready: {files} source files, {defines} defines. Type 'help' for commands."
    ));

    let (tx, rx) = mpsc::channel::<Event>(64);
    let reader = session::spawn_stdin_reader(tx.clone());
    let ticker = if refresh.enabled {
        info!(interval_secs = refresh.interval_secs, "Periodic refresh enabled");
        Some(session::spawn_refresh_ticker(
            tx.clone(),
            Duration::from_secs(refresh.interval_secs.max(1)),
        ))
    } else {
        None
    };
    drop(tx);

    session::run(session, rx).await;

    // The reader thread ends with the process
    drop(reader);
    if let Some(ticker) = ticker {
        ticker.abort();
    }
    Ok(())
}

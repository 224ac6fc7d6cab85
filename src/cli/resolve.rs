use crate::cli::{project_root, ResolveArgs};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::host::TerminalHost;
use crate::resolve::Engine;
use tracing::debug;

/// Run the resolve command
pub fn run(args: ResolveArgs) -> Result<()> {
    let root = project_root(args.root)?;
    let config = Config::load(&root)?;
    let mut engine = Engine::open(&root, config)?;

    // No buffers are open, so the file is read from disk
    let host = TerminalHost::new(std::io::sink());
    let resolution = engine.resolve(&host, &args.file, args.line, args.column)?;
    debug!(?resolution, "Resolved");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else if resolution.is_self {
        println!(
            "{} ({}) is declared at {}",
            resolution.symbol, resolution.kind, resolution.target
        );
    } else {
        println!(
            "{} ({}) -> {}",
            resolution.symbol, resolution.kind, resolution.target
        );
    }
    Ok(())
}

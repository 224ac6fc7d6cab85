use crate::cli::{project_root, IndexArgs};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::inventory::canonical_path;
use crate::resolve::Engine;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct FileReport {
    file: PathBuf,
    occurrences: usize,
    declarations: usize,
    new_names: usize,
    bodies_found: usize,
    diagnostics: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    files: Vec<FileReport>,
    failed: usize,
    occurrences: usize,
    names: usize,
    elapsed_ms: f64,
}

/// Run the index command
pub fn run(args: IndexArgs) -> Result<()> {
    let root = project_root(args.root)?;
    let config = Config::load(&root)?;
    let start = Instant::now();
    let mut engine = Engine::open(&root, config)?;

    let targets: Vec<PathBuf> = if args.files.is_empty() {
        engine.inventory().files().to_vec()
    } else {
        args.files.iter().map(|f| canonical_path(f)).collect()
    };

    let mut files = Vec::with_capacity(targets.len());
    let mut failed = 0;
    for target in &targets {
        match engine.index_file(target) {
            Ok(stats) => {
                let diagnostics = engine
                    .unit(target)
                    .map(|u| u.ast.diagnostics.len())
                    .unwrap_or(0);
                files.push(FileReport {
                    file: target.clone(),
                    occurrences: stats.occurrences,
                    declarations: stats.declarations,
                    new_names: stats.inserted,
                    bodies_found: stats.replaced,
                    diagnostics,
                });
            }
            Err(e) => {
                warn!(file = %target.display(), error = %e, "Failed to index file");
                failed += 1;
            }
        }
    }

    let report = Report {
        files,
        failed,
        occurrences: engine.index().symbols().len(),
        names: engine.index().declarations().len(),
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    };
    info!(
        files = report.files.len(),
        failed = report.failed,
        elapsed_ms = report.elapsed_ms,
        "Index complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for file in &report.files {
        let relative = file.file.strip_prefix(engine.root()).unwrap_or(&file.file);
        println!(
            "{:<40} {:>6} occurrences {:>5} declarations {:>5} new names{}",
            relative.display(),
            file.occurrences,
            file.declarations,
            file.new_names,
            if file.diagnostics > 0 {
                format!(" ({} diagnostics)", file.diagnostics)
            } else {
                String::new()
            }
        );
    }
    println!(
        "Indexed {} files ({} failed): {} occurrences, {} declared names in {:.2}ms",
        report.files.len(),
        report.failed,
        report.occurrences,
        report.names,
        report.elapsed_ms
    );
    Ok(())
}

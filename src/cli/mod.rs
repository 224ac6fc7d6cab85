//! CLI command definitions and handlers

pub mod defines;
pub mod index;
pub mod resolve;
pub mod session;

use crate::core::error::{Error, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_ABOUT: &str = r#"
Jump-to-definition for C/C++ source trees.

Indexes the sources under a project root with tree-sitter, applies the
-D defines found in the project's Makefiles, and resolves the symbol at a
cursor position to its definition, searching sibling files when only a
prototype is visible.

QUICK START:
    cjump session                     Interactive session on the current directory
    cjump resolve src/main.c 42 8     Resolve the symbol at line 42, column 8

SESSION KEYS (defaults, see [keys] in .cjump.toml):
    F12      Jump to definition
    M--      Go back
    M-=      Go forward

EXAMPLES:
    cjump defines                     Show the harvested build defines
    cjump index src/main.c            Index one file and print counts
    cjump resolve a.c 10 4 --json     JSON output for scripting
"#;

/// Jump-to-definition for C/C++ source trees
#[derive(Parser, Debug)]
#[command(name = "cjump")]
#[command(author, version)]
#[command(about = "Jump-to-definition for C/C++ source trees")]
#[command(long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive navigation session
    #[command(visible_alias = "s")]
    Session(SessionArgs),

    /// Resolve the symbol at a position to its definition
    #[command(visible_alias = "r")]
    Resolve(ResolveArgs),

    /// Print the build defines harvested from the project's build files
    Defines(DefinesArgs),

    /// Index files and print occurrence and declaration counts
    #[command(visible_alias = "i")]
    Index(IndexArgs),
}

/// Arguments for the session command
#[derive(Parser, Debug)]
#[command(after_help = "Type a key name (F12, M--, M-=) or a command per line:
    open PATH | switch PATH | goto LINE COLUMN | set LINE TEXT
    save | where | buffers | quit")]
pub struct SessionArgs {
    /// Project root (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// File to open at startup
    pub file: Option<PathBuf>,

    /// Reparse modified buffers periodically, overriding the config
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
#[command(after_help = "LINE is 1-based, COLUMN is 0-based (editor cursor convention).")]
pub struct ResolveArgs {
    /// Source file containing the symbol
    pub file: PathBuf,

    /// Line (1-based)
    pub line: u32,

    /// Column (0-based)
    pub column: u32,

    /// Project root (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the defines command
#[derive(Parser, Debug)]
pub struct DefinesArgs {
    /// Project root (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the index command
#[derive(Parser, Debug)]
pub struct IndexArgs {
    /// Files to index (default: every source file in the project)
    pub files: Vec<PathBuf>,

    /// Project root (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

/// Resolve the project root argument
pub fn project_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => std::env::current_dir().map_err(|e| Error::io(".", e)),
    }
}

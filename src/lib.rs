//! cjump - jump-to-definition for C/C++ source trees
//!
//! Indexes a project's C and C++ sources with tree-sitter, resolves the
//! symbol under an editor cursor to its definition (searching sibling files
//! when only a prototype is visible) and keeps a back/forward history of
//! jumps. Editors plug in through the [`host::Host`] trait.

pub mod build;
pub mod cli;
pub mod core;
pub mod history;
pub mod host;
pub mod index;
pub mod inventory;
pub mod parse;
pub mod resolve;
pub mod session;

pub use core::config::Config;
pub use core::error::{Error, Result};
pub use resolve::{Engine, Resolution};
pub use session::Session;

//! File-scoped index deltas
//!
//! A delta is everything one translation unit contributes: its occurrences
//! grouped by file and line, and its declaring occurrences in traversal
//! order. Building a delta never touches the shared tables.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Occurrence;
use crate::parse::{Ast, NodeId};

#[derive(Debug, Default)]
pub struct FileDelta {
    unit: PathBuf,
    files: HashMap<PathBuf, BTreeMap<u32, Vec<Arc<Occurrence>>>>,
    declarations: Vec<Arc<Occurrence>>,
}

impl FileDelta {
    /// Walk the whole AST of `unit`
    ///
    /// Nodes without a name are skipped. A declaring node and every use bound
    /// to it share one `Arc` snapshot of the declaration.
    pub fn build(ast: &Ast, unit: &Path) -> Self {
        let mut snapshots: HashMap<NodeId, Arc<Occurrence>> = HashMap::new();
        for (id, node) in ast.descendants() {
            if node.kind.is_declaration() && !node.spelling.is_empty() {
                snapshots.insert(id, Arc::new(Occurrence::from_node(node)));
            }
        }

        let mut delta = Self {
            unit: unit.to_path_buf(),
            ..Self::default()
        };

        for (id, node) in ast.descendants() {
            if node.spelling.is_empty() {
                continue;
            }

            let occurrence = match snapshots.get(&id) {
                Some(declaration) => {
                    delta.declarations.push(declaration.clone());
                    declaration.clone()
                }
                None => {
                    let mut occurrence = Occurrence::from_node(node);
                    occurrence.referenced = node.referenced.map(|target| {
                        snapshots
                            .get(&target)
                            .cloned()
                            .unwrap_or_else(|| Arc::new(Occurrence::from_node(ast.node(target))))
                    });
                    Arc::new(occurrence)
                }
            };

            delta
                .files
                .entry(occurrence.location.file.clone())
                .or_default()
                .entry(occurrence.location.line)
                .or_default()
                .push(occurrence);
        }

        delta
    }

    /// Translation unit this delta came from
    pub fn unit(&self) -> &Path {
        &self.unit
    }

    /// All occurrences, file by file, line by line
    pub fn occurrences(&self) -> impl Iterator<Item = &Arc<Occurrence>> {
        self.files
            .values()
            .flat_map(|lines| lines.values())
            .flatten()
    }

    /// Declaring occurrences in traversal order
    pub fn declarations(&self) -> &[Arc<Occurrence>] {
        &self.declarations
    }

    /// Preferred declaration of `name` within this delta alone
    pub fn preferred(&self, name: &str) -> Option<&Arc<Occurrence>> {
        let mut matching = self.declarations.iter().filter(|d| d.spelling == name);
        let first = matching.next()?;
        if first.has_body {
            return Some(first);
        }
        matching.find(|d| d.has_body).or(Some(first))
    }
}

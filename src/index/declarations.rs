//! Name -> preferred declaration
//!
//! Every declaring occurrence offered for a name is kept in offer order,
//! tagged with the units that contributed it. The preferred declaration is
//! the first candidate with a body, or the first candidate when none has
//! one. Applying offers one by one this is exactly: insert when absent,
//! replace a bodiless entry with a bodied one, otherwise keep. Keeping the
//! candidates is what lets a unit's contributions be purged without
//! forgetting what other units declared.

use compact_str::CompactString;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::symbols::Tagged;
use super::Occurrence;

#[derive(Debug, Default)]
pub struct DeclarationIndex {
    names: HashMap<CompactString, SmallVec<[Tagged; 2]>>,
}

/// What an offer did to the preferred declaration of its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Inserted,
    Replaced,
    Kept,
}

impl DeclarationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a declaring occurrence contributed by `unit`
    pub fn offer(&mut self, occurrence: Arc<Occurrence>, unit: &Path) -> Offer {
        let candidates = self.names.entry(occurrence.spelling.clone()).or_default();
        let previous = preferred(candidates).map(|t| t.occurrence.has_body);

        if let Some(existing) = candidates.iter_mut().find(|t| t.occurrence == occurrence) {
            existing.add_unit(unit);
        } else {
            candidates.push(Tagged::new(occurrence.clone(), unit));
        }

        match previous {
            None => Offer::Inserted,
            Some(false) if occurrence.has_body => Offer::Replaced,
            Some(_) => Offer::Kept,
        }
    }

    /// Preferred declaration for `name`
    pub fn get(&self, name: &str) -> Option<&Arc<Occurrence>> {
        self.names
            .get(name)
            .and_then(|candidates| preferred(candidates))
            .map(|t| &t.occurrence)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Remove everything `unit` contributed; returns the number of candidates dropped
    pub fn purge_unit(&mut self, unit: &Path) -> usize {
        let mut removed = 0;
        for candidates in self.names.values_mut() {
            let before = candidates.len();
            candidates.retain(|t| !t.remove_unit(unit));
            removed += before - candidates.len();
        }
        self.names.retain(|_, candidates| !candidates.is_empty());
        removed
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn preferred(candidates: &[Tagged]) -> Option<&Tagged> {
    candidates
        .iter()
        .find(|t| t.occurrence.has_body)
        .or_else(|| candidates.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{CursorKind, Location};

    fn decl(name: &str, line: u32, has_body: bool) -> Arc<Occurrence> {
        Arc::new(Occurrence {
            spelling: CompactString::new(name),
            kind: CursorKind::FunctionDecl,
            location: Location::new("/p/a.c", line, 5),
            has_body,
            referenced: None,
        })
    }

    #[test]
    fn test_body_replaces_prototype_once() {
        let mut index = DeclarationIndex::new();
        let unit = Path::new("/p/a.c");

        assert_eq!(index.offer(decl("f", 1, false), unit), Offer::Inserted);
        assert_eq!(index.offer(decl("f", 2, false), unit), Offer::Kept);
        assert_eq!(index.get("f").unwrap().location.line, 1);

        assert_eq!(index.offer(decl("f", 10, true), unit), Offer::Replaced);
        assert_eq!(index.offer(decl("f", 20, true), unit), Offer::Kept);
        assert_eq!(index.offer(decl("f", 30, false), unit), Offer::Kept);

        let best = index.get("f").unwrap();
        assert!(best.has_body);
        assert_eq!(best.location.line, 10, "first body wins");
    }

    #[test]
    fn test_purge_falls_back_to_other_units() {
        let mut index = DeclarationIndex::new();
        let header_user = Path::new("/p/main.c");
        let definer = Path::new("/p/impl.c");

        index.offer(decl("f", 1, false), header_user);
        index.offer(decl("f", 7, true), definer);
        assert!(index.get("f").unwrap().has_body);

        index.purge_unit(definer);
        assert!(!index.get("f").unwrap().has_body);
        assert_eq!(index.get("f").unwrap().location.line, 1);

        index.purge_unit(header_user);
        assert!(!index.contains("f"));
        assert!(index.is_empty());
    }
}

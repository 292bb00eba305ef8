// catalog.rs — Known tile names grouped by arity class
//
// The tokenizer resolves words of a composition expression against the
// catalog by longest-prefix match, so a longer tile name is never shadowed
// by a shorter one that happens to be its prefix.
//
// Preconditions: none.
// Postconditions: every name maps to exactly one class.
// Failure modes: duplicate or malformed names → `CatalogError`.
// Side effects: none.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::tile::TileClass;

/// Errors raised while populating a catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("tile `{name}` registered as both {existing} and {requested}")]
    Duplicate {
        name: String,
        existing: TileClass,
        requested: TileClass,
    },
    #[error("invalid tile name `{0}`: names use letters, digits, `_`, `-`, `.` and contain a non-digit")]
    InvalidName(String),
}

/// Registry of tile names.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    classes: BTreeMap<String, TileClass>,
    /// Names sorted by descending byte length (ties broken alphabetically).
    by_length: Vec<String>,
}

/// Characters that may appear in a tile name. Must agree with the word
/// token of the lexer.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(is_name_char)
        && name.chars().any(|c| !c.is_ascii_digit())
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` under `class`. Re-registering under the same class
    /// is a no-op.
    pub fn insert(&mut self, name: impl Into<String>, class: TileClass) -> Result<(), CatalogError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(CatalogError::InvalidName(name));
        }
        if let Some(&existing) = self.classes.get(&name) {
            if existing == class {
                return Ok(());
            }
            return Err(CatalogError::Duplicate {
                name,
                existing,
                requested: class,
            });
        }
        self.classes.insert(name.clone(), class);
        let key = (Reverse(name.len()), name.as_str());
        let pos = self
            .by_length
            .partition_point(|n| (Reverse(n.len()), n.as_str()) < key);
        self.by_length.insert(pos, name);
        Ok(())
    }

    /// Builder-style `insert` for tests and fixtures.
    pub fn with(mut self, name: &str, class: TileClass) -> Result<Self, CatalogError> {
        self.insert(name, class)?;
        Ok(self)
    }

    pub fn class_of(&self, name: &str) -> Option<TileClass> {
        self.classes.get(name).copied()
    }

    pub fn names_longest_first(&self) -> &[String] {
        &self.by_length
    }

    /// Names registered under `class`, alphabetically.
    pub fn names_in(&self, class: TileClass) -> Vec<&str> {
        self.classes
            .iter()
            .filter(|(_, &c)| c == class)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// The longest catalog name that is a prefix of `text`.
    pub fn longest_prefix(&self, text: &str) -> Option<(&str, TileClass)> {
        self.by_length
            .iter()
            .find(|n| text.starts_with(n.as_str()))
            .map(|n| (n.as_str(), self.classes[n]))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

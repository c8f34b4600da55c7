//! Field allow-list and alias resolution.
//!
//! The allow-list is a trust declaration: it maps the paths users may write
//! to the canonical paths the builder resolves against the schema. Aliases
//! are substituted before any schema lookup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One caller-provided allow-list entry: a plain path, or an alias mapping
/// a user-visible name to a canonical field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowEntry {
    Path(String),
    Alias { alias: String, field: String },
}

impl AllowEntry {
    pub fn path(p: impl Into<String>) -> Self {
        AllowEntry::Path(p.into())
    }

    pub fn alias(alias: impl Into<String>, field: impl Into<String>) -> Self {
        AllowEntry::Alias {
            alias: alias.into(),
            field: field.into(),
        }
    }
}

impl From<&str> for AllowEntry {
    fn from(p: &str) -> Self {
        AllowEntry::Path(p.to_string())
    }
}

/// Immutable resolved allow-list.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    allow_all: bool,
    allowed: HashSet<String>,
    aliases: IndexMap<String, String>,
}

impl AllowList {
    /// Admit any parseable path (the schema still has the last word).
    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            ..Self::default()
        }
    }

    pub fn from_entries(entries: &[AllowEntry]) -> Self {
        let mut allowed = HashSet::new();
        let mut aliases = IndexMap::new();
        for entry in entries {
            match entry {
                AllowEntry::Path(p) => {
                    allowed.insert(p.clone());
                }
                AllowEntry::Alias { alias, field } => {
                    aliases.insert(alias.clone(), field.clone());
                }
            }
        }
        Self {
            allow_all: false,
            allowed,
            aliases,
        }
    }

    /// Resolve a parsed field path to its canonical form, or `None` when the
    /// path is not admitted. The caller applies the `unknown_field` policy.
    pub fn resolve(&self, path: &[String]) -> Option<Vec<String>> {
        if self.allow_all {
            return Some(path.to_vec());
        }
        let joined = path.join(".");
        if let Some(canonical) = self.aliases.get(&joined) {
            return Some(canonical.split('.').map(str::to_string).collect());
        }
        if self.allowed.contains(&joined) {
            return Some(path.to_vec());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn allow_all_admits_anything() {
        let list = AllowList::allow_all();
        assert_eq!(
            list.resolve(&path(&["whatever", "field"])),
            Some(path(&["whatever", "field"]))
        );
    }

    #[test]
    fn plain_paths() {
        let list = AllowList::from_entries(&["status".into(), "organization.name".into()]);
        assert_eq!(list.resolve(&path(&["status"])), Some(path(&["status"])));
        assert_eq!(
            list.resolve(&path(&["organization", "name"])),
            Some(path(&["organization", "name"]))
        );
        assert_eq!(list.resolve(&path(&["priority"])), None);
    }

    #[test]
    fn alias_substitutes_before_resolution() {
        let list = AllowList::from_entries(&[
            AllowEntry::path("status"),
            AllowEntry::alias("org.name", "organization.name"),
        ]);
        assert_eq!(
            list.resolve(&path(&["org", "name"])),
            Some(path(&["organization", "name"]))
        );
        // the canonical path itself is not admitted unless listed
        assert_eq!(list.resolve(&path(&["organization", "name"])), None);
    }

    #[test]
    fn empty_list_admits_nothing() {
        let list = AllowList::from_entries(&[]);
        assert_eq!(list.resolve(&path(&["status"])), None);
    }
}

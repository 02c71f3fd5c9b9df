use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::normalize::clean_text;

const BUILTIN_ALIASES: &str = include_str!("../data/aliases.json");

/// Known name drift between the source tables.
///
/// `team_aliases` maps a canonical misspelling to its canonical team name and
/// is applied after [`clean_text`]. `stadium_renames` maps a raw stadium-table
/// name to its replacement and is applied before canonicalisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasTable {
    #[serde(default)]
    pub team_aliases: HashMap<String, String>,
    #[serde(default)]
    pub stadium_renames: HashMap<String, String>,
}

impl AliasTable {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_ALIASES).context("parse built-in alias table")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read alias table {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse alias table {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let table: AliasTable = serde_json::from_str(raw)?;
        Ok(table.canonicalized())
    }

    // Entries may be written in any case or spacing; lookups happen on
    // canonical keys.
    fn canonicalized(self) -> Self {
        let team_aliases = self
            .team_aliases
            .into_iter()
            .map(|(from, to)| (clean_text(&from), clean_text(&to)))
            .collect();
        Self {
            team_aliases,
            stadium_renames: self.stadium_renames,
        }
    }

    /// Canonical team name for an already-cleaned `team`.
    pub fn resolve_team(&self, team: &str) -> String {
        match self.team_aliases.get(team) {
            Some(canonical) => canonical.clone(),
            None => team.to_string(),
        }
    }

    pub fn rename_stadium<'a>(&'a self, raw: &'a str) -> &'a str {
        self.stadium_renames
            .get(raw)
            .map(String::as_str)
            .unwrap_or(raw)
    }
}

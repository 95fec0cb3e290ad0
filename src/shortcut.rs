//! First-token shortcut expansion.

use std::collections::BTreeMap;

use crate::config::Config;

/// Expands a CLI's first input token into a token list.
pub trait Shortcuts {
    fn expand(&self, cli: &str, token: &str) -> Option<Vec<String>>;
}

/// Shortcut table keyed by CLI name, then shortcut name.
#[derive(Debug, Clone, Default)]
pub struct ShortcutTable {
    table: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl ShortcutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            table: config.shortcuts.clone(),
        }
    }

    pub fn with_shortcut<S: Into<String>>(
        mut self,
        cli: impl Into<String>,
        name: impl Into<String>,
        tokens: impl IntoIterator<Item = S>,
    ) -> Self {
        self.table
            .entry(cli.into())
            .or_default()
            .insert(name.into(), tokens.into_iter().map(Into::into).collect());
        self
    }
}

impl Shortcuts for ShortcutTable {
    fn expand(&self, cli: &str, token: &str) -> Option<Vec<String>> {
        self.table.get(cli)?.get(token).cloned()
    }
}

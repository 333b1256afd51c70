use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Settings of a single lexer, fixed when it is created except for `emit_comments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LexerConfig {
    /// Return `Comment` tokens instead of skipping them.
    pub emit_comments: bool,
}

impl LexerConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_str(text).context("configuration is not valid JSON")?;
        let mut config = Self::default();
        config.update(&value)?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not read configuration file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in configuration file {}", path.display()))
    }

    pub fn update(&mut self, update: &Value) -> anyhow::Result<()> {
        if let Value::Object(update) = update {
            self.update_by_map(update)
        } else {
            bail!("got invalid configuration object {update}")
        }
    }

    /// Applies the known keys of `update`; unknown keys are ignored.
    pub fn update_by_map(&mut self, update: &Map<String, Value>) -> anyhow::Result<()> {
        if let Some(emit_comments) = update.get("emitComments") {
            self.emit_comments = bool::deserialize(emit_comments)
                .with_context(|| format!("invalid value for emitComments: {emit_comments}"))?;
        }
        Ok(())
    }
}

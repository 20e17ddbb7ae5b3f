// src/config.rs
//! Layered key-value configuration: TOML file defaults overridden by
//! `PERF_*` environment entries, with dotted-path accessors.
//!
//! The provider is constructed once (normally in `main`) and lent to every
//! pipeline component, so "resolved once, read everywhere" holds without any
//! process-global state.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "PERF_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";

/// Environment entries with this prefix override file values:
/// `PERF_REPORTING_FORMATS` becomes the dotted key `reporting.formats`.
const ENV_OVERRIDE_PREFIX: &str = "PERF_";

#[derive(Debug, Clone)]
pub struct AppConfig {
    root: Value,
}

impl AppConfig {
    pub fn empty() -> Self {
        Self {
            root: Value::Object(serde_json::Map::new()),
        }
    }

    /// Load the file layer, then apply environment overrides on top.
    ///
    /// A missing file yields an empty base layer; a malformed file is a hard
    /// error, since every downstream stage depends on a valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let mut cfg = Self::empty();
        if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config from {}", path.display()))?;
            let table: toml::Value = toml::from_str(&raw)
                .with_context(|| format!("parsing config from {}", path.display()))?;
            cfg.root = serde_json::to_value(table).context("converting config tree")?;
        }
        cfg.apply_env_overrides(std::env::vars());
        Ok(cfg)
    }

    /// Load using `$PERF_CONFIG_PATH`, falling back to `config/pipeline.toml`.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load(&path)
    }

    /// Translate `PERF_FOO_BAR=value` entries into `foo.bar` dotted keys.
    /// Override values parse as JSON scalars where possible (numbers, bools,
    /// arrays), otherwise they are kept as plain strings.
    fn apply_env_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, raw) in vars {
            if key == ENV_CONFIG_PATH {
                continue;
            }
            let Some(rest) = key.strip_prefix(ENV_OVERRIDE_PREFIX) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let dotted = rest.to_ascii_lowercase().replace('_', ".");
            self.set(&dotted, parse_override_value(&raw));
        }
    }

    /// Dotted-path lookup. Any absent segment, or a value that does not
    /// deserialize into `T`, yields `None` rather than an error.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut cur = &self.root;
        for seg in key.split('.') {
            cur = cur.as_object()?.get(seg)?;
        }
        serde_json::from_value(cur.clone()).ok()
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set a dotted key, creating intermediate tables that do not exist yet.
    /// A scalar in the middle of the path is replaced by a table.
    pub fn set(&mut self, key: &str, value: Value) {
        let mut cur = &mut self.root;
        let mut segments = key.split('.').peekable();
        while let Some(seg) = segments.next() {
            if !cur.is_object() {
                *cur = Value::Object(serde_json::Map::new());
            }
            let Some(map) = cur.as_object_mut() else {
                return;
            };
            if segments.peek().is_none() {
                map.insert(seg.to_string(), value);
                return;
            }
            cur = map
                .entry(seg.to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
        }
    }
}

fn parse_override_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

use super::PolicyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Keys an override file may set. Absent keys keep the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverride {
    pub max_steps: Option<usize>,
    pub business_hours_block_restart: Option<bool>,
    pub business_hours_tz: Option<String>,
    pub hours_start: Option<u32>,
    pub hours_end: Option<u32>,
    pub require_verify_for_cmds: Option<bool>,
    pub require_rollback_for_restart: Option<bool>,
}

impl PolicyOverride {
    pub fn merge_into(self, mut base: PolicyConfig) -> PolicyConfig {
        if let Some(v) = self.max_steps {
            base.max_steps = v;
        }
        if let Some(v) = self.business_hours_block_restart {
            base.business_hours_block_restart = v;
        }
        if let Some(v) = self.business_hours_tz {
            base.business_hours_tz = v;
        }
        if let Some(v) = self.hours_start {
            base.hours_start = v;
        }
        if let Some(v) = self.hours_end {
            base.hours_end = v;
        }
        if let Some(v) = self.require_verify_for_cmds {
            base.require_verify_for_cmds = v;
        }
        if let Some(v) = self.require_rollback_for_restart {
            base.require_rollback_for_restart = v;
        }
        base
    }
}

fn parse_override(path: &Path, raw: &str) -> Result<PolicyOverride, String> {
    if raw.trim().is_empty() {
        return Ok(PolicyOverride::default());
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(raw).map_err(|e| e.to_string()),
        _ => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
    }
}

/// Built-in defaults with the file at `path` merged over them key by key.
///
/// A missing file yields the defaults silently. An unreadable or malformed
/// file (parse error, unknown key, bad time zone, bad hours) is logged and
/// the defaults are used in full.
pub fn load_policy(path: &Path) -> PolicyConfig {
    if !path.exists() {
        debug!(path = %path.display(), "no policy file, using defaults");
        return PolicyConfig::default();
    }

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read policy file, using defaults");
            return PolicyConfig::default();
        }
    };

    let merged = match parse_override(path, &raw) {
        Ok(over) => over.merge_into(PolicyConfig::default()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed policy file, using defaults");
            return PolicyConfig::default();
        }
    };

    if let Err(e) = merged.validate() {
        warn!(path = %path.display(), error = %e, "invalid policy values, using defaults");
        return PolicyConfig::default();
    }
    merged
}

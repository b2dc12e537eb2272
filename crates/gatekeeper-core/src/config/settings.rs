//! Scalar engine-level settings, loaded with highest-source-wins semantics
//! (distinct from `merge_rules`'s id-keyed merge — see `loader.rs`).

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSettingsFile {
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub strict: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub log_level: String,
    pub strict: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            log_level: "info".to_string(),
            strict: false,
        }
    }
}

impl EngineSettings {
    /// Fold a higher-precedence layer's explicit settings over the current
    /// ones. `None` means "no opinion from this layer", matching
    /// `HooksConfig::merge_with`'s tri-state inheritance for `builtin_guards`.
    pub fn merge_with(&mut self, other: &EngineSettingsFile) {
        if let Some(level) = &other.log_level {
            self.log_level = level.clone();
        }
        if let Some(strict) = other.strict {
            self.strict = strict;
        }
    }

    /// `GATEKEEPER_STRICT_CONFIG=1` overrides every file-based setting —
    /// the single knob unifying the loader's and the rule base's soft/hard
    /// failure behavior (see DESIGN.md).
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("GATEKEEPER_STRICT_CONFIG") {
            self.strict = val == "1" || val.eq_ignore_ascii_case("true");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_with_none_inherits() {
        let mut settings = EngineSettings {
            strict: true,
            ..EngineSettings::default()
        };
        settings.merge_with(&EngineSettingsFile {
            log_level: None,
            strict: None,
        });
        assert!(settings.strict);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_merge_with_explicit_overrides() {
        let mut settings = EngineSettings::default();
        settings.merge_with(&EngineSettingsFile {
            log_level: Some("debug".into()),
            strict: Some(true),
        });
        assert_eq!(settings.log_level, "debug");
        assert!(settings.strict);
    }
}

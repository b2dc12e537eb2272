//! Discover, parse, validate, and merge rule declarations across all 8
//! precedence tiers; separately load scalar engine settings.

use super::discovery;
use super::settings::{EngineSettings, EngineSettingsFile};
use super::source::{ConfigSource, SourceKind};
use crate::error::EngineError;
use crate::rule::{merge_rules, Rule};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<Rule>,
    #[serde(default)]
    hooks: Option<HooksTable>,
    #[serde(flatten)]
    settings: EngineSettingsFile,
}

#[derive(Debug, Default, Deserialize)]
struct HooksTable {
    #[serde(default)]
    rules: Vec<Rule>,
}

/// Parse one rule file. Missing files are treated as empty (layer absent).
/// Individually invalid rules are always logged and skipped — fail-open
/// regardless of `strict`. A file that exists but can't be read or parsed
/// is soft-skipped (logged and treated as empty) unless `strict` is set,
/// in which case it is a hard error that aborts the whole load.
fn load_file(path: &Path, strict: bool) -> Result<Vec<Rule>, EngineError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if strict {
                return Err(EngineError::ConfigRead {
                    path: path.display().to_string(),
                    source: e,
                });
            }
            tracing::warn!(path = %path.display(), error = %e, "failed to read config file");
            return Ok(Vec::new());
        }
    };
    let parsed: RuleFile = match toml::from_str(&content) {
        Ok(p) => p,
        Err(e) => {
            if strict {
                return Err(EngineError::ConfigParse {
                    path: path.display().to_string(),
                    source: e,
                });
            }
            tracing::warn!(path = %path.display(), error = %e, "failed to parse config file, skipping");
            return Ok(Vec::new());
        }
    };

    let mut rules = parsed.rules;
    if let Some(hooks) = parsed.hooks {
        rules.extend(hooks.rules);
    }

    Ok(rules
        .into_iter()
        .filter(|r| match r.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(rule_id = %r.id, error = %e, "dropping invalid rule");
                false
            }
        })
        .collect())
}

/// `strict` here is provisional: read directly off `GATEKEEPER_STRICT_CONFIG`
/// before the final merged `EngineSettings` exists, since that env var is
/// itself one of the things this function is loading.
fn load_file_settings(path: &Path, strict: bool) -> Result<EngineSettingsFile, EngineError> {
    if !path.exists() {
        return Ok(EngineSettingsFile::default());
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if strict {
                return Err(EngineError::ConfigRead {
                    path: path.display().to_string(),
                    source: e,
                });
            }
            return Ok(EngineSettingsFile::default());
        }
    };
    match toml::from_str::<RuleFile>(&content) {
        Ok(f) => Ok(f.settings),
        Err(e) => {
            if strict {
                Err(EngineError::ConfigParse {
                    path: path.display().to_string(),
                    source: e,
                })
            } else {
                Ok(EngineSettingsFile::default())
            }
        }
    }
}

/// `GATEKEEPER_STRICT_CONFIG` read directly, ahead of the full settings
/// merge, to decide whether settings-file failures should be hard.
fn provisional_strict() -> bool {
    std::env::var("GATEKEEPER_STRICT_CONFIG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Packaged defaults; the engine ships with no opinionated rules, only the
/// precedence machinery. Hosts populate the builtin tier by shipping their
/// own rule file under the user config path at install time if desired.
fn builtin_rules() -> Vec<Rule> {
    Vec::new()
}

fn default_rules() -> Vec<Rule> {
    Vec::new()
}

fn source_for(kind: SourceKind, path: Option<PathBuf>) -> ConfigSource {
    let exists = path.as_deref().is_some_and(Path::exists);
    ConfigSource { kind, path, exists }
}

/// All 8 tiers, lowest to highest, as (source, rules). Fails fast on the
/// first hard error raised by `load_file` in strict mode.
fn all_tiers(
    project_root: Option<&Path>,
    strict: bool,
) -> Result<Vec<(ConfigSource, Vec<Rule>)>, EngineError> {
    let mut tiers = vec![
        (source_for(SourceKind::Default, None), default_rules()),
        (source_for(SourceKind::Builtin, None), builtin_rules()),
    ];

    if let Some(path) = discovery::user_config_path() {
        let rules = load_file(&path, strict)?;
        tiers.push((source_for(SourceKind::User, Some(path)), rules));
    }

    if let Some(root) = project_root {
        let external = discovery::project_external_path(root);
        let rules = load_file(&external, strict)?;
        tiers.push((source_for(SourceKind::ProjectExternal, Some(external)), rules));

        let dropin_dir = discovery::dropin_dir(root);
        let mut dropin_rules = Vec::new();
        for p in discovery::discover_dropin_files(&dropin_dir) {
            dropin_rules.extend(load_file(&p, strict)?);
        }
        tiers.push((source_for(SourceKind::Dropin, Some(dropin_dir)), dropin_rules));

        let inline = discovery::project_inline_path(root);
        let rules = load_file(&inline, strict)?;
        tiers.push((source_for(SourceKind::ProjectInline, Some(inline)), rules));

        let local = discovery::local_path(root);
        let rules = load_file(&local, strict)?;
        tiers.push((source_for(SourceKind::Local, Some(local)), rules));

        if let Some(wt_path) = discovery::worktree_config_path(root) {
            let rules = load_file(&wt_path, strict)?;
            tiers.push((source_for(SourceKind::Worktree, Some(wt_path)), rules));
        }
    }

    Ok(tiers)
}

/// Load and merge the full rule base for `project_root` (if any). In strict
/// mode, a malformed file anywhere in the chain aborts the whole load.
pub fn load_rules(project_root: Option<&Path>, strict: bool) -> Result<Vec<Rule>, EngineError> {
    let tiers = all_tiers(project_root, strict)?;
    let lists: Vec<Vec<Rule>> = tiers.into_iter().map(|(_, rules)| rules).collect();
    Ok(merge_rules(&lists))
}

/// Load scalar engine settings with highest-source-wins semantics, entirely
/// separate from rule merging. In strict mode (per `GATEKEEPER_STRICT_CONFIG`,
/// read provisionally since `strict` itself lives among these settings), a
/// malformed settings file aborts the load instead of being skipped.
pub fn load_engine_settings(project_root: Option<&Path>) -> Result<EngineSettings, EngineError> {
    let strict = provisional_strict();
    let mut settings = EngineSettings::default();

    if let Some(path) = discovery::user_config_path() {
        settings.merge_with(&load_file_settings(&path, strict)?);
    }
    if let Some(root) = project_root {
        settings.merge_with(&load_file_settings(&discovery::project_external_path(root), strict)?);
        settings.merge_with(&load_file_settings(&discovery::project_inline_path(root), strict)?);
        settings.merge_with(&load_file_settings(&discovery::local_path(root), strict)?);
        if let Some(wt_path) = discovery::worktree_config_path(root) {
            settings.merge_with(&load_file_settings(&wt_path, strict)?);
        }
    }
    settings.apply_env();
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty_layer() {
        let rules = load_file(Path::new("/nonexistent/rules.toml"), false).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_malformed_toml_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hooks.toml");
        write(&path, "this is not valid toml {{{{");
        assert!(load_file(&path, false).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_toml_is_hard_error_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hooks.toml");
        write(&path, "this is not valid toml {{{{");
        assert!(matches!(
            load_file(&path, true),
            Err(crate::error::EngineError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_invalid_rule_dropped_valid_rule_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hooks.toml");
        write(
            &path,
            r#"
[[rules]]
id = ""
events = ["PreToolUse"]

[[rules]]
id = "r2"
events = ["PreToolUse"]
"#,
        );
        let rules = load_file(&path, false).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "r2");
    }

    #[test]
    fn test_invalid_rule_still_dropped_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hooks.toml");
        write(
            &path,
            r#"
[[rules]]
id = ""
events = ["PreToolUse"]

[[rules]]
id = "r2"
events = ["PreToolUse"]
"#,
        );
        let rules = load_file(&path, true).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "r2");
    }

    #[test]
    fn test_accepts_both_top_level_and_nested_hooks_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hooks.toml");
        write(
            &path,
            r#"
[[rules]]
id = "top-level"
events = ["PreToolUse"]

[[hooks.rules]]
id = "nested"
events = ["PreToolUse"]
"#,
        );
        let rules = load_file(&path, false).unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["top-level", "nested"]);
    }

    #[test]
    fn test_load_rules_merges_project_external_and_inline() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(".gatekeeper");
        write(
            &marker.join("hooks.toml"),
            r#"
[[rules]]
id = "from-external"
events = ["PreToolUse"]
"#,
        );
        write(
            &marker.join("gatekeeper.toml"),
            r#"
[[hooks.rules]]
id = "from-inline"
events = ["PreToolUse"]
"#,
        );

        let rules = load_rules(Some(dir.path()), false).unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.contains(&"from-external"));
        assert!(ids.contains(&"from-inline"));
    }

    #[test]
    fn test_load_rules_aborts_in_strict_mode_on_malformed_tier() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(".gatekeeper");
        write(&marker.join("hooks.toml"), "this is not valid toml {{{{");

        let result = load_rules(Some(dir.path()), true);
        assert!(matches!(
            result,
            Err(crate::error::EngineError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_local_overrides_project_inline_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(".gatekeeper");
        write(
            &marker.join("gatekeeper.toml"),
            r#"
[[hooks.rules]]
id = "shared"
events = ["PreToolUse"]
result = "ok"
"#,
        );
        write(
            &marker.join("gatekeeper.local.toml"),
            r#"
[[rules]]
id = "shared"
events = ["PreToolUse"]
result = "block"
"#,
        );

        let rules = load_rules(Some(dir.path()), false).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].result, crate::rule::RuleResultKind::Block);
    }

    #[test]
    fn test_load_engine_settings_highest_source_wins() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(".gatekeeper");
        write(&marker.join("hooks.toml"), "log_level = \"warn\"\n");
        write(
            &marker.join("gatekeeper.local.toml"),
            "log_level = \"debug\"\n",
        );

        let settings = load_engine_settings(Some(dir.path())).unwrap();
        assert_eq!(settings.log_level, "debug");
    }
}

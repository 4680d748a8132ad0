//! Project configuration (`tsrsconfig.json`), per SPEC_FULL §2.3.
//!
//! Deserialized with `serde`/`serde_json`; CLI flags in [`crate::cli`]
//! override whatever a config file sets, which in turn overrides these
//! defaults. The core compiler never reads this module directly — it only
//! ever sees the plain [`crate::cli::CompilerOptions`] that `merge_with_cli`
//! produces.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "tsrsconfig.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{path}' is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The subset of `compilerOptions` this crate understands, matching the CLI
/// flag names so `--target`/`--strict`/etc. shadow whatever the file sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptionsConfig {
    pub target: Option<String>,
    pub module: Option<String>,
    pub strict: Option<bool>,
    pub no_emit: Option<bool>,
    pub out_dir: Option<String>,
    pub declaration: Option<bool>,
    #[serde(default)]
    pub lib: Vec<String>,
    pub jsx: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub es_module_interop: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptionsConfig,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ProjectConfig {
    pub fn recommended() -> Self {
        ProjectConfig {
            compiler_options: CompilerOptionsConfig {
                target: Some("es2022".to_string()),
                module: Some("esnext".to_string()),
                strict: Some(true),
                ..Default::default()
            },
            include: vec!["src/**/*.ts".to_string()],
            exclude: vec!["node_modules".to_string()],
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Matches a path against `include`/`exclude` using simple prefix/suffix
    /// glob semantics (`*` only at the start or end of a segment) per
    /// SPEC_FULL §2.3 — full glob matching is out of scope for the core.
    pub fn matches(&self, file_name: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|pat| glob_like_match(pat, file_name));
        let excluded = self.exclude.iter().any(|pat| glob_like_match(pat, file_name));
        included && !excluded
    }
}

fn glob_like_match(pattern: &str, file_name: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix("/**/*.ts") {
        return file_name.starts_with(prefix) && file_name.ends_with(".ts");
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return file_name.starts_with(prefix);
    }
    file_name == pattern || file_name.starts_with(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommended_config_round_trips_through_json() {
        let cfg = ProjectConfig::recommended();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ProjectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.compiler_options.target, Some("es2022".to_string()));
        assert_eq!(back.include, vec!["src/**/*.ts".to_string()]);
    }

    #[test]
    fn include_exclude_matching() {
        let cfg = ProjectConfig {
            include: vec!["src/**/*.ts".to_string()],
            exclude: vec!["src/generated".to_string()],
            ..Default::default()
        };
        assert!(cfg.matches("src/app.ts"));
        assert!(!cfg.matches("src/generated/x.ts"));
        assert!(!cfg.matches("lib/app.ts"));
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = ProjectConfig::load(Path::new("/nonexistent/tsrsconfig.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let dir = std::env::temp_dir().join("tsrs_config_test_malformed");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tsrsconfig.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = ProjectConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}

//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, ServerConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local override and is returned
/// whether or not it exists, so loading a missing explicit path fails.
/// Returns paths in load order (system, user, local/cli). Discovered files
/// are only returned when they exist.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/toolhouse-mcp/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("toolhouse-mcp/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("toolhouse-mcp.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load `files` in order over the defaults, then overlay the environment.
pub fn load_layers<F>(files: &[PathBuf], lookup: &F) -> Result<(ServerConfig, ConfigSources), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut sources = ConfigSources::default();
    let mut merged = toml::Table::new();

    for path in files {
        let table = read_table(path)?;
        merge_tables(&mut merged, table);
        sources.files.push(path.clone());
    }

    let mut config: ServerConfig =
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse {
                path: files.last().cloned().unwrap_or_default(),
                message: e.to_string(),
            })?;

    apply_env_overrides(&mut config, &mut sources, lookup);

    Ok((config, sources))
}

/// Read a TOML file into a raw table.
fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge `overlay` into `base`; nested tables merge key by key, everything
/// else is replaced.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let incoming = match value {
            toml::Value::Table(incoming) => incoming,
            other => {
                base.insert(key, other);
                continue;
            }
        };
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key, toml::Value::Table(incoming));
    }
}

/// Environment lookup backed by the process environment. Empty values count
/// as unset.
pub fn process_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides<F>(config: &mut ServerConfig, sources: &mut ConfigSources, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut take = |name: &str| -> Option<String> {
        let value = lookup(name)?;
        sources.env_overrides.push(name.to_string());
        Some(value)
    };

    // Credentials
    if let Some(v) = take("TOOLHOUSE_API_KEY") {
        config.toolhouse.api_key = v;
    }
    if let Some(v) = take("GROQ_API_KEY") {
        config.groq.api_key = v;
    }

    // Toolhouse
    if let Some(v) = take("TOOLHOUSE_BUNDLE_NAME") {
        config.toolhouse.bundle = v;
    }
    if let Some(v) = take("TOOLHOUSE_BASE_URL") {
        config.toolhouse.base_url = v;
    }
    if let Some(v) = take("TOOLHOUSE_USER_ID") {
        config.toolhouse.user_id = Some(v);
    }

    // Groq
    if let Some(v) = take("GROQ_BASE_URL") {
        config.groq.base_url = v;
    }
    if let Some(v) = take("GROQ_MODEL") {
        config.groq.model = v;
    }
    if let Some(v) = lookup("GROQ_MAX_TOKENS") {
        if let Ok(n) = v.parse() {
            config.groq.max_tokens = n;
            sources.env_overrides.push("GROQ_MAX_TOKENS".to_string());
        }
    }

    // Logging
    if let Some(v) = lookup("TOOLHOUSE_MCP_LOG_LEVEL") {
        config.logging.level = v;
        sources.env_overrides.push("TOOLHOUSE_MCP_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.logging.level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
    if let Some(v) = lookup("TOOLHOUSE_MCP_LOG_FILE") {
        config.logging.file = v;
        sources.env_overrides.push("TOOLHOUSE_MCP_LOG_FILE".to_string());
    }
    if let Some(v) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.logging.otlp_endpoint = Some(v);
        sources.env_overrides.push("OTEL_EXPORTER_OTLP_ENDPOINT".to_string());
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        let (var_name, rest) = match stripped.find('/') {
            Some(pos) => (&stripped[..pos], Some(&stripped[pos + 1..])),
            None => (stripped, None),
        };
        if let Ok(value) = env::var(var_name) {
            let base = PathBuf::from(value);
            return match rest {
                Some(rest) => base.join(rest),
                None => base,
            };
        }
    }

    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write_toml(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/test/path");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_defaults_without_files_or_env() {
        let (config, sources) = load_layers(&[], &env_from(&[])).unwrap();
        assert_eq!(config.toolhouse.bundle, "mcp-toolhouse");
        assert!(sources.files.is_empty());
        assert!(sources.env_overrides.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_toml(
            &dir,
            "partial.toml",
            r#"
[groq]
model = "llama-3.1-8b-instant"
"#,
        );

        let (config, sources) = load_layers(&[path.clone()], &env_from(&[])).unwrap();
        assert_eq!(config.groq.model, "llama-3.1-8b-instant");
        assert_eq!(config.groq.max_tokens, 1024);
        assert_eq!(config.toolhouse.base_url, "https://api.toolhouse.ai/v1");
        assert_eq!(sources.files, vec![path]);
    }

    #[test]
    fn test_later_files_win_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let user = write_toml(
            &dir,
            "user.toml",
            r#"
[toolhouse]
bundle = "research"
user_id = "alice"

[logging]
level = "debug"
"#,
        );
        let local = write_toml(
            &dir,
            "local.toml",
            r#"
[toolhouse]
bundle = "coding"
"#,
        );

        let (config, _) = load_layers(&[user, local], &env_from(&[])).unwrap();
        assert_eq!(config.toolhouse.bundle, "coding");
        assert_eq!(config.toolhouse.user_id.as_deref(), Some("alice"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_toml(
            &dir,
            "config.toml",
            r#"
[toolhouse]
bundle = "from-file"
"#,
        );

        let env = env_from(&[
            ("TOOLHOUSE_API_KEY", "th-secret"),
            ("GROQ_API_KEY", "gsk-secret"),
            ("TOOLHOUSE_BUNDLE_NAME", "from-env"),
            ("GROQ_MAX_TOKENS", "2048"),
        ]);

        let (config, sources) = load_layers(&[path], &env).unwrap();
        assert_eq!(config.toolhouse.api_key, "th-secret");
        assert_eq!(config.groq.api_key, "gsk-secret");
        assert_eq!(config.toolhouse.bundle, "from-env");
        assert_eq!(config.groq.max_tokens, 2048);
        assert!(sources.env_overrides.contains(&"TOOLHOUSE_BUNDLE_NAME".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparseable_max_tokens_is_ignored() {
        let (config, sources) =
            load_layers(&[], &env_from(&[("GROQ_MAX_TOKENS", "lots")])).unwrap();
        assert_eq!(config.groq.max_tokens, 1024);
        assert!(sources.env_overrides.is_empty());
    }

    #[test]
    fn test_bad_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_toml(&dir, "broken.toml", "[groq\nmodel = ");

        let err = load_layers(&[path.clone()], &env_from(&[])).unwrap_err();
        match err {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files_with_override(None);
    }

    #[test]
    fn test_missing_cli_path_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let files = discover_config_files_with_override(Some(&missing));
        assert_eq!(files.last(), Some(&missing));

        let err = load_layers(&files, &env_from(&[])).unwrap_err();
        match err {
            ConfigError::FileRead { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {}", other),
        }
    }
}

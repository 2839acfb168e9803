//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// TOML-style file configuration for image-downloader defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Default directory for archives and saved images.
    pub output_dir: Option<PathBuf>,
    /// History database path.
    pub history_db: Option<PathBuf>,
    /// Pixabay API key.
    pub pixabay_api_key: Option<String>,
    /// Gemini API key (Google/Imagen and footy renders).
    pub gemini_api_key: Option<String>,
    /// Default images per keyword (1..=100).
    pub images_per_keyword: Option<u32>,
    /// Default pages of links for the footy source (1..=50).
    pub max_pages: Option<u32>,
    /// Payload fetches in flight during archive export (1..=16).
    pub archive_concurrency: Option<u8>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_range("images_per_keyword", self.images_per_keyword, 1, 100)?;
        validate_range("max_pages", self.max_pages, 1, 50)?;
        validate_range(
            "archive_concurrency",
            self.archive_concurrency.map(u32::from),
            1,
            16,
        )?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if self.pixabay_api_key.as_deref().is_some_and(str::is_empty) {
            bail!("Invalid config value for `pixabay_api_key`: must not be empty");
        }
        if self.gemini_api_key.as_deref().is_some_and(str::is_empty) {
            bail!("Invalid config value for `gemini_api_key`: must not be empty");
        }
        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u32>, min: u32, max: u32) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/image-downloader/config.toml`
/// 2. `$HOME/.config/image-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("image-downloader")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("image-downloader")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig { path, config: None });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig { path, config: None });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "output_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `output_dir` value on line {line_no}"))?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "history_db" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `history_db` value on line {line_no}"))?;
                cfg.history_db = Some(PathBuf::from(parsed));
            }
            "pixabay_api_key" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `pixabay_api_key` value on line {line_no}")
                })?;
                cfg.pixabay_api_key = Some(parsed);
            }
            "gemini_api_key" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `gemini_api_key` value on line {line_no}"))?;
                cfg.gemini_api_key = Some(parsed);
            }
            "images_per_keyword" => {
                let parsed = parse_integer_u32(value).with_context(|| {
                    format!("Invalid `images_per_keyword` value on line {line_no}")
                })?;
                cfg.images_per_keyword = Some(parsed);
            }
            "max_pages" => {
                let parsed = parse_integer_u32(value)
                    .with_context(|| format!("Invalid `max_pages` value on line {line_no}"))?;
                cfg.max_pages = Some(parsed);
            }
            "archive_concurrency" => {
                let parsed = parse_integer_u8(value).with_context(|| {
                    format!("Invalid `archive_concurrency` value on line {line_no}")
                })?;
                cfg.archive_concurrency = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u32(raw_value: &str) -> Result<u32> {
    let value = parse_integer_u64(raw_value)?;
    u32::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u32"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
images_per_keyword = 8
verbosity = "verbose"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.images_per_keyword, Some(8));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert!(cfg.output_dir.is_none());
        assert!(cfg.pixabay_api_key.is_none());
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
output_dir = "/tmp/images"
history_db = "/tmp/history.db"
pixabay_api_key = "pk-123"
gemini_api_key = "gk-456"
images_per_keyword = 5
max_pages = 3
archive_concurrency = 4
connect_timeout_secs = 15
read_timeout_secs = 90
verbosity = "quiet"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/tmp/images")));
        assert_eq!(cfg.history_db, Some(PathBuf::from("/tmp/history.db")));
        assert_eq!(cfg.pixabay_api_key.as_deref(), Some("pk-123"));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("gk-456"));
        assert_eq!(cfg.max_pages, Some(3));
        assert_eq!(cfg.archive_concurrency, Some(4));
        assert_eq!(cfg.connect_timeout_secs, Some(15));
        assert_eq!(cfg.read_timeout_secs, Some(90));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Quiet));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_counts() {
        let err = parse_config_str("images_per_keyword = 101").expect_err("101 is above range");
        assert!(err.to_string().contains("images_per_keyword"));

        let err = parse_config_str("max_pages = 0").expect_err("0 is below range");
        assert!(err.to_string().contains("max_pages"));

        let err = parse_config_str("archive_concurrency = 17").expect_err("17 is above range");
        assert!(err.to_string().contains("archive_concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err =
            parse_config_str("max_pages = 4 trailing").expect_err("expected trailing token error");
        assert!(err.to_string().contains("max_pages"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_key() {
        let err = parse_config_str("pixabay_api_key = abc").expect_err("unquoted string");
        assert!(err.to_string().contains("pixabay_api_key"));
    }

    #[test]
    fn test_parse_config_rejects_empty_api_key() {
        let err = parse_config_str(r#"gemini_api_key = """#).expect_err("empty key");
        assert!(err.to_string().contains("gemini_api_key"));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
max_pages = 4 # pages
pixabay_api_key = "abc#def" # hash inside quotes is kept
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.max_pages, Some(4));
        assert_eq!(cfg.pixabay_api_key.as_deref(), Some("abc#def"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err =
            parse_config_str("connect_timeout_secs = 0").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_verbosity() {
        let err = parse_config_str(r#"verbosity = "loud""#).expect_err("unknown verbosity");
        assert!(err.to_string().contains("verbosity"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("unknown_key = 123").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("unknown_key"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("max_pages 4").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }
}

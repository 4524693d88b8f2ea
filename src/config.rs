//! Forward engine configuration loading.
//!
//! TOML is the sole config source; no environment variable overrides.
//!
//! # Required fields
//! - `jobs_path`
//!
//! All other fields fall back to documented defaults.

use serde::Deserialize;
use std::path::Path;

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Config types (validated, fully populated)
// ---------------------------------------------------------------------------

/// Top-level forward engine configuration.
#[derive(Debug, Clone)]
pub struct ForwardConfig {
    /// Default mode for jobs that don't specify their own.
    pub mode: crate::model::Mode,
    pub dry_run: bool,
    pub silent: bool,
    /// Upload chunk size hint forwarded to the uploader, in KiB.
    pub part_size_kb: u32,
    /// Cap on siblings fetched per album.
    pub album_fetch_page_size: usize,
    /// Path to the JSONL job source consumed by the CLI.
    pub jobs_path: String,
}

// ---------------------------------------------------------------------------
// Raw TOML deserialization type (with Option for optional fields)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawConfig {
    mode: Option<String>,
    dry_run: Option<bool>,
    silent: Option<bool>,
    part_size_kb: Option<u32>,
    album_fetch_page_size: Option<usize>,
    jobs_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load config from a path.
pub fn load_config_from_path(path: &Path) -> Result<ForwardConfig, ConfigError> {
    let toml_str = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("reading config file '{}': {e}", path.display())))?;
    load_config_from_str(&toml_str)
}

/// Load config from a TOML string.
pub fn load_config_from_str(toml_str: &str) -> Result<ForwardConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let mode = match raw.mode {
        Some(s) => s
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("mode: unknown mode '{s}'")))?,
        None => crate::model::Mode::Direct,
    };

    let jobs_path = raw
        .jobs_path
        .ok_or_else(|| ConfigError::MissingField("jobs_path".to_owned()))?;
    if jobs_path.is_empty() {
        return Err(ConfigError::InvalidValue("jobs_path must not be empty".to_owned()));
    }

    Ok(ForwardConfig {
        mode,
        dry_run: raw.dry_run.unwrap_or(false),
        silent: raw.silent.unwrap_or(false),
        part_size_kb: raw.part_size_kb.unwrap_or(512),
        album_fetch_page_size: raw.album_fetch_page_size.unwrap_or(100),
        jobs_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_jobs_path_is_an_error() {
        let err = load_config_from_str("mode = \"direct\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "jobs_path"));
    }

    #[test]
    fn defaults_fill_every_optional_field() {
        let cfg = load_config_from_str("jobs_path = \"jobs.jsonl\"\n").unwrap();
        assert_eq!(cfg.mode, crate::model::Mode::Direct);
        assert!(!cfg.dry_run);
        assert!(!cfg.silent);
        assert_eq!(cfg.part_size_kb, 512);
        assert_eq!(cfg.album_fetch_page_size, 100);
        assert_eq!(cfg.jobs_path, "jobs.jsonl");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = load_config_from_str(
            "mode = \"clone\"\ndry_run = true\nsilent = true\npart_size_kb = 256\nalbum_fetch_page_size = 10\njobs_path = \"x.jsonl\"\n",
        )
        .unwrap();
        assert_eq!(cfg.mode, crate::model::Mode::Clone);
        assert!(cfg.dry_run);
        assert!(cfg.silent);
        assert_eq!(cfg.part_size_kb, 256);
        assert_eq!(cfg.album_fetch_page_size, 10);
    }

    #[test]
    fn unknown_mode_is_an_invalid_value() {
        let err =
            load_config_from_str("mode = \"bogus\"\njobs_path = \"x.jsonl\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = load_config_from_str("not valid toml =====").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_an_actual_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"jobs_path = \"jobs.jsonl\"\n").unwrap();
        let cfg = load_config_from_path(file.path()).unwrap();
        assert_eq!(cfg.jobs_path, "jobs.jsonl");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config_from_path(Path::new("/nonexistent/forward.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

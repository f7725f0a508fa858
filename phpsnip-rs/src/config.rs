//! `phpsnip.conf` configuration file parser.
//!
//! The file is a list of `key = value` lines:
//!
//! | Key              | Value                                   | Default |
//! |------------------|-----------------------------------------|---------|
//! | `bool_style`     | `php` (`1` / empty) or `word`           | `php`   |
//! | `max_call_depth` | integer from 1 to 1024                  | `256`   |
//! | `log`            | tracing filter, e.g. `phpsnip=debug`    | unset   |
//!
//! Lines starting with `;` or `#` are comments.  Values may be wrapped in
//! double quotes.

use std::path::Path;

use thiserror::Error;

use crate::script::interp::{Options, DEFAULT_MAX_CALL_DEPTH, MAX_CALL_DEPTH_LIMIT};
use crate::script::value::BoolStyle;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bool_style: BoolStyle,
    pub max_call_depth: usize,
    /// Log filter directives; the `PHPSNIP_LOG` environment variable wins.
    pub log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bool_style: BoolStyle::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            log: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Bad lines are reported and skipped; every other setting still applies.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected 'key = value', found '{line}'"),
                });
                continue;
            };
            let key = key.trim();
            let value = unquote(value.trim());

            if let Err(message) = config.apply(key, value) {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// Set one key.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "bool_style" => self.bool_style = value.parse()?,
            "max_call_depth" => {
                self.max_call_depth = match value.parse::<usize>() {
                    Ok(n) if (1..=MAX_CALL_DEPTH_LIMIT).contains(&n) => n,
                    _ => {
                        return Err(format!(
                            "max_call_depth must be between 1 and {MAX_CALL_DEPTH_LIMIT}, got '{value}'"
                        ))
                    }
                }
            }
            "log" => self.log = (!value.is_empty()).then(|| value.to_owned()),
            other => return Err(format!("unknown setting '{other}'")),
        }
        Ok(())
    }

    /// Interpreter options derived from this config.
    pub fn options(&self) -> Options {
        Options {
            bool_style: self.bool_style,
            max_call_depth: self.max_call_depth,
        }
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_is_default() {
        let (cfg, errs) = Config::load_str("");
        assert!(errs.is_empty());
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.options(), Options::default());
    }

    #[test]
    fn all_settings() {
        let (cfg, errs) = Config::load_str(
            "; runner settings\nbool_style = word\nmax_call_depth = 32\n# logging\nlog = \"phpsnip=debug\"\n",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.bool_style, BoolStyle::Word);
        assert_eq!(cfg.max_call_depth, 32);
        assert_eq!(cfg.log.as_deref(), Some("phpsnip=debug"));
        assert_eq!(cfg.options().max_call_depth, 32);
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let (cfg, errs) = Config::load_str(
            "bool_style = maybe\nmax_call_depth = 0\nnonsense\ncolour = red\nmax_call_depth = 8",
        );
        assert_eq!(cfg.bool_style, BoolStyle::Php);
        assert_eq!(cfg.max_call_depth, 8);
        let lines: Vec<usize> = errs.iter().map(|e| e.line).collect();
        assert_eq!(lines, [1, 2, 3, 4]);
        assert!(errs[3].to_string().contains("unknown setting 'colour'"));
    }

    #[test]
    fn call_depth_is_capped() {
        let (cfg, errs) = Config::load_str("max_call_depth = 100000");
        assert_eq!(cfg.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("between 1 and 1024"), "{errs:?}");

        let (cfg, errs) = Config::load_str(&format!("max_call_depth = {MAX_CALL_DEPTH_LIMIT}"));
        assert!(errs.is_empty());
        assert_eq!(cfg.max_call_depth, MAX_CALL_DEPTH_LIMIT);
    }

    #[test]
    fn empty_log_clears() {
        let (cfg, errs) = Config::load_str("log = debug\nlog =");
        assert!(errs.is_empty());
        assert_eq!(cfg.log, None);
    }

    #[test]
    fn load_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bool_style = word").unwrap();
        let (cfg, errs) = Config::load_file(file.path()).unwrap();
        assert!(errs.is_empty());
        assert_eq!(cfg.bool_style, BoolStyle::Word);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_file(&dir.path().join("absent.conf")).is_err());
    }
}

//! Command-line argument parsing.
//!
//! Usage:
//!   phpsnip [-c <file>] [--bool-style php|word] [--dump-ast] [-v...] <file>...
//!   phpsnip [-c <file>] [--bool-style php|word] [-v...] -e <code>

use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;

use crate::script::value::BoolStyle;

/// Name of the config file searched for when `-c` is not given.
pub const CONFIG_FILE_NAME: &str = "phpsnip.conf";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Parser, Debug, Default, PartialEq)]
#[command(name = "phpsnip")]
#[command(about = "Run PHP-style snippet scripts and print their output")]
#[command(version)]
pub struct Cli {
    /// Script files to run, each in a fresh interpreter.
    #[arg(value_name = "FILE", required_unless_present = "eval")]
    pub files: Vec<PathBuf>,

    /// Run this code instead of reading files.
    #[arg(short, long, value_name = "CODE", conflicts_with = "files")]
    pub eval: Option<String>,

    /// Config file to load instead of searching for `phpsnip.conf`.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How booleans render in output (`php` or `word`).
    #[arg(long, value_name = "STYLE", value_parser = parse_bool_style)]
    pub bool_style: Option<BoolStyle>,

    /// Print the parsed program and exit without running it.
    #[arg(long)]
    pub dump_ast: bool,

    /// Raise log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter implied by the `-v` count, if any.
    pub fn verbosity_filter(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("phpsnip=debug"),
            _ => Some("phpsnip=trace"),
        }
    }
}

fn parse_bool_style(s: &str) -> Result<BoolStyle, String> {
    s.parse()
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Standard config locations, in search order: the working directory, then
/// the per-user config directory.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".").join(CONFIG_FILE_NAME)];
    if let Some(dirs) = ProjectDirs::from("", "", "phpsnip") {
        paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    paths
}

/// Search for the user config file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    config_search_paths().into_iter().find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

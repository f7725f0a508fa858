//! Runner for PHP-style snippet scripts.

pub mod cli;
pub mod config;
pub mod script;

use std::io::Write;
use std::path::Path;
use std::process;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use phpsnip::cli::{self, Cli};
use phpsnip::config::Config;
use phpsnip::script::{parse_script, Interpreter, Options, ScriptError};

/// Environment variable holding log filter directives.
const LOG_ENV: &str = "PHPSNIP_LOG";

fn main() {
    let args = Cli::parse();

    // ── Config: explicit `-c`, else the first file found on the search path ──
    let mut failed = false;
    let config_path = args.config.clone().or_else(cli::find_user_config);
    let (mut config, config_errors) = match &config_path {
        Some(path) => match Config::load_file(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("phpsnip: {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => (Config::default(), Vec::new()),
    };
    if let Some(style) = args.bool_style {
        config.bool_style = style;
    }

    init_tracing(args.verbosity_filter(), config.log.as_deref());

    if let Some(path) = &config_path {
        debug!(path = %path.display(), "loaded config");
        for e in &config_errors {
            eprintln!("phpsnip: {}: {e}", path.display());
            failed = true;
        }
    }

    let options = config.options();

    // ── Scripts ───────────────────────────────────────────────────────────────
    if let Some(src) = &args.eval {
        failed |= !run_source("-e", src, options, args.dump_ast);
    } else {
        for path in &args.files {
            failed |= !run_file(path, options, args.dump_ast);
        }
    }

    if failed {
        process::exit(1);
    }
}

/// Install the stderr log subscriber.
///
/// Priority: `PHPSNIP_LOG` → `-v` count → `log` config key → warnings only.
fn init_tracing(verbosity: Option<&str>, config_log: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let directives = verbosity.or(config_log).unwrap_or("warn");
        EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_file(path: &Path, options: Options, dump_ast: bool) -> bool {
    match std::fs::read_to_string(path) {
        Ok(src) => run_source(&path.display().to_string(), &src, options, dump_ast),
        Err(e) => {
            eprintln!("phpsnip: {}: {e}", path.display());
            false
        }
    }
}

/// Run one script in a fresh interpreter and print its output.
/// Returns `false` if it failed.
fn run_source(label: &str, src: &str, options: Options, dump_ast: bool) -> bool {
    debug!(script = label, bytes = src.len(), "running");

    if dump_ast {
        return match parse_script(src) {
            Ok(program) => {
                println!("{program:#?}");
                true
            }
            Err(e) => {
                report(label, &ScriptError::Parse(e));
                false
            }
        };
    }

    let mut interp = Interpreter::with_options(options);
    let result = interp.exec_script(src);

    // Output produced before a failure is still printed.
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout
        .write_all(interp.output.as_str().as_bytes())
        .and_then(|()| stdout.flush())
    {
        warn!(error = %e, "writing output failed");
        return false;
    }
    drop(stdout);

    match result {
        Ok(()) => true,
        Err(e) => {
            report(label, &e);
            false
        }
    }
}

fn report(label: &str, e: &ScriptError) {
    eprintln!("phpsnip: {label}: {e}");
}

use std::{collections::HashMap, fs, path::PathBuf, process::exit, time::Instant};

use clap::Parser;
use sema::{
    display_error,
    errors::errors::Error,
    session::{FsLoader, Session, SessionOptions, MAX_INCLUDES},
};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "semac", version, about = "Semantic analyser for sema sources")]
struct Args {
    /// Source files, one compilation unit each.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Maximum number of `$include` directives per run.
    #[arg(long, default_value_t = MAX_INCLUDES)]
    max_includes: usize,

    /// Also analyse `@test` functions.
    #[arg(long)]
    testing: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() {
    init_logging();
    let args = Args::parse();

    let options = SessionOptions {
        max_includes: args.max_includes,
        testing: args.testing,
        ..SessionOptions::default()
    };
    let mut session = Session::new(options, Box::new(FsLoader));
    let mut sources = HashMap::new();
    let mut failed = false;

    let start = Instant::now();
    for path in &args.files {
        let file = path.display().to_string();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(reason) => {
                error!(file = %file, "failed to read: {}", reason);
                failed = true;
                continue;
            }
        };

        let added = session.add_source(&file, &content);
        sources.insert(file, content);

        if let Err(error) = added {
            report(&error, &mut sources);
            failed = true;
        }
    }

    if failed {
        exit(1);
    }
    debug!(files = args.files.len(), elapsed = ?start.elapsed(), "parsed");

    let analyse_start = Instant::now();
    session.analyse();
    debug!(elapsed = ?analyse_start.elapsed(), "analysed");

    let errors = session.diagnostics.take();
    for error in &errors {
        report(error, &mut sources);
    }

    if !errors.is_empty() {
        error!("analysis failed with {} error(s)", errors.len());
        exit(1);
    }

    info!(modules = session.modules.len(), elapsed = ?start.elapsed(), "analysis finished");
}

/// Shows an error against its source line. Included files are read on
/// first use.
fn report(error: &Error, sources: &mut HashMap<String, String>) {
    let file = error.get_position().1.as_str();

    if !sources.contains_key(file) {
        let content = fs::read_to_string(file).unwrap_or_default();
        sources.insert(file.to_string(), content);
    }

    let content = sources.get(file).map(String::as_str).unwrap_or("");
    display_error(error, content);
}

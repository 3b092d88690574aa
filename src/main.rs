use std::path::PathBuf;

use clap::{CommandFactory, Parser as ClapParser, error::ErrorKind};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::{
    driver::{CompileError, CompileOptions, Dump},
    frontend::{SourceFile, import::DEFAULT_INCLUDE_PATH},
};

mod driver;
mod frontend;
mod index;
mod middle;

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Lunar source file to compile
    source_file: PathBuf,

    /// Print an intermediate form of the program
    #[arg(long, value_enum)]
    dump: Vec<Dump>,

    /// Write dumps to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Search this directory for imports before the default location
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,
}

fn main() {
    // Logging stays off unless asked for
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let args = Args::parse();

    if !args.source_file.exists() {
        Args::command()
            .error(
                ErrorKind::InvalidValue,
                format!("Source file '{}' does not exist!", args.source_file.display()),
            )
            .exit()
    }

    if !args.source_file.is_file() {
        Args::command()
            .error(
                ErrorKind::InvalidValue,
                format!("Input path '{}' is not a file!", args.source_file.display()),
            )
            .exit()
    }

    let mut include_paths = args.include;
    include_paths.push(PathBuf::from(DEFAULT_INCLUDE_PATH));

    let options = CompileOptions {
        include_paths,
        dumps: args.dump,
        output: args.output,
    };

    let source = match SourceFile::read(&args.source_file) {
        Ok(source) => source,
        Err(source) => report_error(
            None,
            &CompileError::Read {
                path: args.source_file,
                source,
            },
        ),
    };

    if let Err(error) = driver::compile(&source, &options) {
        report_error(Some(&source), &error);
    }
}

fn report_error(source: Option<&SourceFile>, error: &CompileError) -> ! {
    let message = format!("{}: {error}", "error".red().bold());

    #[cfg(feature = "error-backtrace")]
    let message = if error.is_internal() {
        format!(
            "{message}\n{}: {}",
            "backtrace".blue(),
            std::backtrace::Backtrace::force_capture()
        )
    } else {
        message
    };

    match (source, error.span()) {
        (Some(source), Some(span)) => {
            eprintln!(
                "{message} ({}:{}:{})",
                source.origin,
                source.row_for_position(span.start),
                source.column_for_position(span.start)
            );
            eprintln!("{}", source.highlight_span(span));
        }
        _ => eprintln!("{message}"),
    }

    std::process::exit(1);
}

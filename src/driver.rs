//! Runs the pipeline over one translation unit: parse (inlining imports),
//! check, lower, and write any requested dumps.

use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use clap::ValueEnum;
use thiserror::Error;
use tracing::debug;

use crate::{
    frontend::{
        SourceFile,
        import::ImportResolver,
        lexer::Span,
        parser::{ParseError, Parser},
    },
    middle::{
        ir::{self, IrGenError, ast_lowering},
        sema::{Sema, SemaError},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dump {
    /// The checked AST with imports inlined
    Ast,
    /// The lowered IR module
    Ir,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Import search directories, in lookup order
    pub include_paths: Vec<PathBuf>,
    pub dumps: Vec<Dump>,
    /// Dumps go to stdout when unset
    pub output: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Failed to read `{}`: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Sema(#[from] SemaError),
    #[error(transparent)]
    IrGen(#[from] IrGenError),
}

impl CompileError {
    /// Location in the main source file, if there is one
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Parse(error) => error.span(),
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        match self {
            CompileError::Sema(error) => error.is_internal(),
            CompileError::IrGen(error) => error.is_internal(),
            CompileError::Read { .. } | CompileError::Io(_) | CompileError::Parse(_) => false,
        }
    }
}

enum DumpSink {
    Stdout,
    File(File),
}

impl DumpSink {
    fn open(output: Option<&PathBuf>) -> io::Result<Self> {
        match output {
            Some(path) => Ok(DumpSink::File(File::create(path)?)),
            None => Ok(DumpSink::Stdout),
        }
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        match self {
            DumpSink::Stdout => io::stdout().lock().write_all(text.as_bytes()),
            // Colors only make sense on a terminal
            DumpSink::File(file) => file.write_all(strip_ansi_escapes::strip_str(text).as_bytes()),
        }
    }
}

/// Compiles `source` to IR, stopping at the first error
pub fn compile(source: &SourceFile, options: &CompileOptions) -> Result<ir::Module, CompileError> {
    let imports = ImportResolver::new(options.include_paths.clone());

    debug!("import search paths: {:?}", imports.search_paths());

    let ast = Parser::parse_ast(source, &imports)?;
    let ast = Sema::check_ast(ast)?;

    debug!("{} passed semantic analysis", source.origin);

    let module = ast_lowering::lower_to_ir(&ast)?;

    debug!(
        "lowered {} objects and {} functions",
        module.objects.len(),
        module.functions.len()
    );

    // The output file is only touched once the whole unit compiled
    if !options.dumps.is_empty() {
        let mut sink = DumpSink::open(options.output.as_ref())?;

        if options.dumps.contains(&Dump::Ast) {
            sink.write(&ast.to_string())?;
        }

        if options.dumps.contains(&Dump::Ir) {
            sink.write(&module.to_string())?;
        }
    }

    Ok(module)
}

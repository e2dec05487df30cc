use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use plzero::ast::Expr;
use plzero::compiler::{self, CompileError};
use plzero::diagnostic::{Diagnostic, OutputFormat, registry};
use plzero::vm::{self, RunError, RunOptions};
use plzero::{disasm, lexer, parser};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source file to run. Without a file or -e, starts the REPL.
    file: Option<PathBuf>,

    /// Run EXPR instead of a file.
    #[arg(short = 'e', long = "eval", value_name = "EXPR", conflicts_with = "file", allow_hyphen_values = true)]
    eval: Option<String>,

    /// Print an intermediate form instead of running.
    #[arg(long, value_enum)]
    emit: Option<Emit>,

    /// Trace every instruction to stderr.
    #[arg(long)]
    trace: bool,

    /// Diagnostics as JSON, one object per line.
    #[arg(long, conflicts_with_all = ["text", "ansi"])]
    json: bool,

    /// Diagnostics as plain text.
    #[arg(long, conflicts_with = "ansi")]
    text: bool,

    /// Diagnostics with ANSI colour.
    #[arg(long)]
    ansi: bool,

    /// Explain an error code, e.g. PL0-R002.
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,

    /// List every error code with a one-line summary.
    #[arg(long)]
    list_errors: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Emit {
    /// Syntax tree as JSON.
    Ast,
    /// Syntax tree in parenthesized prefix form.
    Npn,
    /// Disassembled bytecode.
    Bytecode,
}

impl Cli {
    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.text {
            OutputFormat::Text
        } else if self.ansi || io::stderr().is_terminal() {
            OutputFormat::Ansi
        } else {
            OutputFormat::Text
        }
    }
}

fn report(d: &Diagnostic, format: OutputFormat) -> ExitCode {
    let _ = format.write_to(d, &mut io::stderr().lock());
    ExitCode::FAILURE
}

fn explain(code: &str, format: OutputFormat) -> ExitCode {
    match registry::lookup(code) {
        Some(entry) => {
            print!("{}", entry.long);
            ExitCode::SUCCESS
        }
        None => report(
            &Diagnostic::error(format!("unknown error code '{code}'"))
                .with_suggestion("Codes look like PL0-L001, PL0-P003, PL0-C002 or PL0-R005."),
            format,
        ),
    }
}

fn list_errors() -> ExitCode {
    for entry in registry::REGISTRY {
        println!("{}  {}", entry.code, entry.short);
    }
    ExitCode::SUCCESS
}

fn front_end(source: &str) -> Result<Expr, CompileError> {
    let tokens = lexer::lex(source)?;
    Ok(parser::parse(tokens)?)
}

fn emit(kind: Emit, source: &str, name: &str, format: OutputFormat) -> ExitCode {
    let compile_failure = |error: CompileError| {
        let err = RunError::Compile { error, source_code: source.to_string() };
        report(&err.diagnostic(), format)
    };

    match kind {
        Emit::Ast | Emit::Npn => {
            let expr = match front_end(source) {
                Ok(expr) => expr,
                Err(e) => return compile_failure(e),
            };
            if kind == Emit::Npn {
                println!("{}", expr);
                return ExitCode::SUCCESS;
            }
            match serde_json::to_string_pretty(&expr) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => report(&Diagnostic::error(format!("cannot serialize syntax tree: {e}")), format),
            }
        }
        Emit::Bytecode => {
            let chunk = match compiler::compile(source) {
                Ok(chunk) => chunk,
                Err(e) => return compile_failure(e),
            };
            match disasm::disassemble(&chunk, name, &mut io::stdout().lock()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => report(&Diagnostic::error(format!("cannot write disassembly: {e}")), format),
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.output_format();
    let options = RunOptions { trace: cli.trace, format };

    if cli.list_errors {
        return list_errors();
    }
    if let Some(code) = &cli.explain {
        return explain(code, format);
    }

    let (source, name) = match (cli.eval, cli.file) {
        (Some(expr), _) => (expr, "<inline>".to_string()),
        (None, Some(path)) => match cli.emit {
            None => {
                return match vm::runfile(&path, &mut io::stdout().lock(), &options) {
                    Ok(_) => ExitCode::SUCCESS,
                    Err(e) => report(&e.diagnostic(), format),
                };
            }
            Some(_) => match vm::read_source(&path) {
                Ok(source) => (source, path.display().to_string()),
                Err(e) => return report(&e.diagnostic(), format),
            },
        },
        (None, None) => {
            return match vm::repl(&mut io::stdin().lock(), &mut io::stdout().lock(), &options) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => report(&Diagnostic::error(format!("repl I/O failure: {e}")), format),
            };
        }
    };

    if let Some(kind) = cli.emit {
        return emit(kind, &source, &name, format);
    }

    match vm::interpret(&source, &options) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(e) => report(&e.diagnostic(), format),
    }
}

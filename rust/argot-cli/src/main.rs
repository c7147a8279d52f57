//! The `argot` command-line driver.
//!
//! Reads a parsed Source AST (JSON) from a file or stdin, compiles it for a
//! registered target, and writes the generated source. Warnings go to
//! stderr; exit codes distinguish usage errors (2) from compile errors (1).

mod config;

use argot_compiler::options::{CStandard, EmitOptions, IndentStyle, LineEnding};
use argot_compiler::registry::Registry;
use clap::{Parser, Subcommand};
use config::ConfigFile;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "argot",
    version,
    about = "Transpiles cryptographic JavaScript into C, Ruby, and TypeScript"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Source AST file (JSON); `-` reads stdin.
    input: Option<PathBuf>,

    /// Target language name (see `argot list-targets`).
    #[arg(short, long)]
    target: Option<String>,

    /// Output path; defaults to stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Module name used in diagnostics.
    #[arg(long, default_value = "module")]
    name: String,

    /// Indentation: tab, 2-space, or 4-space.
    #[arg(long)]
    indent: Option<IndentStyle>,

    /// Line ending: lf or crlf.
    #[arg(long)]
    line_ending: Option<LineEnding>,

    /// Suppress the generated-by banner and documentation comments.
    #[arg(long)]
    no_doc_comments: bool,

    /// Emit a shebang line (Ruby).
    #[arg(long)]
    shebang: bool,

    /// C standard: c89, c99, c11, c17, or c23.
    #[arg(long)]
    c_standard: Option<CStandard>,

    /// Emit defensive argument checks where the target supports them.
    #[arg(long)]
    safety_checks: bool,

    /// Use string keys instead of symbols in Ruby hashes.
    #[arg(long)]
    string_keys: bool,

    /// Config file with per-target option defaults.
    #[arg(long, default_value = "argot.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// List the registered targets.
    ListTargets,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Command::ListTargets)) {
        let registry = Registry::with_builtin_targets();
        for info in registry.list() {
            println!(
                "{:<12} .{:<4} v{:<7} {}",
                info.name, info.extension, info.version, info.description
            );
        }
        return ExitCode::SUCCESS;
    }

    let (Some(input), Some(target)) = (&cli.input, &cli.target) else {
        eprintln!("usage: argot <input.json> --target <name> [--out <file>]");
        return ExitCode::from(2);
    };

    let source_json = match read_input(input) {
        Ok(text) => text,
        Err(message) => {
            eprintln!("argot: {message}");
            return ExitCode::from(2);
        }
    };

    let options = match build_options(&cli, target) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("argot: {message}");
            return ExitCode::from(2);
        }
    };

    let source_ast = match serde_json::from_str(&source_json) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("argot: input is not valid JSON: {e}");
            return ExitCode::from(2);
        }
    };

    match argot_compiler::compile_named(&source_ast, &cli.name, target, Some(&options)) {
        Ok(output) => {
            for warning in &output.warnings {
                eprintln!("argot: {warning}");
            }
            match &cli.out {
                Some(path) => {
                    if let Err(e) = std::fs::write(path, &output.code) {
                        eprintln!("argot: cannot write {}: {e}", path.display());
                        return ExitCode::FAILURE;
                    }
                }
                None => print!("{}", output.code),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("argot: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(path: &PathBuf) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("cannot read stdin: {e}"))?;
        return Ok(text);
    }
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

/// Defaults < `argot.toml` < CLI flags.
fn build_options(cli: &Cli, target: &str) -> Result<EmitOptions, String> {
    let mut options = EmitOptions::default();
    if cli.config.exists() {
        let file = ConfigFile::load(&cli.config)?;
        file.apply(target, &mut options)?;
    }
    if let Some(indent) = cli.indent {
        options.indent = Some(indent);
    }
    if let Some(line_ending) = cli.line_ending {
        options.line_ending = line_ending;
    }
    if cli.no_doc_comments {
        options.doc_comments = false;
    }
    if cli.shebang {
        options.shebang = true;
    }
    if let Some(standard) = cli.c_standard {
        options.c_standard = standard;
    }
    if cli.safety_checks {
        options.safety_checks = true;
    }
    if cli.string_keys {
        options.symbol_keys = false;
    }
    Ok(options)
}

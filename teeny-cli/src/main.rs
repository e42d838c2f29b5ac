use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Once;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use teeny_core::{DEFAULT_OUTPUT, Token, TokenKind, compile_to_path, tokenize};
use tracing::info;

static TRACING_INIT: Once = Once::new();

/// Command line arguments for the Teeny compiler.
#[derive(Parser, Debug)]
#[command(version, about = "Compiles Teeny programs to C", long_about = None)]
struct Cli {
    #[arg(value_name = "INPUT", help = "Teeny source file to compile")]
    input: PathBuf,

    #[arg(
        short,
        long,
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT,
        help = "Where to write the generated C program"
    )]
    output: PathBuf,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "c",
        help = "Output format: c, tokens"
    )]
    emit: String,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                err.print().ok();
                process::exit(1);
            }
        },
    };
    execute(cli)
}

/// Installs a stderr log subscriber when `RUST_LOG` is set.
///
/// Try `RUST_LOG=teeny_core=trace` to see every grammar rule as it is parsed.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn execute(cli: Cli) -> Result<()> {
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read input file {}", cli.input.display()))?;

    match cli.emit.as_str() {
        "c" => {
            compile_to_path(&source, &cli.output)?;
            info!(input = %cli.input.display(), output = %cli.output.display(), "compiled");
            println!("Compiling completed: {}", cli.output.display());
        }
        "tokens" => {
            for token in tokenize(&source)? {
                println!("{}", format_token(&token));
            }
        }
        other => return Err(anyhow::anyhow!("unsupported emit format: {other}")),
    }

    Ok(())
}

fn format_token(token: &Token) -> String {
    match token.kind {
        TokenKind::Number | TokenKind::Ident => format!("{} {}", token.kind, token.text),
        TokenKind::String => format!("{} \"{}\"", token.kind, token.text),
        kind => kind.to_string(),
    }
}

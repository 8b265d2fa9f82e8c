//! dynval CLI - parse, evaluate and inspect value notation

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use dynval::{
    parse_json, parse_with_config, to_json_string, utils::CliDiagnostic, utils::ValueReport,
    EvalConfig, EvalError, Evaluator,
};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "dynval")]
#[command(version)]
#[command(about = "Parse and evaluate dynamic value notation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Reject identifiers instead of keeping them as expressions
    #[arg(long, global = true)]
    strict: bool,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Parse notation and print it back
    Parse {
        /// Notation text (reads from stdin if not provided)
        text: Option<String>,

        /// Print JSON instead of notation
        #[arg(long)]
        json: bool,

        /// Pretty print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Evaluate an operator expression and print the resulting literal
    Eval {
        /// Expression text (reads from stdin if not provided)
        text: Option<String>,
    },

    /// Print a JSON report describing the parsed value
    Inspect {
        /// Notation text (reads from stdin if not provided)
        text: Option<String>,
    },

    /// Read JSON and print it as notation
    Json {
        /// JSON file path (reads from stdin if not provided)
        file: Option<String>,
    },
}

#[cfg(feature = "cli")]
fn main() -> io::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let config = if cli.strict {
        EvalConfig::strict()
    } else {
        EvalConfig::default()
    };

    match cli.command {
        Commands::Parse { text, json, pretty } => {
            let input = read_text(text)?;
            let value = parse_with_config(&input, config).unwrap_or_else(|e| fail(&e, &input));
            if json {
                let out = to_json_string(&value, pretty).unwrap_or_else(|e| fail(&e, &input));
                println!("{}", out);
            } else {
                println!("{}", value.to_notation());
            }
        }
        Commands::Eval { text } => {
            let input = read_text(text)?;
            let literal = evaluate_input(&input, config).unwrap_or_else(|e| fail(&e, &input));
            println!("{}", literal);
        }
        Commands::Inspect { text } => {
            let input = read_text(text)?;
            let value = parse_with_config(&input, config).unwrap_or_else(|e| fail(&e, &input));
            println!("{}", ValueReport::new(&value).to_json_string());
        }
        Commands::Json { file } => {
            let input = match file {
                Some(path) => fs::read_to_string(path)?,
                None => read_stdin()?,
            };
            let value = parse_json(&input).unwrap_or_else(|e| fail(&e, &input));
            println!("{}", value.to_notation());
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn evaluate_input(input: &str, config: EvalConfig) -> Result<String, EvalError> {
    Evaluator::with_config(config).evaluate(input.trim())
}

#[cfg(feature = "cli")]
fn read_text(text: Option<String>) -> io::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => read_stdin(),
    }
}

#[cfg(feature = "cli")]
fn read_stdin() -> io::Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

#[cfg(feature = "cli")]
fn fail<T>(err: &EvalError, source: &str) -> T {
    let diagnostic = CliDiagnostic::from_error(err, source);
    log::debug!("{}", err.format_with_source(source));
    eprintln!("{}", diagnostic.colored());
    std::process::exit(1);
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install dynval --features cli");
    eprintln!("  dynval <parse|eval|inspect|json> [TEXT]");
}

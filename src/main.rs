//! opsplit - give every stateful operand its own value before model export
//!
//! # Usage
//!
//! ```bash
//! # Split merged stateful operands and write the result
//! opsplit split model.json -o model.split.json
//!
//! # Use a custom stateful operand table
//! opsplit split model.json -c opsplit.toml --show-ir
//!
//! # Show which operands are treated as stateful
//! opsplit policy -c opsplit.toml
//! ```

use clap::{Parser, Subcommand};
use compiler::config::{self, SplitConfig};
use compiler::error_codes;
use compiler::ir::dump::dump_module;
use compiler::ir::optimization::PassError;
use compiler::ir::validation::validate_stateful_operands;
use compiler::ir::IrModule;
use compiler::logging;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "opsplit")]
#[command(version = "0.1.0")]
#[command(about = "Split merged stateful operands in graph IR", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the split pass over an IR module
    Split {
        /// Path to the IR module (JSON)
        input: PathBuf,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the IR after the pass
        #[arg(long)]
        show_ir: bool,

        /// Skip validation after the pass
        #[arg(long)]
        no_verify: bool,

        /// Split functions concurrently
        #[arg(long)]
        parallel: bool,

        /// Increase log verbosity (-v info, -vv debug, -vvv trace)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },

    /// Print the effective stateful operand table
    Policy {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Split {
            input,
            config,
            output,
            show_ir,
            no_verify,
            parallel,
            verbose,
        } => {
            logging::init(verbose);
            split_file(input, config, output, show_ir, no_verify, parallel)
        }
        Commands::Policy { config, json } => {
            logging::init(0);
            show_policy(config, json)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn read_config(path: Option<&Path>) -> Result<SplitConfig, String> {
    match path {
        Some(path) => config::load_config(path),
        None => Ok(SplitConfig::default()),
    }
}

fn describe_pass_error(error: &PassError) -> String {
    match error {
        PassError::Failed { error, .. } => match error.help() {
            Some(help) => format!("{}\n  help: {}", error, help),
            None => error.to_string(),
        },
        PassError::Invalid { .. } => {
            format!("{}: {}", error_codes::format_error_code(error_codes::INVALID_IR), error)
        }
    }
}

fn split_file(
    input: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    show_ir: bool,
    no_verify: bool,
    parallel: bool,
) -> Result<(), String> {
    let mut config = read_config(config_path.as_deref())?;
    if no_verify {
        config.pipeline.verify = false;
    }
    if parallel {
        config.pipeline.parallel = true;
    }

    let content = std::fs::read_to_string(&input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;
    let mut module = IrModule::from_json(&content)?;
    log::info!(
        "loaded module {} with {} functions",
        module.name,
        module.functions.len()
    );

    let mut manager = config.pass_manager();
    let result = manager
        .run(&mut module)
        .map_err(|e| describe_pass_error(&e))?;

    if config.pipeline.verify {
        let policy = config.policy();
        for function in module.functions.values() {
            validate_stateful_operands(function, &policy).map_err(|errors| {
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
    }

    eprintln!(
        "{}: {} stateful operands checked, {} constants and {} dequantize pairs cloned",
        module.name,
        result.stat("stateful_operands"),
        result.stat("constants_cloned"),
        result.stat("dequantize_pairs_cloned")
    );

    if show_ir {
        println!("{}", dump_module(&module));
    }

    let json = module.to_json()?;
    match output {
        Some(path) => std::fs::write(&path, json)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?,
        None if !show_ir => println!("{}", json),
        None => {}
    }

    Ok(())
}

fn show_policy(config_path: Option<PathBuf>, json: bool) -> Result<(), String> {
    let config = read_config(config_path.as_deref())?;
    let entries = config.policy().effective_entries();

    if json {
        let table: serde_json::Map<String, serde_json::Value> = entries
            .into_iter()
            .map(|(name, indices)| (name, serde_json::Value::from(indices)))
            .collect();
        let text = serde_json::to_string_pretty(&table)
            .map_err(|e| format!("Failed to serialize policy: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    if entries.is_empty() {
        println!("no stateful operations");
        return Ok(());
    }
    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, indices) in entries {
        println!("{:width$}  {:?}", name, indices, width = width);
    }
    Ok(())
}

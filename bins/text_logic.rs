//! English → propositional logic CLI
//!
//! Usage:
//!   text_logic translate "If I play hockey, then I don't gamble."
//!   text_logic clause --file lease.txt --json
//!   text_logic argument --notation solver --file argument.txt
//!   text_logic --config config/text_logic.toml translate --file essay.txt

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use text_logic::config::Config;
use text_logic::logic::{Argument, ExactOracle, Notation, Registry};

#[derive(Parser)]
#[command(name = "text_logic")]
#[command(about = "Translate English sentences into propositional logic")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output notation: rules, solver or symbolic
    #[arg(long, global = true)]
    notation: Option<Notation>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate each sentence with the rule table
    Translate {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Assemble formulas from contract-style clauses, one per line
    Clause {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Translate sentences and print the solver argument line
    Argument {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn read_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input from {:?}", path));
    }
    match text {
        Some(text) => Ok(text),
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin"),
    }
}

fn print_registry(registry: &Registry) {
    println!("\n=== Propositions ===");
    for p in registry.propositions() {
        println!("{}: {}", p.symbol, p.text);
    }
}

fn run_translate(config: &Config, notation: Notation, input: &str, as_json: bool) -> Result<()> {
    let translator = config.translator()?;
    let mut registry = config.registry(Box::new(ExactOracle))?;
    let sentences = translator.translate_document(input, &mut registry)?;

    if as_json {
        let rendered: Vec<_> = sentences
            .iter()
            .map(|s| json!({ "english": s.english, "formula": s.formula.render(notation) }))
            .collect();
        let out = json!({ "sentences": rendered, "propositions": registry });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for s in &sentences {
        println!("{}", s.english);
        println!("  {}", s.formula.render(notation));
    }
    print_registry(&registry);
    Ok(())
}

fn run_clause(config: &Config, notation: Notation, input: &str, as_json: bool) -> Result<()> {
    let mut assembler = config.assembler()?;
    let mut registry = config.registry(Box::new(ExactOracle))?;

    let mut results = Vec::new();
    for clause in input.lines().filter(|l| !l.trim().is_empty()) {
        results.push(assembler.process_clause(clause, &mut registry, None)?);
    }

    if as_json {
        let out = json!({ "clauses": results, "propositions": registry });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for result in &results {
        println!("[{}]", result.clause_hash);
        for premise in &result.premises {
            println!("  {}", premise.formula.render(notation));
        }
        for note in &result.notes {
            println!("  note: {}", note);
        }
    }
    print_registry(&registry);
    Ok(())
}

fn run_argument(config: &Config, notation: Notation, input: &str, as_json: bool) -> Result<()> {
    let translator = config.translator()?;
    let mut registry = config.registry(Box::new(ExactOracle))?;
    let formulas = translator
        .translate_document(input, &mut registry)?
        .into_iter()
        .map(|s| s.formula)
        .collect();

    let Some(argument) = Argument::from_formulas(formulas) else {
        anyhow::bail!("No sentences to build an argument from");
    };
    let line = argument.render(notation);

    if as_json {
        let out = json!({ "argument": line, "propositions": registry });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", line);
        print_registry(&registry);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let notation = cli.notation.unwrap_or(config.output.notation);
    tracing::debug!("Using {} notation", notation.as_str());

    match cli.command {
        Commands::Translate { text, file } => {
            let input = read_input(text, file)?;
            run_translate(&config, notation, &input, cli.json)?;
        }
        Commands::Clause { text, file } => {
            let input = read_input(text, file)?;
            run_clause(&config, notation, &input, cli.json)?;
        }
        Commands::Argument { text, file } => {
            let input = read_input(text, file)?;
            run_argument(&config, notation, &input, cli.json)?;
        }
    }

    Ok(())
}

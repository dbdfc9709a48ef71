//! CLI for jsprimer.
//!
//! Usage:
//!   jsprimer run <file.js>            # Run a snippet file
//!   jsprimer eval "code"              # Run inline code
//!   jsprimer repl                     # Run snippets line by line
//!   jsprimer topics [--json]          # List the course topics
//!   jsprimer event-loop [--step N]    # Show the event-loop walkthrough

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jsprimer::config::Config;
use jsprimer::course::event_loop::{Step, PROGRAM, STEPS};
use jsprimer::course::topics;
use jsprimer::snippet::{ExecutionResult, SnippetExecutor};

#[derive(Parser)]
#[command(name = "jsprimer", version, about = "Run JavaScript teaching snippets")]
struct Cli {
    /// Configuration file (defaults to ./jsprimer.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a snippet file and print its output
    Run { file: PathBuf },
    /// Run inline code and print its output
    Eval { code: String },
    /// Read snippets from stdin, one per line
    Repl,
    /// List the course topics in order
    Topics {
        #[arg(long)]
        json: bool,
    },
    /// Print the event-loop walkthrough
    EventLoop(EventLoopArgs),
}

#[derive(Args)]
struct EventLoopArgs {
    /// Print a single step (1-based)
    #[arg(long, conflicts_with = "all")]
    step: Option<usize>,
    /// Print every step
    #[arg(long)]
    all: bool,
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    init_logging(&config.log.level);
    let executor = SnippetExecutor::new().with_limits(config.limits());

    match cli.command {
        Command::Run { file } => {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            Ok(report(executor.run(&source)))
        }
        Command::Eval { code } => Ok(report(executor.run(&code))),
        Command::Repl => {
            repl(&executor)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Topics { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(topics::all())?);
            } else {
                for topic in topics::all() {
                    println!("{:>2}. {:<14} {}", topic.order, topic.id, topic.title);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::EventLoop(args) => {
            event_loop(args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print a run's transcript; failures go to stderr and exit with 1.
fn report(result: ExecutionResult) -> ExitCode {
    match result {
        ExecutionResult::Success(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        ExecutionResult::Failure(text) => {
            eprintln!("{}", text);
            ExitCode::FAILURE
        }
    }
}

fn repl(executor: &SnippetExecutor) -> Result<()> {
    println!("jsprimer {}", env!("CARGO_PKG_VERSION"));
    println!("Each line runs as its own snippet. Type .exit to quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        stdout.flush()?;
        let line = match lines.next() {
            Some(line) => line.context("reading input")?,
            None => break,
        };
        let line = line.trim();
        if line == ".exit" || line == ".quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        println!("{}", executor.run(line));
    }
    Ok(())
}

fn event_loop(args: EventLoopArgs) -> Result<()> {
    let selected: Vec<(usize, &Step)> = match args.step {
        Some(n) => {
            if n == 0 || n > STEPS.len() {
                bail!("step must be between 1 and {}", STEPS.len());
            }
            vec![(n - 1, &STEPS[n - 1])]
        }
        None if args.all => STEPS.iter().enumerate().collect(),
        None => {
            println!("{}", PROGRAM.join("\n"));
            println!();
            for (i, step) in STEPS.iter().enumerate() {
                println!("{:>2}. {}", i + 1, step.name);
            }
            return Ok(());
        }
    };

    if args.json {
        let steps: Vec<&Step> = selected.iter().map(|(_, s)| *s).collect();
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }
    for (i, step) in selected {
        print_step(i, step);
    }
    Ok(())
}

fn print_step(index: usize, step: &Step) {
    println!("Step {}/{}: {}", index + 1, STEPS.len(), step.name);
    println!("  {}", step.description);
    if let Some(line) = step.code_line {
        println!("  line {}: {}", line, PROGRAM[line - 1].trim());
    }
    let panels = [
        ("Call Stack", step.call_stack),
        ("Web APIs", step.web_apis),
        ("Macrotask Queue", step.macrotask_queue),
        ("Microtask Queue", step.microtask_queue),
    ];
    for (title, items) in panels {
        if !items.is_empty() {
            println!("  {}: {}", title, items.join(", "));
        }
    }
    if let Some(output) = step.output {
        println!("  output: {}", output);
    }
    println!();
}

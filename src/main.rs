use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use lll_lsp::config::{DEFAULT_CHECKER, DEFAULT_CHECKER_TIMEOUT};
use lll_lsp::lint::LllChecker;
use lll_lsp::lsp::server::run_server;
use lll_lsp::task::{ConfiguredTask, LintTask, WorkspaceFolder, provide_tasks, resolve_task};

/// Language server for the lll line length linter
#[derive(Debug, Parser)]
#[command(name = "lll-lsp", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Checker executable
    #[arg(long, default_value = DEFAULT_CHECKER)]
    checker: String,

    /// Argument placed before `-l <length> <file>`; repeatable
    #[arg(long = "checker-arg", allow_hyphen_values = true)]
    checker_args: Vec<String>,

    /// Seconds before a checker run is abandoned
    #[arg(long, default_value_t = DEFAULT_CHECKER_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Accepted for clients that always pass it; stdio is the only transport
    #[arg(long, hide = true)]
    stdio: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the lint task of each workspace folder as JSON
    Tasks {
        /// Workspace folders, defaults to the current directory
        folders: Vec<PathBuf>,

        /// Run the tasks instead of printing them
        #[arg(long)]
        run: bool,
    },

    /// Resolve a task from the editor's task configuration and print it as JSON
    ResolveTask {
        /// Task entry as JSON, e.g. '{"type":"lll"}'; `-` reads it from stdin
        task: String,

        /// Workspace folder the task runs in, defaults to the current directory
        #[arg(long)]
        folder: Option<PathBuf>,

        /// Run the resolved task instead of printing it
        #[arg(long)]
        run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Tasks { folders, run }) => run_tasks(folders, run),
        Some(Command::ResolveTask { task, folder, run }) => run_resolve_task(&task, folder, run),
        None => {
            let checker = LllChecker::new(
                cli.checker,
                cli.checker_args,
                Duration::from_secs(cli.timeout_secs),
            );
            run_server(Arc::new(checker)).await
        }
    }
}

fn current_dir() -> anyhow::Result<PathBuf> {
    std::env::current_dir().context("Failed to read current directory")
}

fn run_tasks(folders: Vec<PathBuf>, run: bool) -> anyhow::Result<()> {
    let folders = if folders.is_empty() {
        vec![current_dir()?]
    } else {
        folders
    };
    let folders: Vec<WorkspaceFolder> = folders
        .into_iter()
        .map(WorkspaceFolder::from_path)
        .collect();
    let tasks = provide_tasks(&folders);

    if !run {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    let mut failed = 0;
    for task in &tasks {
        if !run_task(task)? {
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} lint tasks reported problems", failed, tasks.len());
    }
    Ok(())
}

fn run_resolve_task(task: &str, folder: Option<PathBuf>, run: bool) -> anyhow::Result<()> {
    let json = if task == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read task from stdin")?;
        buf
    } else {
        task.to_string()
    };

    let folder = match folder {
        Some(folder) => folder,
        None => current_dir()?,
    };
    let task = resolve_task(
        ConfiguredTask::from_json(&json)?,
        WorkspaceFolder::from_path(folder),
    )?;

    if !run {
        println!("{}", serde_json::to_string_pretty(&task)?);
        return Ok(());
    }

    if !run_task(&task)? {
        anyhow::bail!("Lint task {} reported problems", task.name);
    }
    Ok(())
}

/// Runs one task in the foreground; returns whether it succeeded
fn run_task(task: &LintTask) -> anyhow::Result<bool> {
    eprintln!("> {}", task.name);
    let status = task
        .execution
        .to_command()
        .status()
        .with_context(|| format!("Failed to run task {}", task.name))?;
    Ok(status.success())
}

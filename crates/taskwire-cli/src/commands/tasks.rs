//! Task subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::cli::ServiceArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct TasksCommand {
    #[command(subcommand)]
    pub command: TasksSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum TasksSubcommand {
    /// List your tasks
    List(ListArgs),

    /// Mark a task complete
    Complete(CompleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Page size
    #[arg(long)]
    pub limit: Option<u32>,

    /// Offset of the first task
    #[arg(long, default_value_t = 0, conflicts_with = "all")]
    pub offset: u64,

    /// Follow next links until every task is loaded
    #[arg(long)]
    pub all: bool,

    /// Output one JSON object per task
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Task id
    pub id: u64,
}

pub async fn handle(cmd: TasksCommand, service: &ServiceArgs) -> Result<()> {
    match cmd.command {
        TasksSubcommand::List(args) => list(args, service).await,
        TasksSubcommand::Complete(args) => complete(args, service).await,
    }
}

async fn list(args: ListArgs, service: &ServiceArgs) -> Result<()> {
    let client = session::logged_in(service)?;
    let limit = args.limit.unwrap_or(client.config().page_limit).max(1);

    let (tasks, next) = if args.all {
        let pager = taskwire_http::TaskPager::new(client.clone(), limit);
        pager.load_all().await.context("Failed to load tasks")?;
        (pager.tasks(), None)
    } else {
        let page = client
            .list_tasks(limit, args.offset)
            .await
            .context("Failed to load tasks")?;
        let next = page.next_offset();
        (page.results, next)
    };

    if tasks.is_empty() {
        eprintln!("{}", "No tasks found.".dimmed());
        return Ok(());
    }

    for task in &tasks {
        if args.json {
            output::json(task)?;
        } else {
            output::task_row(task);
        }
    }

    if let Some(offset) = next {
        eprintln!();
        eprintln!("{}: --offset {}", "More tasks".dimmed(), offset);
    }

    Ok(())
}

async fn complete(args: CompleteArgs, service: &ServiceArgs) -> Result<()> {
    let client = session::logged_in(service)?;

    client
        .complete_task(args.id)
        .await
        .with_context(|| format!("Failed to complete task {}", args.id))?;

    output::success(&format!("Task {} completed", args.id));
    Ok(())
}

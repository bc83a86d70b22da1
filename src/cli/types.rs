//! CLI command definitions (spec.md §6 control surface, exposed as a local
//! operator CLI rather than the out-of-scope HTTP transport).

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "foreman")]
#[command(about = "foreman - autonomous software-engineering pipeline supervisor", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output machine-readable JSON instead of a formatted table.
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the supervisor loop: scheduler, integration engine, seed engine,
    /// self-update, health monitor, and worktree GC.
    Run,

    /// Print a snapshot of active task / queue / in-flight-agent counts.
    Status,

    /// Task management.
    #[command(subcommand)]
    Task(TaskCommands),

    /// Integration queue inspection.
    #[command(subcommand)]
    Queue(QueueCommands),

    /// Proposal review (spec.md §4.6 feature-discovery/architecture-review
    /// proposals awaiting human approval).
    #[command(subcommand)]
    Proposal(ProposalCommands),

    /// Operator-tunable settings (spec.md §6 `PUT /settings` allow-list).
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Debug, Subcommand)]
pub enum TaskCommands {
    /// File a new backlog task.
    Create {
        title: String,
        description: String,
        /// Absolute path of a repo configured in `.foreman/config.yaml`.
        #[arg(long)]
        repo: String,
        #[arg(long, default_value = "")]
        notify_channel: String,
    },
    /// List tasks, defaulting to every active (non-terminal) task.
    List {
        /// One of backlog/spec/qa/qa_fix/impl/retry/rebase/done/merged/failed.
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one task's full detail, including its last error.
    Show { id: i64 },
    /// Send an exhausted/failed task back to backlog with a clean slate.
    Retry { id: i64 },
    /// Mark a task failed without further attempts.
    Cancel { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum QueueCommands {
    /// List queued integration entries for one repo.
    List { repo: String },
}

#[derive(Debug, Subcommand)]
pub enum ProposalCommands {
    /// List proposals, defaulting to `proposed` (awaiting review).
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Approve a proposal: files the task it describes and marks it approved.
    Approve { id: i64 },
    /// Dismiss a proposal without filing a task.
    Dismiss { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommands {
    /// Persist one allow-listed setting override (spec.md §6).
    Set { key: String, value: String },
}

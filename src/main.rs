//! foreman binary entry point (spec.md §1, §5 "single supervisor loop per
//! process"): loads configuration, connects the store, and either runs the
//! long-lived supervisor loop or dispatches a one-shot operator command.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::RwLock;
use tracing::info;

use foreman::adapters::codehost::GhCli;
use foreman::adapters::credentials::OAuthCredentialRefresher;
use foreman::adapters::git::GitCli;
use foreman::adapters::substrates::{ClaudeCodeConfig, ClaudeCodeSubstrate};
use foreman::cli::{commands, Cli, Commands, ProposalCommands, QueueCommands, SettingsCommands, TaskCommands};
use foreman::domain::ports::{NullNotifier, Substrate};
use foreman::infrastructure::config::ConfigLoader;
use foreman::infrastructure::logging;
use foreman::services::{health_monitor, scheduler, self_update, settings, worktree_gc};
use foreman::{PipelineContext, Store};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ConfigLoader::load().context("failed to load configuration")?;
    let _logging_guard = logging::init(&config.logging).context("failed to initialize logging")?;

    let store = Store::connect(&config.database.path).await.context("failed to connect to database")?;
    store.migrate().await.context("failed to run database migrations")?;
    settings::refresh(&*store.state, &mut config)
        .await
        .context("failed to apply persisted settings overrides")?;

    match cli.command {
        Commands::Status => return commands::status::show(&store, &config, cli.json).await,
        Commands::Task(cmd) => return dispatch_task(&store, cmd, cli.json).await,
        Commands::Queue(cmd) => return dispatch_queue(&store, cmd, cli.json).await,
        Commands::Proposal(cmd) => return dispatch_proposal(&store, cmd, cli.json).await,
        Commands::Settings(cmd) => return dispatch_settings(&store, cmd, cli.json).await,
        Commands::Run => {}
    }

    run_supervisor(store, config).await
}

async fn dispatch_task(store: &Store, cmd: TaskCommands, json: bool) -> Result<()> {
    match cmd {
        TaskCommands::Create { title, description, repo, notify_channel } => {
            commands::task::create(store, title, description, repo, notify_channel, json).await
        }
        TaskCommands::List { status } => commands::task::list(store, status, json).await,
        TaskCommands::Show { id } => commands::task::show(store, id, json).await,
        TaskCommands::Retry { id } => commands::task::retry(store, id, json).await,
        TaskCommands::Cancel { id } => commands::task::cancel(store, id, json).await,
    }
}

async fn dispatch_queue(store: &Store, cmd: QueueCommands, json: bool) -> Result<()> {
    match cmd {
        QueueCommands::List { repo } => commands::queue::list(store, repo, json).await,
    }
}

async fn dispatch_proposal(store: &Store, cmd: ProposalCommands, json: bool) -> Result<()> {
    match cmd {
        ProposalCommands::List { status } => commands::proposal::list(store, status, json).await,
        ProposalCommands::Approve { id } => commands::proposal::approve(store, id, json).await,
        ProposalCommands::Dismiss { id } => commands::proposal::dismiss(store, id, json).await,
    }
}

async fn dispatch_settings(store: &Store, cmd: SettingsCommands, json: bool) -> Result<()> {
    match cmd {
        SettingsCommands::Set { key, value } => commands::settings::set(store, key, value, json).await,
    }
}

/// Runs the long-lived supervisor: crash recovery, the scheduler (which also
/// drives the integration and seed engines), and the self-update,
/// health-monitor, and worktree-gc side loops, until `ctrl-c` or the
/// self-update supervisor arms and fires a restart.
async fn run_supervisor(store: Store, config: foreman::Config) -> Result<()> {
    store.reset_for_startup().await.context("crash recovery reset failed")?;

    let run_id = uuid::Uuid::new_v4();
    info!(%run_id, "foreman starting");

    let substrate = ClaudeCodeSubstrate::new(ClaudeCodeConfig {
        container_name_prefix: config.container_name_prefix.clone(),
        ..ClaudeCodeConfig::default()
    });
    if let Err(e) = substrate.sweep_stale_containers(&config.container_name_prefix).await {
        tracing::warn!(error = %e, "startup container sweep failed");
    }

    let ctx = PipelineContext {
        store,
        git: Arc::new(GitCli::new()),
        code_host: Arc::new(GhCli::new()),
        substrate: Arc::new(substrate),
        credentials: Arc::new(OAuthCredentialRefresher::new(config.credential_helper_command.clone())),
        notifier: Arc::new(NullNotifier),
        config: Arc::new(RwLock::new(config)),
        in_flight: Arc::new(AtomicUsize::new(0)),
    };

    let running = Arc::new(AtomicBool::new(true));
    let scheduler_handle = tokio::spawn(scheduler::run(ctx.clone(), running.clone()));
    tokio::spawn(self_update::run(ctx.clone(), running.clone()));
    tokio::spawn(health_monitor::run(ctx.clone(), running.clone()));
    tokio::spawn(worktree_gc::run(ctx.clone(), running.clone()));

    tokio::signal::ctrl_c().await.ok();
    info!("shutdown signal received");
    running.store(false, Ordering::SeqCst);

    let _ = scheduler_handle.await;
    info!("foreman stopped");
    Ok(())
}

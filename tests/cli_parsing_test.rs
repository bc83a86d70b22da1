//! Verifies the `clap` derive tree is well-formed and parses the operator
//! commands documented in spec.md §6.

use clap::{CommandFactory, Parser};
use foreman::cli::{Cli, Commands, ProposalCommands, QueueCommands, SettingsCommands, TaskCommands};

#[test]
fn cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn parses_task_create_with_flags() {
    let cli = Cli::try_parse_from([
        "foreman", "--json", "task", "create", "fix the bug", "it crashes on startup", "--repo", "/repo/a", "--notify-channel", "#eng",
    ])
    .expect("should parse");

    assert!(cli.json);
    match cli.command {
        Commands::Task(TaskCommands::Create { title, description, repo, notify_channel }) => {
            assert_eq!(title, "fix the bug");
            assert_eq!(description, "it crashes on startup");
            assert_eq!(repo, "/repo/a");
            assert_eq!(notify_channel, "#eng");
        }
        other => panic!("expected Task(Create), got a different command variant: {other:?}"),
    }
}

#[test]
fn parses_queue_list() {
    let cli = Cli::try_parse_from(["foreman", "queue", "list", "/repo/a"]).expect("should parse");
    match cli.command {
        Commands::Queue(QueueCommands::List { repo }) => assert_eq!(repo, "/repo/a"),
        other => panic!("expected Queue(List), got a different command variant: {other:?}"),
    }
}

#[test]
fn parses_proposal_approve() {
    let cli = Cli::try_parse_from(["foreman", "proposal", "approve", "7"]).expect("should parse");
    match cli.command {
        Commands::Proposal(ProposalCommands::Approve { id }) => assert_eq!(id, 7),
        other => panic!("expected Proposal(Approve), got a different command variant: {other:?}"),
    }
}

#[test]
fn parses_settings_set() {
    let cli = Cli::try_parse_from(["foreman", "settings", "set", "pipeline_max_agents", "8"]).expect("should parse");
    match cli.command {
        Commands::Settings(SettingsCommands::Set { key, value }) => {
            assert_eq!(key, "pipeline_max_agents");
            assert_eq!(value, "8");
        }
        other => panic!("expected Settings(Set), got a different command variant: {other:?}"),
    }
}

#[test]
fn status_and_run_take_no_arguments() {
    assert!(Cli::try_parse_from(["foreman", "status"]).is_ok());
    assert!(Cli::try_parse_from(["foreman", "run"]).is_ok());
}

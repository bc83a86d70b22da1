//! Seed / Proposal Engine (spec.md §4.6): fires when the scheduler observes
//! zero active tasks and zero active agents, rotating through five scan
//! modes and an operator-triggered triage pass.

use std::sync::atomic::Ordering;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::models::{
    Config, Persona, Proposal, RepoConfig, Task, TaskCreator, KEY_SEED_LAST_FIRE, KEY_SEED_MODE,
};
use crate::services::phases::{invoke_agent, session_dir};
use crate::services::PipelineContext;

struct SeedMode {
    name: &'static str,
    prompt: &'static str,
    is_proposal: bool,
}

const SEED_MODES: [SeedMode; 5] = [
    SeedMode {
        name: "refactoring",
        prompt: "Scan the repository for refactoring opportunities: duplicated logic, \
                 overly complex functions, or inconsistent patterns.",
        is_proposal: false,
    },
    SeedMode {
        name: "bug audit",
        prompt: "Scan the repository for latent bugs: unhandled error paths, off-by-one \
                 errors, or logic that contradicts its own documentation.",
        is_proposal: false,
    },
    SeedMode {
        name: "test coverage",
        prompt: "Scan the repository for undertested code paths and propose tests that \
                 would catch a real regression.",
        is_proposal: false,
    },
    SeedMode {
        name: "feature discovery",
        prompt: "Review the repository and propose new features that would plausibly be \
                 asked for next, given the existing functionality.",
        is_proposal: true,
    },
    SeedMode {
        name: "architecture review",
        prompt: "Review the repository's architecture for structural improvements: module \
                 boundaries, dependency direction, and abstraction leaks.",
        is_proposal: true,
    },
];

pub async fn maybe_run(ctx: &PipelineContext) {
    let active = ctx.store.tasks.active_task_count().await.unwrap_or(1);
    let in_flight = ctx.in_flight.load(Ordering::SeqCst);
    if active > 0 || in_flight > 0 {
        return;
    }

    let config = ctx.config_snapshot().await;
    let cooldown = config.seed_cooldown_s() as i64;
    let last = ctx.store.state.get_i64(KEY_SEED_LAST_FIRE, 0).await.unwrap_or(0);
    let now = Utc::now().timestamp();
    if now - last < cooldown {
        return;
    }

    let backlog_total = ctx.store.tasks.list_active().await.map(|v| v.len()).unwrap_or(0);
    if backlog_total >= config.pipeline_max_backlog {
        info!(backlog_total, cap = config.pipeline_max_backlog, "backlog cap reached, skipping seed");
        return;
    }

    let _ = ctx.store.state.set(KEY_SEED_LAST_FIRE, &now.to_string()).await;

    let Some(primary) = config.primary_repo().cloned() else {
        warn!("seed engine fired with no primary repo configured");
        return;
    };

    let mode = rotate_seed_mode(ctx).await;
    run_seed_mode(ctx, &config, &primary, &primary, mode).await;
    cross_pollinate(ctx, &config, &primary).await;
}

/// Returns the mode to run *this* firing, then advances the stored counter
/// to `(mode + 1) % 5` for the next one (spec.md §8 scenario 5).
async fn rotate_seed_mode(ctx: &PipelineContext) -> usize {
    let current = (ctx.store.state.get_i64(KEY_SEED_MODE, 0).await.unwrap_or(0) as usize) % 5;
    let next = (current + 1) % 5;
    let _ = ctx.store.state.set(KEY_SEED_MODE, &next.to_string()).await;
    current
}

async fn run_seed_mode(ctx: &PipelineContext, config: &Config, scan_repo: &RepoConfig, file_against: &RepoConfig, mode: usize) {
    let spec = &SEED_MODES[mode];
    let session_folder = format!("seed-{}", spec.name.replace(' ', "-"));
    let sessions = session_dir(&config.sessions_dir, 0).parent().map(std::path::Path::to_path_buf).unwrap_or_default().join(session_folder);
    let workdir = std::path::PathBuf::from(&scan_repo.path);

    let (start, end) = if spec.is_proposal { ("PROPOSAL_START", "PROPOSAL_END") } else { ("TASK_START", "TASK_END") };
    let prompt = format!(
        "{}\n\nFor each idea, emit a block exactly as:\n{start}\nTITLE: <short title>\nDESCRIPTION: <what to do>\n{}{end}\n",
        spec.prompt,
        if spec.is_proposal { "RATIONALE: <why this matters>\n" } else { "" },
    );

    let outcome = match invoke_agent(ctx, config, scan_repo, Persona::Manager, prompt, &workdir, &sessions, None, false).await {
        Ok(o) => o,
        Err(e) => {
            warn!(mode = spec.name, error = %e, "seed agent invocation failed");
            return;
        }
    };

    let blocks = parse_sentinel_blocks(&outcome.output, start, end);
    info!(mode = spec.name, blocks = blocks.len(), "seed scan complete");

    for block in blocks {
        if block.title.is_empty() {
            continue;
        }
        if spec.is_proposal {
            let proposal = Proposal::new(file_against.path.clone(), block.title, block.description, block.rationale.unwrap_or_default());
            if let Err(e) = ctx.store.proposals.create(&proposal).await {
                warn!(error = %e, "failed to persist seeded proposal");
            }
        } else {
            let task = Task::new(block.title, block.description, file_against.path.clone(), TaskCreator::Seeder, "");
            if let Err(e) = ctx.store.tasks.create(&task).await {
                warn!(error = %e, "failed to persist seeded task");
            }
        }
    }
}

/// Runs a proposal-producing pass over every non-primary repo, filing the
/// resulting proposals against the primary repo (spec.md §4.6).
async fn cross_pollinate(ctx: &PipelineContext, config: &Config, primary: &RepoConfig) {
    let architecture_review = &SEED_MODES[4];
    for repo in config.repos.iter().filter(|r| !r.primary) {
        let session_folder = format!("cross-pollinate-{}", repo.path.replace(['/', '.'], "-"));
        let sessions = session_dir(&config.sessions_dir, 0).parent().map(std::path::Path::to_path_buf).unwrap_or_default().join(session_folder);
        let workdir = std::path::PathBuf::from(&repo.path);
        let prompt = format!(
            "{}\n\nFor each idea, emit a block exactly as:\nPROPOSAL_START\nTITLE: <short title>\nDESCRIPTION: <what to do>\nRATIONALE: <why this matters>\nPROPOSAL_END\n",
            architecture_review.prompt
        );
        let outcome = match invoke_agent(ctx, config, repo, Persona::Manager, prompt, &workdir, &sessions, None, false).await {
            Ok(o) => o,
            Err(e) => {
                warn!(repo = %repo.path, error = %e, "cross-pollinate agent invocation failed");
                continue;
            }
        };
        let blocks = parse_sentinel_blocks(&outcome.output, "PROPOSAL_START", "PROPOSAL_END");
        for block in blocks {
            if block.title.is_empty() {
                continue;
            }
            let rationale = format!(
                "(cross-pollinated from {}) {}",
                repo.path,
                block.rationale.unwrap_or_default()
            );
            let proposal = Proposal::new(primary.path.clone(), block.title, block.description, rationale);
            let _ = ctx.store.proposals.create(&proposal).await;
        }
    }
}

struct SentinelBlock {
    title: String,
    description: String,
    rationale: Option<String>,
}

/// Scans `output` for `start`..`end` delimited blocks and extracts
/// `TITLE:`/`DESCRIPTION:`/`RATIONALE:` lines (spec.md §4.6).
fn parse_sentinel_blocks(output: &str, start: &str, end: &str) -> Vec<SentinelBlock> {
    let mut blocks = Vec::new();
    let mut rest = output;
    while let Some(start_idx) = rest.find(start) {
        let after_start = &rest[start_idx + start.len()..];
        let Some(end_idx) = after_start.find(end) else {
            break;
        };
        let body = &after_start[..end_idx];
        rest = &after_start[end_idx + end.len()..];

        let mut title = String::new();
        let mut description = String::new();
        let mut rationale = None;
        for line in body.lines() {
            let line = line.trim();
            if let Some(v) = line.strip_prefix("TITLE:") {
                title = v.trim().to_string();
            } else if let Some(v) = line.strip_prefix("DESCRIPTION:") {
                description = v.trim().to_string();
            } else if let Some(v) = line.strip_prefix("RATIONALE:") {
                rationale = Some(v.trim().to_string());
            }
        }
        blocks.push(SentinelBlock { title, description, rationale });
    }
    blocks
}

/// Operator-triggered triage: the dimensions are rated by a Manager agent
/// and applied to every `proposed` proposal (spec.md §4.6 "Triage").
pub async fn triage(ctx: &PipelineContext, config: &Config, repo: &RepoConfig) -> crate::domain::errors::DomainResult<usize> {
    let proposed = ctx.store.proposals.list_by_status(crate::domain::models::ProposalStatus::Proposed).await?;
    let mut rated = 0;
    for mut proposal in proposed {
        let sessions = session_dir(&config.sessions_dir, 0)
            .parent()
            .map(std::path::Path::to_path_buf)
            .unwrap_or_default()
            .join(format!("triage-{}", proposal.id));
        let workdir = std::path::PathBuf::from(&repo.path);
        let prompt = format!(
            "Triage this proposal:\nTITLE: {}\nDESCRIPTION: {}\nRATIONALE: {}\n\n\
             Reply with exactly these lines:\nIMPACT: <1-5>\nFEASIBILITY: <1-5>\nRISK: <1-5>\n\
             EFFORT: <1-5>\nSCORE: <1-10>\nDISMISS: <yes|no>\nREASONING: <one paragraph>",
            proposal.title, proposal.description, proposal.rationale
        );
        let outcome = match invoke_agent(ctx, config, repo, Persona::Manager, prompt, &workdir, &sessions, None, false).await {
            Ok(o) => o,
            Err(e) => {
                warn!(proposal_id = proposal.id, error = %e, "triage agent invocation failed");
                continue;
            }
        };
        let triage = parse_triage(&outcome.output);
        let dismiss = outcome.output.to_lowercase().contains("dismiss: yes");
        let reasoning = outcome
            .output
            .lines()
            .find_map(|l| l.trim().strip_prefix("REASONING:"))
            .unwrap_or("")
            .trim()
            .to_string();
        proposal.apply_triage(triage, reasoning, dismiss);
        ctx.store.proposals.update(&proposal).await?;
        rated += 1;
    }
    Ok(rated)
}

fn parse_triage(output: &str) -> crate::domain::models::Triage {
    let mut triage = crate::domain::models::Triage::default();
    for line in output.lines() {
        let line = line.trim();
        if let Some(v) = line.strip_prefix("IMPACT:") {
            triage.impact = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("FEASIBILITY:") {
            triage.feasibility = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("RISK:") {
            triage.risk = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("EFFORT:") {
            triage.effort = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("SCORE:") {
            triage.score = v.trim().parse().ok();
        }
    }
    triage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_task_blocks() {
        let output = "noise\nTASK_START\nTITLE: Add flag X\nDESCRIPTION: do the thing\nTASK_END\nmore noise";
        let blocks = parse_sentinel_blocks(output, "TASK_START", "TASK_END");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].title, "Add flag X");
        assert_eq!(blocks[0].description, "do the thing");
    }

    #[test]
    fn parses_multiple_proposal_blocks_with_rationale() {
        let output = "PROPOSAL_START\nTITLE: A\nDESCRIPTION: da\nRATIONALE: ra\nPROPOSAL_END\nPROPOSAL_START\nTITLE: B\nDESCRIPTION: db\nRATIONALE: rb\nPROPOSAL_END";
        let blocks = parse_sentinel_blocks(output, "PROPOSAL_START", "PROPOSAL_END");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].title, "B");
        assert_eq!(blocks[1].rationale.as_deref(), Some("rb"));
    }

    #[test]
    fn empty_title_blocks_are_still_parsed_but_discarded_by_caller() {
        let output = "TASK_START\nDESCRIPTION: no title here\nTASK_END";
        let blocks = parse_sentinel_blocks(output, "TASK_START", "TASK_END");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].title.is_empty());
    }

    #[test]
    fn seed_mode_rotates_through_all_five() {
        assert_eq!(SEED_MODES.len(), 5);
        assert!(!SEED_MODES[0].is_proposal);
        assert!(!SEED_MODES[2].is_proposal);
        assert!(SEED_MODES[3].is_proposal);
        assert!(SEED_MODES[4].is_proposal);
    }
}

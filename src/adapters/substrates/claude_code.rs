//! Claude Code CLI substrate: spawns a child process, writes a single JSON
//! request to its stdin, folds NDJSON from stdout, and force-kills it on a
//! watchdog timeout (spec.md §4.5).

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentOutcome, AgentRequest, AgentStreamFold, Persona};
use crate::domain::ports::{AgentSpawn, Substrate};

/// Claude Code CLI substrate configuration.
#[derive(Debug, Clone)]
pub struct ClaudeCodeConfig {
    /// Path to the `claude` binary.
    pub binary_path: String,
    /// Sandbox-container launcher (e.g. `["docker", "run", "--rm", "-i"]`);
    /// empty means run unsandboxed (used for `run_host`).
    pub sandbox_command: Vec<String>,
    pub allowed_tools: Vec<String>,
    /// Prefix every sandboxed container is named with (`--name <prefix><uuid>`)
    /// so a crashed supervisor's lingering containers can be found and
    /// force-killed at the next startup (spec.md §4.2 "Crash recovery").
    pub container_name_prefix: String,
}

impl Default for ClaudeCodeConfig {
    fn default() -> Self {
        Self {
            binary_path: "claude".to_string(),
            sandbox_command: vec!["docker".to_string(), "run".to_string(), "--rm".to_string(), "-i".to_string()],
            allowed_tools: vec![
                "Edit".to_string(),
                "Write".to_string(),
                "Bash".to_string(),
                "Glob".to_string(),
                "Grep".to_string(),
                "Read".to_string(),
            ],
            container_name_prefix: "foreman-agent-".to_string(),
        }
    }
}

pub struct ClaudeCodeSubstrate {
    config: ClaudeCodeConfig,
}

impl ClaudeCodeSubstrate {
    pub fn new(config: ClaudeCodeConfig) -> Self {
        Self { config }
    }

    fn build_request(&self, spawn: &AgentSpawn<'_>) -> AgentRequest {
        AgentRequest {
            prompt: spawn.prompt.clone(),
            system_prompt: spawn.system_prompt.clone(),
            model: spawn.model.clone(),
            allowed_tools: self.config.allowed_tools.clone(),
            workdir: spawn.workdir.to_path_buf(),
            resume_session_id: spawn.resume_session_id.clone(),
        }
    }

    fn spawn_child(&self, spawn: &AgentSpawn<'_>, sandboxed: bool) -> DomainResult<Child> {
        let mut cmd = if sandboxed && !self.config.sandbox_command.is_empty() {
            let (program, prefix_args) = self
                .config
                .sandbox_command
                .split_first()
                .expect("non-empty sandbox_command checked above");
            let mut c = Command::new(program);
            c.args(prefix_args);
            c.arg("--name").arg(format!("{}{}", self.config.container_name_prefix, uuid::Uuid::new_v4()));
            c.arg(format!("--memory={}m", spawn.container_memory_mb));
            c.arg("-v").arg(format!("{}:{}", spawn.workdir.display(), spawn.workdir.display()));
            c.arg("-v").arg(format!("{}:{}", spawn.session_dir.display(), spawn.session_dir.display()));
            c.arg(&self.config.binary_path);
            c
        } else {
            let mut c = Command::new(&self.config.binary_path);
            c.current_dir(spawn.workdir);
            c
        };

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd.spawn().map_err(|e| DomainError::Substrate(format!("failed to spawn agent: {e}")))
    }

    async fn run(&self, spawn: AgentSpawn<'_>, sandboxed: bool) -> DomainResult<AgentOutcome> {
        let request = self.build_request(&spawn);
        let request_json = serde_json::to_string(&request)?;

        let mut child = self.spawn_child(&spawn, sandboxed)?;
        let child_pid = child.id();

        let mut stdin = child.stdin.take().ok_or_else(|| DomainError::Substrate("no stdin handle".to_string()))?;
        let stdout = child.stdout.take().ok_or_else(|| DomainError::Substrate("no stdout handle".to_string()))?;

        stdin
            .write_all(request_json.as_bytes())
            .await
            .map_err(|e| DomainError::Substrate(format!("failed to write agent request: {e}")))?;
        stdin.write_all(b"\n").await.ok();
        drop(stdin);

        let watchdog = spawn.timeout;
        let fold_task = async move {
            let mut fold = AgentStreamFold::new();
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                fold.feed_line(&line);
            }
            let exit_code = match child.wait().await {
                Ok(s) => s.code().unwrap_or(-1),
                Err(_) => -1,
            };
            fold.finish(exit_code)
        };

        match timeout(watchdog, fold_task).await {
            Ok(outcome) => Ok(outcome),
            // The watchdog elapsed. Ask the child to exit cleanly first;
            // `kill_on_drop(true)` still force-kills it a moment later when
            // the dropped future's `Child` handle is reclaimed, so a child
            // that ignores SIGTERM is still reaped.
            Err(_) => {
                if let Some(pid) = child_pid {
                    let _ = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), nix::sys::signal::Signal::SIGTERM);
                }
                Err(DomainError::AgentTimeout(watchdog.as_secs()))
            }
        }
    }
}

#[async_trait]
impl Substrate for ClaudeCodeSubstrate {
    async fn run_sandboxed(&self, spawn: AgentSpawn<'_>) -> DomainResult<AgentOutcome> {
        self.run(spawn, true).await
    }

    async fn run_host(&self, spawn: AgentSpawn<'_>) -> DomainResult<AgentOutcome> {
        self.run(spawn, false).await
    }

    async fn sweep_stale_containers(&self, name_prefix: &str) -> DomainResult<()> {
        let Some(runtime) = self.config.sandbox_command.first() else {
            return Ok(());
        };
        let list = Command::new(runtime)
            .args(["ps", "-q", "--filter", &format!("name={name_prefix}")])
            .output()
            .await
            .map_err(|e| DomainError::Substrate(format!("container sweep: {runtime} ps failed: {e}")))?;
        let stdout = String::from_utf8_lossy(&list.stdout);
        let ids: Vec<&str> = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if ids.is_empty() {
            return Ok(());
        }
        tracing::warn!(count = ids.len(), name_prefix, "terminating lingering sandbox containers from a prior crash");
        let mut kill = Command::new(runtime);
        kill.arg("kill").args(&ids);
        let _ = kill.output().await;
        Ok(())
    }
}

/// Persona base system prompts (spec.md §4.5 "persona base + configuration
/// suffix + optional per-repo prompt").
pub fn persona_base_prompt(persona: Persona) -> &'static str {
    match persona {
        Persona::Manager => {
            "You are the manager agent. Write a concise technical spec for the requested \
             change and save it as spec.md in the repository root. Do not write code."
        }
        Persona::Qa => {
            "You are the QA agent. Write or update tests that exercise the behavior described \
             in spec.md. Do not implement the feature itself."
        }
        Persona::Worker => {
            "You are the worker agent. Implement the change described in spec.md so that the \
             tests written by the QA agent pass."
        }
    }
}

/// Composes the full system prompt handed to the substrate (spec.md §4.5).
pub fn compose_system_prompt(persona: Persona, config_suffix: &str, repo_suffix: Option<&str>) -> String {
    let mut prompt = persona_base_prompt(persona).to_string();
    if !config_suffix.is_empty() {
        prompt.push('\n');
        prompt.push_str(config_suffix);
    }
    if let Some(suffix) = repo_suffix {
        prompt.push('\n');
        prompt.push_str(suffix);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_system_prompt_appends_suffixes_in_order() {
        let composed = compose_system_prompt(Persona::Worker, "Follow house style.", Some("This repo uses Rust 2021."));
        assert!(composed.starts_with(persona_base_prompt(Persona::Worker)));
        assert!(composed.contains("Follow house style."));
        assert!(composed.ends_with("This repo uses Rust 2021."));
    }

    #[test]
    fn compose_system_prompt_omits_absent_repo_suffix() {
        let composed = compose_system_prompt(Persona::Qa, "", None);
        assert_eq!(composed, persona_base_prompt(Persona::Qa));
    }
}

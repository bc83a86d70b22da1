//! In-memory `CodeHost` double for service-layer tests: tracks PR state per
//! `(repo, branch)` without shelling out to `gh`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::models::PrState;
use crate::domain::ports::{CodeHost, CreatePrOutcome, MergeOutcome};

#[derive(Clone)]
struct PrRecord {
    number: i64,
    state: PrState,
    mergeable: PrState,
}

#[derive(Default)]
pub struct MockCodeHost {
    prs: Mutex<HashMap<String, PrRecord>>,
    next_number: Mutex<i64>,
}

impl MockCodeHost {
    pub fn new() -> Self {
        Self {
            prs: Mutex::new(HashMap::new()),
            next_number: Mutex::new(1),
        }
    }

    /// Force the mergeability a later `pr_mergeable` call returns for
    /// `branch`, without requiring a PR to already exist.
    pub async fn set_mergeable(&self, branch: &str, state: PrState) {
        let mut prs = self.prs.lock().await;
        prs.entry(branch.to_string())
            .or_insert_with(|| PrRecord { number: 0, state: PrState::Other("OPEN".into()), mergeable: PrState::Unknown })
            .mergeable = state;
    }

    /// Marks the PR for `branch` as already merged, as if merged outside
    /// the engine's own `merge_pr` call (e.g. an operator merged manually).
    pub async fn mark_merged_externally(&self, branch: &str) {
        let mut prs = self.prs.lock().await;
        prs.entry(branch.to_string())
            .or_insert_with(|| PrRecord { number: 0, state: PrState::Other("OPEN".into()), mergeable: PrState::Mergeable })
            .state = PrState::Merged;
    }
}

#[async_trait]
impl CodeHost for MockCodeHost {
    async fn pr_state(&self, _repo_path: &str, branch: &str) -> DomainResult<Option<PrState>> {
        let prs = self.prs.lock().await;
        Ok(prs.get(branch).map(|r| r.state.clone()))
    }

    async fn pr_number(&self, _repo_path: &str, branch: &str) -> DomainResult<Option<i64>> {
        let prs = self.prs.lock().await;
        Ok(prs.get(branch).map(|r| r.number))
    }

    async fn pr_mergeable(&self, _repo_path: &str, branch: &str) -> DomainResult<PrState> {
        let prs = self.prs.lock().await;
        Ok(prs.get(branch).map(|r| r.mergeable.clone()).unwrap_or(PrState::Mergeable))
    }

    async fn create_pr(&self, _repo_path: &str, branch: &str, _title: &str, _body: &str) -> DomainResult<CreatePrOutcome> {
        let mut prs = self.prs.lock().await;
        if let Some(existing) = prs.get(branch) {
            return Ok(CreatePrOutcome::Created(existing.number));
        }
        let mut next = self.next_number.lock().await;
        let number = *next;
        *next += 1;
        prs.insert(
            branch.to_string(),
            PrRecord {
                number,
                state: PrState::Other("OPEN".to_string()),
                mergeable: PrState::Mergeable,
            },
        );
        Ok(CreatePrOutcome::Created(number))
    }

    async fn merge_pr(&self, _repo_path: &str, branch: &str) -> DomainResult<MergeOutcome> {
        let mut prs = self.prs.lock().await;
        match prs.get_mut(branch) {
            Some(record) => {
                record.state = PrState::Merged;
                Ok(MergeOutcome {
                    success: true,
                    conflict: false,
                    stderr: String::new(),
                })
            }
            None => Ok(MergeOutcome {
                success: false,
                conflict: false,
                stderr: "no such PR".to_string(),
            }),
        }
    }
}

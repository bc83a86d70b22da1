//! In-memory `Substrate` double for service-layer tests: returns scripted
//! outcomes instead of spawning a process.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AgentOutcome;
use crate::domain::ports::{AgentSpawn, Substrate};

pub struct MockSubstrate {
    sandboxed_responses: Mutex<VecDeque<DomainResult<AgentOutcome>>>,
    host_responses: Mutex<VecDeque<DomainResult<AgentOutcome>>>,
}

impl MockSubstrate {
    pub fn new() -> Self {
        Self {
            sandboxed_responses: Mutex::new(VecDeque::new()),
            host_responses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_sandboxed(&mut self, outcome: AgentOutcome) {
        self.sandboxed_responses.get_mut().push_back(Ok(outcome));
    }

    pub fn push_sandboxed_err(&mut self, err: DomainError) {
        self.sandboxed_responses.get_mut().push_back(Err(err));
    }

    pub fn push_host(&mut self, outcome: AgentOutcome) {
        self.host_responses.get_mut().push_back(Ok(outcome));
    }
}

impl Default for MockSubstrate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Substrate for MockSubstrate {
    async fn run_sandboxed(&self, _spawn: AgentSpawn<'_>) -> DomainResult<AgentOutcome> {
        let mut queue = self.sandboxed_responses.lock().await;
        queue
            .pop_front()
            .unwrap_or_else(|| Err(DomainError::Substrate("MockSubstrate: no scripted sandboxed response".to_string())))
    }

    async fn run_host(&self, _spawn: AgentSpawn<'_>) -> DomainResult<AgentOutcome> {
        let mut queue = self.host_responses.lock().await;
        queue
            .pop_front()
            .unwrap_or_else(|| Err(DomainError::Substrate("MockSubstrate: no scripted host response".to_string())))
    }
}

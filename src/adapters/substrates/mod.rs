pub mod claude_code;
mod mock;

pub use claude_code::{compose_system_prompt, persona_base_prompt, ClaudeCodeConfig, ClaudeCodeSubstrate};
pub use mock::MockSubstrate;

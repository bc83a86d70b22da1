mod cli;
mod mock;

pub use cli::GitCli;
pub use mock::MockGit;

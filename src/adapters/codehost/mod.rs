mod gh_cli;
mod mock;

pub use gh_cli::GhCli;
pub use mock::MockCodeHost;

mod oauth;
mod token;

pub use oauth::OAuthCredentialRefresher;
pub use token::{Token, TokenSlot};

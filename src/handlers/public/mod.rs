// Routes reachable without a token

pub mod health;
pub mod login;

pub use health::{health, root};
pub use login::login;

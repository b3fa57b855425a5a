pub mod auth;
pub mod extractors;

pub use auth::jwt_auth_middleware;
pub use extractors::{AdminUser, JsonBody, PathId};

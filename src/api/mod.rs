//! Wire types: request bodies in, response views out.

pub mod format;
pub mod requests;

pub use format::{ContactSummary, LoginResponse, UserSummary};
pub use requests::{AddressRequest, ContactRequest, LoginRequest, UserRequest};

pub mod auth_service;
pub mod contact_service;
pub mod error;
pub mod user_service;
pub mod validation;

pub use auth_service::AuthService;
pub use contact_service::ContactService;
pub use error::{FieldErrors, ServiceError, ServiceResult};
pub use user_service::UserService;

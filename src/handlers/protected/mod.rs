// Routes behind jwt_auth_middleware

pub mod contacts;
pub mod users;

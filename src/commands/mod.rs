pub mod auth;
pub mod export;

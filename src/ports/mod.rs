pub mod auth;
pub mod card;
pub mod file;
pub mod member;

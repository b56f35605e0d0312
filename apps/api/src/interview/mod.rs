pub mod admin;
pub mod handlers;
pub mod session;
pub mod status;
pub mod token;

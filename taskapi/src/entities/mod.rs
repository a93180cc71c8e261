pub mod access_token;
pub mod task;
pub mod user;

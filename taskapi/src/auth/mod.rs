//! Bearer token authentication.
//!
//! Tokens are opaque random strings handed out once at login or
//! registration. Only their SHA-256 digest is stored, so a leaked database
//! does not leak usable tokens.

pub mod extractor;
pub mod password;
pub mod tokens;

pub use extractor::AuthUser;
pub use password::{hash_password, verify_password};

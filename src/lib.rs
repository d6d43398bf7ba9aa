//! # Ingresso (account registration, login and logout)
//!
//! `ingresso` serves the three account flows of a web application:
//! registration, login and logout.
//!
//! ## Forms
//!
//! Submitted data is bound to a form type and run through an ordered list of
//! validators per field, followed by one cross-field check. Validation never
//! fails with an `Err`; it returns [`forms::FormErrors`] tagged by field so the
//! form can be rendered again with inline messages.
//!
//! ## Credentials and sessions
//!
//! - **Passwords** are stored as Argon2id PHC strings and hashed on the blocking
//!   pool.
//! - **Sessions** are random tokens handed to the client in an `HttpOnly`
//!   cookie. Only a SHA-256 hash of the token is stored.
//! - **Login failures** use one message for "no such account" and "wrong
//!   password" to prevent account enumeration.
//!
//! ## Capabilities
//!
//! Stores, the password hasher and the flow configuration travel with each
//! request in an [`api::AuthState`] extension instead of process globals.

pub mod accounts;
pub mod api;
pub mod cli;
pub mod forms;
pub mod messages;
pub mod sessions;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

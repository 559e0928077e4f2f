//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Credentials are stored as salted Argon2 hashes; tokens are HS256 JWTs signed
//! with keys handed out by a [`keys::KeyProvider`].

pub mod domain;
pub mod errors;
pub mod keys;
pub mod password;
pub mod repository;
pub mod service;
#[cfg(feature = "seaorm")]
pub mod repo;

pub use keys::{KeyProvider, SigningKey, StaticKeyProvider};
pub use service::AuthService;

//! Catalog module: products, categories and the links between them.
//!
//! Same three layers as `auth`: domain types, a repository trait, and the
//! service holding the business rules.

pub mod domain;
pub mod repository;
pub mod service;
#[cfg(feature = "seaorm")]
pub mod repo;

pub use service::CatalogService;

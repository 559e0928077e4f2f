//! Service layer providing the catalog and authentication business rules on
//! top of `models`.
//! - Separates business logic from data access through repository traits.
//! - Each repository has a SeaORM implementation and an in-memory mock.
//! - Errors are plain enums; the HTTP layer decides status codes.

pub mod errors;
pub mod auth;
pub mod catalog;
#[cfg(all(test, feature = "seaorm"))]
pub mod test_support;

//! SeaORM entities for the catalog schema, field validation shared by the
//! service layer, and connection helpers.

pub mod errors;
pub mod db;
pub mod validation;
pub mod product;
pub mod category;
pub mod product_category;
pub mod user;
pub mod role;
pub mod user_role;

#[cfg(test)]
mod tests;

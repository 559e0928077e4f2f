use async_trait::async_trait;

use super::domain::{CategoryView, CategoryWithProducts, Product, ProductInput};
use crate::errors::ServiceError;

/// Repository abstraction for catalog persistence.
///
/// Inserts must report uniqueness violations as `ServiceError::Conflict`, since
/// the store is the final arbiter when two writers race on the same key.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, ServiceError>;
    async fn products_by_name(&self, name: &str) -> Result<Vec<Product>, ServiceError>;
    async fn product_by_sku(&self, sku: &str) -> Result<Option<Product>, ServiceError>;
    async fn product_by_id(&self, id: i32) -> Result<Option<Product>, ServiceError>;
    async fn insert_product(&self, input: &ProductInput) -> Result<Product, ServiceError>;
    /// Overwrite the mutable fields of product `id`; the SKU is left untouched.
    async fn update_product(&self, id: i32, input: &ProductInput) -> Result<Product, ServiceError>;
    /// Returns `false` when nothing was deleted.
    async fn delete_product(&self, id: i32) -> Result<bool, ServiceError>;

    async fn list_categories(&self) -> Result<Vec<CategoryView>, ServiceError>;
    async fn category_by_id(&self, id: i32) -> Result<Option<CategoryView>, ServiceError>;
    async fn category_by_name(&self, name: &str) -> Result<Option<CategoryView>, ServiceError>;
    async fn insert_category(&self, name: &str) -> Result<CategoryView, ServiceError>;

    async fn link_exists(&self, category_id: i32, product_id: i32) -> Result<bool, ServiceError>;
    async fn insert_link(&self, category_id: i32, product_id: i32) -> Result<(), ServiceError>;
    /// Every category with its linked products, in one explicit join.
    async fn categories_with_products(&self) -> Result<Vec<CategoryWithProducts>, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use crate::catalog::domain::ProductSummary;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        next_id: i32,
        products: BTreeMap<i32, Product>,
        categories: BTreeMap<i32, CategoryView>,
        links: BTreeSet<(i32, i32)>, // (category_id, product_id)
    }

    impl State {
        fn next_id(&mut self) -> i32 {
            self.next_id += 1;
            self.next_id
        }
    }

    #[derive(Default)]
    pub struct MockCatalogRepository {
        state: Mutex<State>,
        /// When set, `categories_with_products` fails with a database error.
        pub fail_joins: bool,
    }

    impl MockCatalogRepository {
        pub fn failing_joins() -> Self {
            Self { fail_joins: true, ..Self::default() }
        }

        pub fn link_count(&self) -> usize {
            self.state.lock().unwrap().links.len()
        }
    }

    #[async_trait]
    impl CatalogRepository for MockCatalogRepository {
        async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
            Ok(self.state.lock().unwrap().products.values().cloned().collect())
        }

        async fn products_by_name(&self, name: &str) -> Result<Vec<Product>, ServiceError> {
            let state = self.state.lock().unwrap();
            Ok(state.products.values().filter(|p| p.name == name).cloned().collect())
        }

        async fn product_by_sku(&self, sku: &str) -> Result<Option<Product>, ServiceError> {
            let state = self.state.lock().unwrap();
            Ok(state.products.values().find(|p| p.sku == sku).cloned())
        }

        async fn product_by_id(&self, id: i32) -> Result<Option<Product>, ServiceError> {
            Ok(self.state.lock().unwrap().products.get(&id).cloned())
        }

        async fn insert_product(&self, input: &ProductInput) -> Result<Product, ServiceError> {
            let mut state = self.state.lock().unwrap();
            if state.products.values().any(|p| p.sku == input.sku) {
                return Err(ServiceError::Conflict(format!("SKU {} already exists", input.sku)));
            }
            let id = state.next_id();
            let product = Product {
                id,
                name: input.name.clone(),
                sku: input.sku.clone(),
                description: input.description.clone(),
                image: input.image.clone(),
                price: input.price,
            };
            state.products.insert(id, product.clone());
            Ok(product)
        }

        async fn update_product(&self, id: i32, input: &ProductInput) -> Result<Product, ServiceError> {
            let mut state = self.state.lock().unwrap();
            let product = state.products.get_mut(&id).ok_or_else(|| ServiceError::not_found("Product"))?;
            product.name = input.name.clone();
            product.description = input.description.clone();
            product.image = input.image.clone();
            product.price = input.price;
            Ok(product.clone())
        }

        async fn delete_product(&self, id: i32) -> Result<bool, ServiceError> {
            let mut state = self.state.lock().unwrap();
            let removed = state.products.remove(&id).is_some();
            state.links.retain(|(_, p)| *p != id);
            Ok(removed)
        }

        async fn list_categories(&self) -> Result<Vec<CategoryView>, ServiceError> {
            Ok(self.state.lock().unwrap().categories.values().cloned().collect())
        }

        async fn category_by_id(&self, id: i32) -> Result<Option<CategoryView>, ServiceError> {
            Ok(self.state.lock().unwrap().categories.get(&id).cloned())
        }

        async fn category_by_name(&self, name: &str) -> Result<Option<CategoryView>, ServiceError> {
            let state = self.state.lock().unwrap();
            Ok(state.categories.values().find(|c| c.name == name).cloned())
        }

        async fn insert_category(&self, name: &str) -> Result<CategoryView, ServiceError> {
            let mut state = self.state.lock().unwrap();
            if state.categories.values().any(|c| c.name == name) {
                return Err(ServiceError::Conflict(format!("category {} already exists", name)));
            }
            let id = state.next_id();
            let category = CategoryView { id, name: name.to_string() };
            state.categories.insert(id, category.clone());
            Ok(category)
        }

        async fn link_exists(&self, category_id: i32, product_id: i32) -> Result<bool, ServiceError> {
            Ok(self.state.lock().unwrap().links.contains(&(category_id, product_id)))
        }

        async fn insert_link(&self, category_id: i32, product_id: i32) -> Result<(), ServiceError> {
            let mut state = self.state.lock().unwrap();
            if !state.links.insert((category_id, product_id)) {
                return Err(ServiceError::Conflict("product already linked".into()));
            }
            Ok(())
        }

        async fn categories_with_products(&self) -> Result<Vec<CategoryWithProducts>, ServiceError> {
            if self.fail_joins {
                return Err(ServiceError::Db("connection reset".into()));
            }
            let state = self.state.lock().unwrap();
            Ok(state
                .categories
                .values()
                .map(|c| CategoryWithProducts {
                    category_id: c.id,
                    category_name: c.name.clone(),
                    products: state
                        .links
                        .iter()
                        .filter(|(cid, _)| *cid == c.id)
                        .filter_map(|(_, pid)| state.products.get(pid))
                        .map(|p| ProductSummary { product_id: p.id, product_name: p.name.clone(), product_price: p.price })
                        .collect(),
                })
                .collect())
        }
    }
}

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::domain::{
    category_location, product_location, CategoryInput, CategoryListing, CategoryName, CategoryView,
    CategoryWithProducts, Created, LinkInput, ProductInfo, ProductInput, ProductLink, ProductRef, ProductView,
};
use super::repository::CatalogRepository;
use crate::errors::ServiceError;

/// Catalog business service independent of web framework.
///
/// Field rules are checked here before anything reaches the store; uniqueness
/// is checked up front and again by the store's constraints on insert.
pub struct CatalogService<R: CatalogRepository> {
    repo: Arc<R>,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// All products, or only those named exactly `name` when given.
    pub async fn list_products(&self, name: Option<&str>) -> Result<Vec<ProductView>, ServiceError> {
        match name {
            Some(name) => self.find_by_name(name).await,
            None => {
                let products = self.repo.list_products().await?;
                debug!(count = products.len(), "list products");
                Ok(products.iter().map(|p| p.view()).collect())
            }
        }
    }

    /// Exact-name search; an empty result is `NotFound`.
    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<ProductView>, ServiceError> {
        let products = self.repo.products_by_name(name).await?;
        if products.is_empty() {
            return Err(ServiceError::NotFound(format!("no products named {name}")));
        }
        Ok(products.iter().map(|p| p.view()).collect())
    }

    pub async fn find_by_sku(&self, sku: &str) -> Result<ProductView, ServiceError> {
        self.repo
            .product_by_sku(sku)
            .await?
            .map(|p| p.view())
            .ok_or_else(|| ServiceError::not_found("Product"))
    }

    /// Internal id, SKU and name of a product.
    pub async fn product_info(&self, sku: &str) -> Result<ProductInfo, ServiceError> {
        self.repo
            .product_by_sku(sku)
            .await?
            .map(|p| p.info())
            .ok_or_else(|| ServiceError::not_found("Product"))
    }

    /// Create a product.
    ///
    /// # Examples
    /// ```
    /// use service::catalog::{CatalogService, repository::mock::MockCatalogRepository, domain::ProductInput};
    /// use rust_decimal::Decimal;
    /// use std::sync::Arc;
    /// let svc = CatalogService::new(Arc::new(MockCatalogRepository::default()));
    /// let input = ProductInput { name: "Red Boots".into(), sku: "RB-1".into(), description: "Boots".into(), image: "rb.png".into(), price: Decimal::new(4999, 2) };
    /// let created = tokio_test::block_on(svc.create_product(input)).unwrap();
    /// assert_eq!(created.location, "/Products?name=Red+Boots");
    /// ```
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: ProductInput) -> Result<Created<ProductView>, ServiceError> {
        input.validate()?;
        if self.repo.product_by_sku(&input.sku).await?.is_some() {
            warn!("duplicate sku rejected");
            return Err(ServiceError::Conflict(format!("SKU {} already exists", input.sku)));
        }
        let product = self.repo.insert_product(&input).await?;
        info!(product_id = product.id, "product_created");
        Ok(Created { location: product_location(&product.name), value: product.view() })
    }

    /// Overwrite name, description, image and price of the product at `sku`.
    /// The body SKU must equal the path SKU; the SKU itself never changes.
    #[instrument(skip(self, input), fields(sku = %sku))]
    pub async fn update_product(&self, sku: &str, input: ProductInput) -> Result<(), ServiceError> {
        if input.sku != sku {
            return Err(ServiceError::Validation("SKU does not match".into()));
        }
        input.validate()?;
        let existing = self
            .repo
            .product_by_sku(sku)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product"))?;
        self.repo.update_product(existing.id, &input).await?;
        info!(product_id = existing.id, "product_updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, sku: &str) -> Result<(), ServiceError> {
        let existing = self
            .repo
            .product_by_sku(sku)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product"))?;
        if !self.repo.delete_product(existing.id).await? {
            // lost a race with another delete
            return Err(ServiceError::not_found("Product"));
        }
        info!(product_id = existing.id, "product_deleted");
        Ok(())
    }

    pub async fn list_categories(&self, names_only: bool) -> Result<CategoryListing, ServiceError> {
        let categories = self.repo.list_categories().await?;
        Ok(if names_only {
            CategoryListing::NamesOnly(categories.into_iter().map(|c| CategoryName { name: c.name }).collect())
        } else {
            CategoryListing::Full(categories)
        })
    }

    pub async fn find_category(&self, id: i32) -> Result<CategoryView, ServiceError> {
        self.repo
            .category_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(&self, input: CategoryInput) -> Result<Created<CategoryView>, ServiceError> {
        models::category::validate_name(&input.name)?;
        if self.repo.category_by_name(&input.name).await?.is_some() {
            return Err(ServiceError::Conflict(format!("category {} already exists", input.name)));
        }
        let category = self.repo.insert_category(&input.name).await?;
        info!(category_id = category.id, "category_created");
        Ok(Created { location: category_location(category.id), value: category })
    }

    /// Link a product (by id or SKU) to a category.
    ///
    /// `NotFound` when either side is missing, `Conflict` when already linked.
    #[instrument(skip(self, input), fields(category_id = tracing::field::Empty))]
    pub async fn link_product(&self, input: LinkInput) -> Result<ProductLink, ServiceError> {
        let category_id = input
            .category_id
            .ok_or_else(|| ServiceError::Validation("CategoryId is required".into()))?;
        tracing::Span::current().record("category_id", category_id);
        let product_ref = input.product_ref()?;

        if self.repo.category_by_id(category_id).await?.is_none() {
            return Err(ServiceError::not_found("Category"));
        }
        let product = match &product_ref {
            ProductRef::Id(id) => self.repo.product_by_id(*id).await?,
            ProductRef::Sku(sku) => self.repo.product_by_sku(sku).await?,
        }
        .ok_or_else(|| ServiceError::not_found("Product"))?;

        if self.repo.link_exists(category_id, product.id).await? {
            return Err(ServiceError::Conflict("product already linked to category".into()));
        }
        self.repo.insert_link(category_id, product.id).await?;
        info!(product_id = product.id, "product_linked");
        Ok(ProductLink { category_id, product_id: product.id })
    }

    /// Categories with their product summaries. Store failures are logged and
    /// reported as `Internal` without the underlying detail.
    pub async fn categories_with_products(&self) -> Result<Vec<CategoryWithProducts>, ServiceError> {
        self.repo.categories_with_products().await.map_err(|e| {
            error!(err = %e, "loading categories with products failed");
            ServiceError::Internal("Internal Server Error".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::mock::MockCatalogRepository;
    use rust_decimal::Decimal;

    fn svc() -> (CatalogService<MockCatalogRepository>, Arc<MockCatalogRepository>) {
        let repo = Arc::new(MockCatalogRepository::default());
        (CatalogService::new(repo.clone()), repo)
    }

    fn boots(sku: &str) -> ProductInput {
        ProductInput {
            name: "Boots".into(),
            sku: sku.into(),
            description: "Leather".into(),
            image: "boots.png".into(),
            price: Decimal::new(4950, 2),
        }
    }

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let (svc, _) = svc();
        let created = svc.create_product(boots("A123")).await.unwrap();
        assert_eq!(created.value, boots("A123"));
        assert_eq!(svc.find_by_sku("A123").await.unwrap(), boots("A123"));
        assert_eq!(svc.find_by_name("Boots").await.unwrap().len(), 1);
        assert_eq!(svc.product_info("A123").await.unwrap().sku, "A123");
    }

    #[tokio::test]
    async fn duplicate_sku_conflicts_without_new_record() {
        let (svc, _) = svc();
        svc.create_product(boots("A123")).await.unwrap();
        let err = svc.create_product(boots("A123")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(svc.list_products(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let (svc, _) = svc();
        let mut bad = boots("A1");
        bad.name = "x".repeat(51);
        assert!(matches!(svc.create_product(bad).await, Err(ServiceError::Validation(_))));
        let mut bad = boots("A1");
        bad.price = Decimal::new(-1, 0);
        assert!(matches!(svc.create_product(bad).await, Err(ServiceError::Validation(_))));
        let mut bad = boots("");
        bad.sku = String::new();
        assert!(matches!(svc.create_product(bad).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn update_requires_matching_sku() {
        let (svc, _) = svc();
        svc.create_product(boots("A123")).await.unwrap();
        let mut changed = boots("B456");
        changed.name = "Sandals".into();
        let err = svc.update_product("A123", changed).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.find_by_sku("A123").await.unwrap().name, "Boots");
    }

    #[tokio::test]
    async fn update_overwrites_mutable_fields() {
        let (svc, _) = svc();
        svc.create_product(boots("A123")).await.unwrap();
        let changed = ProductInput {
            name: "Sandals".into(),
            sku: "A123".into(),
            description: "Summer".into(),
            image: "s.png".into(),
            price: Decimal::new(1000, 2),
        };
        svc.update_product("A123", changed.clone()).await.unwrap();
        assert_eq!(svc.find_by_sku("A123").await.unwrap(), changed);
        assert!(matches!(svc.update_product("NOPE", boots("NOPE")).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_then_delete_again_is_not_found() {
        let (svc, _) = svc();
        svc.create_product(boots("A123")).await.unwrap();
        svc.delete_product("A123").await.unwrap();
        assert!(matches!(svc.delete_product("A123").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.find_by_name("Boots").await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn categories_create_find_and_list() {
        let (svc, _) = svc();
        let created = svc.create_category(CategoryInput { name: "Shoes".into() }).await.unwrap();
        assert_eq!(created.location, format!("/Categories/{}", created.value.id));
        assert_eq!(svc.find_category(created.value.id).await.unwrap().name, "Shoes");
        assert!(matches!(svc.find_category(999).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            svc.create_category(CategoryInput { name: "Shoes".into() }).await,
            Err(ServiceError::Conflict(_))
        ));
        match svc.list_categories(true).await.unwrap() {
            CategoryListing::NamesOnly(names) => assert_eq!(names, vec![CategoryName { name: "Shoes".into() }]),
            other => panic!("unexpected listing {other:?}"),
        }
    }

    #[tokio::test]
    async fn link_twice_conflicts_and_keeps_one_row() {
        let (svc, repo) = svc();
        svc.create_product(boots("A123")).await.unwrap();
        let cat = svc.create_category(CategoryInput { name: "Shoes".into() }).await.unwrap().value;
        let input = LinkInput { category_id: Some(cat.id), product_sku: Some("A123".into()), ..Default::default() };

        svc.link_product(input.clone()).await.unwrap();
        assert!(matches!(svc.link_product(input).await, Err(ServiceError::Conflict(_))));
        assert_eq!(repo.link_count(), 1);

        let joined = svc.categories_with_products().await.unwrap();
        assert_eq!(joined[0].products.len(), 1);
        assert_eq!(joined[0].products[0].product_name, "Boots");
    }

    #[tokio::test]
    async fn link_reports_missing_side() {
        let (svc, _) = svc();
        let cat = svc.create_category(CategoryInput { name: "Shoes".into() }).await.unwrap().value;
        let missing_product = LinkInput { category_id: Some(cat.id), product_id: Some(42), ..Default::default() };
        match svc.link_product(missing_product).await {
            Err(ServiceError::NotFound(msg)) => assert_eq!(msg, "Product not found."),
            other => panic!("unexpected {other:?}"),
        }
        let missing_category = LinkInput { category_id: Some(77), product_id: Some(42), ..Default::default() };
        match svc.link_product(missing_category).await {
            Err(ServiceError::NotFound(msg)) => assert_eq!(msg, "Category not found."),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn join_failure_becomes_internal() {
        let svc = CatalogService::new(Arc::new(MockCatalogRepository::failing_joins()));
        match svc.categories_with_products().await {
            Err(ServiceError::Internal(msg)) => assert!(!msg.contains("connection reset")),
            other => panic!("unexpected {other:?}"),
        }
    }
}

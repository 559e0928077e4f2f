use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    Unchanged,
};

use models::{category, product, product_category};

use crate::catalog::domain::{CategoryView, CategoryWithProducts, Product, ProductInput, ProductSummary};
use crate::catalog::repository::CatalogRepository;
use crate::errors::ServiceError;

pub struct SeaOrmCatalogRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        let rows = product::Entity::find()
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn products_by_name(&self, name: &str) -> Result<Vec<Product>, ServiceError> {
        let rows = product::Entity::find()
            .filter(product::Column::Name.eq(name))
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn product_by_sku(&self, sku: &str) -> Result<Option<Product>, ServiceError> {
        Ok(product::find_by_sku(&self.db, sku).await?.map(Product::from))
    }

    async fn product_by_id(&self, id: i32) -> Result<Option<Product>, ServiceError> {
        Ok(product::Entity::find_by_id(id).one(&self.db).await?.map(Product::from))
    }

    async fn insert_product(&self, input: &ProductInput) -> Result<Product, ServiceError> {
        let am = product::ActiveModel {
            name: Set(input.name.clone()),
            sku: Set(input.sku.clone()),
            description: Set(input.description.clone()),
            image: Set(input.image.clone()),
            price: Set(input.price),
            ..Default::default()
        };
        let created = am
            .insert(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, &format!("SKU {} already exists", input.sku)))?;
        Ok(created.into())
    }

    async fn update_product(&self, id: i32, input: &ProductInput) -> Result<Product, ServiceError> {
        // sku stays NotSet so the UPDATE never touches it
        let am = product::ActiveModel {
            id: Unchanged(id),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            image: Set(input.image.clone()),
            price: Set(input.price),
            ..Default::default()
        };
        let updated = am.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => ServiceError::not_found("Product"),
            other => ServiceError::from(other),
        })?;
        Ok(updated.into())
    }

    async fn delete_product(&self, id: i32) -> Result<bool, ServiceError> {
        let res = product::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryView>, ServiceError> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(CategoryView::from).collect())
    }

    async fn category_by_id(&self, id: i32) -> Result<Option<CategoryView>, ServiceError> {
        Ok(category::Entity::find_by_id(id).one(&self.db).await?.map(CategoryView::from))
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<CategoryView>, ServiceError> {
        Ok(category::find_by_name(&self.db, name).await?.map(CategoryView::from))
    }

    async fn insert_category(&self, name: &str) -> Result<CategoryView, ServiceError> {
        let am = category::ActiveModel { name: Set(name.to_string()), ..Default::default() };
        let created = am
            .insert(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, &format!("category {} already exists", name)))?;
        Ok(created.into())
    }

    async fn link_exists(&self, category_id: i32, product_id: i32) -> Result<bool, ServiceError> {
        let n = product_category::Entity::find()
            .filter(product_category::Column::CategoryId.eq(category_id))
            .filter(product_category::Column::ProductId.eq(product_id))
            .count(&self.db)
            .await?;
        Ok(n > 0)
    }

    async fn insert_link(&self, category_id: i32, product_id: i32) -> Result<(), ServiceError> {
        let am = product_category::ActiveModel { product_id: Set(product_id), category_id: Set(category_id) };
        // Composite keys have no generated id to read back, so insert without returning the model
        product_category::Entity::insert(am)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "product already linked"))?;
        Ok(())
    }

    async fn categories_with_products(&self) -> Result<Vec<CategoryWithProducts>, ServiceError> {
        let rows = category::Entity::find()
            .find_with_related(product::Entity)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(c, products)| CategoryWithProducts {
                category_id: c.id,
                category_name: c.name,
                products: products
                    .into_iter()
                    .map(|p| ProductSummary { product_id: p.id, product_name: p.name, product_price: p.price })
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use rust_decimal::Decimal;

    fn input(sku: &str) -> ProductInput {
        ProductInput {
            name: "Lamp".into(),
            sku: sku.into(),
            description: "Desk lamp".into(),
            image: "img/lamp.png".into(),
            price: Decimal::new(2500, 2),
        }
    }

    #[tokio::test]
    async fn duplicate_insert_maps_to_conflict() -> Result<(), anyhow::Error> {
        let repo = SeaOrmCatalogRepository { db: get_db().await? };
        repo.insert_product(&input("LMP-1")).await?;
        let err = repo.insert_product(&input("LMP-1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "got {err:?}");

        repo.insert_category("Lighting").await?;
        let err = repo.insert_category("Lighting").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "got {err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn update_keeps_sku_and_rejects_missing_row() -> Result<(), anyhow::Error> {
        let repo = SeaOrmCatalogRepository { db: get_db().await? };
        let created = repo.insert_product(&input("LMP-2")).await?;
        let mut changed = input("IGNORED");
        changed.name = "Floor lamp".into();
        let updated = repo.update_product(created.id, &changed).await?;
        assert_eq!(updated.sku, "LMP-2");
        assert_eq!(updated.name, "Floor lamp");

        let err = repo.update_product(9999, &changed).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn link_twice_is_conflict() -> Result<(), anyhow::Error> {
        let repo = SeaOrmCatalogRepository { db: get_db().await? };
        let p = repo.insert_product(&input("LMP-3")).await?;
        let c = repo.insert_category("Home").await?;
        repo.insert_link(c.id, p.id).await?;
        assert!(repo.link_exists(c.id, p.id).await?);
        let err = repo.insert_link(c.id, p.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "got {err:?}");

        let joined = repo.categories_with_products().await?;
        let home = joined.iter().find(|c| c.category_name == "Home").expect("home");
        assert_eq!(home.products.len(), 1);
        assert_eq!(home.products[0].product_name, "Lamp");
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_went_away() -> Result<(), anyhow::Error> {
        let repo = SeaOrmCatalogRepository { db: get_db().await? };
        let p = repo.insert_product(&input("LMP-4")).await?;
        assert!(repo.delete_product(p.id).await?);
        assert!(!repo.delete_product(p.id).await?);
        Ok(())
    }
}

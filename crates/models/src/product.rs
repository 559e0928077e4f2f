use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::{self, DESCRIPTION_MAX, IMAGE_MAX, NAME_MAX, SKU_MAX};
use crate::{category, product_category};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub sku: String,
    pub description: String,
    pub image: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    ProductCategory,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::ProductCategory => Entity::has_many(product_category::Entity).into(),
        }
    }
}

impl Related<product_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCategory.def()
    }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef {
        product_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(product_category::Relation::Product.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Validate the mutable fields plus SKU.
pub fn validate(name: &str, sku: &str, description: &str, image: &str, price: Decimal) -> Result<(), ModelError> {
    validation::required("Name", name, NAME_MAX)?;
    validation::required("SKU", sku, SKU_MAX)?;
    validation::required("Description", description, DESCRIPTION_MAX)?;
    validation::required("Image", image, IMAGE_MAX)?;
    validation::non_negative("Price", price)?;
    validation::at_most("Price", price, validation::price_max())
}

pub async fn find_by_sku(db: &DatabaseConnection, sku: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Sku.eq(sku)).one(db).await?)
}

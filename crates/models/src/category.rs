use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::{self, NAME_MAX};
use crate::{product, product_category};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
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

impl Related<product::Entity> for Entity {
    fn to() -> RelationDef {
        product_category::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(product_category::Relation::Category.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    validation::required("Name", name, NAME_MAX)
}

pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Name.eq(name)).one(db).await?)
}

use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::{self, NAME_MAX};
use crate::{role, user_role};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_name: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    UserRole,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::UserRole => Entity::has_many(user_role::Entity).into(),
        }
    }
}

impl Related<user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRole.def()
    }
}

impl Related<role::Entity> for Entity {
    fn to() -> RelationDef {
        user_role::Relation::Role.def()
    }

    fn via() -> Option<RelationDef> {
        Some(user_role::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate(user_name: &str, first_name: &str, last_name: &str) -> Result<(), ModelError> {
    validation::required("UserName", user_name, NAME_MAX)?;
    validation::required("FirstName", first_name, NAME_MAX)?;
    validation::required("LastName", last_name, NAME_MAX)
}

pub async fn find_by_user_name(db: &DatabaseConnection, user_name: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::UserName.eq(user_name)).one(db).await?)
}

use sea_orm::{entity::prelude::*, ActiveModelTrait, ConnectionTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::{self, NAME_MAX};
use crate::{user, user_role};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
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

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        user_role::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(user_role::Relation::Role.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    validation::required("Role", name, NAME_MAX)
}

/// Fetch a role by name, creating it when missing.
pub async fn find_or_create<C: ConnectionTrait>(db: &C, name: &str) -> Result<Model, ModelError> {
    validate_name(name)?;
    if let Some(existing) = Entity::find().filter(Column::Name.eq(name)).one(db).await? {
        return Ok(existing);
    }
    let am = ActiveModel { name: Set(name.to_string()), ..Default::default() };
    Ok(am.insert(db).await?)
}

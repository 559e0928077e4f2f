use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use models::{role, user, user_role};

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::{AuthRepository, NewUser};

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn repo_err(e: DbErr) -> AuthError {
    AuthError::Repository(e.to_string())
}

async fn role_names<C: ConnectionTrait>(db: &C, u: &user::Model) -> Result<Vec<String>, AuthError> {
    let roles = u
        .find_related(role::Entity)
        .order_by_asc(role::Column::Name)
        .all(db)
        .await
        .map_err(repo_err)?;
    Ok(roles.into_iter().map(|r| r.name).collect())
}

fn to_auth_user(u: user::Model, roles: Vec<String>) -> AuthUser {
    AuthUser { id: u.id, user_name: u.user_name, first_name: u.first_name, last_name: u.last_name, roles }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<AuthUser>, AuthError> {
        let Some(u) = user::find_by_user_name(&self.db, user_name).await? else {
            return Ok(None);
        };
        let roles = role_names(&self.db, &u).await?;
        Ok(Some(to_auth_user(u, roles)))
    }

    async fn create_user(&self, new_user: NewUser<'_>) -> Result<AuthUser, AuthError> {
        user::validate(new_user.user_name, new_user.first_name, new_user.last_name)?;
        for name in new_user.roles {
            role::validate_name(name)?;
        }

        // dropping the transaction on any early return rolls everything back
        let txn = self.db.begin().await.map_err(repo_err)?;
        let am = user::ActiveModel {
            user_name: Set(new_user.user_name.to_string()),
            password_hash: Set(new_user.password_hash.to_string()),
            first_name: Set(new_user.first_name.to_string()),
            last_name: Set(new_user.last_name.to_string()),
            ..Default::default()
        };
        let created = am.insert(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AuthError::Conflict,
            _ => repo_err(e),
        })?;
        for name in new_user.roles {
            let r = role::find_or_create(&txn, name).await?;
            let linked = user_role::Entity::find()
                .filter(user_role::Column::UserId.eq(created.id))
                .filter(user_role::Column::RoleId.eq(r.id))
                .count(&txn)
                .await
                .map_err(repo_err)?;
            if linked == 0 {
                user_role::Entity::insert(user_role::ActiveModel { user_id: Set(created.id), role_id: Set(r.id) })
                    .exec_without_returning(&txn)
                    .await
                    .map_err(repo_err)?;
            }
        }
        let roles = role_names(&txn, &created).await?;
        txn.commit().await.map_err(repo_err)?;
        Ok(to_auth_user(created, roles))
    }

    async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError> {
        let res = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(res.map(|u| Credentials { user_id: u.id, password_hash: u.password_hash }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    fn new_user<'a>(user_name: &'a str, roles: &'a [String]) -> NewUser<'a> {
        NewUser { user_name, first_name: "Carol", last_name: "Danvers", password_hash: "$argon2id$x", roles }
    }

    #[tokio::test]
    async fn roles_are_loaded_with_the_user() -> Result<(), anyhow::Error> {
        let repo = SeaOrmAuthRepository { db: get_db().await? };
        let roles = vec!["User".to_string(), "Admin".to_string(), "Admin".to_string()];
        let u = repo.create_user(new_user("carol", &roles)).await?;
        assert_eq!(u.roles, vec!["Admin".to_string(), "User".to_string()]);

        // roles are shared between users
        let other = repo.create_user(new_user("kara", &["Admin".to_string()])).await?;
        assert_eq!(other.roles, vec!["Admin".to_string()]);

        let found = repo.find_user_by_name("carol").await?.expect("user");
        assert_eq!(found.roles, vec!["Admin".to_string(), "User".to_string()]);
        assert!(repo.find_user_by_name("Carol").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn bad_role_stores_nothing() -> Result<(), anyhow::Error> {
        let repo = SeaOrmAuthRepository { db: get_db().await? };
        let roles = vec!["Admin".to_string(), "r".repeat(51)];
        let err = repo.create_user(new_user("eve", &roles)).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)), "got {err:?}");
        assert!(repo.find_user_by_name("eve").await?.is_none());

        let u = repo.create_user(new_user("eve", &["Admin".to_string()])).await?;
        assert_eq!(u.roles, vec!["Admin".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_user_name_is_conflict() -> Result<(), anyhow::Error> {
        let repo = SeaOrmAuthRepository { db: get_db().await? };
        repo.create_user(new_user("dave", &[])).await?;
        let err = repo.create_user(new_user("dave", &["Admin".to_string()])).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
        // the failed attempt left no role behind
        assert!(role::Entity::find().one(&repo.db).await?.is_none());
        Ok(())
    }
}

use async_trait::async_trait;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Look up a user by exact name, with roles loaded.
    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<AuthUser>, AuthError>;
    /// Insert the user and link the named roles (created on demand) as one unit:
    /// on error nothing is stored.
    async fn create_user(&self, new_user: NewUser<'_>) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError>;
}

/// Validated registration data handed to the repository.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub user_name: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
    pub roles: &'a [String],
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: user_name
        creds: Mutex<HashMap<i32, Credentials>>, // key: user_id
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_name(&self, user_name: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(user_name).cloned())
        }

        async fn create_user(&self, new_user: NewUser<'_>) -> Result<AuthUser, AuthError> {
            for role in new_user.roles {
                models::role::validate_name(role)?;
            }
            let mut users = self.users.lock().unwrap();
            if users.contains_key(new_user.user_name) {
                return Err(AuthError::Conflict);
            }
            let mut roles: Vec<String> = Vec::new();
            for role in new_user.roles {
                if !roles.contains(role) {
                    roles.push(role.clone());
                }
            }
            roles.sort();
            let user = AuthUser {
                id: users.len() as i32 + 1,
                user_name: new_user.user_name.to_string(),
                first_name: new_user.first_name.to_string(),
                last_name: new_user.last_name.to_string(),
                roles,
            };
            users.insert(user.user_name.clone(), user.clone());
            self.creds
                .lock()
                .unwrap()
                .insert(user.id, Credentials { user_id: user.id, password_hash: new_user.password_hash.to_string() });
            Ok(user)
        }

        async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }
    }
}

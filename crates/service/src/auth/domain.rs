use serde::{Deserialize, Serialize};

/// Role granting write access to the catalog.
pub const ADMIN_ROLE: &str = "Admin";

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterInput {
    pub user_name: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginInput {
    pub user_name: String,
    pub password: String,
}

/// Domain user (business view), roles loaded explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: i32,
    pub password_hash: String,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
}

/// Body returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenResponse {
    pub token: String,
}

/// JWT payload. One `role` entry per role linked to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub role: Vec<String>,
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verified caller identity, attached to requests after token checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_name: String,
    pub given_name: String,
    pub family_name: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool { self.is_in_role(ADMIN_ROLE) }
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Self { user_name: c.sub, given_name: c.given_name, family_name: c.family_name, roles: c.role }
    }
}

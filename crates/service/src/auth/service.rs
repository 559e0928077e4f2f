use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, decode_header, encode, get_current_timestamp, Algorithm, Header as JwtHeader, Validation};
use tracing::{debug, info, instrument, warn};

use super::domain::{AuthSession, AuthUser, Claims, LoginInput, Principal, RegisterInput};
use super::errors::AuthError;
use super::keys::{KeyProvider, StaticKeyProvider};
use super::password::{hash_password, verify_against_dummy, verify_password, MIN_PASSWORD_LEN};
use super::repository::{AuthRepository, NewUser};

/// Auth service configuration
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Tokens carry no `exp` when unset.
    pub token_ttl: Option<Duration>,
}

impl AuthConfig {
    pub fn from_settings(settings: &configs::AuthSettings) -> Self {
        Self {
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            token_ttl: settings.token_ttl_secs.map(Duration::from_secs),
        }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository, K: KeyProvider = StaticKeyProvider> {
    repo: Arc<R>,
    keys: Arc<K>,
    cfg: AuthConfig,
}

impl<R: AuthRepository, K: KeyProvider> AuthService<R, K> {
    pub fn new(repo: Arc<R>, keys: Arc<K>, cfg: AuthConfig) -> Self { Self { repo, keys, cfg } }

    pub fn keys(&self) -> &Arc<K> { &self.keys }

    /// Register a new user with a hashed password and the given roles.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::{domain::RegisterInput, SigningKey, StaticKeyProvider};
    /// use std::sync::Arc;
    /// let keys = Arc::new(StaticKeyProvider::new(SigningKey::new("k1", [7u8; 32]), vec![]));
    /// let svc = AuthService::new(Arc::new(MockAuthRepository::default()), keys, AuthConfig::default());
    /// let input = RegisterInput { user_name: "alice".into(), password: "Secret123".into(), first_name: "Alice".into(), last_name: "Smith".into(), roles: vec!["Admin".into()] };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.roles, vec!["Admin".to_string()]);
    /// ```
    #[instrument(skip(self, input), fields(user_name = %input.user_name))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
        }
        models::user::validate(&input.user_name, &input.first_name, &input.last_name)?;
        for role in &input.roles {
            models::role::validate_name(role)?;
        }
        if let Some(existing) = self.repo.find_user_by_name(&input.user_name).await? {
            debug!("user exists: {}", existing.user_name);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        let user = self
            .repo
            .create_user(NewUser {
                user_name: &input.user_name,
                first_name: &input.first_name,
                last_name: &input.last_name,
                password_hash: &hash,
                roles: &input.roles,
            })
            .await?;
        info!(user_id = user.id, roles = ?user.roles, "user_registered");
        Ok(user)
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown user and wrong password are both `Unauthorized`.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::{domain::{RegisterInput, LoginInput}, SigningKey, StaticKeyProvider};
    /// use std::sync::Arc;
    /// let keys = Arc::new(StaticKeyProvider::new(SigningKey::new("k1", [7u8; 32]), vec![]));
    /// let svc = AuthService::new(Arc::new(MockAuthRepository::default()), keys, AuthConfig::default());
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { user_name: "u".into(), password: "Passw0rd".into(), first_name: "F".into(), last_name: "L".into(), roles: vec![] }));
    /// let session = tokio_test::block_on(svc.authenticate(LoginInput { user_name: "u".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.user_name, "u");
    /// assert_eq!(svc.verify(&session.token).unwrap().user_name, "u");
    /// ```
    #[instrument(skip(self, input), fields(user_name = %input.user_name))]
    pub async fn authenticate(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        if input.user_name.is_empty() || input.password.is_empty() {
            return Err(AuthError::Unauthorized);
        }
        // unknown users still pay for one hash check so timing does not reveal them
        let Some(user) = self.repo.find_user_by_name(&input.user_name).await? else {
            verify_against_dummy(&input.password);
            return Err(AuthError::Unauthorized);
        };
        let Some(cred) = self.repo.get_credentials(user.id).await? else {
            verify_against_dummy(&input.password);
            return Err(AuthError::Unauthorized);
        };

        if !verify_password(&input.password, &cred.password_hash)? {
            warn!("password mismatch");
            return Err(AuthError::Unauthorized);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = user.id, "user_authenticated");
        Ok(AuthSession { user, token })
    }

    /// Sign a token for `user` with the active key.
    pub fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        let now = get_current_timestamp();
        let claims = Claims {
            sub: user.user_name.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
            role: user.roles.clone(),
            iat: now,
            exp: self.cfg.token_ttl.map(|ttl| now + ttl.as_secs()),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
        };
        let key = self.keys.active();
        let mut header = JwtHeader::new(Algorithm::HS256);
        header.kid = Some(key.id().to_string());
        encode(&header, &claims, &key.encoding_key()).map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Check signature and registered claims, returning the caller's identity.
    ///
    /// The `kid` header selects the key; tokens without one are checked against
    /// the active key.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::TokenError(e.to_string()))?;
        let key = match header.kid.as_deref() {
            Some(kid) => self
                .keys
                .find(kid)
                .ok_or_else(|| AuthError::TokenError(format!("unknown key id {kid}")))?,
            None => self.keys.active(),
        };
        let data = decode::<Claims>(token, &key.decoding_key(), &self.validation())
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(Principal::from(data.claims))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        if self.cfg.token_ttl.is_some() {
            validation.set_required_spec_claims(&["exp"]);
        }
        validation.validate_exp = true;
        match &self.cfg.issuer {
            Some(iss) => validation.set_issuer(&[iss]),
            None => validation.iss = None,
        }
        match &self.cfg.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        validation
    }
}

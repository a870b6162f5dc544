//! Registration, login and token validation.

use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::jwt::{AccessTokenClaims, JwtService};
use super::repository::UserRepository;
use super::ServiceError;
use crate::models::{Role, User};
use crate::utils::{hash_password, verify_password, Password};

/// Email carried by tokens from [`AuthService::dummy_login`].
pub const DUMMY_EMAIL: &str = "dummy@example.com";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: JwtService,
}

fn parse_role(role: &str) -> Result<Role, ServiceError> {
    role.parse()
        .map_err(|_| ServiceError::InvalidRole(role.to_string()))
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: Password,
        role: &str,
    ) -> Result<User, ServiceError> {
        let role = parse_role(role)?;

        if self.users.get_by_email(email).await?.is_some() {
            return Err(ServiceError::UserAlreadyExists);
        }

        let hash = hash_password(&password)?;
        let user = self.users.create(email, &hash, role).await?;

        info!(user_id = %user.id, role = %role, "User registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: Password) -> Result<String, ServiceError> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_password(&password, &user.password_hash) {
            warn!(user_id = %user.id, "Login failed: password mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self
            .jwt
            .generate_access_token(&user.id.to_string(), &user.email, user.role)?;

        info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// Token for a synthetic user with the given role. No user is stored.
    #[instrument(skip(self))]
    pub fn dummy_login(&self, role: &str) -> Result<String, ServiceError> {
        let role = parse_role(role)?;
        let token = self
            .jwt
            .generate_access_token(&Uuid::new_v4().to_string(), DUMMY_EMAIL, role)?;
        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims, ServiceError> {
        self.jwt.validate_access_token(token).map_err(|e| {
            warn!(error = %e, "Token rejected");
            ServiceError::InvalidToken
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::services::MemoryStore;

    fn auth() -> AuthService {
        let jwt = JwtService::new(&JwtConfig {
            secret: "unit-test-secret".into(),
            expiry_hours: 24,
        })
        .unwrap();
        AuthService::new(Arc::new(MemoryStore::new()), jwt)
    }

    #[tokio::test]
    async fn register_then_login() {
        let auth = auth();
        let user = auth
            .register("emp@example.com", Password::new("secret1"), "employee")
            .await
            .unwrap();
        assert_eq!(user.role, Role::Employee);

        let token = auth
            .login("emp@example.com", Password::new("secret1"))
            .await
            .unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, Role::Employee);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let auth = auth();
        auth.register("emp@example.com", Password::new("secret1"), "employee")
            .await
            .unwrap();

        let wrong = auth.login("emp@example.com", Password::new("nope")).await;
        let unknown = auth.login("ghost@example.com", Password::new("secret1")).await;
        assert!(matches!(wrong, Err(ServiceError::InvalidCredentials)));
        assert!(matches!(unknown, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn duplicate_email_and_bad_role_are_rejected() {
        let auth = auth();
        auth.register("m@example.com", Password::new("secret1"), "moderator")
            .await
            .unwrap();

        let dup = auth
            .register("m@example.com", Password::new("secret1"), "moderator")
            .await;
        assert!(matches!(dup, Err(ServiceError::UserAlreadyExists)));

        let bad = auth
            .register("x@example.com", Password::new("secret1"), "admin")
            .await;
        assert!(matches!(bad, Err(ServiceError::InvalidRole(_))));
    }

    #[test]
    fn dummy_login_carries_requested_role() {
        let auth = auth();
        let token = auth.dummy_login("moderator").unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.role, Role::Moderator);
        assert_eq!(claims.email, DUMMY_EMAIL);

        assert!(matches!(
            auth.dummy_login("superuser"),
            Err(ServiceError::InvalidRole(_))
        ));
        assert!(matches!(
            auth.validate_token("not-a-jwt"),
            Err(ServiceError::InvalidToken)
        ));
    }
}

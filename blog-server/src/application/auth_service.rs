use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::data::user_repository::UserRepository;
use crate::domain::input::Registration;
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
    admins: Arc<HashSet<String>>,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self {
            repo,
            keys,
            admins: Arc::new(HashSet::new()),
        }
    }

    /// Usernames that get the administrator role when they register.
    pub fn with_admins(mut self, usernames: impl IntoIterator<Item = String>) -> Self {
        self.admins = Arc::new(usernames.into_iter().collect());
        self
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: uuid::Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<User, DomainError> {
        registration.validate()?;

        let username = registration.username.trim().to_string();
        let hash = hash_password(&registration.password)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        let is_admin = self.admins.contains(&username);
        let user = User::new(
            username,
            registration.email.trim().to_lowercase(),
            hash,
            is_admin,
        );
        self.repo.create(user).await
    }

    /// Accepts either a username or an email address as `login`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: &str) -> Result<(User, String), DomainError> {
        let login = login.trim();
        let user = match self.repo.find_by_username(login).await? {
            Some(user) => user,
            None => self
                .repo
                .find_by_email(&login.to_lowercase())
                .await?
                .ok_or(DomainError::Unauthorized)?,
        };

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        let token = self
            .keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        Ok((user, token))
    }
}

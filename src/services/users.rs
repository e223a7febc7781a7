//! User directory and credential checks

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{CreateUser, LoginRequest, User, UserQuery, UserSummary},
    },
    repository::Repository,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check credentials and return the user summary with its role
    pub async fn login(&self, request: &LoginRequest) -> AppResult<(UserSummary, Role)> {
        let email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;
        let password = request.password.as_deref().unwrap_or_default();

        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(user.password_hash.as_deref(), password)? {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        check_role_hint(user.role, request.role.as_deref())?;

        tracing::info!("User {} logged in as {}", user.id, user.role);
        Ok((UserSummary::from(&user), user.role))
    }

    /// Search users
    pub async fn search(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        self.repository.users.search(query).await
    }

    /// Create a user with a hashed password
    pub async fn create(&self, data: CreateUser) -> AppResult<User> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if data.first_name.trim().is_empty() || data.last_name.trim().is_empty() {
            return Err(AppError::Validation("Names cannot be blank".to_string()));
        }

        let role = Role::normalize(&data.role)?;
        let hash = hash_password(&data.password)?;

        let user = self.repository.users.create(&data, role, &hash).await?;
        tracing::info!("Created user {} with role {}", user.id, user.role);
        Ok(user)
    }
}

/// A role hint that names a different role than the stored one is refused
fn check_role_hint(stored: Role, hint: Option<&str>) -> AppResult<()> {
    match hint.map(str::trim).filter(|h| !h.is_empty()) {
        None => Ok(()),
        Some(hint) => {
            let wanted = Role::normalize(hint)?;
            if wanted == stored {
                Ok(())
            } else {
                Err(AppError::Forbidden(format!(
                    "This account cannot log in as {}",
                    wanted
                )))
            }
        }
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash (no hash never matches)
pub fn verify_password(hash: Option<&str>, password: &str) -> AppResult<bool> {
    let Some(hash) = hash else {
        return Ok(false);
    };
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correcto-123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(Some(&hash), "correcto-123").unwrap());
        assert!(!verify_password(Some(&hash), "otro").unwrap());
        assert!(!verify_password(None, "correcto-123").unwrap());
    }

    #[test]
    fn test_corrupt_hash_is_internal_error() {
        assert!(matches!(
            verify_password(Some("plaintext"), "plaintext"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_role_hint() {
        assert!(check_role_hint(Role::Librarian, None).is_ok());
        assert!(check_role_hint(Role::Librarian, Some("  ")).is_ok());
        assert!(check_role_hint(Role::Librarian, Some("Bibliotecaria")).is_ok());
        assert!(matches!(
            check_role_hint(Role::Client, Some("admin")),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_role_hint(Role::Client, Some("superuser")),
            Err(AppError::Validation(_))
        ));
    }
}

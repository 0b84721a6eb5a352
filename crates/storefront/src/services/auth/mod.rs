//! Authentication service.
//!
//! Password login, registration and the session records kept in the two
//! key/value scopes. [`gate`] turns a session into admin or staff
//! capabilities.

mod error;
pub mod gate;

pub use error::{AuthError, RegistrationError};
pub use gate::{Actor, AdminAccess, AuthGate, StaffAccess};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;

use eshop_core::{Email, UserRole};

use crate::db::users::UserRepository;
use crate::db::{Repository, RepositoryError};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::session::AuthRecord;
use crate::models::user::{PublicUser, User};
use crate::storage::{self, KeyValueStore, keys};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Self-service signup form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl RegistrationForm {
    /// Check required fields, password rules and the email format.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<Email, RegistrationError> {
        for (field, value) in [
            ("username", &self.username),
            ("name", &self.name),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(RegistrationError::MissingField(field));
            }
        }
        if self.password != self.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }
        validate_password(&self.password)?;
        Ok(Email::parse(&self.email)?)
    }
}

/// Authentication service.
///
/// Borrows the user repository and both storage scopes for the duration of
/// one operation. The caller persists the user collection afterwards.
pub struct AuthService<'a> {
    users: &'a mut UserRepository,
    persistent: &'a mut dyn KeyValueStore,
    session: &'a mut dyn KeyValueStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    pub fn new(
        users: &'a mut UserRepository,
        persistent: &'a mut dyn KeyValueStore,
        session: &'a mut dyn KeyValueStore,
    ) -> Self {
        Self {
            users,
            persistent,
            session,
        }
    }

    /// Log in with username and password.
    ///
    /// With `remember_me` the record is written to the persistent scope,
    /// otherwise to the session scope.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is unknown, the
    /// password is wrong or the account is disabled.
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<AuthRecord, AuthError> {
        let mut user = self
            .users
            .get_by_username(username)
            .filter(|user| user.is_active)
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        let now = Utc::now();
        user.last_login = Some(now);
        let user = self.users.update(user)?;

        let record = AuthRecord {
            user: PublicUser::from(&user),
            timestamp: now,
            remember_me,
        };
        self.store_record(&record);

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::info!(username = %user.username, remember_me, "User logged in");
        Ok(record)
    }

    /// Load the current login, preferring the persistent scope.
    ///
    /// Corrupt records are logged and ignored.
    #[must_use]
    pub fn restore(&self) -> Option<AuthRecord> {
        restore_session(&*self.persistent, &*self.session)
    }

    /// Clear the login from both scopes.
    pub fn logout(&mut self) {
        storage::forget(self.persistent, keys::AUTH);
        storage::forget(self.session, keys::AUTH_SESSION);
        clear_sentry_user();
        tracing::info!("User logged out");
    }

    /// Create a customer account and log it in for this session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Registration` for form problems and
    /// `AuthError::UserAlreadyExists` if the username or email is taken.
    pub fn register(&mut self, form: &RegistrationForm) -> Result<AuthRecord, AuthError> {
        let email = form.validate()?;
        let password_hash = hash_password(&form.password)?;

        let now = Utc::now();
        let user = User {
            id: self.users.next_id(),
            username: form.username.trim().to_owned(),
            password_hash,
            role: UserRole::Customer,
            name: form.name.trim().to_owned(),
            email,
            is_active: true,
            created_at: now.date_naive(),
            last_login: Some(now),
            phone: non_blank(form.phone.as_deref()),
            address: non_blank(form.address.as_deref()),
        };

        let user = self.users.add(user).map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        let record = AuthRecord {
            user: PublicUser::from(&user),
            timestamp: now,
            remember_me: false,
        };
        self.store_record(&record);

        tracing::info!(username = %user.username, user_id = %user.id, "User registered");
        Ok(record)
    }

    fn store_record(&mut self, record: &AuthRecord) {
        if record.remember_me {
            storage::persist(self.persistent, keys::AUTH, record);
        } else {
            storage::persist(self.session, keys::AUTH_SESSION, record);
        }
    }
}

/// Load a login record: `eshop-auth` first, then `eshop-auth-session`.
#[must_use]
pub fn restore_session(
    persistent: &dyn KeyValueStore,
    session: &dyn KeyValueStore,
) -> Option<AuthRecord> {
    storage::load(persistent, keys::AUTH).or_else(|| storage::load(session, keys::AUTH_SESSION))
}

/// Build a user record with a freshly hashed password.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn new_user(
    id: eshop_core::UserId,
    username: &str,
    password: &str,
    role: UserRole,
    name: &str,
    email: Email,
) -> Result<User, AuthError> {
    Ok(User {
        id,
        username: username.to_owned(),
        password_hash: hash_password(password)?,
        role,
        name: name.to_owned(),
        email,
        is_active: true,
        created_at: Utc::now().date_naive(),
        last_login: None,
        phone: None,
        address: None,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `RegistrationError::PasswordTooShort` below the minimum length.
pub fn validate_password(password: &str) -> Result<(), RegistrationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(RegistrationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

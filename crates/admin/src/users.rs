//! Account management panel.

use chrono::NaiveDate;

use eshop_core::{Email, UserId, UserRole};
use eshop_storefront::Storefront;
use eshop_storefront::db::{Repository, RepositoryError};
use eshop_storefront::interchange;
use eshop_storefront::models::user::{PublicUser, User};
use eshop_storefront::services::auth::{
    Actor, AdminAccess, hash_password, validate_password,
};

use crate::error::{AdminError, Result};

/// The add/edit user form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub username: String,
    /// Required on create. Left blank on edit to keep the current password.
    pub password: String,
    pub role: UserRole,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl UserForm {
    fn checked(&self) -> Result<Email> {
        if self.username.trim().is_empty() {
            return Err(AdminError::MissingField("username"));
        }
        if self.name.trim().is_empty() {
            return Err(AdminError::MissingField("name"));
        }
        if self.email.trim().is_empty() {
            return Err(AdminError::MissingField("email"));
        }
        Ok(Email::parse(self.email.trim())?)
    }

    fn new_password_hash(&self) -> Result<Option<String>> {
        if self.password.is_empty() {
            return Ok(None);
        }
        validate_password(&self.password)?;
        Ok(Some(hash_password(&self.password)?))
    }
}

/// User CRUD for admins.
pub struct UserAdmin<'a> {
    store: &'a mut Storefront,
    access: &'a AdminAccess,
}

impl<'a> UserAdmin<'a> {
    #[must_use]
    pub const fn new(store: &'a mut Storefront, access: &'a AdminAccess) -> Self {
        Self { store, access }
    }

    /// Every account, without password hashes.
    #[must_use]
    pub fn list(&self) -> Vec<PublicUser> {
        self.store
            .users()
            .list()
            .iter()
            .map(PublicUser::from)
            .collect()
    }

    /// Create an account with the next free id.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::MissingField` for blank fields (including the
    /// password), `AdminError::InvalidPassword` for short passwords and
    /// `AdminError::Repository` when the username or email is taken.
    pub fn create(&mut self, form: &UserForm, today: NaiveDate) -> Result<PublicUser> {
        let email = form.checked()?;
        let password_hash = form
            .new_password_hash()?
            .ok_or(AdminError::MissingField("password"))?;

        let user = User {
            id: self.store.users().next_id(),
            username: form.username.trim().to_owned(),
            password_hash,
            role: form.role,
            name: form.name.trim().to_owned(),
            email,
            is_active: form.is_active,
            created_at: today,
            last_login: None,
            phone: non_blank(form.phone.as_deref()),
            address: non_blank(form.address.as_deref()),
        };
        let user = self.store.users_mut(self.access).add(user)?;
        self.store.persist_users();
        tracing::info!(
            actor = self.access.actor().name(),
            user_id = %user.id,
            role = %user.role,
            "User created"
        );
        Ok(PublicUser::from(&user))
    }

    /// Apply the form to an existing account.
    ///
    /// A blank password keeps the current hash. Creation date and last login
    /// are never touched.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`], plus `AdminError::NotFound` for unknown ids.
    pub fn update(&mut self, id: UserId, form: &UserForm) -> Result<PublicUser> {
        let email = form.checked()?;
        let existing = self
            .store
            .users()
            .get(&id)
            .ok_or_else(|| AdminError::user_not_found(id))?;

        let user = User {
            username: form.username.trim().to_owned(),
            password_hash: form
                .new_password_hash()?
                .unwrap_or(existing.password_hash),
            role: form.role,
            name: form.name.trim().to_owned(),
            email,
            is_active: form.is_active,
            phone: non_blank(form.phone.as_deref()),
            address: non_blank(form.address.as_deref()),
            ..existing
        };
        let user = self
            .store
            .users_mut(self.access)
            .update(user)
            .map_err(|e| not_found_or(e, id))?;
        self.store.persist_users();
        tracing::info!(actor = self.access.actor().name(), user_id = %id, "User updated");
        Ok(PublicUser::from(&user))
    }

    /// Remove an account. Admins cannot remove their own.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::SelfModification` or `AdminError::NotFound`.
    pub fn delete(&mut self, id: UserId) -> Result<PublicUser> {
        self.ensure_not_self(id, "delete")?;
        let user = self
            .store
            .users_mut(self.access)
            .delete(&id)
            .map_err(|e| not_found_or(e, id))?;
        self.store.persist_users();
        tracing::info!(actor = self.access.actor().name(), user_id = %id, "User deleted");
        Ok(PublicUser::from(&user))
    }

    /// Flip the active flag. Admins cannot deactivate themselves.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::SelfModification` or `AdminError::NotFound`.
    pub fn toggle_active(&mut self, id: UserId) -> Result<PublicUser> {
        self.ensure_not_self(id, "deactivate")?;
        let mut user = self
            .store
            .users()
            .get(&id)
            .ok_or_else(|| AdminError::user_not_found(id))?;
        user.is_active = !user.is_active;

        let user = self.store.users_mut(self.access).update(user)?;
        self.store.persist_users();
        tracing::info!(
            actor = self.access.actor().name(),
            user_id = %id,
            is_active = user.is_active,
            "User active flag changed"
        );
        Ok(PublicUser::from(&user))
    }

    /// All accounts as pretty JSON, with password hashes.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Import` if serialization fails.
    pub fn export(&self) -> Result<String> {
        Ok(interchange::export_users(self.store.users())?)
    }

    /// Replace every account with the contents of `json`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Import`; accounts are unchanged on error.
    pub fn import(&mut self, json: &str) -> Result<usize> {
        let count = interchange::import_users(self.store.users_mut(self.access), json)?;
        self.store.persist_users();
        tracing::info!(actor = self.access.actor().name(), count, "Users replaced from import");
        Ok(count)
    }

    fn ensure_not_self(&self, id: UserId, action: &'static str) -> Result<()> {
        match self.access.actor() {
            Actor::User(me) if me.id == id => Err(AdminError::SelfModification { action }),
            _ => Ok(()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn not_found_or(err: RepositoryError, id: UserId) -> AdminError {
    match err {
        RepositoryError::NotFound => AdminError::user_not_found(id),
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eshop_storefront::config::StorefrontConfig;
    use eshop_storefront::demo::DemoData;
    use eshop_storefront::services::auth::{AuthGate, RegistrationError};

    use super::*;

    fn demo_store() -> Storefront {
        let mut store = Storefront::in_memory(StorefrontConfig::default());
        store
            .seed(&AuthGate::operator(), DemoData::load().unwrap())
            .unwrap();
        store
    }

    fn form(username: &str, email: &str) -> UserForm {
        UserForm {
            username: username.to_owned(),
            password: "packer42".to_owned(),
            role: UserRole::Employee,
            name: "Ravi Kumar".to_owned(),
            email: email.to_owned(),
            is_active: true,
            phone: Some("  ".to_owned()),
            address: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    }

    #[test]
    fn test_create_assigns_next_id_and_hashes() {
        let mut store = demo_store();
        let access = AuthGate::operator();
        let created = UserAdmin::new(&mut store, &access)
            .create(&form("packer", "ravi@abn.example"), today())
            .unwrap();

        assert_eq!(created.id, UserId::new(6));
        assert_eq!(created.phone, None);
        let stored = store.users().get(&created.id).unwrap();
        assert!(stored.password_hash.starts_with("$argon2"));
        assert!(store.login("packer", "packer42", false).is_ok());
    }

    #[test]
    fn test_create_requires_password_and_unique_names() {
        let mut store = demo_store();
        let access = AuthGate::operator();
        let mut admin = UserAdmin::new(&mut store, &access);

        let mut no_password = form("packer", "ravi@abn.example");
        no_password.password = String::new();
        assert!(matches!(
            admin.create(&no_password, today()),
            Err(AdminError::MissingField("password"))
        ));

        let mut short = form("packer", "ravi@abn.example");
        short.password = "abc".to_owned();
        assert!(matches!(
            admin.create(&short, today()),
            Err(AdminError::InvalidPassword(
                RegistrationError::PasswordTooShort { .. }
            ))
        ));

        assert!(matches!(
            admin.create(&form("admin", "ravi@abn.example"), today()),
            Err(AdminError::Repository(RepositoryError::Conflict(_)))
        ));
        assert!(matches!(
            admin.create(&form("packer", "not-an-email"), today()),
            Err(AdminError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_update_with_blank_password_keeps_hash() {
        let mut store = demo_store();
        let access = AuthGate::operator();
        let before = store.users().get(&UserId::new(2)).unwrap();

        let mut edit = form("employee1", before.email.as_str());
        edit.password = String::new();
        edit.name = "Renamed".to_owned();
        let updated = UserAdmin::new(&mut store, &access)
            .update(UserId::new(2), &edit)
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.created_at, before.created_at);
        let after = store.users().get(&UserId::new(2)).unwrap();
        assert_eq!(after.password_hash, before.password_hash);
        assert!(store.login("employee1", "emp123", false).is_ok());
    }

    #[test]
    fn test_admin_cannot_remove_or_disable_self() {
        let mut store = demo_store();
        store.login("admin", "admin123", false).unwrap();
        let access = store.require_admin().unwrap();
        let mut admin = UserAdmin::new(&mut store, &access);

        assert!(matches!(
            admin.delete(UserId::new(1)),
            Err(AdminError::SelfModification { action: "delete" })
        ));
        assert!(matches!(
            admin.toggle_active(UserId::new(1)),
            Err(AdminError::SelfModification { action: "deactivate" })
        ));

        let toggled = admin.toggle_active(UserId::new(3)).unwrap();
        assert!(!toggled.is_active);
        admin.delete(UserId::new(3)).unwrap();
        assert!(matches!(
            admin.delete(UserId::new(3)),
            Err(AdminError::NotFound(_))
        ));
        assert_eq!(admin.list().len(), 4);
    }

    #[test]
    fn test_deactivated_user_loses_access() {
        let mut store = demo_store();
        store.login("employee1", "emp123", false).unwrap();
        assert!(store.require_staff().is_ok());

        let access = AuthGate::operator();
        UserAdmin::new(&mut store, &access)
            .toggle_active(UserId::new(2))
            .unwrap();
        assert!(store.require_staff().is_err());
    }

    #[test]
    fn test_export_keeps_hashes_only() {
        let mut store = demo_store();
        let access = AuthGate::operator();
        let json = UserAdmin::new(&mut store, &access).export().unwrap();
        assert!(!json.contains("admin123"));
        assert!(json.contains("$argon2"));

        let mut target = Storefront::in_memory(StorefrontConfig::default());
        assert_eq!(UserAdmin::new(&mut target, &access).import(&json).unwrap(), 5);
        assert!(target.login("manager", "mgr789", false).is_ok());
    }
}

//! Role checks that hand out capabilities.
//!
//! Admin operations take an [`AdminAccess`] or [`StaffAccess`] argument.
//! Neither can be built outside this module. A capability comes either from
//! a session check or, with the `operator` feature, from
//! [`AuthGate::operator`] for tooling that owns the data directory. Crates
//! built without that feature can only get one by logging in.

use super::AuthError;
use crate::db::users::UserRepository;
use crate::models::session::AuthRecord;
use crate::models::user::PublicUser;

/// Who is acting through a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// A logged-in account.
    User(PublicUser),
    /// Local tooling with direct access to the data directory.
    Operator,
}

impl Actor {
    /// Name for logs.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::User(user) => &user.username,
            Self::Operator => "operator",
        }
    }
}

/// Proof of an admin login. Required for catalog, user and company changes.
#[derive(Debug, Clone)]
pub struct AdminAccess {
    actor: Actor,
}

impl AdminAccess {
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Admins may do everything staff may do.
    #[must_use]
    pub fn as_staff(&self) -> StaffAccess {
        StaffAccess {
            actor: self.actor.clone(),
        }
    }
}

/// Proof of an admin or employee login. Required for order operations.
#[derive(Debug, Clone)]
pub struct StaffAccess {
    actor: Actor,
}

impl StaffAccess {
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }
}

/// Checks sessions against the current user records.
///
/// The role and active flag are read from the repository, not from the
/// stored session, so demoting or disabling a user takes effect at once.
#[derive(Debug, Clone, Copy)]
pub struct AuthGate<'a> {
    users: &'a UserRepository,
}

impl<'a> AuthGate<'a> {
    #[must_use]
    pub const fn new(users: &'a UserRepository) -> Self {
        Self { users }
    }

    /// Require an active admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` without a valid session and
    /// `AuthError::Forbidden` for other roles.
    pub fn require_admin(&self, session: Option<&AuthRecord>) -> Result<AdminAccess, AuthError> {
        let user = self.current_user(session)?;
        if !user.role.can_manage_store() {
            tracing::warn!(username = %user.username, role = %user.role, "Admin access denied");
            return Err(AuthError::Forbidden {
                role: user.role,
                action: "manage the store",
            });
        }
        Ok(AdminAccess {
            actor: Actor::User(user),
        })
    }

    /// Require an active admin or employee.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` without a valid session and
    /// `AuthError::Forbidden` for customers.
    pub fn require_staff(&self, session: Option<&AuthRecord>) -> Result<StaffAccess, AuthError> {
        let user = self.current_user(session)?;
        if !user.role.can_manage_orders() {
            tracing::warn!(username = %user.username, role = %user.role, "Staff access denied");
            return Err(AuthError::Forbidden {
                role: user.role,
                action: "manage orders",
            });
        }
        Ok(StaffAccess {
            actor: Actor::User(user),
        })
    }

    /// Admin capability for local operator tooling. No session is checked.
    #[cfg(any(test, feature = "operator"))]
    #[must_use]
    pub const fn operator() -> AdminAccess {
        AdminAccess {
            actor: Actor::Operator,
        }
    }

    fn current_user(&self, session: Option<&AuthRecord>) -> Result<PublicUser, AuthError> {
        let record = session.ok_or(AuthError::Unauthenticated)?;
        let user = self
            .users
            .get_by_username(&record.user.username)
            .filter(|user| user.id == record.user.id && user.is_active)
            .ok_or(AuthError::Unauthenticated)?;
        Ok(PublicUser::from(&user))
    }
}

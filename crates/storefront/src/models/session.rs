//! Login records kept in the key/value stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::PublicUser;

/// A logged-in user as written under `eshop-auth` or `eshop-auth-session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    pub user: PublicUser,
    pub timestamp: DateTime<Utc>,
    /// `true` when the record lives in the persistent scope.
    pub remember_me: bool,
}

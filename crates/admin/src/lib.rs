//! eshop Admin library.
//!
//! Back-office panels over a [`eshop_storefront::Storefront`]. Each panel is
//! built from a capability issued by the auth gate:
//!
//! - [`CatalogAdmin`], [`UserAdmin`], [`CompanyAdmin`] need an `AdminAccess`
//! - [`OrderAdmin`] needs a `StaffAccess` (admins and employees)
//!
//! Every change is saved to the storefront's persistent store before the
//! panel method returns.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod company;
pub mod error;
pub mod orders;
pub mod users;

pub use catalog::CatalogAdmin;
pub use company::CompanyAdmin;
pub use error::{AdminError, Result};
pub use orders::{BackupFile, OrderAdmin};
pub use users::{UserAdmin, UserForm};

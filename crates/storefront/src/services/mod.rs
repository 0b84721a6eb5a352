//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password login, registration, session records and the admin/staff gate

pub mod auth;

//! Domain models for storefront records that are not catalog products.

pub mod order;
pub mod session;
pub mod user;

pub use order::{Order, OrderItem, OrderStats, ShippingAddress};
pub use session::AuthRecord;
pub use user::{PublicUser, User};

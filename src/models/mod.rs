//! Domain models
//!
//! Plain data structs for the entities stored in the database, plus the
//! small enums (roles, statuses, contexts) shared across services and the
//! API layer.

pub mod category;
pub mod event;
pub mod integration;
pub mod post;
pub mod product;
pub mod session;
pub mod user;

pub use category::{Category, CategoryContext, CategoryTreeNode};
pub use event::{EventType, VisitorEvent};
pub use integration::{Integration, Provider};
pub use post::{Post, PostStatus};
pub use product::{Product, ProductEngine, ProductImage, ProductStatus, WholesaleTier};
pub use session::Session;
pub use user::{User, UserRole};

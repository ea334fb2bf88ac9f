//! Repository layer
//!
//! Each entity gets a trait defining its data access interface and a
//! `Sqlx*Repository` implementation. Services depend on the traits
//! (`Arc<dyn XRepository>`), which keeps them testable and independent of
//! the storage backend.

pub mod category;
pub mod event;
pub mod integration;
pub mod post;
pub mod product;
pub mod session;
pub mod settings;
pub mod user;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use event::{EventRepository, ProductClickCount, SqlxEventRepository};
pub use integration::{IntegrationRepository, SqlxIntegrationRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use product::{ProductRepository, SqlxProductRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use settings::{SettingsRepository, SqlxSettingsRepository};
pub use user::{SqlxUserRepository, UserRepository};

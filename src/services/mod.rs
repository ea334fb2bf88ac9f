//! Service layer
//!
//! Business logic on top of the repositories. Each service carries its own
//! error enum; anything the storage layer surfaces is wrapped as
//! `InternalError`.

pub mod analytics;
pub mod category;
pub mod checkout;
pub mod integration;
pub mod password;
pub mod post;
pub mod product;
pub mod settings;
pub mod slug;
pub mod user;

pub use analytics::AnalyticsService;
pub use category::CategoryService;
pub use checkout::CheckoutService;
pub use integration::IntegrationService;
pub use post::PostService;
pub use product::ProductService;
pub use settings::SettingsService;
pub use user::UserService;

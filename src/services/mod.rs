pub mod collection;
pub mod input;
pub mod rate_limit;
pub use rate_limit::{MemoryRateLimitStore, RateLimitStore, RateLimiter};

pub mod upload;
pub use upload::{AssetStore, FsAssetStore, ImageCategory, UploadError, UploadService};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;

pub mod catalog_service;
pub mod catalog_service_impl;
pub use catalog_service::{CatalogError, CatalogService, MangaDraft, TomeDraft, TomePage};
pub use catalog_service_impl::SeaOrmCatalogService;

pub mod reading_service;
pub mod reading_service_impl;
pub use reading_service::{ReadingError, ReadingService};
pub use reading_service_impl::SeaOrmReadingService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{ProfileDraft, UserDraft, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

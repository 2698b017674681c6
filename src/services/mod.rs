//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They own
//! validation, the parent/child invariants of blocks and menus, cache
//! invalidation, and pushing chat messages to live connections.

pub mod block;
pub mod chat;
pub mod error;
pub mod geography;
pub mod hub;
pub mod menu;
pub mod page;
pub mod password;
pub mod rate_limiter;
pub mod role;
pub mod upload;
pub mod user;

pub use block::{BlockCategoryService, BlockPhotoService, BlockService, BlockVideoService};
pub use chat::{ChatError, ChatService};
pub use error::ContentError;
pub use geography::{CityService, CountryService};
pub use hub::{ChatHub, ClientFrame, ConnectionId, HubEvent};
pub use menu::{MenuCategoryService, MenuService};
pub use page::{PageAttachmentService, PagePhotoService, PageService};
pub use password::{hash_password, verify_password};
pub use rate_limiter::LoginRateLimiter;
pub use role::RoleService;
pub use upload::{StoredFile, UploadKind, UploadLocation, UploadService};
pub use user::{IdentityError, UserAccess, UserService, SEEDED_ADMIN_ID};

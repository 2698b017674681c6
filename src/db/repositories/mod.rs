//! Database repositories
//!
//! One trait per aggregate plus an `Sqlx*` implementation that runs the
//! same SQL on SQLite or MySQL through `with_pool!`.

pub mod block;
pub mod block_category;
pub mod block_media;
pub mod chat;
pub mod geography;
pub mod menu;
pub mod menu_category;
pub mod page;
pub mod page_media;
pub mod role;
pub mod session;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;

pub use block::{BlockRepository, SqlxBlockRepository};
pub use block_category::{BlockCategoryRepository, SqlxBlockCategoryRepository};
pub use block_media::{
    BlockPhotoRepository, BlockVideoRepository, SqlxBlockPhotoRepository, SqlxBlockVideoRepository,
};
pub use chat::{ChatRepository, SqlxChatRepository};
pub use geography::{CityRepository, CountryRepository, SqlxCityRepository, SqlxCountryRepository};
pub use menu::{MenuLocation, MenuRepository, SqlxMenuRepository};
pub use menu_category::{MenuCategoryRepository, SqlxMenuCategoryRepository};
pub use page::{PageRepository, SqlxPageRepository};
pub use page_media::{
    PageAttachmentRepository, PagePhotoRepository, SqlxPageAttachmentRepository,
    SqlxPagePhotoRepository,
};
pub use role::{RoleRepository, SqlxRoleRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};

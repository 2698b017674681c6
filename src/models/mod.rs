//! Data models
//!
//! Database rows (`sqlx::FromRow`) and the camelCase request/response types
//! the admin SPA exchanges with the API.

mod block;
mod chat;
mod geography;
pub mod lenient;
mod menu;
mod page;
pub mod permission;
mod role;
mod session;
mod tree;
mod user;

pub use block::{
    Block, BlockCategory, BlockCategoryInput, BlockInput, BlockPhoto, BlockPhotoInput, BlockTree,
    BlockType, BlockVideo, BlockVideoInput, ContentBody,
};
pub use chat::{ChatContact, ChatMessage, ConversationSummary, SendMessageInput};
pub use geography::{City, CityInput, Country, CountryInput};
pub use menu::{Menu, MenuCategory, MenuCategoryInput, MenuInput, MenuTree};
pub use page::{
    Page, PageAttachment, PageAttachmentInput, PageInput, PageListQuery, PagePhoto, PagePhotoInput,
};
pub use permission::{Action, PermissionGroup, PERMISSION_CLAIM_TYPE};
pub use role::{
    is_protected_role, Role, RoleClaim, RoleClaimEntry, RoleInput, RolePermissions,
    UpdatePermissionsInput, ADMINISTRATOR_ROLE, BASIC_ROLE,
};
pub use session::Session;
pub use tree::{build_tree, TreeItem, TreeNode};
pub use user::{
    ChangeCredentialsInput, RegisterInput, TokenRequest, TokenResponse, UpdateUserInput,
    UploadRequest, User, UserRoleEntry, UserRolesPayload,
};

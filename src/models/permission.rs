//! Permission catalogue
//!
//! Permissions are role claims of type `Permission` named
//! `Permissions.<Group>.<Action>`. The catalogue is fixed at compile time;
//! roles only toggle which entries they hold.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;

/// Claim type used for every permission claim
pub const PERMISSION_CLAIM_TYPE: &str = "Permission";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PermissionGroup {
    Users,
    Roles,
    RoleClaims,
    Countries,
    Cities,
    BlockCategories,
    Blocks,
    BlockPhotos,
    BlockVideos,
    MenuCategories,
    Menus,
    Pages,
    PagePhotos,
    PageAttachments,
    Chat,
}

impl PermissionGroup {
    pub const ALL: [PermissionGroup; 15] = [
        PermissionGroup::Users,
        PermissionGroup::Roles,
        PermissionGroup::RoleClaims,
        PermissionGroup::Countries,
        PermissionGroup::Cities,
        PermissionGroup::BlockCategories,
        PermissionGroup::Blocks,
        PermissionGroup::BlockPhotos,
        PermissionGroup::BlockVideos,
        PermissionGroup::MenuCategories,
        PermissionGroup::Menus,
        PermissionGroup::Pages,
        PermissionGroup::PagePhotos,
        PermissionGroup::PageAttachments,
        PermissionGroup::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionGroup::Users => "Users",
            PermissionGroup::Roles => "Roles",
            PermissionGroup::RoleClaims => "RoleClaims",
            PermissionGroup::Countries => "Countries",
            PermissionGroup::Cities => "Cities",
            PermissionGroup::BlockCategories => "BlockCategories",
            PermissionGroup::Blocks => "Blocks",
            PermissionGroup::BlockPhotos => "BlockPhotos",
            PermissionGroup::BlockVideos => "BlockVideos",
            PermissionGroup::MenuCategories => "MenuCategories",
            PermissionGroup::Menus => "Menus",
            PermissionGroup::Pages => "Pages",
            PermissionGroup::PagePhotos => "PagePhotos",
            PermissionGroup::PageAttachments => "PageAttachments",
            PermissionGroup::Chat => "Chat",
        }
    }

    /// Actions that exist for this group
    pub fn actions(&self) -> &'static [Action] {
        match self {
            PermissionGroup::Chat => &[Action::View, Action::Send],
            _ => &[Action::View, Action::Create, Action::Edit, Action::Delete],
        }
    }
}

impl fmt::Display for PermissionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Send,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "View",
            Action::Create => "Create",
            Action::Edit => "Edit",
            Action::Delete => "Delete",
            Action::Send => "Send",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Send => "send",
        }
    }
}

/// Claim value for a group/action pair, e.g. `Permissions.Blocks.View`
pub fn permission_name(group: PermissionGroup, action: Action) -> String {
    format!("Permissions.{}.{}", group.as_str(), action.as_str())
}

/// Catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionDef {
    pub value: String,
    pub group: &'static str,
    pub description: String,
}

static CATALOGUE: Lazy<Vec<PermissionDef>> = Lazy::new(|| {
    PermissionGroup::ALL
        .iter()
        .flat_map(|group| {
            group.actions().iter().map(move |action| PermissionDef {
                value: permission_name(*group, *action),
                group: group.as_str(),
                description: format!("Allows users to {} {}", action.verb(), group.as_str()),
            })
        })
        .collect()
});

/// Every permission a role can hold, grouped in declaration order
pub fn all_permissions() -> &'static [PermissionDef] {
    &CATALOGUE
}

pub fn find_permission(value: &str) -> Option<&'static PermissionDef> {
    CATALOGUE.iter().find(|p| p.value == value)
}

pub fn is_known_permission(value: &str) -> bool {
    find_permission(value).is_some()
}

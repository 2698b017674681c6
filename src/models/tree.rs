//! Parent/child trees for self-referencing entities (blocks, menus)

use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A row that points at an optional parent of the same kind
pub trait TreeItem {
    fn node_id(&self) -> i64;
    fn parent_id(&self) -> Option<i64>;
    /// Sibling ordering; ties broken by id
    fn sort_key(&self) -> (i32, i64);
}

/// Node of a built tree; the item's fields are flattened next to `children`
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub item: T,
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    /// Number of nodes in this subtree, including itself
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Build a forest from a flat list.
///
/// Items whose parent is not in the list become roots, so a filtered list
/// (one category) never loses rows. Each item is placed at most once.
pub fn build_tree<T: TreeItem>(mut items: Vec<T>) -> Vec<TreeNode<T>> {
    let ids: HashSet<i64> = items.iter().map(TreeItem::node_id).collect();
    items.sort_by_key(TreeItem::sort_key);

    let mut levels: HashMap<Option<i64>, Vec<T>> = HashMap::new();
    for item in items {
        let parent = item
            .parent_id()
            .filter(|p| *p != item.node_id() && ids.contains(p));
        levels.entry(parent).or_default().push(item);
    }

    attach(None, &mut levels)
}

fn attach<T: TreeItem>(parent: Option<i64>, levels: &mut HashMap<Option<i64>, Vec<T>>) -> Vec<TreeNode<T>> {
    let Some(siblings) = levels.remove(&parent) else {
        return Vec::new();
    };
    siblings
        .into_iter()
        .map(|item| {
            let children = attach(Some(item.node_id()), levels);
            TreeNode { item, children }
        })
        .collect()
}

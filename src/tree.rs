//! Category forest construction from the flat category list

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::error::{CatalogError, Result};
use crate::models::{Category, CategoryId, CategoryNode};

/// One row of a depth-annotated, pre-order listing of the forest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub id: CategoryId,
    pub name: String,
    pub depth: usize,
}

/// Build the forest hanging off `root` (`None` = top level).
///
/// Siblings are ordered by `display_order`; entries without one follow in
/// list order. Fails with [`CatalogError::CyclicCategoryGraph`] if any
/// `parent_id` chain in the list loops back on itself.
pub fn build_tree(categories: &[Category], root: Option<CategoryId>) -> Result<Vec<CategoryNode>> {
    check_acyclic(categories)?;

    let mut by_parent: HashMap<Option<CategoryId>, Vec<&Category>> = HashMap::new();
    for category in categories {
        by_parent.entry(category.parent_id).or_default().push(category);
    }
    for siblings in by_parent.values_mut() {
        sort_siblings(siblings);
    }

    let known: HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();
    for category in categories {
        if let Some(parent) = category.parent_id {
            if !known.contains(&parent) {
                warn!(id = category.id, parent, "category references a missing parent");
            }
        }
    }

    let mut ancestors = Vec::new();
    attach(&by_parent, root, &mut ancestors)
}

fn attach(
    by_parent: &HashMap<Option<CategoryId>, Vec<&Category>>,
    parent: Option<CategoryId>,
    ancestors: &mut Vec<CategoryId>,
) -> Result<Vec<CategoryNode>> {
    let Some(siblings) = by_parent.get(&parent) else {
        return Ok(Vec::new());
    };

    let mut nodes = Vec::with_capacity(siblings.len());
    for category in siblings {
        if ancestors.contains(&category.id) {
            return Err(CatalogError::CyclicCategoryGraph(category.id));
        }
        ancestors.push(category.id);
        let children = attach(by_parent, Some(category.id), ancestors)?;
        ancestors.pop();
        nodes.push(CategoryNode {
            category: (*category).clone(),
            children,
        });
    }
    Ok(nodes)
}

/// Numeric orders ascending, then unordered entries in their original position
pub fn sort_siblings(siblings: &mut [&Category]) {
    siblings.sort_by_key(|c| (c.display_order.is_none(), c.display_order));
}

/// Walk every parent chain; a chain that revisits an id is a cycle.
fn check_acyclic(categories: &[Category]) -> Result<()> {
    let parent_of: HashMap<CategoryId, Option<CategoryId>> =
        categories.iter().map(|c| (c.id, c.parent_id)).collect();
    let mut verified: HashSet<CategoryId> = HashSet::new();

    for category in categories {
        let mut chain = HashSet::new();
        let mut current = Some(category.id);
        while let Some(id) = current {
            if verified.contains(&id) {
                break;
            }
            if !chain.insert(id) {
                return Err(CatalogError::CyclicCategoryGraph(id));
            }
            current = parent_of.get(&id).copied().flatten();
        }
        verified.extend(chain);
    }
    Ok(())
}

/// Flatten a pre-joined tree back into records, taking `parent_id` from the nesting
pub fn flatten_tree(nodes: &[CategoryNode]) -> Vec<Category> {
    fn walk(nodes: &[CategoryNode], parent: Option<CategoryId>, out: &mut Vec<Category>) {
        for node in nodes {
            let mut category = node.category.clone();
            category.parent_id = parent;
            out.push(category);
            walk(&node.children, Some(node.id()), out);
        }
    }

    let mut out = Vec::new();
    walk(nodes, None, &mut out);
    out
}

pub fn find_node(nodes: &[CategoryNode], id: CategoryId) -> Option<&CategoryNode> {
    for node in nodes {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Ids strictly below `id`
pub fn descendant_ids(nodes: &[CategoryNode], id: CategoryId) -> HashSet<CategoryId> {
    fn collect(node: &CategoryNode, out: &mut HashSet<CategoryId>) {
        for child in &node.children {
            out.insert(child.id());
            collect(child, out);
        }
    }

    let mut out = HashSet::new();
    if let Some(node) = find_node(nodes, id) {
        collect(node, &mut out);
    }
    out
}

pub fn outline(nodes: &[CategoryNode]) -> Vec<OutlineRow> {
    fn walk(nodes: &[CategoryNode], depth: usize, out: &mut Vec<OutlineRow>) {
        for node in nodes {
            out.push(OutlineRow {
                id: node.id(),
                name: node.name().to_string(),
                depth,
            });
            walk(&node.children, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(nodes, 0, &mut out);
    out
}

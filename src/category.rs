//! Category tree controller: loading, selection, CRUD commands and sibling ordering

use std::collections::HashSet;

use tracing::{info, warn};

use crate::error::{ApiError, CatalogError, Result};
use crate::fence::{RequestFence, Ticket};
use crate::models::{Category, CategoryId, CategoryNode, CategoryPayload, ReorderCategoriesRequest, SiblingOrder};
use crate::ordering::{normalize, OrderInput};
use crate::prefs::{Preferences, LAST_CATEGORY_KEY};
use crate::tree::{self, OutlineRow};

/// What the server returned for a category listing
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryListing {
    Flat(Vec<Category>),
    Tree(Vec<CategoryNode>),
}

/// Effect of a click on a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(CategoryId),
    Cleared,
}

/// Result of applying a fresh listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLoaded {
    pub selected: Option<CategoryId>,
    /// Selection differs from what it was before the load
    pub selection_changed: bool,
}

/// Validated category mutation
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryCommand {
    Add(CategoryPayload),
    Update { id: CategoryId, payload: CategoryPayload },
    Delete { id: CategoryId, name: String },
    Reorder(ReorderCategoriesRequest),
}

impl CategoryCommand {
    pub fn add(name: &str, parent_id: Option<CategoryId>) -> Result<Self> {
        Ok(CategoryCommand::Add(CategoryPayload {
            category_name: validated_name(name)?,
            parent_id,
        }))
    }

    /// Confirmation text for destructive commands
    pub fn prompt(&self) -> Option<String> {
        match self {
            CategoryCommand::Delete { name, .. } => Some(format!("Delete category '{}'?", name)),
            _ => None,
        }
    }
}

fn validated_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::Invalid("category name must not be blank".to_string()));
    }
    Ok(name.to_string())
}

pub struct CategoryTreeController<P: Preferences> {
    categories: Vec<Category>,
    tree: Vec<CategoryNode>,
    selected: Option<CategoryId>,
    expanded: HashSet<CategoryId>,
    use_tree_endpoint: bool,
    fence: RequestFence,
    prefs: P,
}

impl<P: Preferences> CategoryTreeController<P> {
    pub fn new(prefs: P) -> Self {
        Self {
            categories: Vec::new(),
            tree: Vec::new(),
            selected: None,
            expanded: HashSet::new(),
            use_tree_endpoint: false,
            fence: RequestFence::new(),
            prefs,
        }
    }

    pub fn with_tree_endpoint(mut self, enabled: bool) -> Self {
        self.use_tree_endpoint = enabled;
        self
    }

    pub fn tree(&self) -> &[CategoryNode] {
        &self.tree
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn outline(&self) -> Vec<OutlineRow> {
        tree::outline(&self.tree)
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn selected(&self) -> Option<CategoryId> {
        self.selected
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn preferences(&self) -> &P {
        &self.prefs
    }

    pub fn is_loading(&self) -> bool {
        self.fence.in_flight()
    }

    /// Start a reload. Returns the ticket and whether to hit the tree endpoint.
    pub fn begin_load(&mut self) -> (Ticket, bool) {
        (self.fence.issue(), self.use_tree_endpoint)
    }

    /// Apply a listing. Stale tickets yield `Ok(None)`; failures leave the
    /// previous tree in place.
    pub fn apply_load(
        &mut self,
        ticket: Ticket,
        result: Result<CategoryListing, ApiError>,
    ) -> Result<Option<TreeLoaded>> {
        if !self.fence.settle(ticket) {
            warn!(seq = ticket.seq(), "discarding stale category listing");
            return Ok(None);
        }

        let categories = match result? {
            CategoryListing::Flat(list) => list,
            CategoryListing::Tree(nodes) => tree::flatten_tree(&nodes),
        };
        let forest = tree::build_tree(&categories, None)?;

        let previous = self.selected;
        // Reach the tree the same way the operator sees it; orphans are not selectable
        let reachable: HashSet<CategoryId> = tree::outline(&forest).into_iter().map(|row| row.id).collect();
        let remembered = previous.or_else(|| {
            self.prefs
                .get(LAST_CATEGORY_KEY)
                .and_then(|value| value.parse::<CategoryId>().ok())
        });

        self.selected = remembered.filter(|id| reachable.contains(id));
        match self.selected {
            Some(id) => self.prefs.set(LAST_CATEGORY_KEY, &id.to_string()),
            None => self.prefs.remove(LAST_CATEGORY_KEY),
        }
        self.expanded.retain(|id| reachable.contains(id));
        self.categories = categories;
        self.tree = forest;

        info!(
            categories = self.categories.len(),
            selected = ?self.selected,
            "category tree loaded"
        );
        Ok(Some(TreeLoaded {
            selected: self.selected,
            selection_changed: self.selected != previous,
        }))
    }

    /// Clicking the selected category deselects it; any other replaces the selection.
    pub fn select(&mut self, id: CategoryId) -> Result<SelectionChange> {
        if !self.is_reachable(id) {
            return Err(CatalogError::UnknownCategory(id));
        }
        if self.selected == Some(id) {
            return Ok(self.deselect());
        }
        self.selected = Some(id);
        self.prefs.set(LAST_CATEGORY_KEY, &id.to_string());
        Ok(SelectionChange::Selected(id))
    }

    /// In the tree as shown; orphans in the flat list are not
    fn is_reachable(&self, id: CategoryId) -> bool {
        tree::outline(&self.tree).iter().any(|row| row.id == id)
    }

    pub fn deselect(&mut self) -> SelectionChange {
        self.selected = None;
        self.prefs.remove(LAST_CATEGORY_KEY);
        SelectionChange::Cleared
    }

    pub fn toggle_expanded(&mut self, id: CategoryId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn is_expanded(&self, id: CategoryId) -> bool {
        self.expanded.contains(&id)
    }

    /// New category under the current selection (top level when nothing is selected)
    pub fn add_command(&self, name: &str) -> Result<CategoryCommand> {
        CategoryCommand::add(name, self.selected)
    }

    pub fn rename_command(&self, id: CategoryId, name: &str) -> Result<CategoryCommand> {
        let category = self.get(id).ok_or(CatalogError::UnknownCategory(id))?;
        Ok(CategoryCommand::Update {
            id,
            payload: CategoryPayload {
                category_name: validated_name(name)?,
                parent_id: category.parent_id,
            },
        })
    }

    /// Rename and move under `parent_id`. The new parent may not be the
    /// category itself or anything below it.
    pub fn update_command(
        &self,
        id: CategoryId,
        name: &str,
        parent_id: Option<CategoryId>,
    ) -> Result<CategoryCommand> {
        if self.get(id).is_none() {
            return Err(CatalogError::UnknownCategory(id));
        }
        if let Some(parent) = parent_id {
            if self.get(parent).is_none() {
                return Err(CatalogError::UnknownCategory(parent));
            }
            if parent == id || tree::descendant_ids(&self.tree, id).contains(&parent) {
                return Err(CatalogError::Invalid(format!(
                    "category {} cannot be placed under its own subtree",
                    id
                )));
            }
        }
        Ok(CategoryCommand::Update {
            id,
            payload: CategoryPayload {
                category_name: validated_name(name)?,
                parent_id,
            },
        })
    }

    /// Deletability (no children, no content) is decided by the server.
    pub fn delete_command(&self, id: CategoryId) -> Result<CategoryCommand> {
        let category = self.get(id).ok_or(CatalogError::UnknownCategory(id))?;
        Ok(CategoryCommand::Delete {
            id,
            name: category.name.clone(),
        })
    }

    /// Siblings under `parent`, in display order
    pub fn siblings(&self, parent: Option<CategoryId>) -> Vec<&Category> {
        let mut siblings: Vec<&Category> = self
            .categories
            .iter()
            .filter(|c| c.parent_id == parent)
            .collect();
        tree::sort_siblings(&mut siblings);
        siblings
    }

    /// Normalize edited orders for the children of one parent.
    ///
    /// Siblings without an edit keep their current order as input, so the
    /// request always covers the whole sibling group.
    pub fn reorder_command(
        &self,
        parent: Option<CategoryId>,
        edits: &[OrderInput<CategoryId>],
    ) -> Result<CategoryCommand> {
        let siblings = self.siblings(parent);
        for edit in edits {
            if !siblings.iter().any(|s| s.id == edit.id) {
                return Err(CatalogError::Invalid(format!(
                    "category {} is not a child of {}",
                    edit.id,
                    parent.map_or_else(|| "the top level".to_string(), |p| format!("category {}", p))
                )));
            }
        }

        let inputs: Vec<OrderInput<CategoryId>> = siblings
            .iter()
            .map(|sibling| {
                edits
                    .iter()
                    .find(|edit| edit.id == sibling.id)
                    .cloned()
                    .unwrap_or_else(|| OrderInput::new(sibling.id, sibling.display_order))
            })
            .collect();

        let items = normalize(&inputs)
            .into_iter()
            .map(|ranked| SiblingOrder {
                id: ranked.id,
                display_order: ranked.order,
            })
            .collect();
        Ok(CategoryCommand::Reorder(ReorderCategoriesRequest {
            parent_id: parent,
            items,
        }))
    }

    /// Bookkeeping after a successful command, before the reload lands
    pub fn command_succeeded(&mut self, command: &CategoryCommand) {
        if let CategoryCommand::Delete { id, .. } = command {
            self.expanded.remove(id);
            if self.selected == Some(*id) {
                self.deselect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferences;

    fn cat(id: CategoryId, parent: Option<CategoryId>, order: Option<i64>) -> Category {
        Category {
            id,
            name: format!("c{}", id),
            parent_id: parent,
            display_order: order,
        }
    }

    fn sample() -> Vec<Category> {
        vec![
            cat(1, None, Some(1)),
            cat(2, None, Some(2)),
            cat(3, Some(1), Some(1)),
            cat(4, Some(1), Some(2)),
            cat(5, Some(3), None),
        ]
    }

    fn loaded(prefs: MemoryPreferences) -> CategoryTreeController<MemoryPreferences> {
        let mut controller = CategoryTreeController::new(prefs);
        let (ticket, _) = controller.begin_load();
        controller
            .apply_load(ticket, Ok(CategoryListing::Flat(sample())))
            .unwrap();
        controller
    }

    #[test]
    fn test_restores_remembered_selection() {
        let controller = loaded(MemoryPreferences::new().with(LAST_CATEGORY_KEY, "4"));
        assert_eq!(controller.selected(), Some(4));
        assert_eq!(controller.tree().len(), 2);
    }

    #[test]
    fn test_forgets_selection_that_no_longer_exists() {
        let controller = loaded(MemoryPreferences::new().with(LAST_CATEGORY_KEY, "99"));
        assert_eq!(controller.selected(), None);
        assert_eq!(controller.preferences().get(LAST_CATEGORY_KEY), None);
    }

    #[test]
    fn test_tree_listing_is_flattened() {
        let mut controller = CategoryTreeController::new(MemoryPreferences::new()).with_tree_endpoint(true);
        let (ticket, use_tree) = controller.begin_load();
        assert!(use_tree);
        let nested = tree::build_tree(&sample(), None).unwrap();
        controller
            .apply_load(ticket, Ok(CategoryListing::Tree(nested.clone())))
            .unwrap();
        assert_eq!(controller.tree(), &nested[..]);
        assert_eq!(controller.categories().len(), 5);
    }

    #[test]
    fn test_stale_and_failed_loads_keep_tree() {
        let mut controller = loaded(MemoryPreferences::new());
        let (stale, _) = controller.begin_load();
        let (fresh, _) = controller.begin_load();
        assert_eq!(controller.apply_load(stale, Ok(CategoryListing::Flat(Vec::new()))).unwrap(), None);
        assert_eq!(controller.categories().len(), 5);

        let err = controller
            .apply_load(fresh, Err(ApiError::Transport("offline".to_string())))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Api(_)));
        assert_eq!(controller.categories().len(), 5);
    }

    #[test]
    fn test_cyclic_listing_is_reported_and_ignored() {
        let mut controller = loaded(MemoryPreferences::new());
        let (ticket, _) = controller.begin_load();
        let cyclic = vec![cat(1, Some(2), None), cat(2, Some(1), None)];
        let err = controller
            .apply_load(ticket, Ok(CategoryListing::Flat(cyclic)))
            .unwrap_err();
        assert!(matches!(err, CatalogError::CyclicCategoryGraph(_)));
        assert_eq!(controller.tree().len(), 2);
    }

    #[test]
    fn test_select_toggles_and_persists() {
        let mut controller = loaded(MemoryPreferences::new());
        assert_eq!(controller.select(3).unwrap(), SelectionChange::Selected(3));
        assert_eq!(controller.preferences().get(LAST_CATEGORY_KEY).as_deref(), Some("3"));
        assert_eq!(controller.select(4).unwrap(), SelectionChange::Selected(4));
        assert_eq!(controller.select(4).unwrap(), SelectionChange::Cleared);
        assert_eq!(controller.selected(), None);
        assert_eq!(controller.preferences().get(LAST_CATEGORY_KEY), None);
        assert!(matches!(controller.select(77), Err(CatalogError::UnknownCategory(77))));
    }

    #[test]
    fn test_orphans_cannot_be_selected() {
        let mut controller = CategoryTreeController::new(MemoryPreferences::new());
        let (ticket, _) = controller.begin_load();
        let mut listing = sample();
        listing.push(cat(8, Some(42), Some(1)));
        controller.apply_load(ticket, Ok(CategoryListing::Flat(listing))).unwrap();

        assert!(controller.get(8).is_some());
        assert!(matches!(controller.select(8), Err(CatalogError::UnknownCategory(8))));
        assert_eq!(controller.selected(), None);
        assert_eq!(controller.preferences().get(LAST_CATEGORY_KEY), None);
        assert_eq!(controller.select(5).unwrap(), SelectionChange::Selected(5));
    }

    #[test]
    fn test_add_goes_under_selection() {
        let mut controller = loaded(MemoryPreferences::new());
        assert_eq!(
            controller.add_command("  Kids ").unwrap(),
            CategoryCommand::Add(CategoryPayload {
                category_name: "Kids".to_string(),
                parent_id: None
            })
        );
        controller.select(1).unwrap();
        match controller.add_command("Anime").unwrap() {
            CategoryCommand::Add(payload) => assert_eq!(payload.parent_id, Some(1)),
            other => panic!("unexpected {:?}", other),
        }
        assert!(controller.add_command("   ").unwrap_err().is_validation());
    }

    #[test]
    fn test_rename_keeps_parent() {
        let controller = loaded(MemoryPreferences::new());
        match controller.rename_command(4, "Thrillers").unwrap() {
            CategoryCommand::Update { id, payload } => {
                assert_eq!(id, 4);
                assert_eq!(payload.category_name, "Thrillers");
                assert_eq!(payload.parent_id, Some(1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reparent_rejects_own_subtree() {
        let controller = loaded(MemoryPreferences::new());
        assert!(controller.update_command(1, "c1", Some(1)).is_err());
        assert!(controller.update_command(1, "c1", Some(5)).is_err());
        assert!(controller.update_command(1, "c1", Some(2)).is_ok());
        assert!(controller.update_command(5, "c5", None).is_ok());
    }

    #[test]
    fn test_reorder_scoped_to_siblings() {
        let controller = loaded(MemoryPreferences::new());
        let cmd = controller
            .reorder_command(Some(1), &[OrderInput::new(4, Some(0))])
            .unwrap();
        assert_eq!(
            cmd,
            CategoryCommand::Reorder(ReorderCategoriesRequest {
                parent_id: Some(1),
                items: vec![
                    SiblingOrder { id: 4, display_order: 1 },
                    SiblingOrder { id: 3, display_order: 2 },
                ],
            })
        );

        let err = controller
            .reorder_command(None, &[OrderInput::new(3, Some(1))])
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_reorder_blank_goes_last() {
        let controller = loaded(MemoryPreferences::new());
        let cmd = controller
            .reorder_command(None, &[OrderInput::from_text(1, "")])
            .unwrap();
        match cmd {
            CategoryCommand::Reorder(request) => {
                let ids: Vec<CategoryId> = request.items.iter().map(|i| i.id).collect();
                assert_eq!(ids, vec![2, 1]);
                assert_eq!(request.parent_id, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_delete_of_selected_clears_selection() {
        let mut controller = loaded(MemoryPreferences::new());
        controller.select(2).unwrap();
        let cmd = controller.delete_command(2).unwrap();
        assert_eq!(cmd.prompt().as_deref(), Some("Delete category 'c2'?"));
        controller.command_succeeded(&cmd);
        assert_eq!(controller.selected(), None);
    }

    #[test]
    fn test_expansion_survives_reload_only_for_existing_ids() {
        let mut controller = loaded(MemoryPreferences::new());
        controller.toggle_expanded(1);
        controller.toggle_expanded(3);
        controller.toggle_expanded(3);
        assert!(controller.is_expanded(1));
        assert!(!controller.is_expanded(3));

        let (ticket, _) = controller.begin_load();
        controller
            .apply_load(ticket, Ok(CategoryListing::Flat(vec![cat(2, None, None)])))
            .unwrap();
        assert!(!controller.is_expanded(1));
    }
}

//! Move dialog: pick a destination category for the selected content

use crate::error::{CatalogError, Result};
use crate::models::{CategoryId, CategoryNode, ContentId, MoveContentsRequest};
use crate::tree::{self, OutlineRow};

#[derive(Debug, Clone, PartialEq, Eq)]
struct MoveSession {
    ids: Vec<ContentId>,
    source: Option<CategoryId>,
    destination: Option<CategoryId>,
}

#[derive(Debug, Default)]
pub struct MoveCoordinator {
    session: Option<MoveSession>,
}

impl MoveCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open for `ids`, currently in `source` (when known). Any earlier pick is forgotten.
    pub fn open(&mut self, ids: Vec<ContentId>, source: Option<CategoryId>) {
        self.session = Some(MoveSession {
            ids,
            source,
            destination: None,
        });
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn cancel(&mut self) {
        self.session = None;
    }

    pub fn ids(&self) -> &[ContentId] {
        match &self.session {
            Some(session) => &session.ids,
            None => &[],
        }
    }

    pub fn source(&self) -> Option<CategoryId> {
        self.session.as_ref().and_then(|s| s.source)
    }

    pub fn destination(&self) -> Option<CategoryId> {
        self.session.as_ref().and_then(|s| s.destination)
    }

    pub fn choose(&mut self, destination: CategoryId) {
        if let Some(session) = self.session.as_mut() {
            session.destination = Some(destination);
        }
    }

    /// Every category, in tree order, as destination candidates
    pub fn destinations(&self, forest: &[CategoryNode]) -> Vec<OutlineRow> {
        tree::outline(forest)
    }

    /// Validate the pick and build the bulk move request
    pub fn prepare_confirm(&self) -> Result<MoveContentsRequest> {
        let session = self.session.as_ref().ok_or(CatalogError::NothingSelected)?;
        if session.ids.is_empty() {
            return Err(CatalogError::NothingSelected);
        }
        let destination = session.destination.ok_or(CatalogError::NoDestination)?;
        if session.source == Some(destination) {
            return Err(CatalogError::SameCategory);
        }
        Ok(MoveContentsRequest {
            ids: session.ids.clone(),
            category_id: destination,
        })
    }

    /// The move went through; close the dialog.
    pub fn move_succeeded(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn test_requires_destination() {
        let mut mover = MoveCoordinator::new();
        assert!(matches!(mover.prepare_confirm(), Err(CatalogError::NothingSelected)));
        mover.open(vec![3, 4], Some(1));
        assert!(matches!(mover.prepare_confirm(), Err(CatalogError::NoDestination)));
    }

    #[test]
    fn test_rejects_current_category() {
        let mut mover = MoveCoordinator::new();
        mover.open(vec![3], Some(1));
        mover.choose(1);
        assert!(matches!(mover.prepare_confirm(), Err(CatalogError::SameCategory)));
        mover.choose(2);
        assert_eq!(
            mover.prepare_confirm().unwrap(),
            MoveContentsRequest { ids: vec![3], category_id: 2 }
        );
    }

    #[test]
    fn test_unknown_source_accepts_any_destination() {
        let mut mover = MoveCoordinator::new();
        mover.open(vec![8], None);
        mover.choose(1);
        assert!(mover.prepare_confirm().is_ok());
    }

    #[test]
    fn test_reopen_forgets_destination() {
        let mut mover = MoveCoordinator::new();
        mover.open(vec![3], Some(1));
        mover.choose(2);
        mover.open(vec![3], Some(1));
        assert_eq!(mover.destination(), None);
        mover.move_succeeded();
        assert!(!mover.is_open());
        assert!(mover.ids().is_empty());
    }

    #[test]
    fn test_destinations_list_whole_tree() {
        let list = vec![
            Category { id: 1, name: "Movies".to_string(), parent_id: None, display_order: Some(1) },
            Category { id: 2, name: "Action".to_string(), parent_id: Some(1), display_order: Some(1) },
        ];
        let forest = tree::build_tree(&list, None).unwrap();
        let rows = MoveCoordinator::new().destinations(&forest);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].depth, 1);
    }
}

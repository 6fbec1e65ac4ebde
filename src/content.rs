//! Content browser: one page of a category's entries, search and bulk selection

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::error::{ApiError, CatalogError, Result};
use crate::fence::{RequestFence, Ticket};
use crate::models::{CategoryId, ContentDraft, ContentEntry, ContentId, ContentQuery, Page};
use crate::pagination::PageCursor;

/// Content pages are always this size
pub const CONTENT_PAGE_SIZE: u32 = 12;

/// What the operator typed versus what the current listing was filtered by
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    input: String,
    applied: String,
}

impl SearchState {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn applied(&self) -> &str {
        &self.applied
    }

    /// Typed but not yet searched
    pub fn is_pending(&self) -> bool {
        self.input.trim() != self.applied
    }

    fn commit(&mut self) {
        self.applied = self.input.trim().to_string();
    }

    fn reset(&mut self) {
        self.input.clear();
        self.applied.clear();
    }
}

/// Validated bulk delete, awaiting operator confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteContents {
    /// Category the rows were selected in
    pub category_id: CategoryId,
    pub ids: Vec<ContentId>,
}

impl DeleteContents {
    pub fn prompt(&self) -> String {
        format!("Delete {} content entr{}?", self.ids.len(), if self.ids.len() == 1 { "y" } else { "ies" })
    }
}

/// What became of a page response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Applied,
    /// Superseded by a newer request or a category change
    Stale,
    /// The requested page no longer exists; the cursor now points at the
    /// last one and the rows on screen are unchanged until it is fetched.
    PastEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentCommand {
    Create(ContentDraft),
    Update { id: ContentId, draft: ContentDraft },
}

impl ContentCommand {
    pub fn create(draft: ContentDraft) -> Result<Self> {
        Ok(ContentCommand::Create(validated_draft(draft)?))
    }

    pub fn update(id: ContentId, draft: ContentDraft) -> Result<Self> {
        Ok(ContentCommand::Update {
            id,
            draft: validated_draft(draft)?,
        })
    }
}

fn validated_draft(mut draft: ContentDraft) -> Result<ContentDraft> {
    draft.title = draft.title.trim().to_string();
    if draft.title.is_empty() {
        return Err(CatalogError::Invalid("content title must not be blank".to_string()));
    }
    if draft.category_id.is_none() {
        return Err(CatalogError::Invalid("choose a category for the content".to_string()));
    }
    Ok(draft)
}

#[derive(Debug)]
pub struct ContentBrowser {
    category: Option<CategoryId>,
    entries: Vec<ContentEntry>,
    cursor: PageCursor,
    search: SearchState,
    selection: BTreeSet<ContentId>,
    fence: RequestFence,
}

impl Default for ContentBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentBrowser {
    pub fn new() -> Self {
        Self {
            category: None,
            entries: Vec::new(),
            cursor: PageCursor::new(CONTENT_PAGE_SIZE),
            search: SearchState::default(),
            selection: BTreeSet::new(),
            fence: RequestFence::new(),
        }
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn entries(&self) -> &[ContentEntry] {
        &self.entries
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchState {
        &mut self.search
    }

    pub fn is_loading(&self) -> bool {
        self.fence.in_flight()
    }

    /// Switch to another category (or none). Drops the page, search and
    /// selection, and anything still in flight for the old category.
    pub fn show_category(&mut self, category: Option<CategoryId>) {
        self.category = category;
        self.entries.clear();
        self.cursor = PageCursor::new(CONTENT_PAGE_SIZE);
        self.search.reset();
        self.selection.clear();
        self.fence.invalidate();
    }

    fn begin(&mut self, page: u32) -> Option<(Ticket, ContentQuery)> {
        let category_id = self.category?;
        let query = ContentQuery {
            category_id,
            page,
            size: CONTENT_PAGE_SIZE,
            title: self.search.applied.clone(),
        };
        Some((self.fence.issue(), query))
    }

    /// First page of the current category with the applied filter
    pub fn begin_first_page(&mut self) -> Option<(Ticket, ContentQuery)> {
        self.begin(0)
    }

    /// Navigate to `page`. Pages outside `[0, total_pages)` are ignored.
    pub fn begin_go_to(&mut self, page: i64) -> Option<(Ticket, ContentQuery)> {
        if !self.cursor.contains(page) {
            return None;
        }
        self.begin(u32::try_from(page).ok()?)
    }

    /// Re-request the page currently shown
    pub fn begin_refresh(&mut self) -> Option<(Ticket, ContentQuery)> {
        self.begin(self.cursor.page)
    }

    /// Commit the typed term as the filter and go back to page 0
    pub fn begin_search(&mut self) -> Option<(Ticket, ContentQuery)> {
        self.category?;
        self.search.commit();
        self.begin(0)
    }

    /// Apply a page response. Failures keep the current page. A page past
    /// the end (rows moved or deleted out from under it) is not shown;
    /// `begin_refresh` then asks for the last page instead.
    pub fn apply_page(&mut self, ticket: Ticket, result: Result<Page<ContentEntry>, ApiError>) -> Result<PageOutcome> {
        if !self.fence.settle(ticket) {
            warn!(seq = ticket.seq(), "discarding stale content page");
            return Ok(PageOutcome::Stale);
        }
        let page = result?;

        self.cursor = PageCursor::from_page(&page, CONTENT_PAGE_SIZE);
        if page.total_pages > 0 && page.number >= page.total_pages {
            info!(
                category = ?self.category,
                requested = page.number,
                total_pages = page.total_pages,
                "content page no longer exists"
            );
            return Ok(PageOutcome::PastEnd);
        }
        self.entries = page.content;
        // Selection only ever covers rows that are on screen
        let visible: BTreeSet<ContentId> = self.entries.iter().map(|e| e.id).collect();
        self.selection.retain(|id| visible.contains(id));

        info!(
            category = ?self.category,
            page = self.cursor.page,
            total_pages = self.cursor.total_pages,
            rows = self.entries.len(),
            "content page loaded"
        );
        Ok(PageOutcome::Applied)
    }

    pub fn is_selected(&self, id: ContentId) -> bool {
        self.selection.contains(&id)
    }

    /// Toggle one visible row. Returns false for ids not on the current page.
    pub fn toggle(&mut self, id: ContentId) -> bool {
        if !self.entries.iter().any(|e| e.id == id) {
            return false;
        }
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
        true
    }

    /// Select or clear every row of the current page (never other pages)
    pub fn select_all_visible(&mut self, selected: bool) {
        self.selection.clear();
        if selected {
            self.selection.extend(self.entries.iter().map(|e| e.id));
        }
    }

    pub fn all_visible_selected(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| self.selection.contains(&e.id))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selected_ids(&self) -> Vec<ContentId> {
        self.selection.iter().copied().collect()
    }

    pub fn prepare_delete(&self) -> Result<DeleteContents> {
        let category_id = self.category.ok_or(CatalogError::NothingSelected)?;
        if self.selection.is_empty() {
            return Err(CatalogError::NothingSelected);
        }
        Ok(DeleteContents {
            category_id,
            ids: self.selected_ids(),
        })
    }

    /// Ids to hand to the move dialog; nothing changes until the move is confirmed
    pub fn prepare_move(&self) -> Result<Vec<ContentId>> {
        if self.selection.is_empty() {
            return Err(CatalogError::NothingSelected);
        }
        Ok(self.selected_ids())
    }

    /// Draft for a new entry in the current category
    pub fn new_draft(&self) -> Result<ContentDraft> {
        let category_id = self
            .category
            .ok_or_else(|| CatalogError::Invalid("select a category before adding content".to_string()))?;
        Ok(ContentDraft {
            exposed: true,
            category_id: Some(category_id),
            ..ContentDraft::default()
        })
    }

    pub fn edit_draft(&self, id: ContentId) -> Option<ContentDraft> {
        let entry = self.entries.iter().find(|e| e.id == id)?;
        Some(ContentDraft {
            title: entry.title.clone(),
            description: entry.description.clone().unwrap_or_default(),
            exposed: entry.exposed,
            category_id: entry.category_id.or(self.category),
            poster_path: entry.poster_path.clone(),
        })
    }
}

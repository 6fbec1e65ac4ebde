//! File ordering for one content entry
//!
//! Two views: a paged, read-mostly listing and a full, unpaged edit view.
//! In the edit view the operator can type order numbers or drag rows; the
//! draft is validated and sent as a whole on save.

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::{ApiError, CatalogError, Result};
use crate::fence::{RequestFence, Ticket};
use crate::models::{CatalogFile, ContentId, FileDraft, FileId, FileOrder, FileQuery, Page, ReorderFilesRequest};
use crate::ordering::parse_order;
use crate::pagination::PageCursor;

pub const DEFAULT_FILE_PAGE_SIZE: u32 = 25;

/// Number shown next to a row in the paged view. Counts down so the first
/// file overall gets the highest number. Presentation only; never sent back.
pub fn display_number(total_elements: u64, page: u32, page_size: u32, index: usize) -> i64 {
    total_elements as i64 - i64::from(page) * i64::from(page_size) - index as i64
}

/// A row in the edit view; `order` holds the field text as typed
#[derive(Debug, Clone, PartialEq)]
pub struct FileRow {
    pub file: CatalogFile,
    pub order: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileView {
    Paged {
        files: Vec<CatalogFile>,
        cursor: PageCursor,
    },
    FullEdit {
        /// Last order confirmed by the server
        committed: Vec<FileRow>,
        /// Working copy the operator edits
        draft: Vec<FileRow>,
    },
}

/// A read the file view needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFetch {
    Page(FileQuery),
    All(ContentId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileCommand {
    Create(FileDraft),
    Update { id: FileId, draft: FileDraft },
    Delete {
        content_id: ContentId,
        id: FileId,
        name: String,
    },
}

impl FileCommand {
    /// Entry whose file list the command changes
    pub fn content_id(&self) -> ContentId {
        match self {
            FileCommand::Create(draft) | FileCommand::Update { draft, .. } => draft.content_id,
            FileCommand::Delete { content_id, .. } => *content_id,
        }
    }

    pub fn prompt(&self) -> Option<String> {
        match self {
            FileCommand::Delete { name, .. } => Some(format!("Delete file '{}'?", name)),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct FileOrderManager {
    content_id: ContentId,
    title: String,
    page_size: u32,
    view: FileView,
    fence: RequestFence,
}

impl FileOrderManager {
    pub fn new(content_id: ContentId, title: &str, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            content_id,
            title: title.to_string(),
            page_size,
            view: FileView::Paged {
                files: Vec::new(),
                cursor: PageCursor::new(page_size),
            },
            fence: RequestFence::new(),
        }
    }

    pub fn content_id(&self) -> ContentId {
        self.content_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn view(&self) -> &FileView {
        &self.view
    }

    pub fn is_full_edit(&self) -> bool {
        matches!(self.view, FileView::FullEdit { .. })
    }

    pub fn is_loading(&self) -> bool {
        self.fence.in_flight()
    }

    /// Paged rows with their display numbers
    pub fn paged_rows(&self) -> Vec<(i64, &CatalogFile)> {
        match &self.view {
            FileView::Paged { files, cursor } => files
                .iter()
                .enumerate()
                .map(|(index, file)| {
                    (
                        display_number(cursor.total_elements, cursor.page, cursor.page_size, index),
                        file,
                    )
                })
                .collect(),
            FileView::FullEdit { .. } => Vec::new(),
        }
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        match &self.view {
            FileView::Paged { cursor, .. } => Some(cursor),
            FileView::FullEdit { .. } => None,
        }
    }

    pub fn draft(&self) -> Option<&[FileRow]> {
        match &self.view {
            FileView::FullEdit { draft, .. } => Some(draft),
            FileView::Paged { .. } => None,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        match &self.view {
            FileView::FullEdit { committed, draft } => committed != draft,
            FileView::Paged { .. } => false,
        }
    }

    fn page_query(&self, page: u32) -> FileQuery {
        FileQuery {
            content_id: self.content_id,
            page,
            size: self.page_size,
        }
    }

    pub fn begin_first_page(&mut self) -> (Ticket, FileQuery) {
        (self.fence.issue(), self.page_query(0))
    }

    /// Paged navigation; out-of-range pages and the edit view are no-ops.
    pub fn begin_go_to(&mut self, page: i64) -> Option<(Ticket, FileQuery)> {
        let cursor = self.cursor()?;
        if !cursor.contains(page) {
            return None;
        }
        let query = self.page_query(u32::try_from(page).ok()?);
        Some((self.fence.issue(), query))
    }

    pub fn apply_page(&mut self, ticket: Ticket, result: Result<Page<CatalogFile>, ApiError>) -> Result<bool> {
        if !self.fence.settle(ticket) {
            warn!(seq = ticket.seq(), content = self.content_id, "discarding stale file page");
            return Ok(false);
        }
        let page = result?;
        let cursor = PageCursor::from_page(&page, self.page_size);
        info!(content = self.content_id, page = cursor.page, rows = page.content.len(), "file page loaded");
        self.view = FileView::Paged {
            files: page.content,
            cursor,
        };
        Ok(true)
    }

    /// Confirmation text before loading every file
    pub fn full_edit_prompt(&self, warn_threshold: u64) -> String {
        let total = self.cursor().map_or(0, |c| c.total_elements);
        let mut prompt = format!("Load all {} files of '{}' for editing?", total, self.title);
        if total > warn_threshold {
            prompt.push_str(" Loading this many files may be slow.");
        }
        prompt
    }

    /// Request the unpaged file set; the view switches when it arrives.
    pub fn begin_full_edit(&mut self) -> (Ticket, ContentId) {
        (self.fence.issue(), self.content_id)
    }

    pub fn apply_all(&mut self, ticket: Ticket, result: Result<Vec<CatalogFile>, ApiError>) -> Result<bool> {
        if !self.fence.settle(ticket) {
            warn!(seq = ticket.seq(), content = self.content_id, "discarding stale file listing");
            return Ok(false);
        }
        let rows = edit_rows(result?);
        info!(content = self.content_id, rows = rows.len(), "full file list loaded for editing");
        self.view = FileView::FullEdit {
            committed: rows.clone(),
            draft: rows,
        };
        Ok(true)
    }

    /// Back to the paged view, dropping unsaved edits
    pub fn leave_full_edit(&mut self) -> (Ticket, FileQuery) {
        if self.has_unsaved_changes() {
            info!(content = self.content_id, "discarding unsaved file order");
        }
        self.view = FileView::Paged {
            files: Vec::new(),
            cursor: PageCursor::new(self.page_size),
        };
        self.begin_first_page()
    }

    fn draft_mut(&mut self) -> Result<&mut Vec<FileRow>> {
        match &mut self.view {
            FileView::FullEdit { draft, .. } => Ok(draft),
            FileView::Paged { .. } => Err(CatalogError::NotEditing),
        }
    }

    /// Change one row's order text. Other rows are left alone; blank is allowed
    /// until save.
    pub fn edit_order(&mut self, file_id: FileId, text: &str) -> Result<()> {
        let draft = self.draft_mut()?;
        let row = draft
            .iter_mut()
            .find(|row| row.file.id == file_id)
            .ok_or_else(|| CatalogError::Invalid(format!("file {} is not in the list", file_id)))?;
        row.order = text.to_string();
        Ok(())
    }

    /// Drag a row to a new position. Every row is renumbered from its
    /// position, replacing any typed orders.
    pub fn move_row(&mut self, from: usize, to: usize) -> Result<()> {
        let draft = self.draft_mut()?;
        let len = draft.len();
        if from >= len || to >= len {
            return Err(CatalogError::Invalid(format!(
                "row {} cannot move to {} in a list of {}",
                from, to, len
            )));
        }
        let row = draft.remove(from);
        draft.insert(to, row);
        for (index, row) in draft.iter_mut().enumerate() {
            row.order = (len - index).to_string();
        }
        Ok(())
    }

    /// Validate the draft: every order must be an integer and unique.
    pub fn prepare_save(&self) -> Result<ReorderFilesRequest> {
        let draft = match &self.view {
            FileView::FullEdit { draft, .. } => draft,
            FileView::Paged { .. } => return Err(CatalogError::NotEditing),
        };

        let mut seen: HashMap<i64, &str> = HashMap::new();
        let mut files = Vec::with_capacity(draft.len());
        for row in draft {
            let order = parse_order(&row.order).ok_or_else(|| CatalogError::InvalidOrder {
                file_name: row.file.vod_file_name.clone(),
                value: row.order.clone(),
            })?;
            if let Some(first) = seen.insert(order, &row.file.vod_file_name) {
                return Err(CatalogError::DuplicateOrder {
                    value: order,
                    first: first.to_string(),
                    second: row.file.vod_file_name.clone(),
                });
            }
            files.push(FileOrder { id: row.file.id, order });
        }

        Ok(ReorderFilesRequest {
            content_id: self.content_id,
            files,
        })
    }

    /// Whether `request` is exactly what this view's draft would save now
    pub fn saved_draft_is(&self, request: &ReorderFilesRequest) -> bool {
        request.content_id == self.content_id && self.prepare_save().is_ok_and(|draft| draft == *request)
    }

    /// The server accepted the draft: promote it and reload the current view.
    pub fn save_succeeded(&mut self) -> (Ticket, FileFetch) {
        if let FileView::FullEdit { committed, draft } = &mut self.view {
            *committed = draft.clone();
        }
        self.begin_reload()
    }

    /// Reload whatever the view shows: every file when editing, else page 0
    pub fn begin_reload(&mut self) -> (Ticket, FileFetch) {
        if self.is_full_edit() {
            let (ticket, content_id) = self.begin_full_edit();
            (ticket, FileFetch::All(content_id))
        } else {
            let (ticket, query) = self.begin_first_page();
            (ticket, FileFetch::Page(query))
        }
    }

    fn find_file(&self, id: FileId) -> Option<&CatalogFile> {
        match &self.view {
            FileView::Paged { files, .. } => files.iter().find(|f| f.id == id),
            FileView::FullEdit { committed, .. } => committed.iter().map(|row| &row.file).find(|f| f.id == id),
        }
    }

    pub fn create_command(&self, name: &str, path: &str) -> Result<FileCommand> {
        Ok(FileCommand::Create(self.file_draft(name, path, None)?))
    }

    pub fn update_command(&self, id: FileId, name: &str, path: &str) -> Result<FileCommand> {
        let file = self
            .find_file(id)
            .ok_or_else(|| CatalogError::Invalid(format!("file {} is not in the list", id)))?;
        Ok(FileCommand::Update {
            id,
            draft: self.file_draft(name, path, file.file_order)?,
        })
    }

    pub fn delete_command(&self, id: FileId) -> Result<FileCommand> {
        let file = self
            .find_file(id)
            .ok_or_else(|| CatalogError::Invalid(format!("file {} is not in the list", id)))?;
        Ok(FileCommand::Delete {
            content_id: self.content_id,
            id,
            name: file.vod_file_name.clone(),
        })
    }

    fn file_draft(&self, name: &str, path: &str, file_order: Option<i64>) -> Result<FileDraft> {
        let (name, path) = (name.trim(), path.trim());
        if name.is_empty() || path.is_empty() {
            return Err(CatalogError::Invalid("file name and path are required".to_string()));
        }
        Ok(FileDraft {
            content_id: self.content_id,
            vod_file_name: name.to_string(),
            vod_file_path: path.to_string(),
            file_order,
        })
    }
}

/// Rows for the edit view: highest order first, files without one after
/// them. Missing orders count down from just below the lowest existing
/// one, so a list that was never edited saves as loaded.
fn edit_rows(mut files: Vec<CatalogFile>) -> Vec<FileRow> {
    files.sort_by_key(|f| (f.file_order.is_none(), Reverse(f.file_order)));
    let blanks = files.iter().filter(|f| f.file_order.is_none()).count() as i64;
    let lowest = files.iter().filter_map(|f| f.file_order).min();
    let mut next = lowest.map_or(blanks, |lowest| blanks.min(lowest - 1));
    files
        .into_iter()
        .map(|file| {
            let order = match file.file_order {
                Some(order) => order,
                None => {
                    next -= 1;
                    next + 1
                }
            };
            FileRow {
                file,
                order: order.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;

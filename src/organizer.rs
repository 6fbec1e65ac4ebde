//! Catalog organizer: ties the tree, content browser, move dialog and file
//! view together.
//!
//! Nothing here touches the network. Reads are handed out as [`Fetch`]
//! values and come back as [`FetchResult`]s; writes are [`Mutation`]s. The
//! console runs both on worker threads, `run`/`execute` run them inline.

use std::collections::VecDeque;

use tracing::{info, warn};

use crate::api::CatalogApi;
use crate::category::{CategoryCommand, CategoryListing, CategoryTreeController, SelectionChange};
use crate::config::AppConfig;
use crate::content::{ContentBrowser, ContentCommand, DeleteContents, PageOutcome};
use crate::error::{ApiError, CatalogError, Result};
use crate::fence::Ticket;
use crate::files::{FileCommand, FileFetch, FileOrderManager};
use crate::models::*;
use crate::mover::MoveCoordinator;
use crate::prefs::Preferences;

/// A read to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    Categories { ticket: Ticket, tree: bool },
    Contents { ticket: Ticket, query: ContentQuery },
    FilePage { ticket: Ticket, query: FileQuery },
    AllFiles { ticket: Ticket, content_id: ContentId },
}

/// A completed read
#[derive(Debug)]
pub enum FetchResult {
    Categories {
        ticket: Ticket,
        result: Result<CategoryListing, ApiError>,
    },
    Contents {
        ticket: Ticket,
        result: Result<Page<ContentEntry>, ApiError>,
    },
    FilePage {
        ticket: Ticket,
        result: Result<Page<CatalogFile>, ApiError>,
    },
    AllFiles {
        ticket: Ticket,
        result: Result<Vec<CatalogFile>, ApiError>,
    },
}

impl Fetch {
    fn from_files((ticket, fetch): (Ticket, FileFetch)) -> Self {
        match fetch {
            FileFetch::Page(query) => Fetch::FilePage { ticket, query },
            FileFetch::All(content_id) => Fetch::AllFiles { ticket, content_id },
        }
    }

    pub fn run(&self, api: &dyn CatalogApi) -> FetchResult {
        match self {
            Fetch::Categories { ticket, tree } => {
                let result = if *tree {
                    api.category_tree().map(CategoryListing::Tree)
                } else {
                    api.list_categories().map(CategoryListing::Flat)
                };
                FetchResult::Categories { ticket: *ticket, result }
            }
            Fetch::Contents { ticket, query } => FetchResult::Contents {
                ticket: *ticket,
                result: api.list_contents(query),
            },
            Fetch::FilePage { ticket, query } => FetchResult::FilePage {
                ticket: *ticket,
                result: api.list_files(query),
            },
            Fetch::AllFiles { ticket, content_id } => FetchResult::AllFiles {
                ticket: *ticket,
                result: api.list_all_files(*content_id),
            },
        }
    }
}

/// A validated write
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Category(CategoryCommand),
    Content(ContentCommand),
    DeleteContents(DeleteContents),
    /// `source` is the category the rows were selected in
    MoveContents {
        source: CategoryId,
        request: MoveContentsRequest,
    },
    File(FileCommand),
    SaveFileOrder(ReorderFilesRequest),
}

impl Mutation {
    pub fn perform(&self, api: &dyn CatalogApi) -> Result<(), ApiError> {
        match self {
            Mutation::Category(command) => match command {
                CategoryCommand::Add(payload) => api.create_category(payload),
                CategoryCommand::Update { id, payload } => api.update_category(*id, payload),
                CategoryCommand::Delete { id, .. } => api.delete_category(*id),
                CategoryCommand::Reorder(request) => api.reorder_categories(request),
            },
            Mutation::Content(command) => match command {
                ContentCommand::Create(draft) => api.create_content(draft),
                ContentCommand::Update { id, draft } => api.update_content(*id, draft),
            },
            Mutation::DeleteContents(delete) => api.delete_contents(&delete.ids),
            Mutation::MoveContents { request, .. } => api.move_contents(request),
            Mutation::File(command) => match command {
                FileCommand::Create(draft) => api.create_file(draft),
                FileCommand::Update { id, draft } => api.update_file(*id, draft),
                FileCommand::Delete { id, .. } => api.delete_file(*id),
            },
            Mutation::SaveFileOrder(request) => api.reorder_files(request),
        }
    }

    /// Confirmation text, for mutations that need one
    pub fn prompt(&self) -> Option<String> {
        match self {
            Mutation::Category(command) => command.prompt(),
            Mutation::DeleteContents(delete) => Some(delete.prompt()),
            Mutation::File(command) => command.prompt(),
            _ => None,
        }
    }

    /// Short label for logs and the status line
    pub fn describe(&self) -> String {
        match self {
            Mutation::Category(CategoryCommand::Add(payload)) => format!("add category '{}'", payload.category_name),
            Mutation::Category(CategoryCommand::Update { id, .. }) => format!("update category {}", id),
            Mutation::Category(CategoryCommand::Delete { name, .. }) => format!("delete category '{}'", name),
            Mutation::Category(CategoryCommand::Reorder(request)) => {
                format!("reorder {} categories", request.items.len())
            }
            Mutation::Content(ContentCommand::Create(draft)) => format!("create content '{}'", draft.title),
            Mutation::Content(ContentCommand::Update { id, .. }) => format!("update content {}", id),
            Mutation::DeleteContents(delete) => format!("delete {} content entries", delete.ids.len()),
            Mutation::MoveContents { request, .. } => {
                format!("move {} entries to category {}", request.ids.len(), request.category_id)
            }
            Mutation::File(FileCommand::Create(draft)) => format!("add file '{}'", draft.vod_file_name),
            Mutation::File(FileCommand::Update { id, .. }) => format!("update file {}", id),
            Mutation::File(FileCommand::Delete { name, .. }) => format!("delete file '{}'", name),
            Mutation::SaveFileOrder(request) => format!("save order of {} files", request.files.len()),
        }
    }
}

pub struct CatalogOrganizer<P: Preferences> {
    tree: CategoryTreeController<P>,
    browser: ContentBrowser,
    mover: MoveCoordinator,
    files: Option<FileOrderManager>,
    file_page_size: u32,
    full_edit_warn_threshold: u64,
}

impl<P: Preferences> CatalogOrganizer<P> {
    pub fn new(prefs: P, config: &AppConfig) -> Self {
        Self {
            tree: CategoryTreeController::new(prefs).with_tree_endpoint(config.use_tree_endpoint),
            browser: ContentBrowser::new(),
            mover: MoveCoordinator::new(),
            files: None,
            file_page_size: config.file_page_size,
            full_edit_warn_threshold: config.full_edit_warn_threshold,
        }
    }

    pub fn tree(&self) -> &CategoryTreeController<P> {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut CategoryTreeController<P> {
        &mut self.tree
    }

    pub fn browser(&self) -> &ContentBrowser {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut ContentBrowser {
        &mut self.browser
    }

    pub fn mover(&self) -> &MoveCoordinator {
        &self.mover
    }

    pub fn mover_mut(&mut self) -> &mut MoveCoordinator {
        &mut self.mover
    }

    pub fn files(&self) -> Option<&FileOrderManager> {
        self.files.as_ref()
    }

    pub fn files_mut(&mut self) -> Option<&mut FileOrderManager> {
        self.files.as_mut()
    }

    pub fn is_busy(&self) -> bool {
        self.tree.is_loading()
            || self.browser.is_loading()
            || self.files.as_ref().is_some_and(|f| f.is_loading())
    }

    pub fn load_tree(&mut self) -> Fetch {
        let (ticket, tree) = self.tree.begin_load();
        Fetch::Categories { ticket, tree }
    }

    fn show_category(&mut self, category: Option<CategoryId>) -> Vec<Fetch> {
        self.browser.show_category(category);
        self.mover.cancel();
        self.files = None;
        self.browser
            .begin_first_page()
            .map(|(ticket, query)| Fetch::Contents { ticket, query })
            .into_iter()
            .collect()
    }

    /// Click on a category. Selecting loads its first page; clicking the
    /// selected one clears the browser.
    pub fn select_category(&mut self, id: CategoryId) -> Result<Vec<Fetch>> {
        Ok(match self.tree.select(id)? {
            SelectionChange::Selected(id) => self.show_category(Some(id)),
            SelectionChange::Cleared => self.show_category(None),
        })
    }

    pub fn deselect_category(&mut self) {
        self.tree.deselect();
        self.show_category(None);
    }

    pub fn submit_search(&mut self) -> Option<Fetch> {
        let (ticket, query) = self.browser.begin_search()?;
        Some(Fetch::Contents { ticket, query })
    }

    pub fn go_to_page(&mut self, page: i64) -> Option<Fetch> {
        let (ticket, query) = self.browser.begin_go_to(page)?;
        Some(Fetch::Contents { ticket, query })
    }

    pub fn refresh_contents(&mut self) -> Option<Fetch> {
        let (ticket, query) = self.browser.begin_refresh()?;
        Some(Fetch::Contents { ticket, query })
    }

    pub fn prepare_bulk_delete(&self) -> Result<Mutation> {
        Ok(Mutation::DeleteContents(self.browser.prepare_delete()?))
    }

    /// Open the move dialog for the current selection
    pub fn open_move(&mut self) -> Result<()> {
        let ids = self.browser.prepare_move()?;
        self.mover.open(ids, self.browser.category());
        Ok(())
    }

    pub fn confirm_move(&self) -> Result<Mutation> {
        let request = self.mover.prepare_confirm()?;
        let source = self.mover.source().ok_or(CatalogError::NothingSelected)?;
        Ok(Mutation::MoveContents { source, request })
    }

    /// Attach the file view to one visible content entry
    pub fn open_files(&mut self, content_id: ContentId) -> Result<Fetch> {
        let entry = self
            .browser
            .entries()
            .iter()
            .find(|e| e.id == content_id)
            .ok_or_else(|| CatalogError::Invalid(format!("content {} is not on this page", content_id)))?;
        let mut files = FileOrderManager::new(content_id, &entry.title, self.file_page_size);
        let (ticket, query) = files.begin_first_page();
        self.files = Some(files);
        Ok(Fetch::FilePage { ticket, query })
    }

    pub fn close_files(&mut self) {
        self.files = None;
    }

    fn open_file_view(&mut self) -> Result<&mut FileOrderManager> {
        self.files
            .as_mut()
            .ok_or_else(|| CatalogError::Invalid("no file list is open".to_string()))
    }

    pub fn files_go_to(&mut self, page: i64) -> Option<Fetch> {
        let (ticket, query) = self.files.as_mut()?.begin_go_to(page)?;
        Some(Fetch::FilePage { ticket, query })
    }

    pub fn full_edit_prompt(&self) -> Option<String> {
        let files = self.files.as_ref()?;
        Some(files.full_edit_prompt(self.full_edit_warn_threshold))
    }

    pub fn enter_full_edit(&mut self) -> Result<Fetch> {
        let (ticket, content_id) = self.open_file_view()?.begin_full_edit();
        Ok(Fetch::AllFiles { ticket, content_id })
    }

    pub fn leave_full_edit(&mut self) -> Result<Fetch> {
        let (ticket, query) = self.open_file_view()?.leave_full_edit();
        Ok(Fetch::FilePage { ticket, query })
    }

    pub fn save_file_order(&self) -> Result<Mutation> {
        let files = self
            .files
            .as_ref()
            .ok_or_else(|| CatalogError::Invalid("no file list is open".to_string()))?;
        Ok(Mutation::SaveFileOrder(files.prepare_save()?))
    }

    /// Apply a completed read. Returns the reads it makes necessary.
    pub fn apply(&mut self, result: FetchResult) -> Result<Vec<Fetch>> {
        match result {
            FetchResult::Categories { ticket, result } => {
                let Some(loaded) = self.tree.apply_load(ticket, result)? else {
                    return Ok(Vec::new());
                };
                if loaded.selected != self.browser.category() {
                    return Ok(self.show_category(loaded.selected));
                }
                Ok(Vec::new())
            }
            FetchResult::Contents { ticket, result } => match self.browser.apply_page(ticket, result)? {
                PageOutcome::PastEnd => Ok(self.refresh_contents().into_iter().collect()),
                PageOutcome::Applied | PageOutcome::Stale => Ok(Vec::new()),
            },
            FetchResult::FilePage { ticket, result } => {
                match self.files.as_mut() {
                    Some(files) => {
                        files.apply_page(ticket, result)?;
                    }
                    None => warn!(seq = ticket.seq(), "file page arrived after the file list closed"),
                }
                Ok(Vec::new())
            }
            FetchResult::AllFiles { ticket, result } => {
                match self.files.as_mut() {
                    Some(files) => {
                        files.apply_all(ticket, result)?;
                    }
                    None => warn!(seq = ticket.seq(), "file listing arrived after the file list closed"),
                }
                Ok(Vec::new())
            }
        }
    }

    /// Settle a write. Failures leave every view as it was so the operator
    /// can retry; successes return the reloads they need.
    pub fn finish(&mut self, mutation: &Mutation, result: Result<(), ApiError>) -> Result<Vec<Fetch>> {
        if let Err(err) = result {
            warn!(error = %err, "{} failed", mutation.describe());
            return Err(err.into());
        }
        info!("{} succeeded", mutation.describe());

        let mut fetches = Vec::new();
        match mutation {
            Mutation::Category(command) => {
                self.tree.command_succeeded(command);
                if self.browser.category().is_some() && self.tree.selected().is_none() {
                    fetches.extend(self.show_category(None));
                }
                fetches.push(self.load_tree());
            }
            Mutation::Content(_) => {
                fetches.extend(self.refresh_contents());
            }
            Mutation::DeleteContents(delete) => {
                if self.browser.category() != Some(delete.category_id) {
                    info!(category = delete.category_id, "delete finished after leaving its category");
                    return Ok(fetches);
                }
                self.browser.clear_selection();
                if let Some((ticket, query)) = self.browser.begin_first_page() {
                    fetches.push(Fetch::Contents { ticket, query });
                }
            }
            Mutation::MoveContents { source, .. } => {
                // A new category means a new dialog and selection; both stay
                if self.browser.category() != Some(*source) {
                    info!(category = *source, "move finished after leaving its category");
                    return Ok(fetches);
                }
                self.mover.move_succeeded();
                self.browser.clear_selection();
                fetches.extend(self.refresh_contents());
            }
            Mutation::File(command) => {
                if let Some(files) = self.files.as_mut().filter(|f| f.content_id() == command.content_id()) {
                    fetches.push(Fetch::from_files(files.begin_reload()));
                }
                fetches.extend(self.refresh_contents());
            }
            Mutation::SaveFileOrder(request) => {
                match self.files.as_mut() {
                    Some(files) if files.saved_draft_is(request) => {
                        fetches.push(Fetch::from_files(files.save_succeeded()));
                    }
                    _ => info!(content = request.content_id, "file order saved; the open view is not that draft"),
                }
                fetches.extend(self.refresh_contents());
            }
        }
        Ok(fetches)
    }

    /// Perform reads inline until nothing more is needed
    pub fn run(&mut self, api: &dyn CatalogApi, fetches: impl IntoIterator<Item = Fetch>) -> Result<()> {
        let mut queue: VecDeque<Fetch> = fetches.into_iter().collect();
        while let Some(fetch) = queue.pop_front() {
            let result = fetch.run(api);
            queue.extend(self.apply(result)?);
        }
        Ok(())
    }

    /// Perform a write inline, then the reloads it triggers
    pub fn execute(&mut self, api: &dyn CatalogApi, mutation: Mutation) -> Result<()> {
        let result = mutation.perform(api);
        let fetches = self.finish(&mutation, result)?;
        self.run(api, fetches)
    }
}

#[cfg(test)]
#[path = "organizer_tests.rs"]
mod tests;

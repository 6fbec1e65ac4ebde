//! In-memory catalog server for tests. Records every call and keeps enough
//! state for paging, moves and reorders to behave like the real thing.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::api::CatalogApi;
use crate::error::ApiError;
use crate::models::*;

#[derive(Default)]
pub struct FakeApi {
    pub categories: RefCell<Vec<Category>>,
    pub contents: RefCell<Vec<ContentEntry>>,
    pub files: RefCell<Vec<CatalogFile>>,
    failing: RefCell<HashSet<&'static str>>,
    calls: RefCell<Vec<String>>,
    next_id: RefCell<i64>,
}

pub fn category(id: CategoryId, name: &str, parent: Option<CategoryId>, order: Option<i64>) -> Category {
    Category {
        id,
        name: name.to_string(),
        parent_id: parent,
        display_order: order,
    }
}

pub fn entry(id: ContentId, title: &str, category: CategoryId) -> ContentEntry {
    ContentEntry {
        id,
        title: title.to_string(),
        category_id: Some(category),
        description: None,
        poster_path: None,
        exposed: true,
        file_count: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn catalog_file(id: FileId, content: ContentId, order: Option<i64>) -> CatalogFile {
    CatalogFile {
        id,
        content_id: Some(content),
        vod_file_name: format!("file{}.mp4", id),
        vod_file_path: format!("/vod/{}/file{}.mp4", content, id),
        file_order: order,
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, size: u32) -> Page<T> {
    let size = size.max(1) as usize;
    let total_pages = items.len().div_ceil(size) as u32;
    let start = page as usize * size;
    Page {
        content: items.iter().skip(start).take(size).cloned().collect(),
        number: page,
        total_pages,
        total_elements: items.len() as u64,
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            next_id: RefCell::new(1000),
            ..Self::default()
        }
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        *self.categories.borrow_mut() = categories;
        self
    }

    pub fn with_contents(self, contents: Vec<ContentEntry>) -> Self {
        *self.contents.borrow_mut() = contents;
        self
    }

    pub fn with_files(self, files: Vec<CatalogFile>) -> Self {
        *self.files.borrow_mut() = files;
        self
    }

    /// Make every later call to `method` fail with a 500
    pub fn fail(&self, method: &'static str) {
        self.failing.borrow_mut().insert(method);
    }

    pub fn recover(&self, method: &'static str) {
        self.failing.borrow_mut().remove(method);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.split(' ').next() == Some(method))
            .count()
    }

    fn record(&self, method: &'static str, detail: String) -> Result<(), ApiError> {
        let call = if detail.is_empty() {
            method.to_string()
        } else {
            format!("{} {}", method, detail)
        };
        self.calls.borrow_mut().push(call);
        if self.failing.borrow().contains(method) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("{} refused", method),
            });
        }
        Ok(())
    }

    fn allocate_id(&self) -> i64 {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        *next
    }
}

impl CatalogApi for FakeApi {
    fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.record("list_categories", String::new())?;
        Ok(self.categories.borrow().clone())
    }

    fn category_tree(&self) -> Result<Vec<CategoryNode>, ApiError> {
        self.record("category_tree", String::new())?;
        let categories = self.categories.borrow();
        crate::tree::build_tree(&categories, None).map_err(|err| ApiError::Transport(err.to_string()))
    }

    fn create_category(&self, payload: &CategoryPayload) -> Result<(), ApiError> {
        self.record("create_category", payload.category_name.clone())?;
        let id = self.allocate_id();
        self.categories
            .borrow_mut()
            .push(category(id, &payload.category_name, payload.parent_id, None));
        Ok(())
    }

    fn update_category(&self, id: CategoryId, payload: &CategoryPayload) -> Result<(), ApiError> {
        self.record("update_category", id.to_string())?;
        if let Some(cat) = self.categories.borrow_mut().iter_mut().find(|c| c.id == id) {
            cat.name = payload.category_name.clone();
            cat.parent_id = payload.parent_id;
        }
        Ok(())
    }

    fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
        self.record("delete_category", id.to_string())?;
        let has_children = self.categories.borrow().iter().any(|c| c.parent_id == Some(id));
        let has_content = self.contents.borrow().iter().any(|e| e.category_id == Some(id));
        if has_children || has_content {
            return Err(ApiError::Status {
                status: 409,
                message: "category is not empty".to_string(),
            });
        }
        self.categories.borrow_mut().retain(|c| c.id != id);
        Ok(())
    }

    fn reorder_categories(&self, request: &ReorderCategoriesRequest) -> Result<(), ApiError> {
        self.record("reorder_categories", format!("{:?}", request.parent_id))?;
        let mut categories = self.categories.borrow_mut();
        for item in &request.items {
            if let Some(cat) = categories.iter_mut().find(|c| c.id == item.id) {
                cat.display_order = Some(item.display_order);
            }
        }
        Ok(())
    }

    fn list_contents(&self, query: &ContentQuery) -> Result<Page<ContentEntry>, ApiError> {
        self.record(
            "list_contents",
            format!("category={} page={} title={}", query.category_id, query.page, query.title),
        )?;
        let matching: Vec<ContentEntry> = self
            .contents
            .borrow()
            .iter()
            .filter(|e| e.category_id == Some(query.category_id))
            .filter(|e| query.title.is_empty() || e.title.contains(&query.title))
            .cloned()
            .collect();
        Ok(paginate(&matching, query.page, query.size))
    }

    fn create_content(&self, draft: &ContentDraft) -> Result<(), ApiError> {
        self.record("create_content", draft.title.clone())?;
        let id = self.allocate_id();
        let mut created = entry(id, &draft.title, draft.category_id.unwrap_or_default());
        created.description = Some(draft.description.clone());
        created.exposed = draft.exposed;
        self.contents.borrow_mut().push(created);
        Ok(())
    }

    fn update_content(&self, id: ContentId, draft: &ContentDraft) -> Result<(), ApiError> {
        self.record("update_content", id.to_string())?;
        if let Some(existing) = self.contents.borrow_mut().iter_mut().find(|e| e.id == id) {
            existing.title = draft.title.clone();
            existing.category_id = draft.category_id;
            existing.exposed = draft.exposed;
        }
        Ok(())
    }

    fn delete_contents(&self, ids: &[ContentId]) -> Result<(), ApiError> {
        self.record("delete_contents", format!("{:?}", ids))?;
        self.contents.borrow_mut().retain(|e| !ids.contains(&e.id));
        Ok(())
    }

    fn move_contents(&self, request: &MoveContentsRequest) -> Result<(), ApiError> {
        self.record("move_contents", format!("{:?} -> {}", request.ids, request.category_id))?;
        for existing in self.contents.borrow_mut().iter_mut() {
            if request.ids.contains(&existing.id) {
                existing.category_id = Some(request.category_id);
            }
        }
        Ok(())
    }

    fn list_files(&self, query: &FileQuery) -> Result<Page<CatalogFile>, ApiError> {
        self.record("list_files", format!("content={} page={}", query.content_id, query.page))?;
        let mut matching: Vec<CatalogFile> = self
            .files
            .borrow()
            .iter()
            .filter(|f| f.content_id == Some(query.content_id))
            .cloned()
            .collect();
        matching.sort_by_key(|f| std::cmp::Reverse(f.file_order));
        Ok(paginate(&matching, query.page, query.size))
    }

    fn list_all_files(&self, content_id: ContentId) -> Result<Vec<CatalogFile>, ApiError> {
        self.record("list_all_files", content_id.to_string())?;
        Ok(self
            .files
            .borrow()
            .iter()
            .filter(|f| f.content_id == Some(content_id))
            .cloned()
            .collect())
    }

    fn create_file(&self, draft: &FileDraft) -> Result<(), ApiError> {
        self.record("create_file", draft.vod_file_name.clone())?;
        let id = self.allocate_id();
        self.files.borrow_mut().push(CatalogFile {
            id,
            content_id: Some(draft.content_id),
            vod_file_name: draft.vod_file_name.clone(),
            vod_file_path: draft.vod_file_path.clone(),
            file_order: draft.file_order,
        });
        Ok(())
    }

    fn update_file(&self, id: FileId, draft: &FileDraft) -> Result<(), ApiError> {
        self.record("update_file", id.to_string())?;
        if let Some(file) = self.files.borrow_mut().iter_mut().find(|f| f.id == id) {
            file.vod_file_name = draft.vod_file_name.clone();
            file.vod_file_path = draft.vod_file_path.clone();
        }
        Ok(())
    }

    fn delete_file(&self, id: FileId) -> Result<(), ApiError> {
        self.record("delete_file", id.to_string())?;
        self.files.borrow_mut().retain(|f| f.id != id);
        Ok(())
    }

    fn reorder_files(&self, request: &ReorderFilesRequest) -> Result<(), ApiError> {
        self.record("reorder_files", request.content_id.to_string())?;
        let mut files = self.files.borrow_mut();
        for order in &request.files {
            if let Some(file) = files.iter_mut().find(|f| f.id == order.id) {
                file.file_order = Some(order.order);
            }
        }
        Ok(())
    }
}

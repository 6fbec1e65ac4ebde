//! Data models for the VOD catalog
//!
//! Field names follow the catalog API's camelCase JSON.

use serde::{Deserialize, Serialize};

pub type CategoryId = i64;
pub type ContentId = i64;
pub type FileId = i64;

/// Flat category record as stored by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "categoryName", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

/// Category with its children attached. Always derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn id(&self) -> CategoryId {
        self.category.id
    }

    pub fn name(&self) -> &str {
        &self.category.name
    }

    /// Number of nodes below this one, at any depth
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// A catalog item (show, movie) belonging to exactly one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub id: ContentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub exposed: bool,
    #[serde(default)]
    pub file_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ContentEntry {
    /// Poster name without the storage prefix (everything before the first `_`)
    pub fn poster_display_name(&self) -> Option<&str> {
        let path = self.poster_path.as_deref()?;
        match path.split_once('_') {
            Some((_, rest)) => Some(rest),
            None => Some(path),
        }
    }

    /// Most recent of updated/created, formatted for display
    pub fn timestamp_display(&self) -> String {
        self.updated_at
            .as_deref()
            .or(self.created_at.as_deref())
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string())
    }
}

/// One playable asset of a content entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    pub id: FileId,
    #[serde(default)]
    pub content_id: Option<ContentId>,
    #[serde(default)]
    pub vod_file_name: String,
    #[serde(default)]
    pub vod_file_path: String,
    #[serde(default)]
    pub file_order: Option<i64>,
}

/// Paged response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub content: Vec<T>,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            number: 0,
            total_pages: 0,
            total_elements: 0,
        }
    }
}

/// Query for `GET /vod-contents`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub category_id: CategoryId,
    pub page: u32,
    pub size: u32,
    pub title: String,
}

/// Query for `GET /vod-files`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileQuery {
    pub content_id: ContentId,
    pub page: u32,
    pub size: u32,
}

/// Body for creating or updating a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    pub category_name: String,
    pub parent_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingOrder {
    pub id: CategoryId,
    pub display_order: i64,
}

/// Body for `PATCH /vod-categories/reorder`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderCategoriesRequest {
    pub parent_id: Option<CategoryId>,
    pub items: Vec<SiblingOrder>,
}

/// Body for `PATCH /vod-contents/move`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveContentsRequest {
    pub ids: Vec<ContentId>,
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOrder {
    pub id: FileId,
    pub order: i64,
}

/// Body for `PATCH /vod-files/reorder`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFilesRequest {
    pub content_id: ContentId,
    pub files: Vec<FileOrder>,
}

/// Editable fields of a content entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDraft {
    pub title: String,
    pub description: String,
    pub exposed: bool,
    pub category_id: Option<CategoryId>,
    pub poster_path: Option<String>,
}

/// Editable fields of a catalog file. Upload happens elsewhere; only the
/// resulting name and path are recorded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDraft {
    pub content_id: ContentId,
    pub vod_file_name: String,
    pub vod_file_path: String,
    pub file_order: Option<i64>,
}

/// Format an API timestamp as local `YYYY-MM-DD HH:MM`, falling back to the raw text
pub fn format_timestamp(raw: &str) -> String {
    use chrono::{DateTime, Local, NaiveDateTime};

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        let json = r#"{"id":3,"categoryName":"Drama","parentId":1,"displayOrder":2}"#;
        let cat: Category = serde_json::from_str(json).unwrap();
        assert_eq!(cat.name, "Drama");
        assert_eq!(cat.parent_id, Some(1));
        assert_eq!(cat.display_order, Some(2));

        let alias: Category = serde_json::from_str(r#"{"id":4,"name":"Kids"}"#).unwrap();
        assert_eq!(alias.name, "Kids");
        assert_eq!(alias.parent_id, None);
        assert_eq!(alias.display_order, None);
    }

    #[test]
    fn test_nested_tree_parses() {
        let json = r#"[{"id":1,"categoryName":"Movies","children":[{"id":2,"categoryName":"Action","parentId":1}]}]"#;
        let nodes: Vec<CategoryNode> = serde_json::from_str(json).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].children[0].name(), "Action");
        assert_eq!(nodes[0].descendant_count(), 1);
    }

    #[test]
    fn test_page_envelope() {
        let json = r#"{"content":[{"id":9,"title":"Pilot","categoryId":2,"exposed":true}],"number":1,"totalPages":3,"totalElements":30}"#;
        let page: Page<ContentEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(page.content[0].title, "Pilot");
        assert!(page.content[0].exposed);
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_elements, 30);

        // Rows without a Default impl still decode, and a missing list is empty
        let files: Page<CatalogFile> = serde_json::from_str(r#"{"number":0,"totalPages":0}"#).unwrap();
        assert!(files.content.is_empty());
        assert_eq!(files.total_elements, 0);
    }

    #[test]
    fn test_request_bodies_serialize_camel_case() {
        let body = ReorderFilesRequest {
            content_id: 7,
            files: vec![FileOrder { id: 1, order: 2 }],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"contentId":7,"files":[{"id":1,"order":2}]}"#
        );

        let body = ReorderCategoriesRequest {
            parent_id: None,
            items: vec![SiblingOrder { id: 5, display_order: 1 }],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"parentId":null,"items":[{"id":5,"displayOrder":1}]}"#
        );
    }

    #[test]
    fn test_poster_display_name() {
        let mut entry: ContentEntry = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert_eq!(entry.poster_display_name(), None);
        entry.poster_path = Some("a1b2_summer_poster.jpg".to_string());
        assert_eq!(entry.poster_display_name(), Some("summer_poster.jpg"));
        entry.poster_path = Some("plain.jpg".to_string());
        assert_eq!(entry.poster_display_name(), Some("plain.jpg"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2024-05-01T13:45:10"), "2024-05-01 13:45");
        assert_eq!(format_timestamp("2024-05-01T13:45:10.123456"), "2024-05-01 13:45");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}

//! VOD catalog API client

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::*;

/// The remote catalog API. One method per endpoint.
pub trait CatalogApi {
    fn list_categories(&self) -> Result<Vec<Category>, ApiError>;
    fn category_tree(&self) -> Result<Vec<CategoryNode>, ApiError>;
    fn create_category(&self, payload: &CategoryPayload) -> Result<(), ApiError>;
    fn update_category(&self, id: CategoryId, payload: &CategoryPayload) -> Result<(), ApiError>;
    fn delete_category(&self, id: CategoryId) -> Result<(), ApiError>;
    fn reorder_categories(&self, request: &ReorderCategoriesRequest) -> Result<(), ApiError>;

    fn list_contents(&self, query: &ContentQuery) -> Result<Page<ContentEntry>, ApiError>;
    fn create_content(&self, draft: &ContentDraft) -> Result<(), ApiError>;
    fn update_content(&self, id: ContentId, draft: &ContentDraft) -> Result<(), ApiError>;
    fn delete_contents(&self, ids: &[ContentId]) -> Result<(), ApiError>;
    fn move_contents(&self, request: &MoveContentsRequest) -> Result<(), ApiError>;

    fn list_files(&self, query: &FileQuery) -> Result<Page<CatalogFile>, ApiError>;
    fn list_all_files(&self, content_id: ContentId) -> Result<Vec<CatalogFile>, ApiError>;
    fn create_file(&self, draft: &FileDraft) -> Result<(), ApiError>;
    fn update_file(&self, id: FileId, draft: &FileDraft) -> Result<(), ApiError>;
    fn delete_file(&self, id: FileId) -> Result<(), ApiError>;
    fn reorder_files(&self, request: &ReorderFilesRequest) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, Copy)]
enum Verb {
    Post,
    Put,
    Patch,
    Delete,
}

/// JSON-over-HTTP implementation backed by a shared ureq agent
#[derive(Clone)]
pub struct HttpCatalogClient {
    base_url: String,
    user_agent: String,
    agent: ureq::Agent,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeouts(base_url, Duration::from_secs(10), Duration::from_secs(30))
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_timeouts(
            &config.api_base_url,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
        .with_user_agent(&config.user_agent)
    }

    fn with_timeouts(base_url: &str, connect: Duration, global: Duration) -> Self {
        // Non-2xx responses are read like any other so their body can be reported
        let agent = ureq::Agent::config_builder()
            .timeout_connect(Some(connect))
            .timeout_global(Some(global))
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: "vod-catalog-admin".to_string(),
            agent,
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn read_body(mut response: ureq::http::Response<ureq::Body>) -> Result<String, ApiError> {
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Status {
                status,
                message: body.trim().to_string(),
            });
        }
        Ok(body)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, ?query, "GET");

        let mut request = self
            .agent
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");
        for (key, value) in query {
            request = request.query(*key, value);
        }

        let body = Self::read_body(request.call()?)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn send_json<B: Serialize + ?Sized>(&self, verb: Verb, path: &str, body: &B) -> Result<(), ApiError> {
        let url = self.url(path);
        let payload = serde_json::to_vec(body)?;
        debug!(%url, ?verb, bytes = payload.len(), "sending");

        let request = match verb {
            Verb::Post => self.agent.post(&url),
            Verb::Put => self.agent.put(&url),
            Verb::Patch => self.agent.patch(&url),
            Verb::Delete => self.agent.delete(&url).force_send_body(),
        };
        let response = request
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .send(&payload[..])?;

        // Success bodies (echoed entity or nothing) are not needed; callers reload
        Self::read_body(response).map(|_| ())
    }

    fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        debug!(%url, "DELETE");
        let response = self
            .agent
            .delete(&url)
            .header("User-Agent", &self.user_agent)
            .call()?;
        Self::read_body(response).map(|_| ())
    }
}

impl CatalogApi for HttpCatalogClient {
    fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json("/vod-categories", &[])
    }

    fn category_tree(&self) -> Result<Vec<CategoryNode>, ApiError> {
        self.get_json("/vod-categories/tree", &[("mode", "web".to_string())])
    }

    fn create_category(&self, payload: &CategoryPayload) -> Result<(), ApiError> {
        self.send_json(Verb::Post, "/vod-categories", payload)
    }

    fn update_category(&self, id: CategoryId, payload: &CategoryPayload) -> Result<(), ApiError> {
        self.send_json(Verb::Put, &format!("/vod-categories/{}", id), payload)
    }

    fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
        self.delete(&format!("/vod-categories/{}", id))
    }

    fn reorder_categories(&self, request: &ReorderCategoriesRequest) -> Result<(), ApiError> {
        self.send_json(Verb::Patch, "/vod-categories/reorder", request)
    }

    fn list_contents(&self, query: &ContentQuery) -> Result<Page<ContentEntry>, ApiError> {
        let mut params = vec![
            ("categoryId", query.category_id.to_string()),
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
        ];
        if !query.title.is_empty() {
            params.push(("title", query.title.clone()));
        }
        self.get_json("/vod-contents", &params)
    }

    fn create_content(&self, draft: &ContentDraft) -> Result<(), ApiError> {
        self.send_json(Verb::Post, "/vod-contents", draft)
    }

    fn update_content(&self, id: ContentId, draft: &ContentDraft) -> Result<(), ApiError> {
        self.send_json(Verb::Put, &format!("/vod-contents/{}", id), draft)
    }

    fn delete_contents(&self, ids: &[ContentId]) -> Result<(), ApiError> {
        self.send_json(Verb::Delete, "/vod-contents", ids)
    }

    fn move_contents(&self, request: &MoveContentsRequest) -> Result<(), ApiError> {
        self.send_json(Verb::Patch, "/vod-contents/move", request)
    }

    fn list_files(&self, query: &FileQuery) -> Result<Page<CatalogFile>, ApiError> {
        self.get_json(
            "/vod-files",
            &[
                ("contentId", query.content_id.to_string()),
                ("page", query.page.to_string()),
                ("size", query.size.to_string()),
            ],
        )
    }

    fn list_all_files(&self, content_id: ContentId) -> Result<Vec<CatalogFile>, ApiError> {
        self.get_json("/vod-files/all", &[("contentId", content_id.to_string())])
    }

    fn create_file(&self, draft: &FileDraft) -> Result<(), ApiError> {
        self.send_json(Verb::Post, "/vod-files", draft)
    }

    fn update_file(&self, id: FileId, draft: &FileDraft) -> Result<(), ApiError> {
        self.send_json(Verb::Put, &format!("/vod-files/{}", id), draft)
    }

    fn delete_file(&self, id: FileId) -> Result<(), ApiError> {
        self.delete(&format!("/vod-files/{}", id))
    }

    fn reorder_files(&self, request: &ReorderFilesRequest) -> Result<(), ApiError> {
        self.send_json(Verb::Patch, "/vod-files/reorder", request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpCatalogClient::new("http://localhost:8081/api/");
        assert_eq!(client.base_url(), "http://localhost:8081/api");
        assert_eq!(client.url("/vod-files/all"), "http://localhost:8081/api/vod-files/all");
    }

    #[test]
    fn test_from_config_uses_configured_agent() {
        let config = AppConfig {
            api_base_url: "http://catalog.example/api".to_string(),
            user_agent: "ops-console".to_string(),
            ..AppConfig::default()
        };
        let client = HttpCatalogClient::from_config(&config);
        assert_eq!(client.base_url(), "http://catalog.example/api");
        assert_eq!(client.user_agent, "ops-console");
    }
}

//! Google Drive v3 catalog client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::CatalogConfig;

use super::error::CatalogError;
use super::traits::CatalogClient;
use super::types::Asset;

/// Lists the videos of a Drive folder.
pub struct DriveCatalog {
    client: Client,
    base_url: String,
    access_token: String,
    paid_prefix: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
    /// Drive reports sizes as decimal strings.
    #[serde(default)]
    size: Option<String>,
}

impl DriveCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        if config.access_token.is_empty() {
            return Err(CatalogError::NotConfigured(
                "catalog access token is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            paid_prefix: config.paid_prefix.clone(),
            page_size: config.page_size.max(1),
        })
    }

    fn query_for(folder_id: &str) -> String {
        format!(
            "'{}' in parents and mimeType contains 'video/' and trashed = false",
            folder_id.replace('\'', "\\'")
        )
    }

    async fn fetch_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FileList, CatalogError> {
        let url = format!("{}/drive/v3/files", self.base_url);

        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", Self::query_for(folder_id)),
                ("fields", "nextPageToken, files(id, name, size)".to_string()),
                ("pageSize", self.page_size.to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == 404 {
            return Err(CatalogError::NotFound(folder_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(format!("Failed to parse file list: {}", e)))
    }
}

#[async_trait]
impl CatalogClient for DriveCatalog {
    fn name(&self) -> &str {
        "drive"
    }

    async fn list(&self, folder_id: &str) -> Result<Vec<Asset>, CatalogError> {
        let mut assets = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self.fetch_page(folder_id, page_token.as_deref()).await?;
            pages += 1;

            debug!(
                folder_id = %folder_id,
                page = pages,
                files = page.files.len(),
                "Fetched catalog page"
            );

            assets.extend(page.files.into_iter().map(|f| {
                let size = f.size.as_deref().and_then(|s| s.parse::<u64>().ok());
                Asset::new(f.id, f.name, size, &self.paid_prefix)
            }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(
            folder_id = %folder_id,
            assets = assets.len(),
            pages = pages,
            "Listed catalog folder"
        );

        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssetTag;
    use crate::error::ErrorKind;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> CatalogConfig {
        CatalogConfig {
            api_url: server.uri(),
            folder_id: "folder-1".to_string(),
            access_token: "token".to_string(),
            paid_prefix: "paid_".to_string(),
            timeout_secs: 5,
            page_size: 2,
            chunk_size_bytes: 1024,
        }
    }

    #[test]
    fn test_query_escapes_quotes() {
        assert_eq!(
            DriveCatalog::query_for("it's"),
            "'it\\'s' in parents and mimeType contains 'video/' and trashed = false"
        );
    }

    #[test]
    fn test_new_requires_token() {
        let config = CatalogConfig {
            api_url: "http://localhost".to_string(),
            folder_id: "f".to_string(),
            access_token: String::new(),
            paid_prefix: "paid_".to_string(),
            timeout_secs: 5,
            page_size: 10,
            chunk_size_bytes: 1024,
        };
        let err = DriveCatalog::new(&config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_list_follows_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [{"id": "c", "name": "third.mkv"}]
            })))
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [
                    {"id": "a", "name": "first.mp4", "size": "1000"},
                    {"id": "b", "name": "paid_25_second.mp4", "size": "not-a-number"}
                ],
                "nextPageToken": "page-2"
            })))
            .mount(&server)
            .await;

        let catalog = DriveCatalog::new(&config_for(&server)).unwrap();
        let assets = catalog.list("folder-1").await.unwrap();

        assert_eq!(assets.len(), 3);
        assert_eq!(assets[0].size, Some(1000));
        assert_eq!(assets[0].tag, AssetTag::Free);
        assert_eq!(assets[1].size, None);
        assert_eq!(assets[1].tag, AssetTag::Paid);
        assert_eq!(assets[2].name, "third.mkv");
    }

    #[tokio::test]
    async fn test_empty_folder_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": []
            })))
            .mount(&server)
            .await;

        let catalog = DriveCatalog::new(&config_for(&server)).unwrap();
        assert!(catalog.list("folder-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_folder_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let catalog = DriveCatalog::new(&config_for(&server)).unwrap();
        let err = catalog.list("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend down"))
            .mount(&server)
            .await;

        let catalog = DriveCatalog::new(&config_for(&server)).unwrap();
        let err = catalog.list("folder-1").await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("backend down"));
    }
}

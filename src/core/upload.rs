//! Multipart upload of metadata plus artifact files

use crate::core::error::PublishError;
use crate::core::http::{ApiClient, AuthHeader};
use crate::core::types::Platform;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Content type of the metadata part
pub const MEDIA_TYPE_JSON: &str = "application/json";

/// Content type of every artifact part
pub const MEDIA_TYPE_JAR: &str = "application/java-archive";

/// Part names for `count` files: `file`, `file_1`, `file_2`, ...
pub fn file_part_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            if i == 0 {
                "file".to_string()
            } else {
                format!("file_{}", i)
            }
        })
        .collect()
}

/// An artifact paired with the multipart field it is sent under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub path: PathBuf,
}

impl FilePart {
    /// Names `files` in order with [`file_part_names`]
    pub fn plan(files: &[PathBuf]) -> Vec<FilePart> {
        file_part_names(files.len())
            .into_iter()
            .zip(files)
            .map(|(name, path)| FilePart {
                name,
                path: path.clone(),
            })
            .collect()
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// One upload call: endpoint, auth, metadata under its field name, and files
#[derive(Debug)]
pub struct UploadRequest<'a> {
    pub platform: Platform,
    pub url: String,
    pub auth: &'a AuthHeader,
    /// Field carrying the metadata (`metadata` or `data`)
    pub metadata_field: &'static str,
    /// Metadata already serialized to JSON
    pub metadata: String,
    pub files: Vec<FilePart>,
}

impl UploadRequest<'_> {
    /// Sends the request; returns the response body when there is one
    pub async fn execute(self, client: &ApiClient) -> Result<Option<String>, PublishError> {
        let form = self.form().await?;
        let response = client
            .post_multipart(self.platform, &self.url, self.auth, form)
            .await?;

        if let Some(body) = &response {
            info!(platform = %self.platform, "response body: {}", body);
        }
        Ok(response)
    }

    /// Builds the multipart body. Files are read fully into memory.
    pub async fn form(&self) -> Result<Form, PublishError> {
        let metadata = Part::text(self.metadata.clone())
            .mime_str(MEDIA_TYPE_JSON)
            .map_err(|e| self.part_error(e))?;
        let mut form = Form::new().part(self.metadata_field, metadata);

        for file in &self.files {
            let bytes = read_artifact(self.platform, &file.path).await?;
            debug!(
                platform = %self.platform,
                part = %file.name,
                bytes = bytes.len(),
                "attaching {}",
                file.path.display()
            );

            let part = Part::bytes(bytes)
                .file_name(file.file_name())
                .mime_str(MEDIA_TYPE_JAR)
                .map_err(|e| self.part_error(e))?;
            form = form.part(file.name.clone(), part);
        }

        Ok(form)
    }

    fn part_error(&self, error: reqwest::Error) -> PublishError {
        PublishError::Upload {
            platform: self.platform,
            status: None,
            message: error.to_string(),
            body: None,
        }
    }
}

async fn read_artifact(platform: Platform, path: &Path) -> Result<Vec<u8>, PublishError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| PublishError::FileRead {
            platform,
            path: path.to_path_buf(),
            source,
        })
}

//! GitHub Gist storage implementation.
//!
//! The state document is one named file inside a gist:
//! - Read: `GET {api}/gists/{id}` and take `files[{name}].content`
//! - Write: `PATCH {api}/gists/{id}` with the full replacement content

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::storage::StateBackend;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Subset of the gist resource we care about.
#[derive(Debug, Deserialize)]
struct Gist {
    #[serde(default)]
    files: HashMap<String, Option<GistFile>>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

/// Gist-backed state document.
pub struct GistBackend {
    client: reqwest::Client,
    api_base: String,
    gist_id: String,
    filename: String,
    token: String,
}

impl GistBackend {
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        gist_id: &str,
        filename: &str,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            gist_id: gist_id.to_string(),
            filename: filename.to_string(),
            token: token.into(),
        }
    }

    fn gist_url(&self) -> String {
        format!("{}/gists/{}", self.api_base, self.gist_id)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Pick our file out of a gist response body.
    fn file_content(&self, gist: Gist) -> FileContent {
        match gist.files.get(&self.filename) {
            Some(Some(file)) if file.truncated => match &file.raw_url {
                Some(url) => FileContent::Truncated(url.clone()),
                None => FileContent::Inline(file.content.clone()),
            },
            Some(Some(file)) => FileContent::Inline(file.content.clone()),
            _ => FileContent::Inline(None),
        }
    }

    /// Request body replacing the file content.
    fn patch_body(&self, content: &str) -> serde_json::Value {
        json!({
            "files": {
                (self.filename.as_str()): { "content": content }
            }
        })
    }
}

/// Where the file content lives in a gist response.
#[derive(Debug, PartialEq, Eq)]
enum FileContent {
    Inline(Option<String>),
    /// Too large to inline; must be fetched from `raw_url`
    Truncated(String),
}

#[async_trait]
impl StateBackend for GistBackend {
    async fn read(&self) -> Result<Option<String>> {
        let gist: Gist = self
            .client
            .get(self.gist_url())
            .header(AUTHORIZATION, self.bearer())
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match self.file_content(gist) {
            FileContent::Inline(content) => Ok(content),
            FileContent::Truncated(raw_url) => {
                log::debug!("Gist file {} is truncated, reading raw_url", self.filename);
                let text = self
                    .client
                    .get(raw_url)
                    .header(AUTHORIZATION, self.bearer())
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                Ok(Some(text))
            }
        }
    }

    async fn write(&self, content: &str) -> Result<()> {
        let response = self
            .client
            .patch(self.gist_url())
            .header(AUTHORIZATION, self.bearer())
            .header(ACCEPT, GITHUB_ACCEPT)
            .json(&self.patch_body(content))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::store(format!(
                "gist update returned {status}: {body}"
            )));
        }
        Ok(())
    }

    fn location(&self) -> String {
        format!("gist {}/{}", self.gist_id, self.filename)
    }
}

use crate::config::Config;
use crate::error::ServiceError;
use crate::models::{ConvertRequest, ConvertResponse, DownloadReceipt, PlaylistPreview, Track};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use ureq::{Agent, AgentBuilder};
use urlencoding::encode;

/// The two calls the session makes against the conversion backend
#[cfg_attr(test, mockall::automock)]
pub trait ConversionService {
    /// Phase 1: resolve a playlist URL into its tracks
    fn analyze(&self, url: &str) -> Result<PlaylistPreview, ServiceError>;

    /// Phase 2: convert exactly these tracks into a downloadable archive
    fn download(&self, songs: &[Track]) -> Result<DownloadReceipt, ServiceError>;
}

/// Where a finished artifact goes once the service has produced it
pub trait Navigator {
    fn navigate(&mut self, path: &str) -> Result<()>;
}

/// A blocking client for the playlist conversion service
#[derive(Clone)]
pub struct ConverterClient {
    agent: Agent,
    base_url: String,
}

impl ConverterClient {
    /// Create a new client with configuration from environment
    pub fn new(config: &Config) -> Self {
        let mut builder = AgentBuilder::new();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        ConverterClient {
            agent: builder.build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a service-relative path such as `/downloads/abc.zip`
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check the service is up before sending it any work
    pub fn ping(&self) -> Result<()> {
        let url = self.url_for("/health");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| anyhow::anyhow!("Health check failed: {}", e))?;

        let body: serde_json::Value = response
            .into_json()
            .context("Health check returned a non-JSON body")?;

        match body.get("status").and_then(|s| s.as_str()) {
            Some("healthy") => Ok(()),
            other => Err(anyhow::anyhow!(
                "Service reported unexpected health status: {:?}",
                other
            )),
        }
    }

    fn post_convert(&self, request: &ConvertRequest<'_>) -> Result<ConvertResponse, ServiceError> {
        let url = self.url_for("/convert");
        debug!("POST {url}");

        let response = self
            .agent
            .post(&url)
            .send_json(request)
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let body = response
            .into_string()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        parse_convert_body(&body)
    }
}

impl ConversionService for ConverterClient {
    fn analyze(&self, url: &str) -> Result<PlaylistPreview, ServiceError> {
        self.post_convert(&ConvertRequest::Analyze { url })?
            .into_preview()
    }

    fn download(&self, songs: &[Track]) -> Result<DownloadReceipt, ServiceError> {
        self.post_convert(&ConvertRequest::Download { songs })?
            .into_receipt()
    }
}

/// Decode a `/convert` body; anything that isn't JSON counts as a transport failure
pub fn parse_convert_body(body: &str) -> Result<ConvertResponse, ServiceError> {
    serde_json::from_str(body)
        .map_err(|e| ServiceError::Transport(format!("Failed to parse JSON response: {e}")))
}

/// Saves artifacts into a local directory
pub struct ArtifactDownloader {
    client: ConverterClient,
    dest_dir: PathBuf,
}

impl ArtifactDownloader {
    pub fn new(client: ConverterClient, dest_dir: impl Into<PathBuf>) -> Self {
        ArtifactDownloader {
            client,
            dest_dir: dest_dir.into(),
        }
    }
}

impl Navigator for ArtifactDownloader {
    fn navigate(&mut self, path: &str) -> Result<()> {
        let file_name = artifact_file_name(path)
            .with_context(|| format!("Artifact path '{path}' has no file name"))?;
        let url = self.client.url_for(&encode_artifact_path(path));

        fs::create_dir_all(&self.dest_dir).with_context(|| {
            format!("Failed to create download directory {}", self.dest_dir.display())
        })?;
        let target = self.dest_dir.join(file_name);

        info!("fetching {url}");
        let response = self
            .client
            .agent
            .get(&url)
            .call()
            .map_err(|e| anyhow::anyhow!("Artifact download failed: {}", e))?;

        let mut file = File::create(&target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        let bytes = io::copy(&mut response.into_reader(), &mut file)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        info!("saved {} bytes to {}", bytes, target.display());
        println!("Saved {}", target.display());
        Ok(())
    }
}

/// Prints the artifact link instead of fetching it
pub struct LinkPrinter {
    base_url: String,
}

impl LinkPrinter {
    pub fn new(client: &ConverterClient) -> Self {
        LinkPrinter {
            base_url: client.base_url().to_string(),
        }
    }
}

impl Navigator for LinkPrinter {
    fn navigate(&mut self, path: &str) -> Result<()> {
        println!(
            "Download ready: {}/{}",
            self.base_url,
            encode_artifact_path(path).trim_start_matches('/')
        );
        Ok(())
    }
}

/// Last path segment, rejecting anything that would escape the download dir
fn artifact_file_name(path: &str) -> Option<&str> {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && *name != "..")
}

/// Percent-encode each segment of a service-relative path
fn encode_artifact_path(path: &str) -> String {
    path.split('/')
        .map(|segment| encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

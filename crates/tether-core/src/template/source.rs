//! Template sources: local files and HTTP(S) URLs.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::Template;
use crate::error::SetupError;

/// Supplies the deployment template for a run.
pub trait TemplateSource {
    /// Human-readable location, used in error messages.
    fn location(&self) -> String;

    fn load(&self) -> anyhow::Result<Template>;
}

/// Where a template lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateLocation {
    File(PathBuf),
    Url(Url),
}

impl TemplateLocation {
    /// Parse an `http(s)://` URL or a filesystem path.
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            anyhow::bail!("Template location is empty");
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed)
                .with_context(|| format!("Invalid template URL: {}", trimmed))?;
            return Ok(Self::Url(url));
        }
        Ok(Self::File(PathBuf::from(trimmed)))
    }

    /// Build the matching source, with an optional parameter file.
    pub fn into_source(self, parameters: Option<PathBuf>) -> Box<dyn TemplateSource> {
        match self {
            Self::File(path) => Box::new(FileTemplateSource::new(path).with_parameters(parameters)),
            Self::Url(url) => Box::new(HttpTemplateSource::new(url).with_parameters(parameters)),
        }
    }
}

impl fmt::Display for TemplateLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Reads a JSON template from disk.
#[derive(Debug, Clone)]
pub struct FileTemplateSource {
    path: PathBuf,
    parameters: Option<PathBuf>,
}

impl FileTemplateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Option<PathBuf>) -> Self {
        self.parameters = parameters;
        self
    }
}

impl TemplateSource for FileTemplateSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> anyhow::Result<Template> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read template: {}", self.path.display()))?;
        let payload = parse_template(&content)?;
        let parameters = self.parameters.as_deref().map(load_parameters).transpose()?;
        Ok(Template::new(payload).with_parameters(parameters))
    }
}

/// Downloads a JSON template over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTemplateSource {
    url: Url,
    parameters: Option<PathBuf>,
}

impl HttpTemplateSource {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Option<PathBuf>) -> Self {
        self.parameters = parameters;
        self
    }

    async fn fetch(&self) -> anyhow::Result<String> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tether/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let response = client
            .get(self.url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch template from {}", self.url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch template: HTTP {} from {}",
                response.status(),
                self.url
            );
        }

        response
            .text()
            .await
            .context("Failed to read template response")
    }
}

impl TemplateSource for HttpTemplateSource {
    fn location(&self) -> String {
        self.url.to_string()
    }

    fn load(&self) -> anyhow::Result<Template> {
        debug!(url = %self.url, "downloading template");
        // Block on async fetch using tokio runtime
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
        let content = runtime.block_on(self.fetch())?;

        let payload = parse_template(&content)?;
        let parameters = self.parameters.as_deref().map(load_parameters).transpose()?;
        Ok(Template::new(payload).with_parameters(parameters))
    }
}

/// Load an ARM parameters document and return its `parameters` object.
///
/// A file is an ARM document when it carries `$schema` or `contentVersion`, or
/// a `parameters` key that is not itself a parameter entry. Anything else is
/// taken to be the bag itself.
pub fn load_parameters(path: &Path) -> Result<Value, SetupError> {
    let unavailable = |message: String| SetupError::ParametersUnavailable {
        path: path.to_path_buf(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
    let value: Value = serde_json::from_str(content.trim_start_matches('\u{feff}'))
        .map_err(|e| unavailable(format!("invalid JSON: {}", e)))?;
    let bag = if is_parameters_document(&value) {
        value.get("parameters").cloned().unwrap_or(Value::Null)
    } else {
        value
    };
    if !bag.is_object() {
        return Err(unavailable("no parameter object".to_string()));
    }
    Ok(bag)
}

fn is_parameters_document(value: &Value) -> bool {
    if value.get("$schema").is_some() || value.get("contentVersion").is_some() {
        return true;
    }
    match value.get("parameters") {
        Some(inner) => inner.get("value").is_none() && inner.get("reference").is_none(),
        None => false,
    }
}

fn parse_template(content: &str) -> anyhow::Result<Value> {
    // Templates saved by some editors carry a UTF-8 BOM.
    let content = content.trim_start_matches('\u{feff}');
    let payload: Value = serde_json::from_str(content).context("Template is not valid JSON")?;
    if !payload.is_object() {
        anyhow::bail!("Template must be a JSON object");
    }
    Ok(payload)
}

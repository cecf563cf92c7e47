//! Read-only access to the local template library.
//!
//! The library is a plain directory tree:
//!
//! ```text
//! <base>/<category>/<template>/content.html
//! <base>/<category>/<template>/content.txt
//! ```
//!
//! Every query re-reads the filesystem. The tree is expected to be edited or
//! re-cloned underneath a running server, so nothing is cached and a path that
//! disappears between two calls is reported as [`ErrorCode::NotFound`].

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tokio::fs;
use tracing::debug;

/// Failure codes for library queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    NotDir,
    IoError,
    UnexpectedError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::NotDir => "NOT_DIR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::UnexpectedError => "UNEXPECTED_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handled library failure. The message is safe to show to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: ErrorCode,
    pub message: String,
}

impl StoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn not_found(what: &str) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("Not found or not readable: {}", what),
        )
    }

    fn not_dir(what: &str) -> Self {
        Self::new(ErrorCode::NotDir, format!("Not a directory: {}", what))
    }

    fn io(what: &str, err: &io::Error) -> Self {
        Self::new(ErrorCode::IoError, format!("Failed to read {}: {}", what, err))
    }

    /// Classify an I/O error raised while touching a directory.
    ///
    /// `what` names the location relative to the library root; absolute server
    /// paths never reach the caller.
    fn from_io(what: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => Self::not_found(what),
            io::ErrorKind::NotADirectory => Self::not_dir(what),
            _ => Self::io(what, err),
        }
    }

    /// Classify an I/O error raised while reading a content file. Any missing or
    /// non-directory ancestor means the variant is absent.
    fn from_content_io(what: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::NotADirectory => Self::not_found(what),
            _ => Self::io(what, err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// How the library root is named in caller-facing messages.
const LIBRARY_ROOT: &str = "template library root";

/// Which body of a template to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    #[default]
    Html,
    Text,
}

impl ContentFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            ContentFormat::Html => "content.html",
            ContentFormat::Text => "content.txt",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Html => "html",
            ContentFormat::Text => "text",
        }
    }
}

impl FromStr for ContentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(ContentFormat::Html),
            "text" => Ok(ContentFormat::Text),
            other => Err(format!(
                "Invalid format '{}'. Supported formats are 'html' and 'text'.",
                other
            )),
        }
    }
}

/// A search hit: a template whose name contains the searched topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Idea {
    pub category: String,
    pub template: String,
}

/// Template library rooted at a fixed base path.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    base: PathBuf,
}

impl TemplateLibrary {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub async fn list_categories(&self) -> StoreResult<Vec<String>> {
        list_categories(&self.base).await
    }

    pub async fn list_templates_in_category(&self, category: &str) -> StoreResult<Vec<String>> {
        list_templates_in_category(&self.base, category).await
    }

    pub async fn get_template_content(
        &self,
        category: &str,
        template: &str,
        format: ContentFormat,
    ) -> StoreResult<String> {
        get_template_content(&self.base, category, template, format).await
    }

    pub async fn get_template_ideas(&self, topic: &str) -> StoreResult<Vec<Idea>> {
        get_template_ideas(&self.base, topic).await
    }
}

/// List the categories (immediate subdirectories) under `base`.
pub async fn list_categories(base: &Path) -> StoreResult<Vec<String>> {
    probe_dir(base, LIBRARY_ROOT).await?;
    list_subdirectories(base, LIBRARY_ROOT).await
}

/// List the templates (immediate subdirectories) of one category.
pub async fn list_templates_in_category(base: &Path, category: &str) -> StoreResult<Vec<String>> {
    let dir = base.join(checked_segment("category", category)?);
    let what = format!("category '{}'", category);
    probe_dir(&dir, &what).await?;
    list_subdirectories(&dir, &what).await
}

/// Read one content variant of a template as UTF-8 text.
pub async fn get_template_content(
    base: &Path,
    category: &str,
    template: &str,
    format: ContentFormat,
) -> StoreResult<String> {
    let path = base
        .join(checked_segment("category", category)?)
        .join(checked_segment("template", template)?)
        .join(format.file_name());
    let what = format!("{}/{}/{}", category, template, format.file_name());

    match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(StoreError::new(
                ErrorCode::NotFound,
                format!("Template content is not a file: {}", what),
            ))
        }
        Err(e) => return Err(StoreError::from_content_io(&what, &e)),
    }

    fs::read_to_string(&path)
        .await
        .map_err(|e| StoreError::from_content_io(&what, &e))
}

/// Find templates whose name contains `topic`, ignoring case.
///
/// A failure to list the categories is returned as-is. A category that cannot be
/// listed contributes no ideas and does not abort the search.
pub async fn get_template_ideas(base: &Path, topic: &str) -> StoreResult<Vec<Idea>> {
    let categories = list_categories(base).await?;

    let listings = futures::future::join_all(
        categories
            .iter()
            .map(|category| list_templates_in_category(base, category)),
    )
    .await;

    Ok(collect_ideas(
        topic,
        categories.into_iter().zip(listings).collect(),
    ))
}

/// Merge per-category listings into ideas, preserving enumeration order.
pub fn collect_ideas(topic: &str, listings: Vec<(String, StoreResult<Vec<String>>)>) -> Vec<Idea> {
    let needle = topic.to_lowercase();
    let mut ideas = Vec::new();

    for (category, listing) in listings {
        let templates = match listing {
            Ok(templates) => templates,
            Err(e) => {
                debug!(%category, error = %e, "Skipping category while searching templates");
                continue;
            }
        };

        ideas.extend(
            templates
                .into_iter()
                .filter(|template| template.to_lowercase().contains(&needle))
                .map(|template| Idea {
                    category: category.clone(),
                    template,
                }),
        );
    }

    ideas
}

async fn probe_dir(path: &Path, what: &str) -> StoreResult<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StoreError::not_dir(what)),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Template directory probe failed");
            Err(StoreError::from_io(what, &e))
        }
    }
}

async fn list_subdirectories(path: &Path, what: &str) -> StoreResult<Vec<String>> {
    let mut entries = fs::read_dir(path)
        .await
        .map_err(|e| StoreError::from_io(what, &e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::from_io(what, &e))?
    {
        // Entry may have been removed since the listing was taken.
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => debug!(name = ?raw, "Skipping non UTF-8 directory name"),
        }
    }

    Ok(names)
}

/// Accept only a single, normal path component.
fn checked_segment<'a>(kind: &str, name: &'a str) -> StoreResult<&'a str> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();

    if single_normal && !name.contains(['/', '\\', '\0']) {
        Ok(name)
    } else {
        Err(StoreError::new(
            ErrorCode::NotFound,
            format!("Invalid {} name: '{}'", kind, name),
        ))
    }
}

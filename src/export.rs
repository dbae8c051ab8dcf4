//! CSV export of selected post fields.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::models::Post;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field '{0}', expected one of: id, text, attachments, links, likes, comments, reposts")]
pub struct UnknownField(pub String);

/// A post column that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Text,
    Attachments,
    Links,
    Likes,
    Comments,
    Reposts,
}

impl Field {
    pub const ALL: [Self; 7] = [
        Self::Id,
        Self::Text,
        Self::Attachments,
        Self::Links,
        Self::Likes,
        Self::Comments,
        Self::Reposts,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Text => "text",
            Self::Attachments => "attachments",
            Self::Links => "links",
            Self::Likes => "likes",
            Self::Comments => "comments",
            Self::Reposts => "reposts",
        }
    }

    /// String form of this field for one post.
    #[must_use]
    pub fn render(&self, post: &Post) -> String {
        match self {
            Self::Id => post.id.to_string(),
            Self::Text => post.text.clone(),
            Self::Attachments => post.attachment_count.to_string(),
            Self::Links => serde_json::to_string(&post.links).unwrap_or_default(),
            Self::Likes => post.likes.to_string(),
            Self::Comments => post.comments.to_string(),
            Self::Reposts => post.reposts.to_string(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Write a header of field names and one row per post, in the given order.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_csv<W: Write>(posts: &[Post], fields: &[Field], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(fields.iter().map(Field::as_str))
        .context("Failed to write CSV header")?;
    for post in posts {
        out.write_record(fields.iter().map(|field| field.render(post)))
            .context("Failed to write CSV row")?;
    }
    out.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// [`write_csv`] into a newly created file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_csv_file(posts: &[Post], fields: &[Field], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_csv(posts, fields, file)?;
    info!(path = %path.display(), rows = posts.len(), "CSV export written");
    Ok(())
}

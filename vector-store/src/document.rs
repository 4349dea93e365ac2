use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Metadata extracted from a knowledge-base document
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DocumentMetadata {
    /// Tags attached to the document
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Outgoing links in the order the author wrote them (unresolved)
    #[serde(default, alias = "wikilinks")]
    pub links: Vec<String>,

    /// Flat key/value frontmatter
    #[serde(default)]
    pub frontmatter: BTreeMap<String, String>,
}

/// A knowledge-base document, keyed by its path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Vault-relative path, unique within a corpus
    pub path: String,

    /// Raw text content
    pub content: String,

    /// Extracted metadata
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document without metadata
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            metadata: DocumentMetadata::default(),
        }
    }

    /// Create a document with metadata
    pub fn with_metadata(
        path: impl Into<String>,
        content: impl Into<String>,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            metadata,
        }
    }

    /// Append outgoing links
    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.links.extend(links.into_iter().map(Into::into));
        self
    }

    /// Add tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Set a frontmatter field
    pub fn with_frontmatter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.frontmatter.insert(key.into(), value.into());
        self
    }

    /// A document with no text is still a document, unlike an absent one
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

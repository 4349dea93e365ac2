use crate::document::{Document, DocumentMetadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const PATH_KEY: &str = "path";
const TAGS_KEY: &str = "tags";
const LINKS_KEY: &str = "wikilinks";

/// One persisted vector store entry.
///
/// Document metadata is flattened into `metadata`: `path`, `tags` and
/// `wikilinks` are reserved keys, every other string value is frontmatter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl VectorRecord {
    pub fn from_document(document: &Document, embedding: Option<Vec<f32>>) -> Self {
        let mut metadata: BTreeMap<String, Value> = document
            .metadata
            .frontmatter
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        metadata.insert(PATH_KEY.to_string(), Value::String(document.path.clone()));
        metadata.insert(
            TAGS_KEY.to_string(),
            Value::from(document.metadata.tags.iter().cloned().collect::<Vec<_>>()),
        );
        metadata.insert(
            LINKS_KEY.to_string(),
            Value::from(document.metadata.links.clone()),
        );

        Self {
            id: document.path.clone(),
            content: document.content.clone(),
            metadata,
            embedding,
        }
    }

    /// Split back into a document and its (optional) vector
    pub fn into_document(self) -> (Document, Option<Vec<f32>>) {
        let mut metadata = DocumentMetadata::default();
        let mut path = self.id;

        for (key, value) in self.metadata {
            match (key.as_str(), value) {
                (PATH_KEY, Value::String(p)) => path = p,
                (TAGS_KEY, Value::Array(items)) => {
                    metadata.tags = string_items(items).collect();
                }
                (LINKS_KEY | "links", Value::Array(items)) => {
                    metadata.links = string_items(items).collect();
                }
                (_, Value::String(s)) => {
                    metadata.frontmatter.insert(key, s);
                }
                _ => {}
            }
        }

        (
            Document::with_metadata(path, self.content, metadata),
            self.embedding,
        )
    }
}

fn string_items(items: Vec<Value>) -> impl Iterator<Item = String> {
    items.into_iter().filter_map(|item| match item {
        Value::String(s) => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reads_flat_metadata() {
        let json = r#"{
            "id": "projects/alpha.md",
            "content": "Alpha ships in May.",
            "metadata": {
                "path": "projects/alpha.md",
                "tags": ["project"],
                "wikilinks": ["people/bob"],
                "status": "active",
                "priority": 2
            },
            "embedding": null
        }"#;

        let record: VectorRecord = serde_json::from_str(json).unwrap();
        let (doc, embedding) = record.into_document();

        assert_eq!(doc.path, "projects/alpha.md");
        assert!(doc.metadata.tags.contains("project"));
        assert_eq!(doc.metadata.links, vec!["people/bob".to_string()]);
        assert_eq!(
            doc.metadata.frontmatter.get("status").map(String::as_str),
            Some("active")
        );
        // Non-string values are not frontmatter
        assert!(!doc.metadata.frontmatter.contains_key("priority"));
        assert!(embedding.is_none());
    }

    #[test]
    fn test_missing_embedding_field() {
        let json = r#"{"id": "x.md", "content": "x"}"#;
        let record: VectorRecord = serde_json::from_str(json).unwrap();
        assert!(record.embedding.is_none());
        assert!(record.metadata.is_empty());
    }

    #[test]
    fn test_document_round_trip_keeps_metadata() {
        let doc = Document::new("a.md", "body")
            .with_links(["b", "c"])
            .with_tags(["t"])
            .with_frontmatter("author", "kim");

        let record = VectorRecord::from_document(&doc, Some(vec![0.5, 0.5]));
        assert_eq!(record.id, "a.md");

        let (restored, embedding) = record.into_document();
        assert_eq!(restored, doc);
        assert_eq!(embedding, Some(vec![0.5, 0.5]));
    }
}

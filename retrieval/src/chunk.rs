//! Document chunks stored in the index.

use serde::{Deserialize, Serialize};

/// Descriptive metadata attached to a chunk when the index was built.
///
/// Every field is optional: older ingestion runs did not record all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Title of the legal text the chunk comes from (e.g. "Code de la famille").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_title: Option<String>,

    /// Title of the section or article inside the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_title: Option<String>,

    /// Collection folder the document was filed under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    /// Where the published text can be consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// A retrievable piece of a legal document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Body text, passed verbatim into the prompt.
    pub text: String,

    /// Source metadata.
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn with_document_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.document_title = Some(title.into());
        self
    }

    pub fn with_chunk_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.chunk_title = Some(title.into());
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.metadata.folder = Some(folder.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.metadata.source_url = Some(url.into());
        self
    }

    /// Key used to recognise the same passage retrieved twice.
    ///
    /// Document title followed by chunk title, missing parts as empty
    /// strings. Chunks without either title therefore share one key.
    pub fn identity(&self) -> String {
        let document = self.metadata.document_title.as_deref().unwrap_or_default();
        let chunk = self.metadata.chunk_title.as_deref().unwrap_or_default();
        format!("{document}{chunk}")
    }
}

/// A chunk returned by a search, with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identity_concatenates_titles() {
        let chunk = DocumentChunk::new("Article 1")
            .with_document_title("Code pénal")
            .with_chunk_title("Article 1");
        assert_eq!(chunk.identity(), "Code pénalArticle 1");
    }

    #[test]
    fn test_identity_without_metadata_is_empty() {
        assert_eq!(DocumentChunk::new("a").identity(), "");
        assert_eq!(DocumentChunk::new("b").identity(), "");
    }

    #[test]
    fn test_metadata_deserializes_with_missing_fields() {
        let chunk: DocumentChunk = serde_json::from_value(serde_json::json!({
            "text": "Le mariage est célébré publiquement.",
            "metadata": { "document_title": "Code de la famille", "page": 12 }
        }))
        .unwrap();

        assert_eq!(
            chunk.metadata.document_title.as_deref(),
            Some("Code de la famille")
        );
        assert_eq!(chunk.metadata.chunk_title, None);
        assert_eq!(chunk.metadata.folder, None);
    }
}

//! Persisted vector store.
//!
//! An index directory holds two files:
//!
//! - `manifest.json`: format version, embedding model, dimension, entry
//!   count and the SHA-256 of the entries file
//! - `entries.json`: every chunk with its embedding
//!
//! The index is produced by an offline ingestion job and may have been
//! copied from elsewhere, so loading verifies the checksum and refuses
//! unverifiable content unless the caller opts in with
//! [`LoadOptions::allow_unverified`].

use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info, warn};

use lexsen_embeddings::{Embedding, SimilarityResult, find_top_k, normalize};

use crate::chunk::{DocumentChunk, RetrievedChunk};
use crate::error::{Result, RetrievalError};
use crate::mmr::{MmrConfig, mmr_select};

/// Manifest file name inside an index directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Entries file name inside an index directory.
pub const ENTRIES_FILE: &str = "entries.json";

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Index manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// On-disk format version.
    pub format_version: u32,

    /// Model the stored embeddings were computed with.
    pub embedding_model: String,

    /// Embedding dimension.
    pub dimension: usize,

    /// Whether stored embeddings are unit length.
    pub normalized: bool,

    /// Number of entries.
    pub entry_count: usize,

    /// Hex SHA-256 of the entries file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// A chunk together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Unique identifier.
    pub id: String,

    /// The chunk.
    #[serde(flatten)]
    pub chunk: DocumentChunk,

    /// The embedding vector.
    pub embedding: Embedding,
}

/// How much to trust an index directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Accept indexes whose checksum is missing or does not match.
    pub allow_unverified: bool,
}

impl LoadOptions {
    /// Options that accept unverifiable indexes.
    pub fn allow_unverified() -> Self {
        Self {
            allow_unverified: true,
        }
    }
}

/// In-memory vector store over document chunks.
///
/// Read-only once loaded; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct VectorStore {
    embedding_model: String,
    dimension: usize,
    entries: Vec<StoredEntry>,
}

impl VectorStore {
    /// Create an empty store.
    pub fn new(embedding_model: impl Into<String>, dimension: usize) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            dimension,
            entries: Vec::new(),
        }
    }

    /// Add a chunk. The embedding is normalized before storage.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        chunk: DocumentChunk,
        mut embedding: Embedding,
    ) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(lexsen_embeddings::EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            }
            .into());
        }

        normalize(&mut embedding);
        self.entries.push(StoredEntry {
            id: id.into(),
            chunk,
            embedding,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn entries(&self) -> &[StoredEntry] {
        &self.entries
    }

    /// Load an index directory.
    pub async fn load(dir: impl AsRef<Path>, options: LoadOptions) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);

        let manifest_bytes = match fs::read(&manifest_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RetrievalError::IndexNotFound(dir.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        let manifest: IndexManifest = serde_json::from_slice(&manifest_bytes)?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(RetrievalError::UnsupportedFormat {
                found: manifest.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let entries_bytes = fs::read(dir.join(ENTRIES_FILE)).await?;
        let actual = checksum(&entries_bytes);

        match manifest.checksum.as_deref() {
            Some(expected) if expected.eq_ignore_ascii_case(&actual) => {
                debug!("Index checksum verified: {actual}");
            }
            Some(expected) if options.allow_unverified => {
                warn!(
                    "Index checksum mismatch at {} (manifest {expected}, actual {actual}); \
                     loading anyway",
                    dir.display()
                );
            }
            Some(expected) => {
                return Err(RetrievalError::ChecksumMismatch {
                    expected: expected.to_string(),
                    actual,
                });
            }
            None if options.allow_unverified => {
                warn!("Index at {} has no checksum; loading anyway", dir.display());
            }
            None => return Err(RetrievalError::UnverifiedIndex(dir.to_path_buf())),
        }

        let mut entries: Vec<StoredEntry> = serde_json::from_slice(&entries_bytes)?;

        if entries.len() != manifest.entry_count {
            return Err(RetrievalError::CorruptIndex(format!(
                "manifest lists {} entries, found {}",
                manifest.entry_count,
                entries.len()
            )));
        }

        for entry in &mut entries {
            if entry.embedding.len() != manifest.dimension {
                return Err(RetrievalError::CorruptIndex(format!(
                    "entry {} has dimension {}, manifest says {}",
                    entry.id,
                    entry.embedding.len(),
                    manifest.dimension
                )));
            }
            if !manifest.normalized {
                normalize(&mut entry.embedding);
            }
        }

        info!(
            "Loaded vector index from {} ({} chunks, model {}, dimension {})",
            dir.display(),
            entries.len(),
            manifest.embedding_model,
            manifest.dimension
        );

        Ok(Self {
            embedding_model: manifest.embedding_model,
            dimension: manifest.dimension,
            entries,
        })
    }

    /// Write the store to an index directory, creating it if needed.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<IndexManifest> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        let entries_bytes = serde_json::to_vec(&self.entries)?;
        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            embedding_model: self.embedding_model.clone(),
            dimension: self.dimension,
            normalized: true,
            entry_count: self.entries.len(),
            checksum: Some(checksum(&entries_bytes)),
        };

        fs::write(dir.join(ENTRIES_FILE), &entries_bytes).await?;
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest)?,
        )
        .await?;

        info!("Saved {} chunks to {}", self.entries.len(), dir.display());
        Ok(manifest)
    }

    /// Plain nearest-neighbour search, best first.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let hits = self.top_k(query, k)?;
        Ok(hits.into_iter().map(|hit| self.retrieved(hit)).collect())
    }

    /// Nearest `fetch_k` neighbours, re-selected down to `k` by MMR.
    ///
    /// An empty store yields no chunks.
    pub fn max_marginal_relevance_search(
        &self,
        query: &[f32],
        config: &MmrConfig,
    ) -> Result<Vec<RetrievedChunk>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.top_k(query, config.fetch_k.max(config.k))?;
        let vectors: Vec<&[f32]> = pool
            .iter()
            .map(|hit| self.entries[hit.index].embedding.as_slice())
            .collect();

        let picked = mmr_select(query, &vectors, config.k, config.lambda)?;
        debug!(
            "MMR selected {} of {} candidates (lambda {})",
            picked.len(),
            pool.len(),
            config.lambda
        );

        Ok(picked
            .into_iter()
            .map(|pos| self.retrieved(pool[pos]))
            .collect())
    }

    fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<SimilarityResult>> {
        if query.len() != self.dimension {
            return Err(lexsen_embeddings::EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            }
            .into());
        }

        Ok(find_top_k(
            query,
            self.entries.iter().map(|e| e.embedding.as_slice()),
            k,
            f32::NEG_INFINITY,
        )?)
    }

    fn retrieved(&self, hit: SimilarityResult) -> RetrievedChunk {
        RetrievedChunk {
            chunk: self.entries[hit.index].chunk.clone(),
            score: hit.score,
        }
    }
}

fn checksum(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_store() -> VectorStore {
        let mut store = VectorStore::new("test-model", 3);
        store
            .add(
                "famille-1",
                DocumentChunk::new("Le mariage est un contrat.")
                    .with_document_title("Code de la famille")
                    .with_chunk_title("Article 100"),
                vec![1.0, 0.0, 0.0],
            )
            .unwrap();
        store
            .add(
                "famille-2",
                DocumentChunk::new("Le mariage est célébré par l'officier d'état civil.")
                    .with_document_title("Code de la famille")
                    .with_chunk_title("Article 101"),
                vec![0.98, 0.02, 0.0],
            )
            .unwrap();
        store
            .add(
                "penal-1",
                DocumentChunk::new("Le vol est puni.")
                    .with_document_title("Code pénal")
                    .with_chunk_title("Article 364"),
                vec![0.0, 0.0, 1.0],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_add_rejects_wrong_dimension() {
        let mut store = VectorStore::new("test-model", 3);
        let err = store
            .add("bad", DocumentChunk::new("x"), vec![1.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }

    #[test]
    fn test_similarity_search_orders_by_score() {
        let store = sample_store();
        let hits = store.similarity_search(&[1.0, 0.0, 0.0], 2).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.metadata.chunk_title.as_deref(), Some("Article 100"));
        assert_eq!(hits[1].chunk.metadata.chunk_title.as_deref(), Some("Article 101"));
    }

    #[test]
    fn test_mmr_search_skips_near_duplicate() {
        let store = sample_store();
        let hits = store
            .max_marginal_relevance_search(&[0.9, 0.0, 0.4359], &MmrConfig::default())
            .unwrap();

        let titles: Vec<_> = hits
            .iter()
            .map(|h| h.chunk.metadata.chunk_title.clone().unwrap_or_default())
            .collect();
        assert_eq!(titles, vec!["Article 100", "Article 364"]);
    }

    #[test]
    fn test_mmr_search_on_empty_store() {
        let store = VectorStore::new("test-model", 3);
        let hits = store
            .max_marginal_relevance_search(&[1.0, 0.0, 0.0], &MmrConfig::default())
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let store = sample_store();
        assert!(store.similarity_search(&[1.0, 0.0], 1).is_err());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = sample_store().save(temp_dir.path()).await.unwrap();
        assert_eq!(manifest.entry_count, 3);
        assert!(manifest.checksum.is_some());

        let loaded = VectorStore::load(temp_dir.path(), LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.embedding_model(), "test-model");
        assert_eq!(loaded.entries()[2].id, "penal-1");
    }

    #[tokio::test]
    async fn test_load_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = VectorStore::load(temp_dir.path().join("absent"), LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn test_tampered_entries_are_refused() {
        let temp_dir = TempDir::new().unwrap();
        sample_store().save(temp_dir.path()).await.unwrap();

        let entries_path = temp_dir.path().join(ENTRIES_FILE);
        let tampered = std::fs::read_to_string(&entries_path)
            .unwrap()
            .replace("Le vol est puni.", "Le vol est permis.");
        std::fs::write(&entries_path, tampered).unwrap();

        let err = VectorStore::load(temp_dir.path(), LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::ChecksumMismatch { .. }));

        let loaded = VectorStore::load(temp_dir.path(), LoadOptions::allow_unverified())
            .await
            .unwrap();
        assert_eq!(loaded.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_checksum_requires_opt_in() {
        let temp_dir = TempDir::new().unwrap();
        sample_store().save(temp_dir.path()).await.unwrap();

        let manifest_path = temp_dir.path().join(MANIFEST_FILE);
        let mut manifest: IndexManifest =
            serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();
        manifest.checksum = None;
        std::fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();

        let err = VectorStore::load(temp_dir.path(), LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::UnverifiedIndex(_)));

        assert!(
            VectorStore::load(temp_dir.path(), LoadOptions::allow_unverified())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_unsupported_format_version() {
        let temp_dir = TempDir::new().unwrap();
        sample_store().save(temp_dir.path()).await.unwrap();

        let manifest_path = temp_dir.path().join(MANIFEST_FILE);
        let mut manifest: IndexManifest =
            serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();
        manifest.format_version = 99;
        std::fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();

        let err = VectorStore::load(temp_dir.path(), LoadOptions::allow_unverified())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::UnsupportedFormat {
                found: 99,
                expected: FORMAT_VERSION
            }
        ));
    }
}

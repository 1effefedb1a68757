//! Shared configuration types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::AimkgError;
use crate::taxonomy::MultimodalRule;

fn validate_embedding_dim(dim: usize) -> Result<(), validator::ValidationError> {
    if dim == 0 {
        return Err(validator::ValidationError::new("embedding_dim must be > 0"));
    }
    Ok(())
}

/// Which text-embedding client to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/embeddings` endpoint.
    #[default]
    OpenAi,
    /// Deterministic offline hashing embedder.
    Hash,
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EmbeddingBackend::OpenAi => "openai",
            EmbeddingBackend::Hash => "hash",
        })
    }
}

impl FromStr for EmbeddingBackend {
    type Err = AimkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(EmbeddingBackend::OpenAi),
            "hash" => Ok(EmbeddingBackend::Hash),
            other => Err(AimkgError::Validation(format!(
                "EMBEDDING_BACKEND must be 'openai' or 'hash', got '{other}'"
            ))),
        }
    }
}

/// Central configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AimkgConfig {
    /// Neo4j connection URI (e.g. `bolt://localhost:7687`).
    #[validate(length(min = 1))]
    pub neo4j_uri: String,

    /// Neo4j username.
    pub neo4j_user: String,

    /// Neo4j password.
    #[validate(length(min = 1))]
    pub neo4j_password: String,

    /// Database name; the server default when unset.
    pub neo4j_database: Option<String>,

    pub embedding_backend: EmbeddingBackend,

    /// Base URL of the OpenAI-compatible embeddings server.
    #[validate(length(min = 1))]
    pub embedding_api_base: String,

    pub embedding_api_key: Option<String>,

    /// Model served at `embedding_api_base`.
    #[validate(length(min = 1))]
    pub embedding_model: String,

    /// Embedding vector dimension (must be > 0).
    #[validate(custom(function = "validate_embedding_dim"))]
    pub embedding_dim: usize,

    /// Directory holding the per-type embedding index files.
    pub index_dir: PathBuf,

    /// Root of the per-source interchange directories.
    pub kg_data_dir: PathBuf,

    /// Default number of recommendations per request.
    #[validate(range(min = 1, max = 50))]
    pub num_results: usize,

    /// Maximum traversal records per recommendation seed.
    #[validate(range(min = 1))]
    pub traversal_limit: usize,

    pub multimodal_rule: MultimodalRule,
}

impl Default for AimkgConfig {
    fn default() -> Self {
        Self {
            neo4j_uri: "bolt://localhost:7687".to_string(),
            neo4j_user: "neo4j".to_string(),
            neo4j_password: String::new(),
            neo4j_database: None,
            embedding_backend: EmbeddingBackend::OpenAi,
            embedding_api_base: "http://localhost:8080/v1".to_string(),
            embedding_api_key: None,
            embedding_model: "all-mpnet-base-v2".to_string(),
            embedding_dim: 768,
            index_dir: PathBuf::from("embeddings"),
            kg_data_dir: PathBuf::from("kg-data"),
            num_results: 3,
            traversal_limit: 100,
            multimodal_rule: MultimodalRule::default(),
        }
    }
}

fn parse_count(var: &str, default: usize) -> crate::Result<usize> {
    match std::env::var(var) {
        Ok(val) => val.parse::<usize>().map_err(|_| {
            AimkgError::Validation(format!("{var} must be a positive integer"))
        }),
        Err(_) => Ok(default),
    }
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl AimkgConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` first (non-fatal if `.env` is absent),
    /// then reads each variable from the process environment. `NEO4J_PASSWORD`
    /// is required and returns a [`crate::AimkgError::Validation`] error when
    /// absent.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let neo4j_uri = std::env::var("NEO4J_URI").unwrap_or(defaults.neo4j_uri);

        let neo4j_user = std::env::var("NEO4J_USER").unwrap_or(defaults.neo4j_user);

        let neo4j_password = std::env::var("NEO4J_PASSWORD").map_err(|_| {
            AimkgError::Validation("NEO4J_PASSWORD is required".to_string())
        })?;

        let embedding_backend = match non_empty("EMBEDDING_BACKEND") {
            Some(val) => val.parse()?,
            None => defaults.embedding_backend,
        };

        let embedding_api_base =
            std::env::var("EMBEDDING_API_BASE").unwrap_or(defaults.embedding_api_base);

        let embedding_model =
            std::env::var("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model);

        let multimodal_rule = match non_empty("MULTIMODAL_RULE") {
            Some(val) => val.parse()?,
            None => defaults.multimodal_rule,
        };

        let config = Self {
            neo4j_uri,
            neo4j_user,
            neo4j_password,
            neo4j_database: non_empty("NEO4J_DATABASE"),
            embedding_backend,
            embedding_api_base,
            embedding_api_key: non_empty("EMBEDDING_API_KEY"),
            embedding_model,
            embedding_dim: parse_count("EMBEDDING_DIM", defaults.embedding_dim)?,
            index_dir: std::env::var("INDEX_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_dir),
            kg_data_dir: std::env::var("KG_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.kg_data_dir),
            num_results: parse_count("NUM_RESULTS", defaults.num_results)?,
            traversal_limit: parse_count("TRAVERSAL_LIMIT", defaults.traversal_limit)?,
            multimodal_rule,
        };

        config
            .validate()
            .map_err(|e| AimkgError::Validation(e.to_string()))?;

        Ok(config)
    }
}

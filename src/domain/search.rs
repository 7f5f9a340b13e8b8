use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One ranked document returned by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub document: String,
    pub metadata: serde_json::Value,
    /// Lower is closer
    pub distance: f32,
}

/// Semantic search capability used by the researcher agent
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Up to `k` documents ranked by ascending distance
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, String>;

    async fn count(&self) -> Result<usize, String>;
}

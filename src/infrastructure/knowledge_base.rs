use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::search::{SearchHit, SearchService};

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    text: String,
    metadata: Value,
    terms: HashSet<String>,
}

/// In-memory document store with term-overlap ranking
///
/// `distance = 1 - matched_query_terms / query_terms`. Documents sharing no
/// term with the query are not returned.
#[derive(Default)]
pub struct InMemoryKnowledgeBase {
    documents: RwLock<Vec<StoredDocument>>,
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds documents, generating ids where none are given
    pub fn add_documents(&self, documents: Vec<(String, Value)>) -> Vec<String> {
        let mut store = match self.documents.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        documents
            .into_iter()
            .map(|(text, metadata)| {
                let id = Uuid::new_v4().to_string();
                store.push(StoredDocument {
                    id: id.clone(),
                    terms: terms(&text),
                    text,
                    metadata,
                });
                id
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut store) = self.documents.write() {
            store.clear();
        }
    }

    fn rank(&self, query: &str, k: usize) -> Vec<SearchHit> {
        let query_terms = terms(query);
        if query_terms.is_empty() || k == 0 {
            return Vec::new();
        }

        let store = match self.documents.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut hits: Vec<SearchHit> = store
            .iter()
            .filter_map(|doc| {
                let matched = query_terms.intersection(&doc.terms).count();
                if matched == 0 {
                    return None;
                }
                Some(SearchHit {
                    id: Some(doc.id.clone()),
                    document: doc.text.clone(),
                    metadata: doc.metadata.clone(),
                    distance: 1.0 - matched as f32 / query_terms.len() as f32,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        hits
    }

    /// Concatenates the best matches into one context block of at most
    /// `max_chars` characters
    pub fn relevant_context(&self, query: &str, k: usize, max_chars: usize) -> String {
        let mut parts = Vec::new();
        let mut total = 0;

        for hit in self.rank(query, k) {
            let length = hit.document.chars().count();
            if total + length > max_chars {
                let remaining = max_chars - total;
                if remaining > 100 {
                    let truncated: String = hit.document.chars().take(remaining).collect();
                    parts.push(format!("{}...", truncated));
                }
                break;
            }
            total += length;
            parts.push(hit.document);
        }

        parts.join(CONTEXT_SEPARATOR)
    }

    /// Loads the sample corpus used for local development
    pub fn seed_sample_data(&self) -> usize {
        let samples = vec![
            (
                "Python is a high-level, interpreted programming language known for its simplicity and readability. It supports multiple programming paradigms including object-oriented, functional, and procedural programming.",
                json!({"topic": "programming", "language": "python"}),
            ),
            (
                "Flask is a lightweight WSGI web application framework in Python. It is designed to make getting started quick and easy, with the ability to scale up to complex applications.",
                json!({"topic": "web_framework", "language": "python"}),
            ),
            (
                "React is a JavaScript library for building user interfaces, particularly single-page applications. It allows developers to create reusable UI components.",
                json!({"topic": "frontend", "language": "javascript"}),
            ),
            (
                "Multi-agent frameworks enable the creation of conversational agents that work together to solve complex tasks, each agent owning a narrow role.",
                json!({"topic": "ai", "category": "multi-agent"}),
            ),
            (
                "Vector databases enable semantic search by storing and querying vector embeddings of text. They are essential for Retrieval Augmented Generation (RAG) systems.",
                json!({"topic": "database", "category": "vector"}),
            ),
            (
                "TypeScript is a strongly typed programming language that builds on JavaScript. It adds optional static typing, classes, and interfaces to help catch errors during development.",
                json!({"topic": "programming", "language": "typescript"}),
            ),
            (
                "RESTful APIs are an architectural style for designing networked applications. They use HTTP methods like GET, POST, PUT, and DELETE to perform CRUD operations on resources.",
                json!({"topic": "architecture", "category": "api"}),
            ),
            (
                "An object-relational mapper maps database tables onto application types and provides enterprise-level persistence patterns such as unit of work and identity maps.",
                json!({"topic": "database", "category": "orm"}),
            ),
            (
                "WebSocket is a communications protocol providing full-duplex communication channels over a single TCP connection. It enables real-time, bi-directional communication between clients and servers.",
                json!({"topic": "networking", "category": "protocol"}),
            ),
            (
                "CI/CD (Continuous Integration/Continuous Deployment) is a method to frequently deliver apps to customers by introducing automation into the stages of app development.",
                json!({"topic": "devops", "category": "automation"}),
            ),
        ];

        let count = samples.len();
        self.add_documents(
            samples
                .into_iter()
                .map(|(text, meta)| (text.to_string(), meta))
                .collect(),
        );

        tracing::info!(documents = count, "Seeded knowledge base with sample documents");
        count
    }
}

#[async_trait]
impl SearchService for InMemoryKnowledgeBase {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, String> {
        Ok(self.rank(query, k))
    }

    async fn count(&self) -> Result<usize, String> {
        Ok(self.len())
    }
}

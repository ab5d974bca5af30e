use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{query_terms, SearchError, SearchIndex};

struct Document {
    body: Value,
    text: String,
}

/// Process-local index for tests and throwaway runs.
#[derive(Default)]
pub struct MemorySearchIndex {
    documents: RwLock<BTreeMap<(String, String), Document>>,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn save(
        &self,
        index: &str,
        id: &str,
        document: &Value,
        text: &str,
    ) -> Result<(), SearchError> {
        self.documents.write().await.insert(
            (index.to_string(), id.to_string()),
            Document {
                body: document.clone(),
                text: text.to_lowercase(),
            },
        );
        Ok(())
    }

    async fn delete(&self, index: &str, id: &str) -> Result<(), SearchError> {
        self.documents
            .write()
            .await
            .remove(&(index.to_string(), id.to_string()));
        Ok(())
    }

    async fn search(&self, index: &str, query: &str) -> Result<Vec<Value>, SearchError> {
        let terms = query_terms(query);
        let documents = self.documents.read().await;

        Ok(documents
            .iter()
            .filter(|((name, _), _)| name == index)
            .filter(|(_, doc)| match &terms {
                Some(terms) => terms.iter().all(|t| doc.text.contains(t.as_str())),
                None => true,
            })
            .map(|(_, doc)| doc.body.clone())
            .collect())
    }
}

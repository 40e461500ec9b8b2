//! Data sources backing the fetch tools

pub mod apify;

pub use apify::ApifyClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReportError, Result};

/// Items produced by one actor run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset identifier, quoted in data-unavailable errors
    pub id: String,
    /// Raw items in dataset order
    pub items: Vec<Value>,
}

impl Dataset {
    pub fn new(id: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }

    /// First item, required by the single-request Yahoo processes
    pub fn first_item(&self, actor: &str) -> Result<&Value> {
        self.items.first().ok_or_else(|| ReportError::EmptyDataset {
            dataset_id: self.id.clone(),
            actor: actor.to_string(),
        })
    }
}

/// Runs a scraping actor and returns its dataset
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Run `actor_id` (`user/actor`) with `input` and wait for its items
    async fn run_actor(&self, actor_id: &str, input: Value) -> Result<Dataset>;
}

use std::sync::Arc;

use crate::{Res, management::KeyValueStore, types::GenerationResult, warning};

pub const HISTORY_KEY: &str = "history";
pub const HISTORY_LIMIT: usize = 10;

/// Bounded most-recent-first log of generation results.
pub struct HistoryManager {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<GenerationResult>,
}

impl HistoryManager {
    /// Loads the persisted history once.
    ///
    /// A corrupt history file is reported and replaced by an empty history on
    /// the next write; it never blocks generation.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Res<Self> {
        let entries = match store.get(HISTORY_KEY).await? {
            Some(json) => match serde_json::from_str::<Vec<GenerationResult>>(&json) {
                Ok(mut entries) => {
                    entries.truncate(HISTORY_LIMIT);
                    entries
                }
                Err(e) => {
                    warning!("Ignoring unreadable history. Err: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(Self { store, entries })
    }

    /// Prepends `result`, truncates to [`HISTORY_LIMIT`] and persists.
    ///
    /// If the write fails the in-memory entries are left as they were.
    pub async fn push(&mut self, result: GenerationResult) -> Res<()> {
        let previous = self.entries.clone();
        self.entries.insert(0, result);
        self.entries.truncate(HISTORY_LIMIT);

        if let Err(e) = self.persist().await {
            self.entries = previous;
            return Err(e);
        }
        Ok(())
    }

    pub async fn clear(&mut self) -> Res<()> {
        self.entries.clear();
        self.store.remove(HISTORY_KEY).await
    }

    pub fn entries(&self) -> &[GenerationResult] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&GenerationResult> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn persist(&self) -> Res<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        self.store.set(HISTORY_KEY, &json).await
    }
}

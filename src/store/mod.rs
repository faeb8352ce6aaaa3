//! Persistence for dreams, interpretations, and registry preferences
//!
//! The journal keeps every record in one serializable document. Stores
//! publish typed [`StoreEvent`]s after each successful mutation.

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::models::{Dream, Interpretation, Mood};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    DreamAdded(Uuid),
    DreamChanged(Uuid),
    DreamsDeleted(Vec<Uuid>),
    InterpretationSaved(Uuid),
    MoodsUpdated,
    TagsUpdated,
}

pub trait DreamStore: Send + Sync {
    fn save_dream(&self, dream: &Dream) -> Result<()>;
    fn update_dream(&self, dream: &Dream) -> Result<()>;
    /// Deletes the dreams and their interpretations, returning how many
    /// dreams were removed. Unknown ids are skipped.
    fn delete_dreams_and_interpretations(&self, ids: &[Uuid]) -> Result<usize>;
    /// All dreams, newest first.
    fn dreams(&self) -> Result<Vec<Dream>>;
    fn dream(&self, id: Uuid) -> Result<Option<Dream>>;
    fn save_interpretation(&self, interpretation: &Interpretation) -> Result<()>;
    fn interpretation_for(&self, dream_id: Uuid) -> Result<Option<Interpretation>>;
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

pub trait PreferenceStore: Send + Sync {
    /// `None` until moods have been saved once.
    fn load_moods(&self) -> Result<Option<Vec<Mood>>>;
    fn save_moods(&self, moods: &[Mood]) -> Result<()>;
    fn load_custom_tags(&self) -> Result<Vec<String>>;
    fn save_custom_tags(&self, tags: &[String]) -> Result<()>;
}

/// The whole persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalData {
    #[serde(default)]
    pub dreams: Vec<Dream>,
    #[serde(default)]
    pub interpretations: Vec<Interpretation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moods: Option<Vec<Mood>>,
    #[serde(default)]
    pub custom_tags: Vec<String>,
}

impl JournalData {
    fn insert_dream(&mut self, dream: &Dream) -> Result<StoreEvent> {
        if self.dreams.iter().any(|d| d.id == dream.id) {
            return Err(Error::Validation(format!("Dream {} already exists", dream.id)));
        }
        self.dreams.push(dream.clone());
        Ok(StoreEvent::DreamAdded(dream.id))
    }

    fn replace_dream(&mut self, dream: &Dream) -> Result<StoreEvent> {
        let slot = self
            .dreams
            .iter_mut()
            .find(|d| d.id == dream.id)
            .ok_or_else(|| Error::NotFound(format!("dream {}", dream.id)))?;
        *slot = dream.clone();
        Ok(StoreEvent::DreamChanged(dream.id))
    }

    /// Returns `None` when no id matched, leaving the journal untouched.
    fn remove_dreams(&mut self, ids: &[Uuid]) -> (usize, Option<StoreEvent>) {
        let removed: Vec<Uuid> = self
            .dreams
            .iter()
            .map(|d| d.id)
            .filter(|id| ids.contains(id))
            .collect();
        if removed.is_empty() {
            return (0, None);
        }
        self.dreams.retain(|d| !removed.contains(&d.id));
        self.interpretations
            .retain(|i| !i.dream_parent_id.is_some_and(|parent| removed.contains(&parent)));
        (removed.len(), Some(StoreEvent::DreamsDeleted(removed)))
    }

    fn sorted_dreams(&self) -> Vec<Dream> {
        let mut dreams = self.dreams.clone();
        dreams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        dreams
    }

    fn find_dream(&self, id: Uuid) -> Option<Dream> {
        self.dreams.iter().find(|d| d.id == id).cloned()
    }

    fn upsert_interpretation(&mut self, interpretation: &Interpretation) -> Result<StoreEvent> {
        let parent = interpretation.dream_parent_id.ok_or_else(|| {
            Error::Validation("Interpretation is not attached to a dream".to_string())
        })?;
        if !self.dreams.iter().any(|d| d.id == parent) {
            return Err(Error::NotFound(format!("dream {}", parent)));
        }
        self.interpretations
            .retain(|i| i.dream_parent_id != Some(parent));
        self.interpretations.push(interpretation.clone());
        Ok(StoreEvent::InterpretationSaved(parent))
    }

    fn find_interpretation(&self, dream_id: Uuid) -> Option<Interpretation> {
        self.interpretations
            .iter()
            .find(|i| i.dream_parent_id == Some(dream_id))
            .cloned()
    }
}

/// Fan-out for store events. Sending with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: StoreEvent) {
        tracing::debug!("Store event: {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

//! User-extensible mood and tag registries
//!
//! Default moods are seeded into the preference store on first load and can
//! never be removed. Tags are a fixed predefined set plus custom labels.

use crate::models::Mood;
use crate::store::PreferenceStore;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const DEFAULT_MOODS: &[(&str, &str)] = &[
    ("Happy", "😊"),
    ("Calm", "😌"),
    ("Excited", "🤩"),
    ("Confused", "😕"),
    ("Anxious", "😰"),
    ("Scared", "😱"),
    ("Sad", "😢"),
    ("Angry", "😠"),
];

pub const PREDEFINED_TAGS: &[&str] = &[
    "Lucid",
    "Nightmare",
    "Recurring",
    "Flying",
    "Falling",
    "Chase",
    "Water",
    "Family",
    "Work",
    "Adventure",
];

/// Case-insensitive label comparison, Unicode-aware.
fn same_label(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

pub fn default_moods() -> Vec<Mood> {
    DEFAULT_MOODS
        .iter()
        .map(|(title, emoji)| Mood::new(*title, *emoji, true))
        .collect()
}

pub struct MoodRegistry {
    store: Arc<dyn PreferenceStore>,
    moods: Vec<Mood>,
}

impl MoodRegistry {
    /// Load the registry, seeding the defaults if nothing was stored yet.
    pub fn load(store: Arc<dyn PreferenceStore>) -> Result<Self> {
        let moods = match store.load_moods()? {
            Some(moods) => moods,
            None => {
                let seeded = default_moods();
                store.save_moods(&seeded)?;
                info!("Seeded {} default moods", seeded.len());
                seeded
            }
        };
        Ok(Self { store, moods })
    }

    pub fn moods(&self) -> &[Mood] {
        &self.moods
    }

    pub fn find(&self, title: &str) -> Option<&Mood> {
        let title = title.trim();
        self.moods.iter().find(|m| same_label(&m.title, title))
    }

    pub fn get(&self, id: Uuid) -> Option<&Mood> {
        self.moods.iter().find(|m| m.id == id)
    }

    /// Adds a custom mood. Adding a title that already exists is a no-op
    /// that returns the registered mood.
    pub fn add_mood(&mut self, title: &str, emoji: &str) -> Result<Mood> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("Mood title must not be empty".to_string()));
        }
        if let Some(existing) = self.find(title) {
            return Ok(existing.clone());
        }

        let mood = Mood::new(title, emoji.trim(), false);
        let mut next = self.moods.clone();
        next.push(mood.clone());
        self.store.save_moods(&next)?;
        self.moods = next;

        info!("Added mood {}", mood.label());
        Ok(mood)
    }

    pub fn remove_mood(&mut self, id: Uuid) -> Result<Mood> {
        let idx = self
            .moods
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::NotFound(format!("mood {}", id)))?;
        if self.moods[idx].is_default {
            return Err(Error::Validation(format!(
                "Default mood '{}' cannot be removed",
                self.moods[idx].title
            )));
        }

        let mut next = self.moods.clone();
        let removed = next.remove(idx);
        self.store.save_moods(&next)?;
        self.moods = next;

        info!("Removed mood {}", removed.label());
        Ok(removed)
    }
}

pub struct TagRegistry {
    store: Arc<dyn PreferenceStore>,
    custom: Vec<String>,
}

impl TagRegistry {
    pub fn load(store: Arc<dyn PreferenceStore>) -> Result<Self> {
        let custom = store.load_custom_tags()?;
        Ok(Self { store, custom })
    }

    /// Predefined tags followed by custom ones.
    pub fn tags(&self) -> Vec<String> {
        PREDEFINED_TAGS
            .iter()
            .map(|t| t.to_string())
            .chain(self.custom.iter().cloned())
            .collect()
    }

    pub fn custom_tags(&self) -> &[String] {
        &self.custom
    }

    /// Returns the registered spelling of `label`, if any.
    pub fn resolve(&self, label: &str) -> Option<String> {
        let label = label.trim();
        self.tags().into_iter().find(|t| same_label(t, label))
    }

    /// Adds a custom tag and returns its registered spelling. Adding an
    /// existing label is a no-op.
    pub fn add_tag(&mut self, label: &str) -> Result<String> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::Validation("Tag must not be empty".to_string()));
        }
        if let Some(existing) = self.resolve(label) {
            return Ok(existing);
        }

        let mut next = self.custom.clone();
        next.push(label.to_string());
        self.store.save_custom_tags(&next)?;
        self.custom = next;
        info!("Added tag {}", label);
        Ok(label.to_string())
    }

    pub fn remove_tag(&mut self, label: &str) -> Result<()> {
        let label = label.trim();
        if PREDEFINED_TAGS.iter().any(|t| same_label(t, label)) {
            return Err(Error::Validation(format!(
                "Predefined tag '{}' cannot be removed",
                label
            )));
        }
        let idx = self
            .custom
            .iter()
            .position(|t| same_label(t, label))
            .ok_or_else(|| Error::NotFound(format!("tag {}", label)))?;

        let mut next = self.custom.clone();
        next.remove(idx);
        self.store.save_custom_tags(&next)?;
        self.custom = next;
        info!("Removed tag {}", label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_defaults_are_seeded_once() {
        let store = store();
        let first = MoodRegistry::load(store.clone()).unwrap();
        assert_eq!(first.moods().len(), DEFAULT_MOODS.len());
        assert!(first.moods().iter().all(|m| m.is_default));

        let second = MoodRegistry::load(store.clone()).unwrap();
        let first_ids: Vec<Uuid> = first.moods().iter().map(|m| m.id).collect();
        let second_ids: Vec<Uuid> = second.moods().iter().map(|m| m.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_stored_moods_skip_seeding() {
        let store = Arc::new(MemoryStore::new().with_moods(vec![Mood::new("Dreamy", "💭", false)]));
        let registry = MoodRegistry::load(store).unwrap();
        assert_eq!(registry.moods().len(), 1);
        assert!(registry.find("Happy").is_none());
    }

    #[test]
    fn test_add_mood_validates_and_persists() {
        let store = store();
        let mut registry = MoodRegistry::load(store.clone()).unwrap();

        assert!(matches!(registry.add_mood("  ", "🫥"), Err(Error::Validation(_))));
        let calm = registry.find("Calm").cloned().unwrap();
        assert_eq!(registry.add_mood(" calm ", "🙂").unwrap(), calm);
        assert_eq!(registry.moods().len(), DEFAULT_MOODS.len());

        let nostalgic = registry.add_mood(" Nostalgic ", "🥲").unwrap();
        assert_eq!(nostalgic.title, "Nostalgic");
        assert!(!nostalgic.is_default);

        let reloaded = MoodRegistry::load(store).unwrap();
        assert_eq!(reloaded.find("nostalgic").map(|m| m.id), Some(nostalgic.id));
    }

    #[test]
    fn test_only_custom_moods_are_removable() {
        let mut registry = MoodRegistry::load(store()).unwrap();
        let default_id = registry.find("Happy").unwrap().id;
        assert!(matches!(
            registry.remove_mood(default_id),
            Err(Error::Validation(_))
        ));

        let custom = registry.add_mood("Wistful", "🌧️").unwrap();
        registry.remove_mood(custom.id).unwrap();
        assert!(registry.get(custom.id).is_none());
        assert!(matches!(
            registry.remove_mood(custom.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_tags_combine_predefined_and_custom() {
        let store = store();
        let mut registry = TagRegistry::load(store.clone()).unwrap();

        assert_eq!(registry.add_tag("flying").unwrap(), "Flying");
        assert!(registry.custom_tags().is_empty());

        assert_eq!(registry.add_tag(" Teeth ").unwrap(), "Teeth");
        assert_eq!(registry.add_tag("teeth").unwrap(), "Teeth");
        assert_eq!(registry.tags().len(), PREDEFINED_TAGS.len() + 1);

        let reloaded = TagRegistry::load(store).unwrap();
        assert_eq!(reloaded.resolve("TEETH"), Some("Teeth".to_string()));
    }

    #[test]
    fn test_remove_tag_rules() {
        let mut registry = TagRegistry::load(store()).unwrap();
        assert!(matches!(registry.add_tag(""), Err(Error::Validation(_))));
        assert!(matches!(registry.remove_tag("Lucid"), Err(Error::Validation(_))));
        assert!(matches!(registry.remove_tag("Unknown"), Err(Error::NotFound(_))));

        registry.add_tag("Exams").unwrap();
        registry.remove_tag("exams").unwrap();
        assert!(registry.resolve("Exams").is_none());
    }

    #[test]
    fn test_labels_match_across_non_ascii_case() {
        let mut moods = MoodRegistry::load(store()).unwrap();
        let enerve = moods.add_mood("Énervé", "😤").unwrap();
        assert_eq!(moods.find("énervé").map(|m| m.id), Some(enerve.id));
        assert_eq!(moods.add_mood("ÉNERVÉ", "😤").unwrap().id, enerve.id);

        let mut tags = TagRegistry::load(store()).unwrap();
        assert_eq!(tags.add_tag("Éveil").unwrap(), "Éveil");
        assert_eq!(tags.add_tag("éveil").unwrap(), "Éveil");
        assert_eq!(tags.resolve("ÉVEIL"), Some("Éveil".to_string()));
        tags.remove_tag("éveil").unwrap();
        assert!(tags.custom_tags().is_empty());
    }
}

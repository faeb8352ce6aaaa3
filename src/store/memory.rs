use super::{DreamStore, EventBus, JournalData, PreferenceStore, StoreEvent};
use crate::models::{Dream, Interpretation, Mood};
use crate::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Volatile store backed by a shared [`JournalData`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<JournalData>>,
    events: EventBus,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_moods(self, moods: Vec<Mood>) -> Self {
        self.lock().moods = Some(moods);
        self
    }

    pub fn snapshot(&self) -> JournalData {
        self.lock().clone()
    }

    // A panic elsewhere never leaves the journal half-mutated, so a
    // poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, JournalData> {
        self.data.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Applies `f` and publishes its event. `None` means nothing changed.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut JournalData) -> Result<(T, Option<StoreEvent>)>,
    ) -> Result<T> {
        let mut data = self.lock();
        let (value, event) = f(&mut *data)?;
        drop(data);
        if let Some(event) = event {
            self.events.publish(event);
        }
        Ok(value)
    }
}

impl DreamStore for MemoryStore {
    fn save_dream(&self, dream: &Dream) -> Result<()> {
        self.mutate(|data| Ok(((), Some(data.insert_dream(dream)?))))
    }

    fn update_dream(&self, dream: &Dream) -> Result<()> {
        self.mutate(|data| Ok(((), Some(data.replace_dream(dream)?))))
    }

    fn delete_dreams_and_interpretations(&self, ids: &[Uuid]) -> Result<usize> {
        self.mutate(|data| Ok(data.remove_dreams(ids)))
    }

    fn dreams(&self) -> Result<Vec<Dream>> {
        Ok(self.lock().sorted_dreams())
    }

    fn dream(&self, id: Uuid) -> Result<Option<Dream>> {
        Ok(self.lock().find_dream(id))
    }

    fn save_interpretation(&self, interpretation: &Interpretation) -> Result<()> {
        self.mutate(|data| Ok(((), Some(data.upsert_interpretation(interpretation)?))))
    }

    fn interpretation_for(&self, dream_id: Uuid) -> Result<Option<Interpretation>> {
        Ok(self.lock().find_interpretation(dream_id))
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

impl PreferenceStore for MemoryStore {
    fn load_moods(&self) -> Result<Option<Vec<Mood>>> {
        Ok(self.lock().moods.clone())
    }

    fn save_moods(&self, moods: &[Mood]) -> Result<()> {
        self.mutate(|data| {
            data.moods = Some(moods.to_vec());
            Ok(((), Some(StoreEvent::MoodsUpdated)))
        })
    }

    fn load_custom_tags(&self) -> Result<Vec<String>> {
        Ok(self.lock().custom_tags.clone())
    }

    fn save_custom_tags(&self, tags: &[String]) -> Result<()> {
        self.mutate(|data| {
            data.custom_tags = tags.to_vec();
            Ok(((), Some(StoreEvent::TagsUpdated)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn test_memory_store_publishes_events() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();

        let mut dream = Dream::new("A quiet library").unwrap();
        store.save_dream(&dream).unwrap();
        dream.tags.insert("Calm".to_string());
        store.update_dream(&dream).unwrap();
        store.delete_dreams_and_interpretations(&[dream.id]).unwrap();

        assert_eq!(events.recv().await.unwrap(), StoreEvent::DreamAdded(dream.id));
        assert_eq!(events.recv().await.unwrap(), StoreEvent::DreamChanged(dream.id));
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::DreamsDeleted(vec![dream.id])
        );
    }

    #[test]
    fn test_update_missing_dream_fails() {
        let store = MemoryStore::new();
        let dream = Dream::new("never saved").unwrap();
        assert!(matches!(store.update_dream(&dream), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_dreams_are_listed_newest_first() {
        let store = MemoryStore::new();
        let mut older = Dream::new("older").unwrap();
        older.created_at -= chrono::Duration::hours(1);
        let newer = Dream::new("newer").unwrap();
        store.save_dream(&older).unwrap();
        store.save_dream(&newer).unwrap();

        let listed: Vec<String> = store.dreams().unwrap().into_iter().map(|d| d.text).collect();
        assert_eq!(listed, vec!["newer".to_string(), "older".to_string()]);
    }

    #[test]
    fn test_deleting_unknown_ids_is_silent() {
        let store = MemoryStore::new();
        let dream = Dream::new("still here").unwrap();
        store.save_dream(&dream).unwrap();
        let mut events = store.subscribe();

        assert_eq!(store.delete_dreams_and_interpretations(&[]).unwrap(), 0);
        assert_eq!(
            store.delete_dreams_and_interpretations(&[Uuid::new_v4()]).unwrap(),
            0
        );

        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert_eq!(store.dreams().unwrap(), vec![dream]);
    }

    #[test]
    fn test_poisoned_lock_keeps_serving() {
        let store = MemoryStore::new();
        let dream = Dream::new("before the crash").unwrap();
        store.save_dream(&dream).unwrap();

        let shared = store.clone();
        let crashed = std::thread::spawn(move || {
            let _guard = shared.data.lock().unwrap();
            panic!("worker crashed while holding the journal");
        })
        .join();
        assert!(crashed.is_err());
        assert!(store.data.is_poisoned());

        assert_eq!(store.dream(dream.id).unwrap(), Some(dream));
        store.save_custom_tags(&["Aftermath".to_string()]).unwrap();
        assert_eq!(store.load_custom_tags().unwrap(), vec!["Aftermath".to_string()]);
    }

    #[test]
    fn test_moods_are_none_until_saved() {
        let store = MemoryStore::new();
        assert!(store.load_moods().unwrap().is_none());
        store.save_moods(&[]).unwrap();
        assert_eq!(store.load_moods().unwrap(), Some(Vec::new()));
    }
}

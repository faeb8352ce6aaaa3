use super::{DreamStore, EventBus, JournalData, PreferenceStore, StoreEvent};
use crate::models::{Dream, Interpretation, Mood};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

const JOURNAL_FILE: &str = "journal.json";

/// Store persisted as a single pretty-printed JSON document.
///
/// Every mutation is applied to a copy, written to disk, and only then
/// made visible, so a failed write leaves the store unchanged.
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<JournalData>,
    events: EventBus,
}

impl JsonFileStore {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(JOURNAL_FILE);

        let data = if path.exists() {
            let json = fs::read_to_string(&path)?;
            let data: JournalData = serde_json::from_str(&json)?;
            info!(
                "Loaded journal from {} ({} dreams)",
                path.display(),
                data.dreams.len()
            );
            data
        } else {
            info!("No journal at {}, starting fresh", path.display());
            JournalData::default()
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
            events: EventBus::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, data: &JournalData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Wrote journal to {}", self.path.display());
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, JournalData> {
        self.data.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Applies `f` to a copy, writes it, then swaps it in. When `f`
    /// reports no event nothing is written or published.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut JournalData) -> Result<(T, Option<StoreEvent>)>,
    ) -> Result<T> {
        let (value, event) = {
            let mut guard = self.lock();
            let mut next = guard.clone();
            let (value, event) = f(&mut next)?;
            if event.is_some() {
                self.write(&next)?;
                *guard = next;
            }
            (value, event)
        };
        if let Some(event) = event {
            self.events.publish(event);
        }
        Ok(value)
    }

    fn read<T>(&self, f: impl FnOnce(&JournalData) -> T) -> T {
        let guard = self.lock();
        f(&*guard)
    }
}

impl DreamStore for JsonFileStore {
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
        Ok(self.read(JournalData::sorted_dreams))
    }

    fn dream(&self, id: Uuid) -> Result<Option<Dream>> {
        Ok(self.read(|data| data.find_dream(id)))
    }

    fn save_interpretation(&self, interpretation: &Interpretation) -> Result<()> {
        self.mutate(|data| Ok(((), Some(data.upsert_interpretation(interpretation)?))))
    }

    fn interpretation_for(&self, dream_id: Uuid) -> Result<Option<Interpretation>> {
        Ok(self.read(|data| data.find_interpretation(dream_id)))
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

impl PreferenceStore for JsonFileStore {
    fn load_moods(&self) -> Result<Option<Vec<Mood>>> {
        Ok(self.read(|data| data.moods.clone()))
    }

    fn save_moods(&self, moods: &[Mood]) -> Result<()> {
        self.mutate(|data| {
            data.moods = Some(moods.to_vec());
            Ok(((), Some(StoreEvent::MoodsUpdated)))
        })
    }

    fn load_custom_tags(&self) -> Result<Vec<String>> {
        Ok(self.read(|data| data.custom_tags.clone()))
    }

    fn save_custom_tags(&self, tags: &[String]) -> Result<()> {
        self.mutate(|data| {
            data.custom_tags = tags.to_vec();
            Ok(((), Some(StoreEvent::TagsUpdated)))
        })
    }
}

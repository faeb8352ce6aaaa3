//! Dream journal orchestration: recording, tagging, interpreting, deleting.

use crate::ai::{InterpretationService, OpenAiInterpretationClient};
use crate::entitlement::{EntitlementProvider, StaticEntitlement};
use crate::models::{Config, Dream, DreamRequest, Interpretation, Mood};
use crate::registry::{MoodRegistry, TagRegistry};
use crate::state::InterpretationSession;
use crate::store::{DreamStore, JsonFileStore, PreferenceStore, StoreEvent};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

/// Owns the journal's collaborators and is the single writer of the
/// mood and tag registries.
pub struct App {
    interpreter: Arc<dyn InterpretationService>,
    dreams: Arc<dyn DreamStore>,
    entitlement: Arc<dyn EntitlementProvider>,
    moods: MoodRegistry,
    tags: TagRegistry,
}

/// Injectable service bundle used to construct [`App`].
pub struct AppServices {
    pub interpreter: Arc<dyn InterpretationService>,
    pub dreams: Arc<dyn DreamStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub entitlement: Arc<dyn EntitlementProvider>,
}

/// Stands in for the OpenAI client when no API key is configured.
struct MissingCredentials;

#[async_trait]
impl InterpretationService for MissingCredentials {
    async fn interpret(&self, request: &DreamRequest) -> Result<Interpretation> {
        request.validate()?;
        Err(Error::Config("OPENAI_API_KEY not set".to_string()))
    }
}

impl App {
    /// Build an app from explicit collaborators, loading (and on first run
    /// seeding) the registries.
    pub fn with_services(services: AppServices) -> Result<Self> {
        Ok(Self {
            interpreter: services.interpreter,
            dreams: services.dreams,
            entitlement: services.entitlement,
            moods: MoodRegistry::load(services.preferences.clone())?,
            tags: TagRegistry::load(services.preferences)?,
        })
    }

    /// Production wiring: JSON file store under `config.data_dir` and the
    /// OpenAI interpretation client.
    pub fn new(config: &Config) -> Result<Self> {
        let store = Arc::new(JsonFileStore::open(&config.data_dir)?);

        let interpreter: Arc<dyn InterpretationService> = if config.api_key.is_some() {
            info!("Interpretation model: {} at {}", config.model, config.base_url);
            Arc::new(OpenAiInterpretationClient::from_config(
                config,
                reqwest::Client::new(),
            )?)
        } else {
            warn!("OPENAI_API_KEY not set, interpretation is unavailable");
            Arc::new(MissingCredentials)
        };

        Self::with_services(AppServices {
            interpreter,
            dreams: store.clone(),
            preferences: store,
            entitlement: Arc::new(StaticEntitlement::new(config.subscribed)),
        })
    }

    pub fn moods(&self) -> &MoodRegistry {
        &self.moods
    }

    pub fn moods_mut(&mut self) -> &mut MoodRegistry {
        &mut self.moods
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagRegistry {
        &mut self.tags
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.dreams.subscribe()
    }

    pub fn record_dream<I, S>(&mut self, text: &str, mood: Option<Mood>, tags: I) -> Result<Dream>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dream = Dream::new(text)?;
        dream.mood = mood;
        dream.tags = self.register_tags(tags)?;
        self.dreams.save_dream(&dream)?;
        info!("Recorded dream {}", dream.id);
        Ok(dream)
    }

    pub fn set_mood(&self, dream_id: Uuid, mood: Option<Mood>) -> Result<Dream> {
        let mut dream = self.dream(dream_id)?;
        dream.mood = mood;
        dream.touch();
        self.dreams.update_dream(&dream)?;
        Ok(dream)
    }

    pub fn set_tags<I, S>(&mut self, dream_id: Uuid, tags: I) -> Result<Dream>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dream = self.dream(dream_id)?;
        dream.tags = self.register_tags(tags)?;
        dream.touch();
        self.dreams.update_dream(&dream)?;
        Ok(dream)
    }

    pub fn dreams(&self) -> Result<Vec<Dream>> {
        self.dreams.dreams()
    }

    pub fn dream(&self, id: Uuid) -> Result<Dream> {
        self.dreams
            .dream(id)?
            .ok_or_else(|| Error::NotFound(format!("dream {}", id)))
    }

    pub fn interpretation(&self, dream_id: Uuid) -> Result<Option<Interpretation>> {
        self.dreams.interpretation_for(dream_id)
    }

    /// A presentation session for the dream, after the entitlement check.
    pub fn session_for(&self, dream_id: Uuid) -> Result<InterpretationSession> {
        self.ensure_entitled()?;
        let dream = self.dream(dream_id)?;
        Ok(InterpretationSession::new(
            self.interpreter.clone(),
            DreamRequest::from(&dream),
        ))
    }

    /// Interpret a stored dream and persist the result against it.
    pub async fn interpret_dream(&self, dream_id: Uuid) -> Result<Interpretation> {
        self.ensure_entitled()?;
        let dream = self.dream(dream_id)?;

        info!("Interpreting dream {}", dream_id);
        let interpretation = self
            .interpreter
            .interpret(&DreamRequest::from(&dream))
            .await?;

        self.attach_interpretation(dream_id, interpretation)
    }

    /// Persist an interpretation produced elsewhere (e.g. by a session).
    pub fn attach_interpretation(
        &self,
        dream_id: Uuid,
        interpretation: Interpretation,
    ) -> Result<Interpretation> {
        let interpretation = interpretation.for_dream(dream_id);
        self.dreams.save_interpretation(&interpretation)?;
        info!(
            "Saved interpretation '{}' for dream {}",
            interpretation.dream_title, dream_id
        );
        Ok(interpretation)
    }

    pub fn delete_dreams(&self, ids: &[Uuid]) -> Result<usize> {
        let removed = self.dreams.delete_dreams_and_interpretations(ids)?;
        info!("Deleted {} dream(s)", removed);
        Ok(removed)
    }

    fn ensure_entitled(&self) -> Result<()> {
        if self.entitlement.is_subscribed() {
            Ok(())
        } else {
            Err(Error::NotEntitled)
        }
    }

    fn register_tags<I, S>(&mut self, tags: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registered = BTreeSet::new();
        for tag in tags {
            let tag = tag.as_ref();
            if tag.trim().is_empty() {
                continue;
            }
            registered.insert(self.tags.add_tag(tag)?);
        }
        Ok(registered)
    }
}

//! Data models and structures
//!
//! Defines dreams, moods, interpretation records, and the runtime
//! configuration read from the environment.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Mood {
    pub id: Uuid,
    pub title: String,
    pub emoji: String,
    pub is_default: bool,
}

impl Mood {
    pub fn new(title: impl Into<String>, emoji: impl Into<String>, is_default: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            emoji: emoji.into(),
            is_default,
        }
    }

    /// `"Calm 😌"`, as embedded into prompts and listings.
    pub fn label(&self) -> String {
        if self.emoji.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.emoji)
        }
    }
}

/// Input to a single interpretation call.
#[derive(Debug, Clone, PartialEq)]
pub struct DreamRequest {
    pub dream_text: String,
    pub mood: Option<Mood>,
    pub tags: BTreeSet<String>,
}

impl DreamRequest {
    pub fn new(dream_text: impl Into<String>) -> Self {
        Self {
            dream_text: dream_text.into(),
            mood: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Rejects blank dream text.
    pub fn validate(&self) -> Result<()> {
        if self.dream_text.trim().is_empty() {
            return Err(Error::Validation("Dream text must not be empty".to_string()));
        }
        Ok(())
    }
}

impl From<&Dream> for DreamRequest {
    fn from(dream: &Dream) -> Self {
        Self {
            dream_text: dream.text.clone(),
            mood: dream.mood.clone(),
            tags: dream.tags.clone(),
        }
    }
}

/// Score is always within `[0, 1]`; it can only be set through [`MoodInsight::new`]
/// or deserialization, both of which clamp.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MoodInsight {
    pub emoji: String,
    pub label: String,
    score: f64,
}

impl MoodInsight {
    pub fn new(emoji: impl Into<String>, label: impl Into<String>, score: f64) -> Self {
        Self {
            emoji: emoji.into(),
            label: label.into(),
            score: clamp_score(score),
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

impl<'de> Deserialize<'de> for MoodInsight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            emoji: String,
            label: String,
            score: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(MoodInsight::new(raw.emoji, raw.label, raw.score))
    }
}

/// Upstream scores are not trusted to stay in range.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symbol {
    pub icon: String,
    pub meaning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

/// Structured result of a dream interpretation.
///
/// Every field except `dream_parent_id` is required when decoding; a
/// completion missing any of them is rejected as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub dream_title: String,
    pub dream_summary: String,
    pub full_interpretation: String,
    pub mood_insights: Vec<MoodInsight>,
    pub symbolism: Vec<Symbol>,
    pub reflection_prompts: Vec<String>,
    pub quote: Quote,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dream_parent_id: Option<Uuid>,
}

impl Interpretation {
    /// Returns a copy attached to the given dream.
    pub fn for_dream(mut self, dream_id: Uuid) -> Self {
        self.dream_parent_id = Some(dream_id);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dream {
    pub id: Uuid,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dream {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        DreamRequest::new(text.as_str()).validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            text: text.trim().to_string(),
            mood: None,
            tags: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// Configuration
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_DATA_DIR: &str = ".dreamai";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_completion_tokens: u32,
    pub data_dir: PathBuf,
    pub subscribed: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = match lookup("DREAMAI_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("DREAMAI_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let max_completion_tokens = match lookup("DREAMAI_MAX_TOKENS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::Config(format!("DREAMAI_MAX_TOKENS is not a number: {}", raw))
            })?,
            None => DEFAULT_MAX_TOKENS,
        };

        let subscribed = match lookup("DREAMAI_SUBSCRIBED") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                Error::Config(format!("DREAMAI_SUBSCRIBED is not a boolean: {}", raw))
            })?,
            None => true,
        };

        Ok(Self {
            api_key: lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty()),
            base_url: lookup("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup("DREAMAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            max_completion_tokens,
            data_dir: lookup("DREAMAI_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            subscribed,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

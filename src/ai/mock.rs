use super::InterpretationService;
use crate::models::{DreamRequest, Interpretation, MoodInsight, Quote, Symbol};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted interpretation service with a shared call counter.
///
/// Queued outcomes are consumed in order; once the queue is empty every
/// call succeeds with an interpretation derived from the request.
#[derive(Clone)]
pub struct MockInterpretationClient {
    responses: Arc<Mutex<VecDeque<Result<Interpretation>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockInterpretationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, interpretation: Interpretation) -> Self {
        self.responses.lock().unwrap().push_back(Ok(interpretation));
        self
    }

    pub fn with_error(self, error: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockInterpretationClient {
    fn default() -> Self {
        Self::new()
    }
}

fn default_interpretation(request: &DreamRequest) -> Interpretation {
    let summary: String = request.dream_text.trim().chars().take(80).collect();
    Interpretation {
        dream_title: "A Dream Remembered".to_string(),
        dream_summary: summary,
        full_interpretation: format!(
            "This dream reflects something on your mind: {}",
            request.dream_text.trim()
        ),
        mood_insights: vec![MoodInsight::new("✨", "Curiosity", 0.5)],
        symbolism: vec![Symbol {
            icon: "🌙".to_string(),
            meaning: "The night as a space for reflection.".to_string(),
        }],
        reflection_prompts: vec!["What stood out to you most?".to_string()],
        quote: Quote {
            text: "All that we see or seem is but a dream within a dream.".to_string(),
            author: "Edgar Allan Poe".to_string(),
        },
        tags: request.tags.iter().cloned().collect(),
        dream_parent_id: None,
    }
}

#[async_trait]
impl InterpretationService for MockInterpretationClient {
    async fn interpret(&self, request: &DreamRequest) -> Result<Interpretation> {
        request.validate()?;

        *self.call_count.lock().unwrap() += 1;

        match self.responses.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(default_interpretation(request)),
        }
    }
}

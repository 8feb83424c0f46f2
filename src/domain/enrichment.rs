use catalog_api::{NewSummary, NewTranscript};
use serde::{Deserialize, Serialize};

/// Generated summary of an episode in two forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "paragraph_summary")]
    pub paragraph: String,
    #[serde(rename = "bullet_summary")]
    pub bullets: String,
}

impl Summary {
    pub fn new(paragraph: impl Into<String>, bullets: impl Into<String>) -> Self {
        Self {
            paragraph: paragraph.into(),
            bullets: bullets.into(),
        }
    }

    /// Both forms must carry text before the summary is kept or published
    pub fn is_complete(&self) -> bool {
        !self.paragraph.trim().is_empty() && !self.bullets.trim().is_empty()
    }

    pub fn to_payload(&self, entry_id: i64) -> Option<NewSummary> {
        self.is_complete().then(|| NewSummary {
            entry: entry_id,
            paragraph_summary: self.paragraph.clone(),
            bullet_summary: self.bullets.clone(),
        })
    }
}

/// Generated full text of an episode; empty means not generated yet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(String);

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn to_payload(&self, entry_id: i64) -> Option<NewTranscript> {
        (!self.is_empty()).then(|| NewTranscript {
            entry: entry_id,
            transcript: self.0.clone(),
        })
    }
}

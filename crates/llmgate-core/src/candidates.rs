//! Ordered list of model identifiers tried by the orchestrator.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Candidate models in trial order.
///
/// Built once at startup and shared read-only between requests; cloning
/// only bumps a reference count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    models: Arc<[String]>,
}

impl CandidateList {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models
            .into_iter()
            .map(Into::into)
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            models: models.into(),
        }
    }

    /// Parse a comma-separated list, trimming entries and dropping blanks.
    pub fn parse(csv: &str) -> Self {
        Self::new(csv.split(',').map(str::trim))
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.models
    }
}

impl std::fmt::Display for CandidateList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.models.join(","))
    }
}

// Accepts either a TOML array or a comma-separated string.
impl<'de> Deserialize<'de> for CandidateList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<String>),
            Csv(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::List(items) => Self::new(items.iter().map(|s| s.trim())),
            Raw::Csv(csv) => Self::parse(&csv),
        })
    }
}

impl Serialize for CandidateList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.models.serialize(serializer)
    }
}

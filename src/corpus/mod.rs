use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigurationError;

static TIER_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus/tiers");

/// Named difficulty bucket selecting which passages to sample from
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Next tier in setup-screen order, wrapping around
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

impl FromStr for Difficulty {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ConfigurationError::UnknownDifficulty(s.to_string())),
        }
    }
}

#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
struct TierFile {
    name: String,
    size: u32,
    passages: Vec<String>,
}

/// Static practice passages keyed by difficulty tier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    tiers: HashMap<Difficulty, Vec<String>>,
}

impl Corpus {
    /// Load the passages embedded in the binary
    pub fn builtin() -> Result<Self, ConfigurationError> {
        let mut tiers = HashMap::new();
        for difficulty in Difficulty::ALL {
            let tier = read_tier_from_file(&format!("{difficulty}.json"))?;
            tiers.insert(difficulty, tier.passages);
        }
        Ok(Self { tiers })
    }

    pub fn from_tiers<I>(tiers: I) -> Self
    where
        I: IntoIterator<Item = (Difficulty, Vec<String>)>,
    {
        Self {
            tiers: tiers.into_iter().collect(),
        }
    }

    /// Parse a corpus from `{ "easy": [..], "medium": [..], "hard": [..] }`
    pub fn from_json_str(name: &str, json: &str) -> Result<Self, ConfigurationError> {
        let tiers: HashMap<Difficulty, Vec<String>> =
            serde_json::from_str(json).map_err(|e| ConfigurationError::CorpusLoad {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { tiers })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigurationError::CorpusRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&path.display().to_string(), &json)
    }

    /// Candidate passages for a tier; an empty or missing tier is a configuration error
    pub fn passages(&self, difficulty: Difficulty) -> Result<&[String], ConfigurationError> {
        match self.tiers.get(&difficulty) {
            Some(passages) if !passages.is_empty() => Ok(passages),
            _ => Err(ConfigurationError::EmptyTier(difficulty)),
        }
    }

    /// Fail fast if any tier cannot produce text
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for difficulty in Difficulty::ALL {
            self.passages(difficulty)?;
        }
        Ok(())
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<String> = Difficulty::ALL
            .iter()
            .map(|d| format!("{d}={}", self.tiers.get(d).map_or(0, Vec::len)))
            .collect();
        write!(f, "corpus({})", counts.join(", "))
    }
}

fn read_tier_from_file(file_name: &str) -> Result<TierFile, ConfigurationError> {
    let load_error = |reason: &str| ConfigurationError::CorpusLoad {
        name: file_name.to_string(),
        reason: reason.to_string(),
    };

    let file = TIER_DIR
        .get_file(file_name)
        .ok_or_else(|| load_error("not embedded"))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| load_error("not valid utf-8"))?;

    serde_json::from_str(contents).map_err(|e| load_error(&e.to_string()))
}

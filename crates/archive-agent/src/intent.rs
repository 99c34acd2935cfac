//! Rule-based intent classification.
//!
//! An ordered cascade of substring/regex tests over the lowercased,
//! trimmed message. First match wins; the ordering is the tie-break
//! policy, not an accident (topic-specific tests run before the broad
//! conversational ones). Pure and total: every input maps to exactly one
//! category and classification never fails.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static GREETING_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^(hi|hello|hey)[\s.!]*$").expect("greeting regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIntent {
    Greeting,
    CrimeStory,
    MissingPersons,
    PoliceCorruption,
    PoliticalScandal,
    MilitaryStory,
    DocumentaryLead,
    DramaticStory,
    StoryInventory,
    AlternativeStory,
    ExpandingThread,
    GeneralExploration,
}

impl UserIntent {
    /// Preferred search term for topic-specific intents, substituted for
    /// the raw keyword set to sharpen retrieval.
    pub fn search_bias(&self) -> Option<&'static str> {
        match self {
            Self::CrimeStory => Some("murder"),
            Self::MissingPersons => Some("missing"),
            Self::PoliceCorruption => Some("police"),
            Self::PoliticalScandal => Some("political"),
            Self::MilitaryStory => Some("military"),
            _ => None,
        }
    }

    /// Short description of what the corpus tends to hold for this intent,
    /// used when composing reasoning steps.
    pub fn availability_hint(&self) -> &'static str {
        match self {
            Self::CrimeStory => {
                "Murder cases: locked-room mysteries, impossible crimes, unsolved cases with strange evidence"
            }
            Self::MissingPersons => {
                "Disappearance patterns: multiple victims, mysterious circumstances, unexplained evidence"
            }
            Self::PoliceCorruption | Self::PoliticalScandal => {
                "Corruption cases: reform candidates, suspicious deaths, missing evidence, cover-ups"
            }
            Self::MilitaryStory => {
                "Limited military-focused material; most stories involve civilians with veteran connections"
            }
            Self::DocumentaryLead => {
                "Visual storytelling potential: missing-persons patterns, location-based mysteries, archival footage"
            }
            Self::DramaticStory => {
                "High emotional impact: personal tragedies, family mysteries, unexplained phenomena"
            }
            _ => "General archive: mid-century mysteries, crimes, disappearances, political intrigue",
        }
    }
}

impl std::fmt::Display for UserIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Greeting => "greeting",
            Self::CrimeStory => "crime_story",
            Self::MissingPersons => "missing_persons",
            Self::PoliceCorruption => "police_corruption",
            Self::PoliticalScandal => "political_scandal",
            Self::MilitaryStory => "military_story",
            Self::DocumentaryLead => "documentary_lead",
            Self::DramaticStory => "dramatic_story",
            Self::StoryInventory => "story_inventory",
            Self::AlternativeStory => "alternative_story",
            Self::ExpandingThread => "expanding_thread",
            Self::GeneralExploration => "general_exploration",
        };
        f.write_str(label)
    }
}

pub struct IntentClassifier {}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {}
    }

    pub fn classify(&self, message: &str) -> UserIntent {
        let query = message.trim().to_lowercase();

        if GREETING_RE.is_match(&query) {
            return UserIntent::Greeting;
        }

        // Topic-specific tests run before the conversational ones so that
        // "tell me more about the murder" stays on topic.
        if ["murder", "kill", "homicide", "crime"]
            .iter()
            .any(|p| query.contains(p))
        {
            return UserIntent::CrimeStory;
        }

        if ["disappear", "missing", "vanish"]
            .iter()
            .any(|p| query.contains(p))
        {
            return UserIntent::MissingPersons;
        }

        // Checked before the broader political test.
        if query.contains("police") && (query.contains("corrupt") || query.contains("bribe")) {
            return UserIntent::PoliceCorruption;
        }

        if ["political", "scandal", "corrupt", "coverup", "cover-up"]
            .iter()
            .any(|p| query.contains(p))
        {
            return UserIntent::PoliticalScandal;
        }

        if ["soldier", "military", "veteran"]
            .iter()
            .any(|p| query.contains(p))
        {
            return UserIntent::MilitaryStory;
        }

        if ["documentary", "film", "footage"]
            .iter()
            .any(|p| query.contains(p))
        {
            return UserIntent::DocumentaryLead;
        }

        if query.contains("drama") || query.contains("traged") {
            return UserIntent::DramaticStory;
        }

        if query.contains("what kind of stories") || query.contains("what stories do you have") {
            return UserIntent::StoryInventory;
        }

        if query.contains("another") || query.contains("different") {
            return UserIntent::AlternativeStory;
        }

        if ["yes", "yeah", "tell me more", "go on"]
            .iter()
            .any(|p| query.contains(p))
        {
            return UserIntent::ExpandingThread;
        }

        UserIntent::GeneralExploration
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Domain records shared by the store, the day projection and the front ends.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BlockId = Uuid;
pub type PriorityId = Uuid;

pub const DEFAULT_WEIGHT: u8 = 3;
pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 5;

/// Closed set of block categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    Focus,
    Admin,
    Social,
    Play,
    Rest,
}

impl BlockCategory {
    pub const ALL: [BlockCategory; 5] = [
        BlockCategory::Focus,
        BlockCategory::Admin,
        BlockCategory::Social,
        BlockCategory::Play,
        BlockCategory::Rest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockCategory::Focus => "focus",
            BlockCategory::Admin => "admin",
            BlockCategory::Social => "social",
            BlockCategory::Play => "play",
            BlockCategory::Rest => "rest",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            BlockCategory::Focus => "Deep Focus",
            BlockCategory::Admin => "Admin",
            BlockCategory::Social => "Social",
            BlockCategory::Play => "Play & Rest",
            BlockCategory::Rest => "Sleep/Buffer",
        }
    }

    /// Fixed render color as `#RRGGBB`.
    pub fn color(self) -> &'static str {
        match self {
            BlockCategory::Focus => "#6C63FF",
            BlockCategory::Admin => "#F5A623",
            BlockCategory::Social => "#E94F8A",
            BlockCategory::Play => "#3CC47C",
            BlockCategory::Rest => "#4A90D9",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| {
                format!("unknown category `{value}`; expected focus|admin|social|play|rest")
            })
    }
}

/// Completion state of a block. Only explicit user actions change it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    #[default]
    Planned,
    Completed,
    Distracted,
}

impl BlockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockStatus::Planned => "planned",
            BlockStatus::Completed => "completed",
            BlockStatus::Distracted => "distracted",
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(BlockStatus::Planned),
            "completed" | "done" => Ok(BlockStatus::Completed),
            "distracted" => Ok(BlockStatus::Distracted),
            other => Err(format!(
                "unknown status `{other}`; expected planned|completed|distracted"
            )),
        }
    }
}

/// A titled, categorized interval of the day.
///
/// `start_time`/`end_time` are kept as the wall-clock strings they were
/// entered with; the store does not validate them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: BlockId,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub category: BlockCategory,
    pub status: BlockStatus,
}

impl TimeBlock {
    pub fn start_hour(&self) -> Option<u32> {
        leading_hour(&self.start_time)
    }

    pub fn end_hour(&self) -> Option<u32> {
        leading_hour(&self.end_time)
    }
}

/// Block fields before an id is assigned. A missing status means `planned`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTimeBlock {
    pub title: String,
    pub category: BlockCategory,
    pub start_time: String,
    pub end_time: String,
    pub status: Option<BlockStatus>,
}

impl NewTimeBlock {
    pub fn planned(
        title: impl Into<String>,
        category: BlockCategory,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            category,
            start_time: start_time.into(),
            end_time: end_time.into(),
            status: Some(BlockStatus::Planned),
        }
    }
}

/// Partial update; only `Some` fields are written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeBlockPatch {
    pub title: Option<String>,
    pub category: Option<BlockCategory>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<BlockStatus>,
}

impl TimeBlockPatch {
    pub fn status(status: BlockStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub(crate) fn apply(self, block: &mut TimeBlock) {
        if let Some(title) = self.title {
            block.title = title;
        }
        if let Some(category) = self.category {
            block.category = category;
        }
        if let Some(start_time) = self.start_time {
            block.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            block.end_time = end_time;
        }
        if let Some(status) = self.status {
            block.status = status;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityDomain {
    You,
    Relationships,
    Work,
}

impl PriorityDomain {
    pub const ALL: [PriorityDomain; 3] = [
        PriorityDomain::You,
        PriorityDomain::Relationships,
        PriorityDomain::Work,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityDomain::You => "you",
            PriorityDomain::Relationships => "relationships",
            PriorityDomain::Work => "work",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriorityDomain::You => "Personal",
            PriorityDomain::Relationships => "Relationships",
            PriorityDomain::Work => "Work",
        }
    }

    /// Ready-made priority names offered during onboarding.
    pub fn examples(self) -> &'static [&'static str] {
        match self {
            PriorityDomain::You => &[
                "Health & Exercise",
                "Sleep",
                "Meditation",
                "Reading",
                "Learning",
            ],
            PriorityDomain::Relationships => {
                &["Family Time", "Date Night", "Friends", "Community"]
            }
            PriorityDomain::Work => &["Deep Work", "Meetings", "Admin Tasks", "Side Projects"],
        }
    }

    pub fn next(self) -> Self {
        match self {
            PriorityDomain::You => PriorityDomain::Relationships,
            PriorityDomain::Relationships => PriorityDomain::Work,
            PriorityDomain::Work => PriorityDomain::You,
        }
    }
}

impl fmt::Display for PriorityDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityDomain {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "you" | "personal" => Ok(PriorityDomain::You),
            "relationships" => Ok(PriorityDomain::Relationships),
            "work" => Ok(PriorityDomain::Work),
            other => Err(format!(
                "unknown domain `{other}`; expected you|relationships|work"
            )),
        }
    }
}

/// A weighted personal value used to bias suggestions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    pub id: PriorityId,
    pub domain: PriorityDomain,
    pub name: String,
    pub weight: u8,
}

impl Priority {
    pub fn new(domain: PriorityDomain, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            domain,
            name: name.into(),
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = clamp_weight(weight);
        self
    }
}

pub fn clamp_weight(weight: i64) -> u8 {
    weight.clamp(i64::from(MIN_WEIGHT), i64::from(MAX_WEIGHT)) as u8
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub has_completed_onboarding: bool,
    pub priorities: Vec<Priority>,
    pub last_priority_audit: Option<DateTime<Utc>>,
}

/// Parses a strict `HH:mm` wall-clock string.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

pub fn format_clock(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Hour component of an `HH:mm` string, read from its leading digits.
/// Minutes are discarded; `None` when there are no leading digits.
pub fn leading_hour(value: &str) -> Option<u32> {
    let digits = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>();
    digits.parse().ok()
}

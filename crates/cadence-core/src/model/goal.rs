use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::task::ParseEnumError;

/// The six fixed life areas used to group goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LifeArea {
    Health,
    #[default]
    Career,
    Relationships,
    Finance,
    Growth,
    Fun,
}

impl LifeArea {
    pub const ALL: [Self; 6] = [
        Self::Health,
        Self::Career,
        Self::Relationships,
        Self::Finance,
        Self::Growth,
        Self::Fun,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Career => "career",
            Self::Relationships => "relationships",
            Self::Finance => "finance",
            Self::Growth => "growth",
            Self::Fun => "fun",
        }
    }
}

/// Planning horizon of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Short,
    #[default]
    Medium,
    Long,
}

impl Timeframe {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

impl GoalStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Paused => "paused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    #[default]
    Active,
    Completed,
}

impl MilestoneStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// SMART breakdown of a goal. Every field is free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Smart {
    pub specific: String,
    pub measurable: String,
    pub achievable: String,
    pub relevant: String,
    pub time_bound: String,
}

/// Impact and effort scores, each on a 1..=5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPriority {
    pub impact: u8,
    pub effort: u8,
}

impl Default for GoalPriority {
    fn default() -> Self {
        Self {
            impact: 3,
            effort: 3,
        }
    }
}

impl GoalPriority {
    /// Classify into the impact/effort matrix. Scores of 3 and above count
    /// as high.
    #[must_use]
    pub const fn quadrant(self) -> ImpactEffort {
        match (self.impact >= 3, self.effort >= 3) {
            (true, false) => ImpactEffort::QuickWin,
            (true, true) => ImpactEffort::MajorProject,
            (false, false) => ImpactEffort::FillIn,
            (false, true) => ImpactEffort::Thankless,
        }
    }

    /// `true` when both scores are in 1..=5.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.impact >= 1 && self.impact <= 5 && self.effort >= 1 && self.effort <= 5
    }
}

/// Impact/effort matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactEffort {
    QuickWin,
    MajorProject,
    FillIn,
    Thankless,
}

impl ImpactEffort {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuickWin => "quick_win",
            Self::MajorProject => "major_project",
            Self::FillIn => "fill_in",
            Self::Thankless => "thankless",
        }
    }
}

/// A user-defined outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub why: String,
    pub identity: String,
    pub area: LifeArea,
    pub deadline: Option<NaiveDate>,
    pub timeframe: Timeframe,
    pub smart: Smart,
    pub priority: GoalPriority,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Default for Goal {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            why: String::new(),
            identity: String::new(),
            area: LifeArea::default(),
            deadline: None,
            timeframe: Timeframe::default(),
            smart: Smart::default(),
            priority: GoalPriority::default(),
            status: GoalStatus::default(),
            created_at: DateTime::<Utc>::default(),
            completed_at: None,
        }
    }
}

/// A measurable checkpoint under a goal.
///
/// `progress` is a cache of the linked-task completion ratio and is only
/// written through the milestone progress sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub goal_id: String,
    pub title: String,
    pub deadline: Option<NaiveDate>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub status: MilestoneStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}

impl Default for Milestone {
    fn default() -> Self {
        Self {
            id: String::new(),
            goal_id: String::new(),
            title: String::new(),
            deadline: None,
            target_value: None,
            current_value: None,
            unit: None,
            status: MilestoneStatus::default(),
            progress: 0,
            created_at: DateTime::<Utc>::default(),
        }
    }
}

/// Fields accepted when creating a goal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub why: String,
    pub identity: String,
    pub area: LifeArea,
    pub deadline: Option<NaiveDate>,
    pub timeframe: Timeframe,
    pub smart: Smart,
    pub priority: GoalPriority,
}

/// Field edits for a goal; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub why: Option<String>,
    pub identity: Option<String>,
    pub area: Option<LifeArea>,
    pub deadline: Option<Option<NaiveDate>>,
    pub timeframe: Option<Timeframe>,
    pub smart: Option<Smart>,
    pub priority: Option<GoalPriority>,
}

/// Fields accepted when creating a milestone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMilestone {
    pub goal_id: String,
    pub title: String,
    pub deadline: Option<NaiveDate>,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
}

/// Field edits for a milestone; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MilestonePatch {
    pub title: Option<String>,
    pub deadline: Option<Option<NaiveDate>>,
    pub target_value: Option<Option<f64>>,
    pub current_value: Option<Option<f64>>,
    pub unit: Option<Option<String>>,
}

impl fmt::Display for LifeArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for ImpactEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LifeArea {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "health" => Ok(Self::Health),
            "career" => Ok(Self::Career),
            "relationships" => Ok(Self::Relationships),
            "finance" => Ok(Self::Finance),
            "growth" => Ok(Self::Growth),
            "fun" => Ok(Self::Fun),
            _ => Err(ParseEnumError {
                expected: "area",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Timeframe {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            _ => Err(ParseEnumError {
                expected: "timeframe",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for GoalStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            "paused" => Ok(Self::Paused),
            _ => Err(ParseEnumError {
                expected: "goal status",
                got: s.to_string(),
            }),
        }
    }
}

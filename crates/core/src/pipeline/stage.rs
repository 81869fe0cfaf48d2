//! The five pipeline stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dispatcher::ExecutionMode;

/// One phase of the slate pipeline, in fixed execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Resolve the source reference into release metadata: real title,
    /// contributors, a visual palette.
    Enrich,
    /// Mine candidate content angles (hooks) for the release.
    MineAngles,
    /// Turn usable angles into a 7-day posting schedule.
    PlanSchedule,
    /// Render video and thumbnail assets for every scheduled post.
    AssembleAssets,
    /// Produce an insight report over the slate's performance.
    AnalyzeReport,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 5] = [
        Stage::Enrich,
        Stage::MineAngles,
        Stage::PlanSchedule,
        Stage::AssembleAssets,
        Stage::AnalyzeReport,
    ];

    /// Zero-based position in the chain.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap()
    }

    /// The stage dispatched after this one, if any.
    pub fn next(&self) -> Option<Stage> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The stage dispatched before this one, if any.
    pub fn prev(&self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Stable string form, used in the database and in API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Enrich => "enrich",
            Stage::MineAngles => "mine-angles",
            Stage::PlanSchedule => "plan-schedule",
            Stage::AssembleAssets => "assemble-assets",
            Stage::AnalyzeReport => "analyze-report",
        }
    }

    /// External connectors the task service needs for this stage. Every stage
    /// writes its output through the slate store connector.
    pub fn connectors(&self) -> &'static [&'static str] {
        match self {
            Stage::Enrich => &["web-search", "streaming-metadata", "slate-store"],
            Stage::MineAngles => &["web-search", "trend-radar", "slate-store"],
            Stage::PlanSchedule => &["slate-store"],
            Stage::AssembleAssets => &["media-render", "slate-store"],
            Stage::AnalyzeReport => &["analytics", "slate-store"],
        }
    }

    /// Execution mode hint passed to the task service.
    pub fn mode(&self) -> ExecutionMode {
        match self {
            Stage::Enrich => ExecutionMode::Fast,
            Stage::MineAngles => ExecutionMode::Quality,
            Stage::PlanSchedule => ExecutionMode::Quality,
            Stage::AssembleAssets => ExecutionMode::Speed,
            Stage::AnalyzeReport => ExecutionMode::Fast,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .find(|stage| stage.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown stage: {}", s))
    }
}

use serde::Serialize;

/// XP needed to reach each level, ascending. Level `n` starts at index `n - 1`.
pub const THRESHOLDS: [u64; 10] = [0, 100, 250, 500, 1000, 2000, 3500, 5500, 8000, 11_000];

const TITLES: [&str; 10] = [
    "Novice",
    "Apprentice",
    "Doer",
    "Achiever",
    "Planner",
    "Strategist",
    "Expert",
    "Master",
    "Grandmaster",
    "Legend",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub level: u32,
    pub title: &'static str,
    pub xp: u64,
    pub current_threshold: u64,
    /// `None` at the top level.
    pub next_threshold: Option<u64>,
    /// Fraction of the way to the next level, in `[0, 1]`.
    pub progress: f64,
}

/// 1-based level for `xp`: the highest level whose threshold is `<= xp`.
#[must_use]
pub fn level_for(xp: u64) -> u32 {
    let idx = THRESHOLDS.iter().rposition(|&t| t <= xp).unwrap_or(0);
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn level_info(xp: u64) -> LevelInfo {
    let idx = THRESHOLDS.iter().rposition(|&t| t <= xp).unwrap_or(0);
    let current = THRESHOLDS[idx];
    let next = THRESHOLDS.get(idx + 1).copied();
    let progress = next.map_or(1.0, |next| {
        ((xp - current) as f64 / (next - current) as f64).clamp(0.0, 1.0)
    });

    LevelInfo {
        level: level_for(xp),
        title: TITLES[idx],
        xp,
        current_threshold: current,
        next_threshold: next,
        progress,
    }
}

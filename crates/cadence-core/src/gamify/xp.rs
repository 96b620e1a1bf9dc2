use serde::{Deserialize, Serialize};

use crate::model::task::Priority;

/// XP awarded per completed task, by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpTable {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    /// Used when a completion carries no priority.
    pub fallback: u64,
}

impl Default for XpTable {
    fn default() -> Self {
        Self {
            high: 50,
            medium: 30,
            low: 15,
            fallback: 20,
        }
    }
}

#[must_use]
pub const fn xp_for_priority(priority: Option<Priority>, table: &XpTable) -> u64 {
    match priority {
        Some(Priority::High) => table.high,
        Some(Priority::Medium) => table.medium,
        Some(Priority::Low) => table.low,
        None => table.fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let table = XpTable::default();
        assert_eq!(xp_for_priority(Some(Priority::High), &table), 50);
        assert_eq!(xp_for_priority(Some(Priority::Medium), &table), 30);
        assert_eq!(xp_for_priority(Some(Priority::Low), &table), 15);
        assert_eq!(xp_for_priority(None, &table), 20);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let table: XpTable = toml::from_str("high = 80").unwrap();
        assert_eq!(table.high, 80);
        assert_eq!(table.low, 15);
    }
}

//! Item domain models.

use serde::{Deserialize, Serialize};
use taskstream_db::items::ItemRow;

/// A task-list item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub text: String,
    pub status: ItemStatus,
    pub created: String,
}

impl Item {
    /// Create an Item from a database row.
    pub fn from_row(row: ItemRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            status: ItemStatus::from_str(&row.status),
            created: row.created,
        }
    }
}

/// Item status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Complete,
}

impl ItemStatus {
    /// Parse from string. Unknown values are treated as active.
    pub fn from_str(s: &str) -> Self {
        match s {
            "complete" => Self::Complete,
            _ => Self::Active,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Complete => "complete",
        }
    }

    /// The status a toggle moves to.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Active => Self::Complete,
            Self::Complete => Self::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        assert_eq!(ItemStatus::from_str("active"), ItemStatus::Active);
        assert_eq!(ItemStatus::from_str("complete"), ItemStatus::Complete);
        assert_eq!(ItemStatus::from_str("garbage"), ItemStatus::Active);
        assert_eq!(ItemStatus::Active.as_str(), "active");
        assert_eq!(ItemStatus::Complete.as_str(), "complete");
    }

    #[test]
    fn test_toggle_flips_status() {
        assert_eq!(ItemStatus::Active.toggled(), ItemStatus::Complete);
        assert_eq!(ItemStatus::Complete.toggled(), ItemStatus::Active);
        assert_eq!(ItemStatus::Active.toggled().toggled(), ItemStatus::Active);
    }
}

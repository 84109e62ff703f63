//! Calendar descriptors.

use serde::{Deserialize, Serialize};

/// One calendar as enumerated from the provider. Read-only; the store
/// never mutates calendars, only the events inside them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarDescriptor {
    pub id: i64,
    pub display_name: String,
    pub access: CalendarAccess,
    pub color: i64,
    pub timezone: Option<String>,
    /// Account the calendar belongs to.
    pub owner: Option<String>,
}

/// Access level granted on a calendar, in the provider's ascending order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarAccess {
    #[default]
    None,
    Freebusy,
    Read,
    Respond,
    Override,
    Contributor,
    Editor,
    Owner,
    Root,
}

impl CalendarAccess {
    pub fn from_provider(value: i64) -> Self {
        match value {
            100 => CalendarAccess::Freebusy,
            200 => CalendarAccess::Read,
            300 => CalendarAccess::Respond,
            400 => CalendarAccess::Override,
            500 => CalendarAccess::Contributor,
            600 => CalendarAccess::Editor,
            700 => CalendarAccess::Owner,
            800 => CalendarAccess::Root,
            _ => CalendarAccess::None,
        }
    }

    pub fn to_provider(self) -> i64 {
        match self {
            CalendarAccess::None => 0,
            CalendarAccess::Freebusy => 100,
            CalendarAccess::Read => 200,
            CalendarAccess::Respond => 300,
            CalendarAccess::Override => 400,
            CalendarAccess::Contributor => 500,
            CalendarAccess::Editor => 600,
            CalendarAccess::Owner => 700,
            CalendarAccess::Root => 800,
        }
    }

    /// Whether events can be created in a calendar with this access level.
    pub fn is_writable(self) -> bool {
        self >= CalendarAccess::Contributor
    }
}

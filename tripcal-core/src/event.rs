//! Provider-neutral event record types.
//!
//! These mirror the provider's storage model: instants are epoch
//! milliseconds, recurrence data stays in its serialized form, and the
//! enum types carry the provider's integer encodings. The store and its
//! assembly layer work exclusively with these types.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// A calendar event record.
///
/// Identity is two-layered: `id` is the provider-assigned row identifier
/// (present once the event has been stored), while `uid` is the
/// caller-supplied stable identifier used for idempotent lookup across
/// create/update/delete. A recurrence exception carries the series uid in
/// `original_uid` plus the overridden occurrence's start in
/// `instance_time`; the pair (uid, exception key) denotes one logical
/// event instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Provider-assigned identifier, set after creation.
    pub id: Option<i64>,
    /// Caller-supplied stable identifier, required.
    pub uid: String,
    pub organizer: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Start instant in epoch milliseconds.
    pub dt_start: i64,
    /// End instant in epoch milliseconds; absent for duration-based events.
    pub dt_end: Option<i64>,
    pub start_timezone: Option<String>,
    pub end_timezone: Option<String>,
    /// ISO-8601 duration, used only when `dt_end` is absent.
    pub duration: Option<String>,
    pub all_day: bool,
    /// Serialized recurrence rule, passed through to the provider.
    pub rrule: Option<String>,
    pub rdate: Option<String>,
    pub exrule: Option<String>,
    pub exdate: Option<String>,
    /// Uid of the series this event overrides; non-empty only for a
    /// recurrence exception.
    pub original_uid: Option<String>,
    /// Start of the overridden occurrence, meaningful only together with
    /// `original_uid`.
    pub instance_time: Option<i64>,
    pub access_level: AccessLevel,
    pub availability: Availability,
    pub attendees: Vec<Attendee>,
    pub reminders: Vec<Reminder>,
    pub extended_properties: Vec<ExtendedProperty>,
}

impl Event {
    /// Whether this record overrides a single occurrence of a series.
    pub fn is_exception(&self) -> bool {
        self.original_uid.as_deref().is_some_and(|uid| !uid.is_empty())
    }

    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.dt_start).single()
    }

    pub fn end_utc(&self) -> Option<DateTime<Utc>> {
        self.dt_end
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Check the fields the provider cannot be expected to diagnose
    /// helpfully. The store runs this before the first write round trip.
    pub fn validate(&self) -> StoreResult<()> {
        if self.uid.is_empty() {
            return Err(StoreError::InvalidEvent("event has no uid".into()));
        }

        for timezone in [&self.start_timezone, &self.end_timezone]
            .into_iter()
            .flatten()
        {
            if !timezone.is_empty() && timezone.parse::<chrono_tz::Tz>().is_err() {
                return Err(StoreError::InvalidEvent(format!(
                    "unknown timezone '{timezone}'"
                )));
            }
        }

        if let Some(duration) = self.duration.as_deref() {
            if !duration.is_empty() {
                iso8601::duration(duration).map_err(|e| {
                    StoreError::InvalidEvent(format!("bad duration '{duration}': {e}"))
                })?;
            }
        }

        if self.is_exception() && self.instance_time.is_none() {
            return Err(StoreError::InvalidEvent(
                "exception event has no original instance time".into(),
            ));
        }

        Ok(())
    }
}

/// An event attendee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: Option<String>,
    pub email: Option<String>,
    pub relationship: AttendeeRelationship,
    pub attendee_type: AttendeeType,
    pub status: AttendeeStatus,
}

/// A reminder attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Lead time before the event start, in minutes.
    pub minutes: i64,
    pub method: ReminderMethod,
}

/// An opaque name/value pair carrying application metadata on an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperty {
    pub name: String,
    pub value: String,
}

/// Property name under which foreign iCal-style properties are stored,
/// with the real name/value pair JSON-encoded in the property value.
/// Shared with other calendar sync adapters writing to the same provider.
pub const WRAPPED_PROPERTY_NAME: &str =
    "vnd.android.cursor.item/vnd.ical4android.unknown-property";

impl ExtendedProperty {
    /// Wrap a foreign property per the shared name/value JSON convention.
    pub fn wrap(name: &str, value: &str) -> Self {
        ExtendedProperty {
            name: WRAPPED_PROPERTY_NAME.to_string(),
            value: serde_json::to_string(&[name, value]).unwrap(),
        }
    }

    /// Decode a property stored via the wrap convention, `None` for
    /// properties that don't follow it.
    pub fn wrapped(&self) -> Option<(String, String)> {
        if self.name != WRAPPED_PROPERTY_NAME {
            return None;
        }
        serde_json::from_str::<[String; 2]>(&self.value)
            .ok()
            .map(|[name, value]| (name, value))
    }
}

/// Event visibility classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    Default,
    Confidential,
    Private,
    Public,
}

impl AccessLevel {
    pub fn from_provider(value: i64) -> Self {
        match value {
            1 => AccessLevel::Confidential,
            2 => AccessLevel::Private,
            3 => AccessLevel::Public,
            _ => AccessLevel::Default,
        }
    }

    pub fn to_provider(self) -> i64 {
        match self {
            AccessLevel::Default => 0,
            AccessLevel::Confidential => 1,
            AccessLevel::Private => 2,
            AccessLevel::Public => 3,
        }
    }
}

/// Whether the event blocks time on the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Busy,
    Free,
    Tentative,
}

impl Availability {
    pub fn from_provider(value: i64) -> Self {
        match value {
            1 => Availability::Free,
            2 => Availability::Tentative,
            _ => Availability::Busy,
        }
    }

    pub fn to_provider(self) -> i64 {
        match self {
            Availability::Busy => 0,
            Availability::Free => 1,
            Availability::Tentative => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeRelationship {
    #[default]
    None,
    Attendee,
    Organizer,
    Performer,
    Speaker,
}

impl AttendeeRelationship {
    pub fn from_provider(value: i64) -> Self {
        match value {
            1 => AttendeeRelationship::Attendee,
            2 => AttendeeRelationship::Organizer,
            3 => AttendeeRelationship::Performer,
            4 => AttendeeRelationship::Speaker,
            _ => AttendeeRelationship::None,
        }
    }

    pub fn to_provider(self) -> i64 {
        match self {
            AttendeeRelationship::None => 0,
            AttendeeRelationship::Attendee => 1,
            AttendeeRelationship::Organizer => 2,
            AttendeeRelationship::Performer => 3,
            AttendeeRelationship::Speaker => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeType {
    #[default]
    None,
    Required,
    Optional,
    Resource,
}

impl AttendeeType {
    pub fn from_provider(value: i64) -> Self {
        match value {
            1 => AttendeeType::Required,
            2 => AttendeeType::Optional,
            3 => AttendeeType::Resource,
            _ => AttendeeType::None,
        }
    }

    pub fn to_provider(self) -> i64 {
        match self {
            AttendeeType::None => 0,
            AttendeeType::Required => 1,
            AttendeeType::Optional => 2,
            AttendeeType::Resource => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeStatus {
    #[default]
    None,
    Accepted,
    Declined,
    Invited,
    Tentative,
}

impl AttendeeStatus {
    pub fn from_provider(value: i64) -> Self {
        match value {
            1 => AttendeeStatus::Accepted,
            2 => AttendeeStatus::Declined,
            3 => AttendeeStatus::Invited,
            4 => AttendeeStatus::Tentative,
            _ => AttendeeStatus::None,
        }
    }

    pub fn to_provider(self) -> i64 {
        match self {
            AttendeeStatus::None => 0,
            AttendeeStatus::Accepted => 1,
            AttendeeStatus::Declined => 2,
            AttendeeStatus::Invited => 3,
            AttendeeStatus::Tentative => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderMethod {
    #[default]
    Default,
    Alert,
    Email,
    Sms,
    Alarm,
}

impl ReminderMethod {
    pub fn from_provider(value: i64) -> Self {
        match value {
            1 => ReminderMethod::Alert,
            2 => ReminderMethod::Email,
            3 => ReminderMethod::Sms,
            4 => ReminderMethod::Alarm,
            _ => ReminderMethod::Default,
        }
    }

    pub fn to_provider(self) -> i64 {
        match self {
            ReminderMethod::Default => 0,
            ReminderMethod::Alert => 1,
            ReminderMethod::Email => 2,
            ReminderMethod::Sms => 3,
            ReminderMethod::Alarm => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_event() -> Event {
        Event {
            uid: "KIT-test-1".to_string(),
            title: Some("Flight to Berlin".to_string()),
            dt_start: 1700000000000,
            dt_end: Some(1700003600000),
            start_timezone: Some("Europe/Berlin".to_string()),
            end_timezone: Some("Europe/Berlin".to_string()),
            ..Event::default()
        }
    }

    #[test]
    fn test_validate_accepts_plain_event() {
        assert!(make_test_event().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_uid() {
        let mut event = make_test_event();
        event.uid.clear();
        assert!(matches!(
            event.validate(),
            Err(StoreError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_timezone() {
        let mut event = make_test_event();
        event.start_timezone = Some("Mars/Olympus_Mons".to_string());
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_validate_duration() {
        let mut event = make_test_event();
        event.dt_end = None;
        event.duration = Some("PT1H30M".to_string());
        assert!(event.validate().is_ok());

        event.duration = Some("90 minutes".to_string());
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_validate_exception_needs_instance_time() {
        let mut event = make_test_event();
        event.original_uid = Some(event.uid.clone());
        assert!(event.validate().is_err());

        event.instance_time = Some(event.dt_start);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_is_exception_ignores_empty_marker() {
        let mut event = make_test_event();
        assert!(!event.is_exception());
        event.original_uid = Some(String::new());
        assert!(!event.is_exception());
        event.original_uid = Some(event.uid.clone());
        assert!(event.is_exception());
    }

    #[test]
    fn test_start_utc() {
        let event = make_test_event();
        assert_eq!(
            event.start_utc().unwrap(),
            Utc.timestamp_millis_opt(1700000000000).unwrap()
        );
    }

    #[test]
    fn test_enum_provider_round_trips() {
        for value in 0..=3 {
            assert_eq!(AccessLevel::from_provider(value).to_provider(), value);
            assert_eq!(AttendeeType::from_provider(value).to_provider(), value);
        }
        for value in 0..=4 {
            assert_eq!(AttendeeStatus::from_provider(value).to_provider(), value);
            assert_eq!(ReminderMethod::from_provider(value).to_provider(), value);
        }
        // unknown provider values collapse to the default variant
        assert_eq!(Availability::from_provider(99), Availability::Busy);
    }

    #[test]
    fn test_extended_property_wrap_round_trip() {
        let prop = ExtendedProperty::wrap("X-TRIP-RESERVATION", "{\"ref\":\"XYZ123\"}");
        assert_eq!(prop.name, WRAPPED_PROPERTY_NAME);
        assert_eq!(
            prop.wrapped(),
            Some((
                "X-TRIP-RESERVATION".to_string(),
                "{\"ref\":\"XYZ123\"}".to_string()
            ))
        );

        let plain = ExtendedProperty {
            name: "CREATED".to_string(),
            value: "20211116T193700Z".to_string(),
        };
        assert_eq!(plain.wrapped(), None);
    }
}

//! Record assembly: provider rows → records and records → write values.
//!
//! Everything here is a pure mapping. Rows are accessed by position, so
//! the projection constants below are load-bearing: `event_from_row`
//! reads both the point-query and the instance-query projections, which
//! therefore must list the same fields in the same order.

use tripcal_core::{
    AccessLevel, Attendee, AttendeeRelationship, AttendeeStatus, AttendeeType, Availability,
    CalendarAccess, CalendarDescriptor, Column, Event, ExtendedProperty, Reminder, ReminderMethod,
    Row, Values,
};

// keep same field order as INSTANCE_PROJECTION!
pub const EVENT_PROJECTION: [Column; 20] = [
    Column::Id,
    Column::Organizer,
    Column::Title,
    Column::Location,
    Column::Description,
    Column::DtStart,
    Column::DtEnd,
    Column::EventTimezone,
    Column::EventEndTimezone,
    Column::Duration,
    Column::AllDay,
    Column::RRule,
    Column::RDate,
    Column::ExRule,
    Column::ExDate,
    Column::OriginalUid,
    Column::OriginalInstanceTime,
    Column::AccessLevel,
    Column::Availability,
    Column::Uid,
];

// keep same field order as EVENT_PROJECTION!
pub const INSTANCE_PROJECTION: [Column; 20] = [
    Column::Id,
    Column::Organizer,
    Column::Title,
    Column::Location,
    Column::Description,
    Column::DtStart,
    Column::DtEnd,
    Column::EventTimezone,
    Column::EventEndTimezone,
    Column::Duration,
    Column::AllDay,
    Column::RRule,
    Column::RDate,
    Column::ExRule,
    Column::ExDate,
    Column::OriginalUid,
    Column::OriginalInstanceTime,
    Column::AccessLevel,
    Column::Availability,
    Column::Uid,
];

pub const ATTENDEE_PROJECTION: [Column; 5] = [
    Column::AttendeeName,
    Column::AttendeeEmail,
    Column::AttendeeRelationship,
    Column::AttendeeType,
    Column::AttendeeStatus,
];

pub const REMINDER_PROJECTION: [Column; 2] = [Column::Minutes, Column::Method];

pub const EXTENDED_PROPERTY_PROJECTION: [Column; 2] =
    [Column::PropertyName, Column::PropertyValue];

pub const CALENDAR_PROJECTION: [Column; 6] = [
    Column::Id,
    Column::CalendarDisplayName,
    Column::CalendarAccessLevel,
    Column::CalendarColor,
    Column::CalendarTimezone,
    Column::OwnerAccount,
];

/// Assemble an event from a row projected with [`EVENT_PROJECTION`] or
/// [`INSTANCE_PROJECTION`]. Child collections start empty; the store
/// loads them separately.
pub fn event_from_row(row: &Row) -> Event {
    Event {
        id: Some(row.integer(0)),
        organizer: row.text(1),
        title: row.text(2),
        location: row.text(3),
        description: row.text(4),
        dt_start: row.integer(5),
        dt_end: row.opt_integer(6),
        start_timezone: row.text(7),
        end_timezone: row.text(8),
        duration: row.text(9),
        all_day: row.flag(10),
        rrule: row.text(11),
        rdate: row.text(12),
        exrule: row.text(13),
        exdate: row.text(14),
        original_uid: row.text(15),
        instance_time: row.opt_integer(16),
        access_level: AccessLevel::from_provider(row.integer(17)),
        availability: Availability::from_provider(row.integer(18)),
        uid: row.text(19).unwrap_or_default(),
        attendees: Vec::new(),
        reminders: Vec::new(),
        extended_properties: Vec::new(),
    }
}

pub fn attendee_from_row(row: &Row) -> Attendee {
    Attendee {
        name: row.text(0),
        email: row.text(1),
        relationship: AttendeeRelationship::from_provider(row.integer(2)),
        attendee_type: AttendeeType::from_provider(row.integer(3)),
        status: AttendeeStatus::from_provider(row.integer(4)),
    }
}

pub fn reminder_from_row(row: &Row) -> Reminder {
    Reminder {
        minutes: row.integer(0),
        method: ReminderMethod::from_provider(row.integer(1)),
    }
}

pub fn extended_property_from_row(row: &Row) -> ExtendedProperty {
    ExtendedProperty {
        name: row.text(0).unwrap_or_default(),
        value: row.text(1).unwrap_or_default(),
    }
}

pub fn calendar_from_row(row: &Row) -> CalendarDescriptor {
    CalendarDescriptor {
        id: row.integer(0),
        display_name: row.text(1).unwrap_or_default(),
        access: CalendarAccess::from_provider(row.integer(2)),
        color: row.integer(3),
        timezone: row.text(4),
        owner: row.text(5),
    }
}

/// Write values for the scalar event columns.
///
/// Identification and creation-only columns (id, uid, calendar id, and
/// the original uid/instance time of an exception) are deliberately
/// absent: update must never change them, and create adds them itself.
pub fn event_values(event: &Event) -> Values {
    let mut values = Values::new();
    values.put(Column::Organizer, event.organizer.clone());
    values.put(Column::Title, event.title.clone());
    values.put(Column::Location, event.location.clone());
    values.put(Column::Description, event.description.clone());
    values.put(Column::DtStart, event.dt_start);
    values.put(Column::DtEnd, event.dt_end);
    values.put(Column::EventTimezone, event.start_timezone.clone());
    values.put(Column::EventEndTimezone, event.end_timezone.clone());
    values.put(Column::Duration, event.duration.clone());
    values.put(Column::AllDay, event.all_day);
    values.put(Column::RRule, event.rrule.clone());
    values.put(Column::RDate, event.rdate.clone());
    values.put(Column::ExRule, event.exrule.clone());
    values.put(Column::ExDate, event.exdate.clone());
    values.put(Column::AccessLevel, event.access_level.to_provider());
    values.put(Column::Availability, event.availability.to_provider());
    values.put(Column::GuestsCanModify, 1i64);
    values
}

pub fn attendee_values(attendee: &Attendee, event_id: i64) -> Values {
    let mut values = Values::new();
    values.put(Column::AttendeeName, attendee.name.clone());
    values.put(Column::AttendeeEmail, attendee.email.clone());
    values.put(
        Column::AttendeeRelationship,
        attendee.relationship.to_provider(),
    );
    values.put(Column::AttendeeType, attendee.attendee_type.to_provider());
    values.put(Column::AttendeeStatus, attendee.status.to_provider());
    values.put(Column::EventId, event_id);
    values
}

pub fn reminder_values(reminder: &Reminder, event_id: i64) -> Values {
    let mut values = Values::new();
    values.put(Column::Minutes, reminder.minutes);
    values.put(Column::Method, reminder.method.to_provider());
    values.put(Column::EventId, event_id);
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripcal_core::Value;

    fn make_event_row() -> Row {
        Row(vec![
            Value::Integer(42),                        // id
            Value::Text("organizer@example.com".into()),
            Value::Text("Flight to Berlin".into()),
            Value::Text("TXL".into()),
            Value::Null,                               // description
            Value::Integer(1700000000000),
            Value::Integer(1700003600000),
            Value::Text("Europe/Berlin".into()),
            Value::Text("Europe/Berlin".into()),
            Value::Null,                               // duration
            Value::Integer(0),                         // all day
            Value::Text("FREQ=WEEKLY".into()),
            Value::Null,                               // rdate
            Value::Null,                               // exrule
            Value::Null,                               // exdate
            Value::Null,                               // original uid
            Value::Null,                               // original instance time
            Value::Integer(2),                         // access level: private
            Value::Integer(1),                         // availability: free
            Value::Text("KIT-1".into()),
        ])
    }

    #[test]
    fn test_projections_agree() {
        // both feed event_from_row by position
        assert_eq!(EVENT_PROJECTION, INSTANCE_PROJECTION);
    }

    #[test]
    fn test_event_from_row() {
        let event = event_from_row(&make_event_row());
        assert_eq!(event.id, Some(42));
        assert_eq!(event.uid, "KIT-1");
        assert_eq!(event.title.as_deref(), Some("Flight to Berlin"));
        assert_eq!(event.description, None);
        assert_eq!(event.dt_start, 1700000000000);
        assert_eq!(event.dt_end, Some(1700003600000));
        assert_eq!(event.rrule.as_deref(), Some("FREQ=WEEKLY"));
        assert_eq!(event.access_level, AccessLevel::Private);
        assert_eq!(event.availability, Availability::Free);
        assert!(!event.is_exception());
        assert!(event.attendees.is_empty());
    }

    #[test]
    fn test_event_values_roundtrip_through_row() {
        let event = event_from_row(&make_event_row());
        let values = event_values(&event);

        // write set must agree with what a re-read would produce
        assert_eq!(
            values.get(Column::Title),
            Some(&Value::Text("Flight to Berlin".into()))
        );
        assert_eq!(values.get(Column::DtStart), Some(&Value::Integer(1700000000000)));
        assert_eq!(values.get(Column::Description), Some(&Value::Null));
        assert_eq!(values.get(Column::AccessLevel), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_event_values_omit_identification_columns() {
        let event = event_from_row(&make_event_row());
        let values = event_values(&event);
        assert_eq!(values.get(Column::Id), None);
        assert_eq!(values.get(Column::Uid), None);
        assert_eq!(values.get(Column::CalendarId), None);
        assert_eq!(values.get(Column::OriginalUid), None);
        assert_eq!(values.get(Column::OriginalInstanceTime), None);
    }

    #[test]
    fn test_attendee_mapping() {
        let row = Row(vec![
            Value::Text("Dr Konqi".into()),
            Value::Text("konqi@kde.org".into()),
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(4),
        ]);
        let attendee = attendee_from_row(&row);
        assert_eq!(attendee.name.as_deref(), Some("Dr Konqi"));
        assert_eq!(attendee.relationship, AttendeeRelationship::Attendee);
        assert_eq!(attendee.attendee_type, AttendeeType::Optional);
        assert_eq!(attendee.status, AttendeeStatus::Tentative);

        let values = attendee_values(&attendee, 42);
        assert_eq!(values.get(Column::EventId), Some(&Value::Integer(42)));
        assert_eq!(values.get(Column::AttendeeStatus), Some(&Value::Integer(4)));
    }

    #[test]
    fn test_calendar_mapping() {
        let row = Row(vec![
            Value::Integer(3),
            Value::Text("Personal".into()),
            Value::Integer(700),
            Value::Integer(0xff0000),
            Value::Text("Europe/Brussels".into()),
            Value::Text("user@example.com".into()),
        ]);
        let calendar = calendar_from_row(&row);
        assert_eq!(calendar.id, 3);
        assert_eq!(calendar.access, CalendarAccess::Owner);
        assert!(calendar.access.is_writable());
        assert_eq!(calendar.owner.as_deref(), Some("user@example.com"));
    }
}

//! Event creation.

use tracing::debug;
use tripcal_core::{Column, Event, ProviderClient, StoreError, StoreResult, Target};

use super::CalendarStore;
use crate::assembly;

impl<P: ProviderClient> CalendarStore<P> {
    /// Insert `event` and its reminders and attendees, returning the
    /// provider-assigned identifier.
    ///
    /// An event declaring `original_uid` is written as a recurrence
    /// exception: the overridden occurrence's start is persisted so the
    /// provider attaches it to the series instead of opening a new one.
    ///
    /// Declared extended properties are NOT written: the provider only
    /// accepts them from privileged sync adapters, so they would be
    /// dropped server-side anyway. Callers must not expect them to
    /// round-trip through `create`.
    ///
    /// The event row and each child row are separate provider calls; a
    /// failure between them leaves the event partially written.
    pub fn create(&self, event: &Event) -> StoreResult<i64> {
        event.validate()?;

        let mut values = assembly::event_values(event);
        // identification/creation-only columns, never part of an update
        if let (true, Some(instance_time)) = (event.is_exception(), event.instance_time) {
            values.put(Column::OriginalUid, event.original_uid.clone());
            values.put(Column::OriginalInstanceTime, instance_time);
        }
        values.put(Column::CalendarId, self.calendar_id());
        values.put(Column::Uid, event.uid.as_str());

        let id = self
            .provider()
            .insert(Target::Events, &values)
            .map_err(|e| StoreError::WriteRejected(e.to_string()))?;
        debug!(id, uid = %event.uid, title = ?event.title, "event added");

        for reminder in &event.reminders {
            self.provider()
                .insert(Target::Reminders, &assembly::reminder_values(reminder, id))
                .map_err(|e| StoreError::WriteRejected(e.to_string()))?;
        }
        for attendee in &event.attendees {
            self.provider()
                .insert(Target::Attendees, &assembly::attendee_values(attendee, id))
                .map_err(|e| StoreError::WriteRejected(e.to_string()))?;
        }

        Ok(id)
    }
}

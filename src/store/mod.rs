//! The calendar store: every read and write path for one calendar.
//!
//! A [`CalendarStore`] is bound to a single provider calendar and
//! composes the provider's four primitives into event-level operations.
//! Calls block until their provider round trips complete; dispatching
//! them off a UI-critical path is the caller's job.
//!
//! Consistency contract: operations that touch more than one collection
//! (create, update with child resync) are not transactional across round
//! trips. A failure mid-way leaves the rows written so far in place; the
//! error is surfaced, never masked, and the store performs no rollback,
//! no retries and no caching. Concurrent writers are coordinated only as
//! far as the provider's per-call atomicity goes.

mod create;
mod delete;
mod fetch;
mod update;

pub use update::ChildResync;

use tripcal_core::{Column, Event, Filter, ProviderClient, StoreResult, Target};

use crate::assembly;

/// Event-level access to one calendar of an external provider.
pub struct CalendarStore<P: ProviderClient> {
    provider: P,
    calendar_id: i64,
}

impl<P: ProviderClient> CalendarStore<P> {
    /// Bind a store to the calendar identified by `calendar_id`.
    ///
    /// Takes any provider client; pass a reference to keep using the
    /// provider alongside the store.
    pub fn new(provider: P, calendar_id: i64) -> Self {
        CalendarStore {
            provider,
            calendar_id,
        }
    }

    pub fn calendar_id(&self) -> i64 {
        self.calendar_id
    }

    pub(crate) fn provider(&self) -> &P {
        &self.provider
    }

    /// Base filter scoping every event query to this calendar.
    pub(crate) fn scope(&self) -> Filter {
        Filter::new().eq(Column::CalendarId, self.calendar_id)
    }

    /// Identifies the non-exception event of a series.
    pub(crate) fn master_filter(&self, uid: &str) -> Filter {
        self.scope().eq(Column::Uid, uid).is_null(Column::OriginalUid)
    }

    /// Identifies one exception instance by its overridden occurrence.
    pub(crate) fn instance_filter(&self, uid: &str, instance_time: i64) -> Filter {
        self.scope()
            .eq(Column::Uid, uid)
            .eq(Column::OriginalInstanceTime, instance_time)
    }

    /// Identifies every row of a series, master and exceptions.
    pub(crate) fn series_filter(&self, uid: &str) -> Filter {
        self.scope().eq(Column::Uid, uid)
    }

    /// Populate the event's child collections from the provider.
    pub(crate) fn load_children(&self, event: &mut Event) -> StoreResult<()> {
        let id = match event.id {
            Some(id) => id,
            None => return Ok(()),
        };
        let key = Filter::new().eq(Column::EventId, id);

        let rows = self
            .provider
            .query(Target::Attendees, &assembly::ATTENDEE_PROJECTION, &key)?;
        event.attendees = rows.iter().map(assembly::attendee_from_row).collect();

        let rows = self
            .provider
            .query(Target::Reminders, &assembly::REMINDER_PROJECTION, &key)?;
        event.reminders = rows.iter().map(assembly::reminder_from_row).collect();

        let rows = self.provider.query(
            Target::ExtendedProperties,
            &assembly::EXTENDED_PROPERTY_PROJECTION,
            &key,
        )?;
        event.extended_properties = rows
            .iter()
            .map(assembly::extended_property_from_row)
            .collect();

        Ok(())
    }
}

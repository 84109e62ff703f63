//! Event updates: identity re-resolution plus gated child replacement.

use tracing::{debug, warn};
use tripcal_core::{Column, Event, Filter, ProviderClient, StoreError, StoreResult, Target, Values};

use super::CalendarStore;
use crate::assembly;

/// Which child collections [`CalendarStore::update`] replaces wholesale.
///
/// Child rows are never diffed: a flagged collection is deleted in full
/// and reinserted from the event; an unflagged one is left untouched on
/// the provider even when the in-memory event carries different rows.
/// The gate spares scalar-only updates the child-record churn, at the
/// price that forgetting a flag silently keeps the old rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildResync {
    pub reminders: bool,
    pub attendees: bool,
}

impl ChildResync {
    /// Replace both child collections.
    pub fn all() -> Self {
        ChildResync {
            reminders: true,
            attendees: true,
        }
    }

    /// Scalar-field update only.
    pub fn none() -> Self {
        ChildResync::default()
    }
}

impl<P: ProviderClient> CalendarStore<P> {
    /// Apply `event`'s scalar fields to the stored row it denotes, then
    /// resync the child collections named in `resync`.
    ///
    /// The provider identifier is re-resolved from (calendar, uid,
    /// exception key) first; an update never trusts a stale `event.id`.
    /// Zero matching rows fail with [`StoreError::NotFound`], several
    /// with [`StoreError::Ambiguous`]; nothing is written in either case.
    pub fn update(&self, event: &Event, resync: ChildResync) -> StoreResult<()> {
        event.validate()?;

        // phase 1: identify the exact row
        let filter = if event.is_exception() {
            self.instance_filter(&event.uid, event.instance_time.unwrap_or_default())
        } else {
            self.master_filter(&event.uid)
        };
        let rows = self
            .provider()
            .query(Target::Events, &assembly::EVENT_PROJECTION, &filter)?;
        let event_id = match rows.len() {
            0 => {
                warn!(uid = %event.uid, "unable to identify event to update");
                return Err(StoreError::NotFound {
                    uid: event.uid.clone(),
                });
            }
            1 => rows[0].integer(0),
            matches => {
                warn!(uid = %event.uid, matches, "event to update is ambiguous");
                return Err(StoreError::Ambiguous {
                    uid: event.uid.clone(),
                    matches,
                });
            }
        };
        debug!(event_id, "found event to update");

        // phase 2: apply the scalar changes to that row alone
        let affected = self
            .provider()
            .update(
                Target::Events,
                &assembly::event_values(event),
                &Filter::new().eq(Column::Id, event_id),
            )
            .map_err(|e| StoreError::WriteRejected(e.to_string()))?;
        if affected != 1 {
            return Err(StoreError::WriteRejected(format!(
                "expected 1 affected row, got {affected}"
            )));
        }

        if resync.reminders {
            let rows: Vec<Values> = event
                .reminders
                .iter()
                .map(|r| assembly::reminder_values(r, event_id))
                .collect();
            self.replace_children(Target::Reminders, event_id, rows)?;
        }
        if resync.attendees {
            let rows: Vec<Values> = event
                .attendees
                .iter()
                .map(|a| assembly::attendee_values(a, event_id))
                .collect();
            self.replace_children(Target::Attendees, event_id, rows)?;
        }

        Ok(())
    }

    /// Delete all child rows of one kind, then reinsert the new set.
    fn replace_children(
        &self,
        target: Target,
        event_id: i64,
        rows: Vec<Values>,
    ) -> StoreResult<()> {
        self.provider()
            .delete(target, &Filter::new().eq(Column::EventId, event_id))
            .map_err(|e| StoreError::WriteRejected(e.to_string()))?;
        for values in &rows {
            self.provider()
                .insert(target, values)
                .map_err(|e| StoreError::WriteRejected(e.to_string()))?;
        }
        Ok(())
    }
}

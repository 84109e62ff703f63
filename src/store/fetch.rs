//! Read paths: full scans, range queries, uid lookups.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use tripcal_core::{Event, ProviderClient, StoreError, StoreResult, Target};

use super::CalendarStore;
use crate::assembly;

impl<P: ProviderClient> CalendarStore<P> {
    /// Every event of this calendar, fully populated. No time filter;
    /// meant for full-sync use.
    pub fn fetch_all(&self) -> StoreResult<Vec<Event>> {
        let rows =
            self.provider()
                .query(Target::Events, &assembly::EVENT_PROJECTION, &self.scope())?;

        let mut events: Vec<Event> = rows.iter().map(assembly::event_from_row).collect();
        for event in &mut events {
            self.load_children(event)?;
        }
        Ok(events)
    }

    /// Events with an occurrence overlapping `[begin, end)`.
    ///
    /// The provider's instance expansion yields one row per occurrence,
    /// so the same event can come back many times; rows are collapsed by
    /// provider id before the (expensive) child loading, which therefore
    /// runs once per logical event.
    pub fn fetch_range(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        let target = Target::Instances {
            begin: begin.timestamp_millis(),
            end: end.timestamp_millis(),
        };
        let rows = self
            .provider()
            .query(target, &assembly::INSTANCE_PROJECTION, &self.scope())?;
        debug!(rows = rows.len(), "instances in range");

        let mut unique: BTreeMap<i64, Event> = BTreeMap::new();
        for row in &rows {
            let event = assembly::event_from_row(row);
            if let Some(id) = event.id {
                unique.entry(id).or_insert(event);
            }
        }
        debug!(events = unique.len(), "unique events in range");

        let mut events: Vec<Event> = unique.into_values().collect();
        for event in &mut events {
            self.load_children(event)?;
        }
        Ok(events)
    }

    /// The non-exception event carrying `uid`, or `None`.
    ///
    /// More than one master row for a uid violates the provider contract
    /// and is reported as [`StoreError::Ambiguous`] rather than silently
    /// picking one.
    pub fn fetch_by_uid(&self, uid: &str) -> StoreResult<Option<Event>> {
        self.fetch_single(uid, self.master_filter(uid))
    }

    /// The exception instance overriding the occurrence of `uid` that
    /// originally started at `instance_time`, or `None`.
    pub fn fetch_instance(&self, uid: &str, instance_time: i64) -> StoreResult<Option<Event>> {
        self.fetch_single(uid, self.instance_filter(uid, instance_time))
    }

    /// Every row sharing `uid`: the master and all exception instances.
    pub fn list_instances(&self, uid: &str) -> StoreResult<Vec<Event>> {
        let rows = self.provider().query(
            Target::Events,
            &assembly::EVENT_PROJECTION,
            &self.series_filter(uid),
        )?;

        let mut events: Vec<Event> = rows.iter().map(assembly::event_from_row).collect();
        for event in &mut events {
            self.load_children(event)?;
        }
        Ok(events)
    }

    fn fetch_single(
        &self,
        uid: &str,
        filter: tripcal_core::Filter,
    ) -> StoreResult<Option<Event>> {
        let rows = self
            .provider()
            .query(Target::Events, &assembly::EVENT_PROJECTION, &filter)?;

        match rows.len() {
            0 => Ok(None),
            1 => {
                let mut event = assembly::event_from_row(&rows[0]);
                self.load_children(&mut event)?;
                Ok(Some(event))
            }
            matches => Err(StoreError::Ambiguous {
                uid: uid.to_string(),
                matches,
            }),
        }
    }
}

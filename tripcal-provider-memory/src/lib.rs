//! In-memory calendar provider.
//!
//! A complete [`ProviderClient`] over in-process tables, used to exercise
//! the store in tests and local development. It keeps the contract of the
//! real provider: monotonic identifier assignment on insert, per-call
//! atomicity, child rows that do not outlive their event, and an
//! instance-expansion view that materializes recurring events inside the
//! queried window, one row per occurrence, so the same event id shows up
//! repeatedly. That is exactly the duplication the store has to collapse.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use rrule::RRuleSet;
use tripcal_core::{
    CalendarDescriptor, Column, Filter, ProviderClient, ProviderError, ProviderResult, Row,
    Target, Value, Values,
};

#[derive(Default)]
pub struct MemoryProvider {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    events: Vec<Values>,
    attendees: Vec<Values>,
    reminders: Vec<Values>,
    extended_properties: Vec<Values>,
    calendars: Vec<Values>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a calendar row. `visible` mirrors the provider flag the
    /// directory listing filters on.
    pub fn with_calendar(self, descriptor: &CalendarDescriptor, visible: bool) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let mut row = Values::new();
            row.put(Column::Id, descriptor.id);
            row.put(Column::CalendarDisplayName, descriptor.display_name.as_str());
            row.put(Column::CalendarAccessLevel, descriptor.access.to_provider());
            row.put(Column::CalendarColor, descriptor.color);
            row.put(Column::CalendarTimezone, descriptor.timezone.clone());
            row.put(Column::OwnerAccount, descriptor.owner.clone());
            row.put(Column::Visible, visible);
            state.calendars.push(row);
        }
        self
    }
}

impl ProviderClient for MemoryProvider {
    fn query(
        &self,
        target: Target,
        projection: &[Column],
        filter: &Filter,
    ) -> ProviderResult<Vec<Row>> {
        let state = self.state.lock().unwrap();
        let table = match target {
            Target::Events => &state.events,
            Target::Attendees => &state.attendees,
            Target::Reminders => &state.reminders,
            Target::ExtendedProperties => &state.extended_properties,
            Target::Calendars => &state.calendars,
            Target::Instances { begin, end } => {
                return expand_instances(&state, begin, end, projection, filter)
            }
        };
        Ok(table
            .iter()
            .filter(|row| filter.matches(row))
            .map(|row| project(row, projection))
            .collect())
    }

    fn insert(&self, target: Target, values: &Values) -> ProviderResult<i64> {
        let mut state = self.state.lock().unwrap();

        if target == Target::Events {
            let calendar_id = values.get(Column::CalendarId).and_then(Value::as_i64);
            let known = calendar_id.is_some_and(|id| {
                state
                    .calendars
                    .iter()
                    .any(|c| c.get(Column::Id).and_then(Value::as_i64) == Some(id))
            });
            if !known {
                return Err(ProviderError::Backend(format!(
                    "no calendar with id {}",
                    calendar_id.unwrap_or(-1)
                )));
            }
        }

        let state = &mut *state;
        state.next_id += 1;
        let id = state.next_id;

        let table = match target {
            Target::Events => &mut state.events,
            Target::Attendees => &mut state.attendees,
            Target::Reminders => &mut state.reminders,
            Target::ExtendedProperties => &mut state.extended_properties,
            Target::Instances { .. } | Target::Calendars => {
                return Err(ProviderError::UnsupportedTarget(target.name()))
            }
        };

        let mut stored = values.clone();
        stored.put(Column::Id, id);
        table.push(stored);
        Ok(id)
    }

    fn update(&self, target: Target, values: &Values, filter: &Filter) -> ProviderResult<usize> {
        let mut state = self.state.lock().unwrap();
        let table = match target {
            Target::Events => &mut state.events,
            Target::Attendees => &mut state.attendees,
            Target::Reminders => &mut state.reminders,
            Target::ExtendedProperties => &mut state.extended_properties,
            Target::Instances { .. } | Target::Calendars => {
                return Err(ProviderError::UnsupportedTarget(target.name()))
            }
        };

        let mut affected = 0;
        for row in table.iter_mut() {
            if filter.matches(row) {
                row.merge(values);
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn delete(&self, target: Target, filter: &Filter) -> ProviderResult<usize> {
        let mut state = self.state.lock().unwrap();
        let state = &mut *state;
        match target {
            Target::Events => {
                let removed_ids: Vec<i64> = state
                    .events
                    .iter()
                    .filter(|row| filter.matches(row))
                    .filter_map(|row| row.get(Column::Id).and_then(Value::as_i64))
                    .collect();
                let removed = retain_count(&mut state.events, filter);

                // child rows do not outlive their event
                for table in [
                    &mut state.attendees,
                    &mut state.reminders,
                    &mut state.extended_properties,
                ] {
                    table.retain(|row| {
                        row.get(Column::EventId)
                            .and_then(Value::as_i64)
                            .map_or(true, |id| !removed_ids.contains(&id))
                    });
                }
                Ok(removed)
            }
            Target::Attendees => Ok(retain_count(&mut state.attendees, filter)),
            Target::Reminders => Ok(retain_count(&mut state.reminders, filter)),
            Target::ExtendedProperties => Ok(retain_count(&mut state.extended_properties, filter)),
            Target::Instances { .. } | Target::Calendars => {
                Err(ProviderError::UnsupportedTarget(target.name()))
            }
        }
    }
}

fn retain_count(table: &mut Vec<Values>, filter: &Filter) -> usize {
    let before = table.len();
    table.retain(|row| !filter.matches(row));
    before - table.len()
}

fn project(row: &Values, projection: &[Column]) -> Row {
    Row(projection
        .iter()
        .map(|column| row.get(*column).cloned().unwrap_or(Value::Null))
        .collect())
}

/// Materialize the occurrence view for `[begin, end)`.
///
/// Non-recurring events contribute their single occurrence; recurring
/// masters are expanded through their RRULE/RDATE/EXDATE data; a master
/// occurrence overridden by an exception row is replaced by that row's
/// own single occurrence.
fn expand_instances(
    state: &State,
    begin: i64,
    end: i64,
    projection: &[Column],
    filter: &Filter,
) -> ProviderResult<Vec<Row>> {
    let mut rows = Vec::new();

    for event in state.events.iter().filter(|row| filter.matches(row)) {
        let dt_start = event.get(Column::DtStart).and_then(Value::as_i64).unwrap_or(0);
        let span = event_span(event);

        let occurrences = match event.get(Column::RRule).and_then(Value::as_str) {
            Some(rrule) if !rrule.is_empty() => {
                expand_rrule(event, rrule, dt_start, begin - span, end)?
            }
            _ => vec![dt_start],
        };

        for occurrence in occurrences {
            let occurrence_end = occurrence + span;
            let overlaps = occurrence < end && (occurrence_end > begin || occurrence >= begin);
            if !overlaps {
                continue;
            }
            if !is_exception_row(event) && has_override(state, event, occurrence) {
                continue;
            }
            rows.push(project(event, projection));
        }
    }

    Ok(rows)
}

fn is_exception_row(row: &Values) -> bool {
    row.get(Column::OriginalUid)
        .and_then(Value::as_str)
        .is_some_and(|uid| !uid.is_empty())
}

/// Whether an exception row overrides the master's occurrence at `time`.
fn has_override(state: &State, master: &Values, time: i64) -> bool {
    let uid = master.get(Column::Uid).cloned().unwrap_or(Value::Null);
    state.events.iter().any(|row| {
        is_exception_row(row)
            && row.get(Column::Uid) == Some(&uid)
            && row.get(Column::OriginalInstanceTime).and_then(Value::as_i64) == Some(time)
    })
}

/// Occurrence length in milliseconds, from the end instant or, failing
/// that, the ISO-8601 duration.
fn event_span(row: &Values) -> i64 {
    let dt_start = row.get(Column::DtStart).and_then(Value::as_i64).unwrap_or(0);
    if let Some(dt_end) = row.get(Column::DtEnd).and_then(Value::as_i64) {
        return (dt_end - dt_start).max(0);
    }
    row.get(Column::Duration)
        .and_then(Value::as_str)
        .and_then(duration_ms)
        .unwrap_or(0)
}

fn duration_ms(duration: &str) -> Option<i64> {
    match iso8601::duration(duration).ok()? {
        iso8601::Duration::YMDHMS {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
        } => {
            let days = day as i64 + 30 * month as i64 + 365 * year as i64;
            let seconds = second as i64 + 60 * minute as i64 + 3600 * hour as i64 + 86400 * days;
            Some(seconds * 1000 + millisecond as i64)
        }
        iso8601::Duration::Weeks(weeks) => Some(weeks as i64 * 7 * 86400 * 1000),
    }
}

/// Expand a master's recurrence data into occurrence start instants
/// between `window_start` and `window_end`.
fn expand_rrule(
    row: &Values,
    rrule: &str,
    dt_start: i64,
    window_start: i64,
    window_end: i64,
) -> ProviderResult<Vec<i64>> {
    let dtstart = to_utc(dt_start)
        .ok_or_else(|| ProviderError::Backend(format!("bad event start {dt_start}")))?;

    let mut lines = vec![
        format!("DTSTART:{}", dtstart.format("%Y%m%dT%H%M%SZ")),
        format!("RRULE:{}", rrule),
    ];
    if let Some(exdate) = row.get(Column::ExDate).and_then(Value::as_str) {
        for chunk in exdate.split(',').filter(|c| !c.is_empty()) {
            lines.push(format!("EXDATE:{chunk}"));
        }
    }
    if let Some(rdate) = row.get(Column::RDate).and_then(Value::as_str) {
        for chunk in rdate.split(',').filter(|c| !c.is_empty()) {
            lines.push(format!("RDATE:{chunk}"));
        }
    }

    let set: RRuleSet = lines
        .join("\n")
        .parse()
        .map_err(|e| ProviderError::Backend(format!("bad recurrence data: {e}")))?;

    // after/before are exclusive; widen by a second to keep the window's
    // own boundary occurrences
    let after = to_utc(window_start - 1000)
        .ok_or_else(|| ProviderError::Backend(format!("bad window start {window_start}")))?
        .with_timezone(&rrule::Tz::UTC);
    let before = to_utc(window_end)
        .ok_or_else(|| ProviderError::Backend(format!("bad window end {window_end}")))?
        .with_timezone(&rrule::Tz::UTC);

    let result = set.after(after).before(before).all(365);
    Ok(result.dates.iter().map(|d| d.timestamp_millis()).collect())
}

fn to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripcal_core::CalendarAccess;

    const HOUR: i64 = 3_600_000;
    const DAY: i64 = 86_400_000;
    const START: i64 = 1_700_000_000_000;

    fn seeded() -> MemoryProvider {
        MemoryProvider::new().with_calendar(
            &CalendarDescriptor {
                id: 1,
                display_name: "Personal".to_string(),
                access: CalendarAccess::Owner,
                ..CalendarDescriptor::default()
            },
            true,
        )
    }

    fn event_values(uid: &str, dt_start: i64) -> Values {
        let mut values = Values::new();
        values.put(Column::CalendarId, 1i64);
        values.put(Column::Uid, uid);
        values.put(Column::DtStart, dt_start);
        values.put(Column::DtEnd, dt_start + HOUR);
        values
    }

    fn instance_rows(provider: &MemoryProvider, begin: i64, end: i64) -> Vec<Row> {
        provider
            .query(
                Target::Instances { begin, end },
                &[Column::Id, Column::Uid],
                &Filter::new().eq(Column::CalendarId, 1),
            )
            .unwrap()
    }

    #[test]
    fn test_insert_assigns_monotonic_ids() {
        let provider = seeded();
        let a = provider
            .insert(Target::Events, &event_values("KIT-a", START))
            .unwrap();
        let b = provider
            .insert(Target::Events, &event_values("KIT-b", START))
            .unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_insert_rejects_unknown_calendar() {
        let provider = seeded();
        let mut values = event_values("KIT-a", START);
        values.put(Column::CalendarId, 99i64);
        assert!(matches!(
            provider.insert(Target::Events, &values),
            Err(ProviderError::Backend(_))
        ));
    }

    #[test]
    fn test_deleting_event_removes_child_rows() {
        let provider = seeded();
        let id = provider
            .insert(Target::Events, &event_values("KIT-a", START))
            .unwrap();
        let mut reminder = Values::new();
        reminder.put(Column::Minutes, 10i64);
        reminder.put(Column::EventId, id);
        provider.insert(Target::Reminders, &reminder).unwrap();

        let removed = provider
            .delete(Target::Events, &Filter::new().eq(Column::Uid, "KIT-a"))
            .unwrap();
        assert_eq!(removed, 1);

        let orphans = provider
            .query(
                Target::Reminders,
                &[Column::Minutes],
                &Filter::new().eq(Column::EventId, id),
            )
            .unwrap();
        assert!(orphans.is_empty());
    }

    #[test]
    fn test_instances_single_event() {
        let provider = seeded();
        provider
            .insert(Target::Events, &event_values("KIT-a", START))
            .unwrap();

        assert_eq!(instance_rows(&provider, START - DAY, START + DAY).len(), 1);
        // starts after the window
        assert!(instance_rows(&provider, START - DAY, START - HOUR).is_empty());
        // half-open: an event starting exactly at `end` is out
        assert!(instance_rows(&provider, START - DAY, START).is_empty());
    }

    #[test]
    fn test_instances_expand_recurring_event() {
        let provider = seeded();
        let mut values = event_values("KIT-daily", START);
        values.put(Column::RRule, "FREQ=DAILY;COUNT=5");
        provider.insert(Target::Events, &values).unwrap();

        // window covers three of the five occurrences, all with one id
        let rows = instance_rows(&provider, START, START + 3 * DAY);
        assert_eq!(rows.len(), 3);
        let ids: Vec<i64> = rows.iter().map(|r| r.integer(0)).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_instances_respect_exdate() {
        let provider = seeded();
        let mut values = event_values("KIT-daily", START);
        values.put(Column::RRule, "FREQ=DAILY;COUNT=3");
        let skipped = to_utc(START + DAY).unwrap();
        values.put(
            Column::ExDate,
            skipped.format("%Y%m%dT%H%M%SZ").to_string(),
        );
        provider.insert(Target::Events, &values).unwrap();

        let rows = instance_rows(&provider, START, START + 3 * DAY);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_exception_replaces_master_occurrence() {
        let provider = seeded();
        let mut master = event_values("KIT-daily", START);
        master.put(Column::RRule, "FREQ=DAILY;COUNT=3");
        let master_id = provider.insert(Target::Events, &master).unwrap();

        // override the second occurrence
        let mut exception = event_values("KIT-daily", START + DAY + HOUR);
        exception.put(Column::OriginalUid, "KIT-daily");
        exception.put(Column::OriginalInstanceTime, START + DAY);
        let exception_id = provider.insert(Target::Events, &exception).unwrap();

        let rows = instance_rows(&provider, START, START + 3 * DAY);
        // three logical occurrences, one served by the exception row
        assert_eq!(rows.len(), 3);
        let master_rows = rows.iter().filter(|r| r.integer(0) == master_id).count();
        let exception_rows = rows.iter().filter(|r| r.integer(0) == exception_id).count();
        assert_eq!(master_rows, 2);
        assert_eq!(exception_rows, 1);
    }

    #[test]
    fn test_instances_reject_writes() {
        let provider = seeded();
        let target = Target::Instances {
            begin: 0,
            end: DAY,
        };
        assert!(matches!(
            provider.insert(target, &Values::new()),
            Err(ProviderError::UnsupportedTarget(_))
        ));
        assert!(matches!(
            provider.delete(target, &Filter::new()),
            Err(ProviderError::UnsupportedTarget(_))
        ));
    }
}

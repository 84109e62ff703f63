//! Calendar directory: enumerate calendars worth offering to the user.

use tripcal_core::{CalendarDescriptor, Column, Filter, ProviderClient, StoreResult, Target};

use crate::assembly;

/// List the calendars that are visible and at least read-accessible.
///
/// The filter is pushed down to the provider; hidden calendars and
/// calendars without any access never reach the caller. Use
/// [`CalendarAccess::is_writable`](tripcal_core::CalendarAccess::is_writable)
/// to narrow the result to calendars events can be created in.
pub fn list_calendars<P: ProviderClient>(provider: &P) -> StoreResult<Vec<CalendarDescriptor>> {
    let filter = Filter::new()
        .eq(Column::Visible, 1)
        .ne(Column::CalendarAccessLevel, 0);
    let rows = provider.query(Target::Calendars, &assembly::CALENDAR_PROJECTION, &filter)?;
    Ok(rows.iter().map(assembly::calendar_from_row).collect())
}

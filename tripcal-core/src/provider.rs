//! The provider-client boundary.
//!
//! The store reaches the external calendar provider exclusively through
//! the four primitives of [`ProviderClient`]. Keeping the boundary this
//! narrow lets the store run unchanged against the real platform provider
//! or an in-memory implementation in tests.
//!
//! The provider guarantees per-call atomicity and monotonic identifier
//! assignment on insert, nothing more. There is no isolation across
//! calls; multi-call store operations are visibly non-atomic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Record collections addressable through the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Event rows (masters and recurrence exceptions).
    Events,
    /// The provider's recurrence-expanded occurrence view over the
    /// half-open window `[begin, end)` in epoch milliseconds. Query-only;
    /// may yield several rows for the same event.
    Instances { begin: i64, end: i64 },
    Attendees,
    Reminders,
    ExtendedProperties,
    /// Calendar descriptors. Read-only for non-privileged clients.
    Calendars,
}

impl Target {
    pub fn name(self) -> &'static str {
        match self {
            Target::Events => "events",
            Target::Instances { .. } => "instances",
            Target::Attendees => "attendees",
            Target::Reminders => "reminders",
            Target::ExtendedProperties => "extended_properties",
            Target::Calendars => "calendars",
        }
    }
}

/// Every column the store projects or writes, across all targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    // events / instances
    Id,
    Organizer,
    Title,
    Location,
    Description,
    DtStart,
    DtEnd,
    EventTimezone,
    EventEndTimezone,
    Duration,
    AllDay,
    RRule,
    RDate,
    ExRule,
    ExDate,
    OriginalUid,
    OriginalInstanceTime,
    AccessLevel,
    Availability,
    Uid,
    CalendarId,
    GuestsCanModify,
    // child records (all three kinds key on the owning event)
    EventId,
    AttendeeName,
    AttendeeEmail,
    AttendeeRelationship,
    AttendeeType,
    AttendeeStatus,
    Minutes,
    Method,
    PropertyName,
    PropertyValue,
    // calendars
    CalendarDisplayName,
    CalendarAccessLevel,
    CalendarColor,
    CalendarTimezone,
    OwnerAccount,
    Visible,
}

/// A single provider cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Value::Null, Value::Text)
    }
}

impl From<Option<i64>> for Value {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Value::Null, Value::Integer)
    }
}

/// One query result row, projected positionally.
///
/// Cells line up with the projection the query was issued with; accessing
/// them by any other order is a bug on the caller's side.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(pub Vec<Value>);

impl Row {
    /// Integer cell, `0` when null or absent.
    pub fn integer(&self, idx: usize) -> i64 {
        self.0.get(idx).and_then(Value::as_i64).unwrap_or(0)
    }

    /// Integer cell, `None` when null or absent.
    pub fn opt_integer(&self, idx: usize) -> Option<i64> {
        self.0.get(idx).and_then(Value::as_i64)
    }

    /// Text cell, `None` when null or absent.
    pub fn text(&self, idx: usize) -> Option<String> {
        self.0.get(idx).and_then(|v| v.as_str()).map(str::to_owned)
    }

    /// Integer cell interpreted as a boolean flag.
    pub fn flag(&self, idx: usize) -> bool {
        self.integer(idx) == 1
    }
}

/// A single filter condition.
///
/// Null handling follows the provider's selection semantics: `Eq` and
/// `Ne` only ever match non-null cells, `IsNull` matches null or absent
/// cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Eq(Column, Value),
    Ne(Column, Value),
    IsNull(Column),
}

/// A conjunction of predicates, built fluently:
///
/// ```
/// use tripcal_core::{Column, Filter};
///
/// let filter = Filter::new()
///     .eq(Column::CalendarId, 7)
///     .eq(Column::Uid, "KIT-1")
///     .is_null(Column::OriginalUid);
/// assert_eq!(filter.predicates().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter(Vec<Predicate>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.0.push(Predicate::Eq(column, value.into()));
        self
    }

    pub fn ne(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.0.push(Predicate::Ne(column, value.into()));
        self
    }

    pub fn is_null(mut self, column: Column) -> Self {
        self.0.push(Predicate::IsNull(column));
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.0
    }

    /// Evaluate the filter against a stored row.
    pub fn matches(&self, row: &Values) -> bool {
        self.0.iter().all(|predicate| {
            let cell = |column: &Column| row.get(*column).cloned().unwrap_or(Value::Null);
            match predicate {
                Predicate::Eq(column, value) => {
                    let cell = cell(column);
                    !cell.is_null() && cell == *value
                }
                Predicate::Ne(column, value) => {
                    let cell = cell(column);
                    !cell.is_null() && cell != *value
                }
                Predicate::IsNull(column) => cell(column).is_null(),
            }
        })
    }
}

/// An ordered column → value write set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Values(Vec<(Column, Value)>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing any earlier value for it.
    pub fn put(&mut self, column: Column, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn get(&self, column: Column) -> Option<&Value> {
        self.0.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    /// Apply every entry of `other` on top of this set.
    pub fn merge(&mut self, other: &Values) {
        for (column, value) in &other.0 {
            self.put(*column, value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Column, Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Errors surfaced by a provider implementation.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The underlying storage engine failed or rejected the call.
    #[error("provider backend error: {0}")]
    Backend(String),

    /// The target does not support the requested primitive (e.g. writing
    /// to the instance-expansion view).
    #[error("target '{0}' does not support this operation")]
    UnsupportedTarget(&'static str),
}

/// Result type alias for provider primitives.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// The four primitives the store composes every operation from.
///
/// Implementations must assign identifiers monotonically on insert and
/// guarantee per-call atomicity; the store builds no transactions on top.
pub trait ProviderClient {
    /// Run a read, returning rows projected positionally per `projection`.
    fn query(&self, target: Target, projection: &[Column], filter: &Filter)
        -> ProviderResult<Vec<Row>>;

    /// Insert one row, returning its assigned identifier.
    fn insert(&self, target: Target, values: &Values) -> ProviderResult<i64>;

    /// Update all rows matching `filter`, returning the affected count.
    fn update(&self, target: Target, values: &Values, filter: &Filter)
        -> ProviderResult<usize>;

    /// Delete all rows matching `filter`, returning the removed count.
    fn delete(&self, target: Target, filter: &Filter) -> ProviderResult<usize>;
}

// Allow passing a borrowed provider where an owned one is expected, so a
// caller can keep using the provider next to the store that wraps it.
impl<P: ProviderClient + ?Sized> ProviderClient for &P {
    fn query(
        &self,
        target: Target,
        projection: &[Column],
        filter: &Filter,
    ) -> ProviderResult<Vec<Row>> {
        (**self).query(target, projection, filter)
    }

    fn insert(&self, target: Target, values: &Values) -> ProviderResult<i64> {
        (**self).insert(target, values)
    }

    fn update(&self, target: Target, values: &Values, filter: &Filter) -> ProviderResult<usize> {
        (**self).update(target, values, filter)
    }

    fn delete(&self, target: Target, filter: &Filter) -> ProviderResult<usize> {
        (**self).delete(target, filter)
    }
}

//! Calendar record store for a travel-itinerary application.
//!
//! The store manages event records (with their attendees, reminders and
//! extended properties) inside a calendar owned by an external provider,
//! speaking to it only through the four query/insert/update/delete
//! primitives of [`ProviderClient`]. It understands recurring-event
//! instance semantics (series masters, per-occurrence exceptions,
//! instance expansion) and identifies events by an application-assigned
//! uid rather than the provider's row ids, so creates, updates and
//! deletes stay idempotent across syncs.
//!
//! Every operation blocks until its provider round trips complete, and
//! multi-step writes are not transactional across those round trips; see
//! [`store::CalendarStore`] for the exact contract.

pub mod assembly;
pub mod config;
pub mod directory;
pub mod store;
pub mod uid;

pub use config::StoreConfig;
pub use directory::list_calendars;
pub use store::{CalendarStore, ChildResync};

// Re-export the record and boundary types from tripcal-core
pub use tripcal_core::*;

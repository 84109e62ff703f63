//! Event deletion.
//!
//! All three operations report `Ok(true)` when at least one row was
//! removed and `Ok(false)` when nothing matched; provider-level faults
//! surface as errors, so "nothing to delete" stays distinguishable from
//! "the provider refused".

use tracing::debug;
use tripcal_core::{ProviderClient, StoreError, StoreResult, Target};

use super::CalendarStore;

impl<P: ProviderClient> CalendarStore<P> {
    /// Remove the non-exception event carrying `uid`. Exception
    /// instances sharing the uid are left in place.
    pub fn delete(&self, uid: &str) -> StoreResult<bool> {
        self.delete_matching(uid, self.master_filter(uid))
    }

    /// Remove exactly the exception instance overriding the occurrence
    /// of `uid` that originally started at `instance_time`.
    pub fn delete_instance(&self, uid: &str, instance_time: i64) -> StoreResult<bool> {
        self.delete_matching(uid, self.instance_filter(uid, instance_time))
    }

    /// Remove every row sharing `uid`: the master and all exceptions.
    pub fn delete_all_instances(&self, uid: &str) -> StoreResult<bool> {
        self.delete_matching(uid, self.series_filter(uid))
    }

    fn delete_matching(&self, uid: &str, filter: tripcal_core::Filter) -> StoreResult<bool> {
        let removed = self
            .provider()
            .delete(Target::Events, &filter)
            .map_err(|e| StoreError::WriteRejected(e.to_string()))?;
        debug!(uid, removed, "deleted events");
        Ok(removed > 0)
    }
}

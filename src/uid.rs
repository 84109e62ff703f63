//! Uid generation for application-owned events.
//!
//! Uids are prefix-tagged so records written by this application can be
//! told apart from everything else in a shared calendar. The tag is part
//! of the persisted data; see [`StoreConfig::uid_prefix`](crate::StoreConfig).

use uuid::Uuid;

/// Generate a fresh namespaced uid: `<PREFIX>-<uuid>`.
pub fn new_uid(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Whether `uid` belongs to the namespace tagged `prefix`.
pub fn has_prefix(uid: &str, prefix: &str) -> bool {
    uid.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uid_shape() {
        let uid = new_uid("KIT");
        assert!(uid.starts_with("KIT-"));
        assert!(uid.len() > "KIT-".len());
        // uids must be unique per call
        assert_ne!(uid, new_uid("KIT"));
    }

    #[test]
    fn test_has_prefix() {
        assert!(has_prefix("KIT-123", "KIT"));
        assert!(!has_prefix("KITTEN-123", "KIT"));
        assert!(!has_prefix("TRIP-123", "KIT"));
        assert!(!has_prefix("KIT", "KIT"));
    }
}

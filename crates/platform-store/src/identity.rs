//! Resource identity derivation
//!
//! Backing containers may recycle their own identifiers over time, so the
//! UID exposed on a resource is never the container's UID itself. It is a
//! UUIDv5 of the container UID under a fixed namespace: a pure function,
//! so the same blob always yields the same resource UID.
//!
//! The namespace is versioned. Changing it changes every derived UID, which
//! breaks any client that stored UIDs; introduce a new constant instead of
//! editing an existing one.

use uuid::Uuid;

/// Namespace for resource UIDs, version 1.
pub const UID_NAMESPACE_V1: Uuid = Uuid::from_u128(0x6f1c_2d4e_8a3b_4c5d_9e7f_0a1b_2c3d_4e5f);

/// Namespace used for all newly derived UIDs.
pub const UID_NAMESPACE: Uuid = UID_NAMESPACE_V1;

/// Derive a resource UID from a backing container UID.
///
/// # Example
///
/// ```
/// use platform_store::identity::derive_uid;
///
/// assert_eq!(derive_uid("blob-1"), derive_uid("blob-1"));
/// assert_ne!(derive_uid("blob-1"), derive_uid("blob-2"));
/// ```
pub fn derive_uid(container_uid: &str) -> Uuid {
    derive_uid_in(&UID_NAMESPACE, container_uid)
}

/// Derive a resource UID under an explicit namespace.
pub fn derive_uid_in(namespace: &Uuid, container_uid: &str) -> Uuid {
    Uuid::new_v5(namespace, container_uid.as_bytes())
}

//! Integrity primitives
//!
//! Content checksums for snapshot payloads and version/id generation.
//! The hasher is chosen once (see [`HashAlgorithm`]) and passed around as a
//! [`ContentHasher`] trait object.

pub mod checksum;
pub mod version;

pub use checksum::{
    verify_checksum, ChecksumStatus, ContentHasher, HashAlgorithm, RollingHasher, Sha256Hasher,
};
pub use version::{new_backup_id, new_version_tag};

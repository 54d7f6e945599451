//! Version tags and snapshot ids
//!
//! Both combine a millisecond timestamp, a process-wide sequence number and
//! a random component. The sequence keeps tokens minted in the same tick
//! distinct; the random part keeps separate processes apart.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::Rng;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn components() -> (i64, u64, u32) {
    let millis = Utc::now().timestamp_millis();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let salt = rand::thread_rng().gen::<u32>() & 0x00ff_ffff;
    (millis, seq, salt)
}

/// New opaque version tag, e.g. `v1718000000000.4.9f3a1c`
pub fn new_version_tag() -> String {
    let (millis, seq, salt) = components();
    format!("v{}.{}.{:06x}", millis, seq, salt)
}

/// New snapshot id, e.g. `1718000000000-4-9f3a1c`
///
/// Ids sort by creation time when compared on their leading timestamp.
pub fn new_backup_id() -> String {
    let (millis, seq, salt) = components();
    format!("{:013}-{}-{:06x}", millis, seq, salt)
}

//! UUIDv7 helper for ids assigned in-process.
//!
//! The PostgreSQL store lets the database assign ids (`gen_random_uuid()`);
//! the memory store generates timestamp-sortable v7 ids itself.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

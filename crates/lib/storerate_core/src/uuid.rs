// Helper for generating UUIDv7 (timestamp-sortable UUIDs)
//
// PostgreSQL does not natively support UUIDv7 for auto-generation.
// Refresh-token rows are time-ordered, so their ids are generated
// app-side. The accounts table uses PG's gen_random_uuid() (v4)
// since time-ordering is irrelevant there.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

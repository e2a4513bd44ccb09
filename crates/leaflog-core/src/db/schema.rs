//! Canonical SQLite schema for leaflog.
//!
//! - `plants` holds plant records plus the `current_status` cache
//! - `events` and `growth_measurements` are append-only logs; `UPDATE` is
//!   rejected by triggers, and rows only disappear through a plant cascade
//! - `reminders` and `notifications` are plain mutable records
//! - `store_meta` tracks schema version and cache maintenance timestamps

/// Migration v1: core tables, append-only triggers, store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS plants (
    plant_id INTEGER PRIMARY KEY AUTOINCREMENT,
    common_name TEXT NOT NULL CHECK (length(trim(common_name)) > 0),
    scientific_name TEXT,
    variety TEXT,
    location TEXT,
    planting_date TEXT NOT NULL,
    acquisition_source TEXT,
    notes TEXT,
    current_status TEXT NOT NULL DEFAULT 'unknown' CHECK (current_status IN (
        'unknown', 'healthy', 'needs_attention', 'sick', 'recovering', 'dormant', 'dead'
    )),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    plant_id INTEGER NOT NULL REFERENCES plants(plant_id) ON DELETE CASCADE,
    event_type TEXT NOT NULL CHECK (event_type IN (
        'watering', 'fertilizing', 'status_change', 'repotting', 'pruning',
        'disease_observed', 'pest_observed', 'treatment', 'death'
    )),
    event_date_us INTEGER NOT NULL,
    description TEXT,
    amount REAL CHECK (amount IS NULL OR amount >= 0),
    performed_by TEXT,
    status TEXT CHECK (status IS NULL OR status IN (
        'unknown', 'healthy', 'needs_attention', 'sick', 'recovering', 'dormant', 'dead'
    )),
    recorded_at_us INTEGER NOT NULL,
    CHECK (event_type <> 'status_change' OR status IS NOT NULL)
);

CREATE TABLE IF NOT EXISTS growth_measurements (
    measurement_id INTEGER PRIMARY KEY AUTOINCREMENT,
    plant_id INTEGER NOT NULL REFERENCES plants(plant_id) ON DELETE CASCADE,
    height_cm REAL CHECK (height_cm IS NULL OR height_cm >= 0),
    width_cm REAL CHECK (width_cm IS NULL OR width_cm >= 0),
    leaf_count INTEGER CHECK (leaf_count IS NULL OR leaf_count >= 0),
    flower_count INTEGER CHECK (flower_count IS NULL OR flower_count >= 0),
    notes TEXT,
    taken_at_us INTEGER NOT NULL,
    CHECK (
        height_cm IS NOT NULL OR width_cm IS NOT NULL
        OR leaf_count IS NOT NULL OR flower_count IS NOT NULL
    )
);

CREATE TABLE IF NOT EXISTS reminders (
    reminder_id INTEGER PRIMARY KEY AUTOINCREMENT,
    plant_id INTEGER NOT NULL REFERENCES plants(plant_id) ON DELETE CASCADE,
    reminder_type TEXT NOT NULL CHECK (reminder_type IN (
        'watering', 'fertilizing', 'repotting', 'pruning', 'misting', 'inspection'
    )),
    frequency_secs INTEGER NOT NULL CHECK (frequency_secs > 0),
    next_due_us INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id INTEGER PRIMARY KEY AUTOINCREMENT,
    reminder_id INTEGER NOT NULL REFERENCES reminders(reminder_id) ON DELETE CASCADE,
    plant_id INTEGER NOT NULL REFERENCES plants(plant_id) ON DELETE CASCADE,
    message TEXT NOT NULL,
    due_at_us INTEGER NOT NULL,
    is_read INTEGER NOT NULL DEFAULT 0 CHECK (is_read IN (0, 1)),
    read_at_us INTEGER,
    created_at_us INTEGER NOT NULL,
    UNIQUE (reminder_id, due_at_us)
);

CREATE TRIGGER IF NOT EXISTS events_append_only
BEFORE UPDATE ON events
BEGIN
    SELECT RAISE(ABORT, 'events are append-only');
END;

CREATE TRIGGER IF NOT EXISTS growth_measurements_append_only
BEFORE UPDATE ON growth_measurements
BEGIN
    SELECT RAISE(ABORT, 'growth measurements are append-only');
END;

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_cache_rebuild_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, last_cache_rebuild_at_us)
VALUES (1, 1, 0);
";

/// Migration v2: read-path indexes.
///
/// `idx_events_plant_status_date` is partial: status reconstruction only ever
/// reads rows with a status, so the anchor lookup is a single index probe.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_events_plant_date
    ON events(plant_id, event_date_us, event_id);

CREATE INDEX IF NOT EXISTS idx_events_plant_status_date
    ON events(plant_id, event_date_us, event_id)
    WHERE status IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_events_date
    ON events(event_date_us);

CREATE INDEX IF NOT EXISTS idx_growth_plant_taken
    ON growth_measurements(plant_id, taken_at_us, measurement_id);

CREATE INDEX IF NOT EXISTS idx_reminders_active_due
    ON reminders(is_active, next_due_us, reminder_id);

CREATE INDEX IF NOT EXISTS idx_reminders_plant
    ON reminders(plant_id, next_due_us);

CREATE INDEX IF NOT EXISTS idx_notifications_unread_created
    ON notifications(is_read, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_plants_status
    ON plants(current_status);
";

/// Indexes expected after all migrations are applied.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_events_plant_date",
    "idx_events_plant_status_date",
    "idx_events_date",
    "idx_growth_plant_taken",
    "idx_reminders_active_due",
    "idx_reminders_plant",
    "idx_notifications_unread_created",
    "idx_plants_status",
];

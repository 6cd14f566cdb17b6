//! Schema migrations, tracked via `PRAGMA user_version`.

use rusqlite::Connection;

pub const SCHEMA_VERSION: i32 = 1;

const V1_SQL: &str = "
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL,
    mode TEXT NOT NULL DEFAULT 'general',
    started_at TEXT NOT NULL,
    last_message_at TEXT,
    ended_at TEXT,
    message_count INTEGER NOT NULL DEFAULT 0,
    summary TEXT,
    summary_for_user TEXT,
    summary_updated_at TEXT
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    conversation_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    metadata TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS student_contexts (
    student_id TEXT PRIMARY KEY,
    quick_context TEXT NOT NULL DEFAULT '',
    recent_sessions TEXT NOT NULL DEFAULT '',
    student_understanding TEXT NOT NULL DEFAULT '',
    open_commitments TEXT NOT NULL DEFAULT '',
    generated_objectives TEXT NOT NULL DEFAULT '[]',
    upcoming_deadlines TEXT NOT NULL DEFAULT '[]',
    total_conversations INTEGER NOT NULL DEFAULT 0,
    total_messages INTEGER NOT NULL DEFAULT 0,
    last_conversation_at TEXT,
    master_summary_updated_at TEXT
);

CREATE TABLE IF NOT EXISTS student_profiles (
    student_id TEXT PRIMARY KEY,
    name TEXT,
    grade_level INTEGER,
    school TEXT,
    gpa REAL,
    sat_score INTEGER,
    act_score INTEGER,
    intended_major TEXT,
    target_schools TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS goals (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL,
    title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'planning',
    total_tasks INTEGER NOT NULL DEFAULT 0,
    completed_tasks INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS deadlines (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL,
    title TEXT NOT NULL,
    due_date TEXT NOT NULL,
    school TEXT
);

CREATE INDEX IF NOT EXISTS idx_conversations_student ON conversations(student_id, last_message_at);
CREATE INDEX IF NOT EXISTS idx_conversations_unsummarized ON conversations(last_message_at) WHERE summary IS NULL;
CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, created_at);
CREATE INDEX IF NOT EXISTS idx_goals_student ON goals(student_id);
CREATE INDEX IF NOT EXISTS idx_deadlines_student ON deadlines(student_id, due_date);
";

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "busy_timeout", 5000i32)?;

    let current_version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    tracing::info!("Database schema version: {} (target: {})", current_version, SCHEMA_VERSION);

    if current_version < 1i32 {
        tracing::info!("Running migration v1: initial schema");
        conn.execute_batch(V1_SQL)?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

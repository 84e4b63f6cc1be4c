//! Initial database migration.
//!
//! Creates users, targets and target_files. File records live in their own
//! table with a unique `(target_id, file_url)` so a replayed confirm cannot
//! attach the same object twice.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(TARGETS_SQL).await?;
        db.execute_unprepared(TARGET_FILES_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const USERS_SQL: &str = r"
CREATE TABLE users (
    id              UUID PRIMARY KEY,
    username        VARCHAR(64) NOT NULL,
    password_hash   VARCHAR(255) NOT NULL,
    name            VARCHAR(255) NOT NULL,
    phone           VARCHAR(32) NOT NULL,
    is_active       BOOLEAN NOT NULL DEFAULT TRUE,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_users_username UNIQUE (username),
    CONSTRAINT chk_users_username_lower CHECK (username = LOWER(username))
);
";

const TARGETS_SQL: &str = r"
CREATE TABLE targets (
    id              UUID PRIMARY KEY,
    title           VARCHAR(255) NOT NULL,
    description     TEXT NOT NULL,
    tags            JSONB NOT NULL DEFAULT '[]'::jsonb,
    assigned_date   TIMESTAMPTZ NOT NULL,
    target_date     TIMESTAMPTZ NOT NULL,
    document_count  INTEGER NOT NULL,
    status          VARCHAR(16) NOT NULL DEFAULT 'pending',
    score           INTEGER,
    assigned_to     UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_targets_document_count CHECK (document_count >= 0),
    CONSTRAINT chk_targets_status CHECK (status IN ('pending', 'completed'))
);

CREATE INDEX idx_targets_owner_created ON targets(assigned_to, created_at DESC);
CREATE INDEX idx_targets_owner_status ON targets(assigned_to, status);
";

const TARGET_FILES_SQL: &str = r"
CREATE TABLE target_files (
    id              UUID PRIMARY KEY,
    target_id       UUID NOT NULL REFERENCES targets(id) ON DELETE CASCADE,
    file_name       TEXT NOT NULL,
    file_url        TEXT NOT NULL,
    file_type       VARCHAR(255) NOT NULL,
    file_size       BIGINT NOT NULL,
    uploaded_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_target_files_url UNIQUE (target_id, file_url),
    CONSTRAINT chk_target_files_size CHECK (file_size >= 0)
);

CREATE INDEX idx_target_files_target ON target_files(target_id, uploaded_at);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at
    BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_targets_updated_at
    BEFORE UPDATE ON targets
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_targets_updated_at ON targets;
DROP TRIGGER IF EXISTS trg_users_updated_at ON users;
DROP FUNCTION IF EXISTS set_updated_at();

DROP TABLE IF EXISTS target_files CASCADE;
DROP TABLE IF EXISTS targets CASCADE;
DROP TABLE IF EXISTS users CASCADE;
";

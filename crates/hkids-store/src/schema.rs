//! Schema definitions.
//!
//! All statements are idempotent (`CREATE TABLE IF NOT EXISTS`, seed inserts
//! with `ON CONFLICT DO NOTHING`) and are executed together inside one
//! transaction by [`crate::PgStore::init_schema`].

/// Name of the seeded administrator account.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the seeded administrator account (hashed before storage).
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// DDL statements, in dependency order.
pub const CREATE_TABLES: [&str; 6] = [
    r"CREATE TABLE IF NOT EXISTS categories (
        id          UUID PRIMARY KEY,
        name        TEXT UNIQUE NOT NULL,
        description TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS users (
        id             UUID PRIMARY KEY,
        username       TEXT UNIQUE NOT NULL,
        password_hash  TEXT NOT NULL,
        role           TEXT NOT NULL,
        kid_profile_id UUID,
        created_at     TIMESTAMPTZ NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS books (
        id            UUID PRIMARY KEY,
        title         TEXT NOT NULL,
        author        TEXT,
        description   TEXT,
        cover_image   TEXT,
        file_path     TEXT NOT NULL,
        category_id   UUID REFERENCES categories(id) ON DELETE SET NULL,
        age_group_min SMALLINT NOT NULL,
        age_group_max SMALLINT NOT NULL,
        page_count    INTEGER NOT NULL,
        is_published  BOOLEAN NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS book_pages (
        id          UUID PRIMARY KEY,
        book_id     UUID NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        page_number INTEGER NOT NULL,
        image_path  TEXT NOT NULL,
        content     TEXT,
        UNIQUE (book_id, page_number)
    )",
    r"CREATE TABLE IF NOT EXISTS kids_profiles (
        id         UUID PRIMARY KEY,
        parent_id  UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name       TEXT NOT NULL,
        avatar     TEXT,
        age        SMALLINT,
        created_at TIMESTAMPTZ NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS parent_approvals (
        kid_profile_id UUID NOT NULL REFERENCES kids_profiles(id) ON DELETE CASCADE,
        category_id    UUID NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        approved       BOOLEAN NOT NULL,
        updated_at     TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (kid_profile_id, category_id)
    )",
];

/// Seed insert for one category. Binds: id, name, description.
pub const SEED_CATEGORY: &str =
    "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING";

/// Seed insert for the admin user. Binds: id, username, password_hash, role, created_at.
pub const SEED_ADMIN: &str = "INSERT INTO users (id, username, password_hash, role, created_at) \
     VALUES ($1, $2, $3, $4, $5) ON CONFLICT (username) DO NOTHING";

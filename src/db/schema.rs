//! Database schema and migrations for Flasky.
//!
//! Migrations are applied in order when the database is opened.
//! The schema_version table tracks which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: roles and users
    r#"
CREATE TABLE roles (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    is_default  INTEGER NOT NULL DEFAULT 0,
    permissions INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_roles_is_default ON roles(is_default);

CREATE TABLE users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,            -- Argon2 PHC string
    confirmed     INTEGER NOT NULL DEFAULT 0,
    role_id       INTEGER REFERENCES roles(id),
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_users_username ON users(username);
CREATE INDEX idx_users_email ON users(email);
CREATE INDEX idx_users_role_id ON users(role_id);
"#,
];

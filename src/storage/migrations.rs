// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Database migrations
//!
//! Schema creation runs at open time as plain SQL, tracked in a
//! `_migrations` table. sqlx's compile-time migration system needs a
//! build-time database connection, which a desktop app that creates its store
//! on first launch cannot rely on.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Apply all pending migrations
///
/// Creates the schema on a fresh store; a no-op on a store that is already
/// current.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_migrations_table(pool).await?;

    run_migration(pool, 1, "initial_schema", create_initial_schema(pool)).await?;

    Ok(())
}

async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Apply one migration unless the tracking table says it already ran
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        return Ok(());
    }

    migration_fn.await?;

    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the initial schema
///
/// Three tables: books (catalog with copy counts), members, borrowings
/// (lending transactions, append-only apart from the closing return).
/// The CHECK constraints on `books.available` are the last line of defence
/// behind the conditional updates in the lending module.
async fn create_initial_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    isbn TEXT UNIQUE,
    category TEXT,
    quantity INTEGER NOT NULL DEFAULT 1,
    available INTEGER NOT NULL DEFAULT 1,
    added_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    CHECK (quantity >= 0),
    CHECK (available >= 0 AND available <= quantity)
);

CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    contact TEXT,
    address TEXT,
    join_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS borrowings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id INTEGER NOT NULL,
    member_id INTEGER NOT NULL,
    borrow_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    due_date TEXT NOT NULL,
    return_date TEXT,
    status TEXT NOT NULL DEFAULT 'borrowed',
    FOREIGN KEY (book_id) REFERENCES books (id),
    FOREIGN KEY (member_id) REFERENCES members (id)
);

CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);
CREATE INDEX IF NOT EXISTS idx_borrowings_book ON borrowings(book_id);
CREATE INDEX IF NOT EXISTS idx_borrowings_member ON borrowings(member_id);
CREATE INDEX IF NOT EXISTS idx_borrowings_return_date ON borrowings(return_date);
        "#,
    )
    .await?;

    Ok(())
}

/// Seed demonstration rows into an empty store
///
/// Only called for a store file that did not exist before open. First-run UX
/// only; not part of the operational contract. No-op if any books exist.
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let books: [(&str, &str, &str, &str, i64); 4] = [
        (
            "Computer Science Fundamentals",
            "John Smith",
            "978-0123456789",
            "Technology",
            5,
        ),
        (
            "Mathematics for Beginners",
            "Alice Johnson",
            "978-1234567890",
            "Education",
            3,
        ),
        (
            "History of Modern World",
            "Robert Brown",
            "978-2345678901",
            "History",
            2,
        ),
        (
            "Introduction to Physics",
            "Maria Garcia",
            "978-3456789012",
            "Science",
            4,
        ),
    ];

    for (title, author, isbn, category, quantity) in books {
        sqlx::query(
            "INSERT INTO books (title, author, isbn, category, quantity, available) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(author)
        .bind(isbn)
        .bind(category)
        .bind(quantity)
        .bind(quantity)
        .execute(pool)
        .await?;
    }

    let members: [(&str, &str, &str); 3] = [
        ("Hafeez Ullah", "0312-1234567", "Gwadar, Balochistan"),
        ("Ahmed Khan", "0300-9876543", "Karachi, Sindh"),
        ("Sara Ahmed", "0333-4567890", "Quetta, Balochistan"),
    ];

    for (name, contact, address) in members {
        sqlx::query("INSERT INTO members (name, contact, address) VALUES (?, ?, ?)")
            .bind(name)
            .bind(contact)
            .bind(address)
            .execute(pool)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    #[tokio::test]
    async fn test_schema_has_exactly_three_entity_tables() {
        let db = Database::new_in_memory().await.expect("in-memory store");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .expect("table listing");

        assert_eq!(tables, vec!["books", "borrowings", "members"]);
    }

    #[tokio::test]
    async fn test_rerunning_migrations_is_a_noop() {
        let db = Database::new_in_memory().await.expect("in-memory store");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .expect("migration count");
        assert!(count > 0, "no migrations recorded");

        run_migrations(db.pool()).await.expect("re-run failed");
        let count_after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .expect("migration count");
        assert_eq!(count, count_after);
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let db = Database::new_in_memory().await.expect("in-memory store");

        let fk_enabled: i32 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("pragma query");
        assert_eq!(fk_enabled, 1);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create database");

        seed_demo_data(db.pool()).await.expect("seed failed");
        seed_demo_data(db.pool()).await.expect("second seed failed");

        let books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(db.pool())
            .await
            .expect("count failed");
        let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(db.pool())
            .await
            .expect("count failed");

        assert_eq!(books, 4);
        assert_eq!(members, 3);
    }

    #[tokio::test]
    async fn test_available_check_constraint() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create database");

        // available > quantity must be rejected by the schema itself
        let result = sqlx::query(
            "INSERT INTO books (title, author, quantity, available) VALUES ('x', 'y', 1, 2)",
        )
        .execute(db.pool())
        .await;

        assert!(result.is_err(), "CHECK constraint did not fire");
    }
}

// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Database connection and management
//!
//! Owns the SQLite connection pool, runs migrations at open time, and handles
//! store-file lifecycle concerns (first-run seeding, backup copies).
//!
//! # SQLite Configuration
//! - WAL mode
//! - Foreign keys enabled
//! - Normal synchronous mode (balance safety/speed)

use crate::error::{LibraryError, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    ConnectOptions,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Database manager - handles connection pooling and store-file operations
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>, // None for in-memory databases
}

impl Database {
    /// Open (or create) the store file and bring the schema up to date
    ///
    /// When the file did not exist before this call, the fresh store is seeded
    /// with a small deterministic set of demonstration rows.
    ///
    /// # Errors
    /// Fails when the parent directory cannot be created, the file cannot be
    /// opened, or a migration fails.
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let path = database_path.as_ref();
        let fresh_store = !path.exists();

        // The store may live in a directory that does not exist yet
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LibraryError::FileIo(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let connection_string = format!("sqlite://{}?mode=rwc", path.display());
        let mut connect_opts = SqliteConnectOptions::from_str(&connection_string)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        connect_opts = connect_opts.disable_statement_logging();

        // One operation at a time by construction, but a small pool keeps the
        // read-side facade from queueing behind a slow write.
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_opts)
            .await?;

        let db = Self {
            pool,
            path: Some(path.to_path_buf()),
        };
        db.migrate().await?;

        if fresh_store {
            crate::storage::migrations::seed_demo_data(&db.pool).await?;
        }

        Ok(db)
    }

    /// Create in-memory database for testing
    ///
    /// Never seeded, so tests start from an empty store.
    pub async fn new_in_memory() -> Result<Self> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .disable_statement_logging();

        // A second connection would see its own empty :memory: database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_opts)
            .await?;

        let db = Self { pool, path: None };
        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        crate::storage::migrations::run_migrations(&self.pool)
            .await
            .map_err(|e| LibraryError::MigrationFailed(e.to_string()))?;

        Ok(())
    }

    /// The underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store file path; `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the pool and release all connections
    pub async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    /// Flush the WAL back into the main store file
    ///
    /// After this a plain file copy of the store is complete on its own.
    pub async fn checkpoint(&self) -> Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Copy the store file into `dest_dir`
    ///
    /// The copy is named `library_backup_<unix-millis>.db`. Returns the path
    /// of the copy.
    ///
    /// # Errors
    /// Fails for an in-memory store, a missing source file, or when the copy
    /// itself fails.
    pub async fn backup<P: AsRef<Path>>(&self, dest_dir: P) -> Result<PathBuf> {
        let source_path = self.path.as_ref().ok_or_else(|| {
            LibraryError::invalid_state("Cannot back up an in-memory database")
        })?;

        if !source_path.exists() {
            return Err(LibraryError::FileIo(format!(
                "Database file not found: {}",
                source_path.display()
            )));
        }

        // Flush WAL so the copy is self-contained
        self.checkpoint().await?;

        let dest_dir = dest_dir.as_ref();
        std::fs::create_dir_all(dest_dir).map_err(|e| {
            LibraryError::FileIo(format!(
                "Failed to create backup directory {}: {}",
                dest_dir.display(),
                e
            ))
        })?;

        let backup_file = dest_dir
            .join(format!("library_backup_{}.db", chrono::Utc::now().timestamp_millis()));

        std::fs::copy(source_path, &backup_file).map_err(|e| {
            LibraryError::FileIo(format!(
                "Failed to back up database to {}: {}",
                backup_file.display(),
                e
            ))
        })?;

        Ok(backup_file)
    }

    /// Run SQLite's integrity check; true when the store is healthy
    pub async fn integrity_check(&self) -> Result<bool> {
        let result: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&self.pool)
            .await?;

        Ok(result == "ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_answers_queries() {
        let db = Database::new_in_memory().await.expect("in-memory store");

        let one: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(db.pool())
            .await
            .expect("query failed");

        assert_eq!(one, 1);
        assert!(db.path().is_none());
    }

    #[tokio::test]
    async fn test_fresh_store_passes_integrity_check() {
        let db = Database::new_in_memory().await.expect("in-memory store");
        assert!(db.integrity_check().await.expect("integrity query"));
    }

    #[tokio::test]
    async fn test_fresh_store_is_seeded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("library.db");

        let db = Database::new(&db_path).await.expect("Failed to open store");
        let books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(db.pool())
            .await
            .expect("count failed");
        assert_eq!(books, 4, "fresh store should carry demo rows");
        db.close().await.expect("close failed");

        // Re-open: existing store must not be re-seeded on top of user data
        let db = Database::new(&db_path).await.expect("Failed to reopen store");
        sqlx::query("DELETE FROM members")
            .execute(db.pool())
            .await
            .expect("delete failed");
        db.close().await.expect("close failed");

        let db = Database::new(&db_path).await.expect("Failed to reopen store");
        let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(db.pool())
            .await
            .expect("count failed");
        assert_eq!(members, 0, "existing store must not be re-seeded");
    }

    #[tokio::test]
    async fn test_backup_copies_store_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("library.db");
        let backup_dir = tempfile::tempdir().expect("tempdir");

        let db = Database::new(&db_path).await.expect("Failed to open store");
        let copy = db.backup(backup_dir.path()).await.expect("backup failed");

        assert!(copy.exists());
        assert!(copy
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("library_backup_") && n.ends_with(".db"))
            .unwrap_or(false));
    }

    #[tokio::test]
    async fn test_backup_creates_missing_destination_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("library.db"))
            .await
            .expect("Failed to open store");

        // Nested path that does not exist yet
        let dest = dir.path().join("backups").join("nightly");
        let copy = db.backup(&dest).await.expect("backup failed");

        assert!(copy.starts_with(&dest));
        assert!(copy.exists());
    }

    #[tokio::test]
    async fn test_backup_of_in_memory_database_fails() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let dir = tempfile::tempdir().expect("tempdir");

        let result = db.backup(dir.path()).await;
        assert!(result.is_err());
    }
}

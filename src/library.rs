// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Operation surface for the presentation layer
//!
//! [`Library`] owns the store handle and exposes one async method per
//! operation the UI invokes, the request/response boundary. Every method
//! returns a [`Result`]; the UI renders `Ok` payloads and shows
//! [`crate::error::LibraryError::user_message`] for failures. No method
//! panics, retries, or caches entity state across calls.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::{LibraryError, Result};
use crate::lending;
use crate::reports::{self, DailyStats, OverdueBorrowing, PopularityEntry};
use crate::storage::models::{Book, BorrowingRecord, Member, NewBook, NewMember};
use crate::storage::{queries, Database};

/// The application core: catalog, members, lending, reporting, backup
///
/// Constructed over an explicit [`Database`] handle; there is no ambient
/// global connection anywhere in the crate.
#[derive(Debug, Clone)]
pub struct Library {
    db: Database,
}

impl Library {
    /// Create a library over an opened store
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (or create) the store at `path` and wrap it
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Database::new(path).await?))
    }

    /// Access the underlying store handle
    pub fn database(&self) -> &Database {
        &self.db
    }

    // ===== Books =====

    /// Add a book to the catalog; every copy starts available
    pub async fn add_book(&self, book: NewBook) -> Result<i64> {
        book.validate()?;
        let id = queries::insert_book(self.db.pool(), &book).await?;
        info!(book_id = id, title = %book.title, "book added");
        Ok(id)
    }

    /// All books, newest first
    pub async fn books(&self) -> Result<Vec<Book>> {
        queries::list_books(self.db.pool()).await
    }

    /// Single book by id
    pub async fn book(&self, id: i64) -> Result<Option<Book>> {
        queries::find_book_by_id(self.db.pool(), id).await
    }

    /// Update a book's full field set; fails when the id is unknown
    pub async fn update_book(&self, book: &Book) -> Result<u64> {
        book.validate()?;
        let changed = queries::update_book(self.db.pool(), book).await?;
        if changed == 0 {
            return Err(LibraryError::not_found(format!("book {}", book.id)));
        }
        Ok(changed)
    }

    /// Delete a book (refused while copies are on loan)
    pub async fn delete_book(&self, id: i64) -> Result<u64> {
        let changed = queries::delete_book(self.db.pool(), id).await?;
        if changed == 0 {
            return Err(LibraryError::not_found(format!("book {id}")));
        }
        info!(book_id = id, "book deleted");
        Ok(changed)
    }

    /// Substring search across title, author, ISBN and category
    pub async fn search_books(&self, term: &str) -> Result<Vec<Book>> {
        queries::search_books(self.db.pool(), term).await
    }

    // ===== Members =====

    /// Register a member
    pub async fn add_member(&self, member: NewMember) -> Result<i64> {
        member.validate()?;
        let id = queries::insert_member(self.db.pool(), &member).await?;
        info!(member_id = id, "member added");
        Ok(id)
    }

    /// All members, newest first
    pub async fn members(&self) -> Result<Vec<Member>> {
        queries::list_members(self.db.pool()).await
    }

    /// Single member by id
    pub async fn member(&self, id: i64) -> Result<Option<Member>> {
        queries::find_member_by_id(self.db.pool(), id).await
    }

    /// Update a member; fails when the id is unknown
    pub async fn update_member(&self, member: &Member) -> Result<u64> {
        member.validate()?;
        let changed = queries::update_member(self.db.pool(), member).await?;
        if changed == 0 {
            return Err(LibraryError::not_found(format!("member {}", member.id)));
        }
        Ok(changed)
    }

    /// Delete a member (refused while they have books out)
    pub async fn delete_member(&self, id: i64) -> Result<u64> {
        let changed = queries::delete_member(self.db.pool(), id).await?;
        if changed == 0 {
            return Err(LibraryError::not_found(format!("member {id}")));
        }
        info!(member_id = id, "member deleted");
        Ok(changed)
    }

    // ===== Lending =====

    /// Borrow a book for a member; returns the new borrowing id
    pub async fn borrow_book(&self, book_id: i64, member_id: i64) -> Result<i64> {
        match lending::borrow_book(self.db.pool(), book_id, member_id).await {
            Ok(id) => {
                info!(borrowing_id = id, book_id, member_id, "borrow committed");
                Ok(id)
            }
            Err(e) => {
                warn!(book_id, member_id, kind = e.kind(), "borrow rejected");
                Err(e)
            }
        }
    }

    /// Return a borrowed book; returns the rows changed (1)
    pub async fn return_book(&self, borrowing_id: i64) -> Result<u64> {
        match lending::return_book(self.db.pool(), borrowing_id).await {
            Ok(changes) => {
                info!(borrowing_id, "return committed");
                Ok(changes)
            }
            Err(e) => {
                warn!(borrowing_id, kind = e.kind(), "return rejected");
                Err(e)
            }
        }
    }

    /// All borrowings joined with titles and member names, newest first
    pub async fn borrowings(&self) -> Result<Vec<BorrowingRecord>> {
        queries::list_borrowings(self.db.pool()).await
    }

    // ===== Reporting =====

    /// Borrowings currently open
    pub async fn active_borrowings(&self) -> Result<Vec<BorrowingRecord>> {
        reports::active_borrowings(self.db.pool()).await
    }

    /// Open borrowings past due at `now`
    pub async fn overdue_borrowings(&self, now: DateTime<Utc>) -> Result<Vec<OverdueBorrowing>> {
        reports::overdue_borrowings(self.db.pool(), now).await
    }

    /// Titles ranked by borrow count
    pub async fn popularity_ranking(&self) -> Result<Vec<PopularityEntry>> {
        reports::popularity_ranking(self.db.pool()).await
    }

    /// Activity counts for one calendar day
    pub async fn daily_stats(&self, day: NaiveDate) -> Result<DailyStats> {
        reports::daily_stats(self.db.pool(), day).await
    }

    // ===== Maintenance =====

    /// Copy the store file into `dest_dir`; returns the copy's path
    pub async fn backup<P: AsRef<Path>>(&self, dest_dir: P) -> Result<PathBuf> {
        let path = self.db.backup(dest_dir).await?;
        info!(backup = %path.display(), "store backed up");
        Ok(path)
    }
}

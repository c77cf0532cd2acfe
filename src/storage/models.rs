// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Database models for Shelfmark
//!
//! Entity structs for the three persisted tables plus the `New*` insert
//! records the operation surface accepts.
//!
//! # SQLite Adaptations
//! - DateTime stored as TEXT in ISO 8601 format
//! - `BorrowingStatus` stored as TEXT (`'borrowed'` / `'returned'`)
//! - Overdue is derived, never stored

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{LibraryError, Result};

// ============================================================================
// ENUMS
// ============================================================================

/// Lifecycle status of a borrowing row
///
/// Overdue is intentionally absent: it is derived from `due_date` at read
/// time, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    Borrowed,
    Returned,
}

impl BorrowingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowingStatus::Borrowed => "borrowed",
            BorrowingStatus::Returned => "returned",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "returned" => BorrowingStatus::Returned,
            _ => BorrowingStatus::Borrowed,
        }
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Book entity - one catalog entry covering all owned copies
///
/// `quantity` is the number of copies owned, `available` the number currently
/// lendable. The store keeps `available == quantity - open borrowings`; the
/// lending module is the only writer that moves `available`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Book {
    /// Primary key (auto-increment)
    pub id: i64,
    pub title: String,
    pub author: String,
    #[sqlx(default)]
    pub isbn: Option<String>,
    #[sqlx(default)]
    pub category: Option<String>,
    pub quantity: i64,
    pub available: i64,
    pub added_date: DateTime<Utc>,
}

impl Book {
    /// Copies currently out on loan
    pub fn on_loan(&self) -> i64 {
        self.quantity - self.available
    }

    /// Validate the full field set before an update
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LibraryError::MissingRequiredField("title"));
        }
        if self.author.trim().is_empty() {
            return Err(LibraryError::MissingRequiredField("author"));
        }
        if self.quantity < 0 {
            return Err(LibraryError::invalid_input("quantity must not be negative"));
        }
        if self.available < 0 || self.available > self.quantity {
            return Err(LibraryError::invalid_input(format!(
                "available ({}) must be between 0 and quantity ({})",
                self.available, self.quantity
            )));
        }
        Ok(())
    }
}

/// Member entity - a registered borrower
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub contact: Option<String>,
    #[sqlx(default)]
    pub address: Option<String>,
    pub join_date: DateTime<Utc>,
}

impl Member {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LibraryError::MissingRequiredField("name"));
        }
        Ok(())
    }
}

/// Borrowing entity - one lending transaction
///
/// Created only by a successful borrow, mutated exactly once by the matching
/// return, never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Borrowing {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[sqlx(default)]
    pub return_date: Option<DateTime<Utc>>,
    pub status: String, // BorrowingStatus as TEXT
}

impl Borrowing {
    /// Get status as enum
    pub fn get_status(&self) -> BorrowingStatus {
        BorrowingStatus::from_str(&self.status)
    }

    /// A borrowing is open iff it has no return timestamp
    pub fn is_open(&self) -> bool {
        self.return_date.is_none() && self.get_status() == BorrowingStatus::Borrowed
    }

    /// Open and past due at `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_date < now
    }

    /// Whole days past the due date at `now`; zero when not overdue
    pub fn days_late(&self, now: DateTime<Utc>) -> i64 {
        if self.is_overdue(now) {
            (now - self.due_date).num_days()
        } else {
            0
        }
    }
}

/// Borrowing joined with book title and member name, as listed in the UI
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BorrowingRecord {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[sqlx(default)]
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub book_title: String,
    pub member_name: String,
}

impl BorrowingRecord {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_date < now
    }
}

// ============================================================================
// NEW RECORD STRUCTS (for inserts)
// ============================================================================

/// New book record for insertion
///
/// `available` is not a field here: a freshly added book always starts with
/// every copy lendable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub quantity: i64,
}

impl NewBook {
    pub fn new(title: String, author: String, quantity: i64) -> Self {
        Self {
            title,
            author,
            isbn: None,
            category: None,
            quantity,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LibraryError::MissingRequiredField("title"));
        }
        if self.author.trim().is_empty() {
            return Err(LibraryError::MissingRequiredField("author"));
        }
        if self.quantity < 0 {
            return Err(LibraryError::invalid_input("quantity must not be negative"));
        }
        Ok(())
    }
}

/// New member record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
}

impl NewMember {
    pub fn new(name: String) -> Self {
        Self {
            name,
            contact: None,
            address: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LibraryError::MissingRequiredField("name"));
        }
        Ok(())
    }
}

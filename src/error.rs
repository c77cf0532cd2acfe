// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Error types for Shelfmark
//!
//! Every fallible operation in the crate returns [`Result`]. Errors fall into
//! four buckets that the presentation layer treats differently:
//!
//! - **Validation**: bad input, rejected before touching the store
//! - **Constraint**: rejected by the store (duplicate ISBN, foreign keys)
//! - **Business rule**: `NotAvailable`, `BorrowingNotFound`, `OpenBorrowings`
//! - **Storage/I/O**: fatal to the current operation only
//!
//! All of them cross the operation boundary as a structured failure
//! ([`LibraryError::kind`] + message), never as a panic.

use thiserror::Error;

/// Result type alias using our LibraryError type
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Main error type for Shelfmark
#[derive(Error, Debug)]
pub enum LibraryError {
    // ===== Validation errors =====

    /// Required field is empty or missing
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// Generic input validation error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ===== Constraint errors =====

    /// A book with this ISBN already exists
    #[error("A book with this ISBN already exists")]
    DuplicateIsbn,

    /// Other store-level constraint violation, surfaced verbatim
    #[error("Constraint violation: {0}")]
    Constraint(String),

    // ===== Business-rule errors =====

    /// Borrow rejected: the book does not exist or has no free copies
    #[error("Book {book_id} is not available for borrowing")]
    NotAvailable { book_id: i64 },

    /// Return rejected: no open borrowing with this id (unknown or already returned)
    #[error("Borrowing {borrowing_id} not found or already returned")]
    BorrowingNotFound { borrowing_id: i64 },

    /// Delete rejected: the entity still has open borrowings
    #[error("Cannot delete {entity} {id}: {count} open borrowing(s) exist")]
    OpenBorrowings {
        entity: &'static str,
        id: i64,
        count: i64,
    },

    /// Record lookup by id came up empty
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    // ===== Storage/state errors =====

    /// Store contents contradict an invariant; the enclosing unit was rolled back
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Database schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// File I/O error (backup, store file handling)
    #[error("File I/O error: {0}")]
    FileIo(String),

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Create a RecordNotFound error with a resource name
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        LibraryError::RecordNotFound(resource.into())
    }

    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        LibraryError::InvalidInput(message.into())
    }

    /// Create an InvalidState error with a message
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        LibraryError::InvalidState(message.into())
    }

    /// Stable machine-readable failure kind
    ///
    /// The presentation layer keys alert styling off this, so the strings are
    /// part of the crate's contract.
    pub fn kind(&self) -> &'static str {
        match self {
            LibraryError::MissingRequiredField(_) | LibraryError::InvalidInput(_) => "validation",
            LibraryError::DuplicateIsbn | LibraryError::Constraint(_) => "constraint",
            LibraryError::NotAvailable { .. } => "not_available",
            LibraryError::BorrowingNotFound { .. } => "not_found",
            LibraryError::OpenBorrowings { .. } => "open_borrowings",
            LibraryError::RecordNotFound(_) => "not_found",
            LibraryError::InvalidState(_) => "invalid_state",
            LibraryError::MigrationFailed(_) => "migration",
            LibraryError::FileIo(_) | LibraryError::Io(_) => "io",
            LibraryError::Sqlx(_) => "database",
        }
    }

    /// Check if error is a business-rule rejection (store left unchanged)
    pub fn is_business_error(&self) -> bool {
        matches!(
            self,
            LibraryError::NotAvailable { .. }
                | LibraryError::BorrowingNotFound { .. }
                | LibraryError::OpenBorrowings { .. }
        )
    }

    /// Check if error was raised before any store access
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            LibraryError::MissingRequiredField(_) | LibraryError::InvalidInput(_)
        )
    }

    /// Get user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::NotAvailable { .. } => {
                "This book is not available for borrowing right now.".to_string()
            }
            LibraryError::BorrowingNotFound { .. } => {
                "Borrowing record not found or the book was already returned.".to_string()
            }
            LibraryError::DuplicateIsbn => {
                "A book with this ISBN is already in the catalog.".to_string()
            }
            LibraryError::OpenBorrowings { entity, count, .. } => {
                format!("This {entity} still has {count} book(s) out on loan.")
            }
            LibraryError::MissingRequiredField(field) => {
                format!("Please fill in the '{field}' field.")
            }
            _ => self.to_string(),
        }
    }

    /// Map a sqlx error to the matching constraint variant where possible
    ///
    /// sqlite reports UNIQUE violations with the offending column path in the
    /// message, which is the only handle we get without parsing error codes
    /// per backend.
    pub(crate) fn from_database(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let message = db_err.message().to_string();
            if message.contains("UNIQUE constraint failed: books.isbn") {
                return LibraryError::DuplicateIsbn;
            }
            if message.contains("constraint failed") {
                return LibraryError::Constraint(message);
            }
        }
        LibraryError::Sqlx(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(LibraryError::NotAvailable { book_id: 1 }.kind(), "not_available");
        assert_eq!(
            LibraryError::BorrowingNotFound { borrowing_id: 1 }.kind(),
            "not_found"
        );
        assert_eq!(LibraryError::MissingRequiredField("title").kind(), "validation");
        assert_eq!(LibraryError::DuplicateIsbn.kind(), "constraint");
    }

    #[test]
    fn test_business_error_classification() {
        assert!(LibraryError::NotAvailable { book_id: 3 }.is_business_error());
        assert!(!LibraryError::MissingRequiredField("name").is_business_error());
        assert!(LibraryError::MissingRequiredField("name").is_validation_error());
    }
}

// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Database storage and models
//!
//! All persistence for the three entities lives here: connection handling
//! ([`Database`]), runtime schema migrations, entity models, and the plain
//! CRUD query layer. The lending transactions themselves sit one level up in
//! [`crate::lending`].
//!
//! # Usage Example
//! ```no_run
//! use shelfmark_core::storage::{queries, Database, NewBook};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("./library.db").await?;
//!
//! let new_book = NewBook::new("The Hobbit".to_string(), "J. R. R. Tolkien".to_string(), 3);
//! let book_id = queries::insert_book(db.pool(), &new_book).await?;
//!
//! let book = queries::find_book_by_id(db.pool(), book_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

// Re-export commonly used types
pub use database::Database;
pub use models::{
    Book, Borrowing, BorrowingRecord, BorrowingStatus, Member, NewBook, NewMember,
};

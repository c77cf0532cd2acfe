// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Shelfmark core: books, members, and lending over a local SQLite store
//!
//! The crate is the backend of a desktop library-management app. The
//! presentation layer (windows, tables, forms) lives elsewhere and calls in
//! through [`Library`], which exposes one request/response operation per UI
//! action. The interesting part is [`lending`]: borrow and return as atomic
//! conditional transactions that keep `0 <= available <= quantity` under any
//! interleaving.

pub mod error;
pub mod lending;
pub mod library;
pub mod reports;
pub mod storage;

pub use error::{LibraryError, Result};
pub use library::Library;
pub use storage::{Book, Borrowing, BorrowingRecord, BorrowingStatus, Database, Member, NewBook, NewMember};

// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Lending transaction core
//!
//! The borrow and return operations, each a single SQLite transaction.
//! This is the only code that moves `books.available`, and both directions
//! are written as *conditional* updates checked by affected-row count:
//!
//! - borrow decrements iff `available > 0`
//! - return increments iff `available < quantity`
//!
//! A separate read-then-unconditional-write would let two borrows of the last
//! copy both succeed; the conditional form makes the availability check and
//! the decrement one statement, so the loser of the race sees zero rows
//! affected and reports [`LibraryError::NotAvailable`].
//!
//! A failure anywhere inside either unit rolls back the whole unit; sqlx
//! transactions roll back on drop unless committed.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{LibraryError, Result};

/// Loan period granted by a borrow
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Borrow a book for a member
///
/// Atomically takes one copy off the shelf and records the borrowing, with
/// `due_date = now + 14 days`. Returns the new borrowing id.
///
/// # Errors
/// - [`LibraryError::NotAvailable`] if the book does not exist or has no free
///   copies (the two cases are deliberately not distinguished)
/// - [`LibraryError::Constraint`] if the member does not exist (foreign key);
///   the availability decrement is rolled back
pub async fn borrow_book(pool: &SqlitePool, book_id: i64, member_id: i64) -> Result<i64> {
    let mut tx = pool.begin().await?;

    // Check-and-decrement in one statement; zero rows affected means the book
    // is unknown or fully lent out.
    let taken = sqlx::query("UPDATE books SET available = available - 1 WHERE id = ? AND available > 0")
        .bind(book_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if taken == 0 {
        // Dropping tx rolls back; nothing has been made visible.
        return Err(LibraryError::NotAvailable { book_id });
    }

    let now = Utc::now();
    let due = now + Duration::days(LOAN_PERIOD_DAYS);

    let result = sqlx::query(
        r#"
        INSERT INTO borrowings (book_id, member_id, borrow_date, due_date, return_date, status)
        VALUES (?, ?, ?, ?, NULL, 'borrowed')
        "#,
    )
    .bind(book_id)
    .bind(member_id)
    .bind(now)
    .bind(due)
    .execute(&mut *tx)
    .await
    .map_err(LibraryError::from_database)?;

    let borrowing_id = result.last_insert_rowid();
    tx.commit().await?;

    debug!(book_id, member_id, borrowing_id, "book borrowed");
    Ok(borrowing_id)
}

/// Return a borrowed book
///
/// Atomically puts the copy back on the shelf and closes the borrowing.
/// Idempotent in the rejection sense: a second return of the same borrowing
/// fails with [`LibraryError::BorrowingNotFound`] and never credits
/// availability twice. Returns the number of borrowing rows changed (1).
pub async fn return_book(pool: &SqlitePool, borrowing_id: i64) -> Result<u64> {
    let mut tx = pool.begin().await?;

    // Only an open borrowing qualifies; unknown id and already-returned are
    // the same failure to the caller.
    let book_id: Option<i64> = sqlx::query_scalar(
        "SELECT book_id FROM borrowings WHERE id = ? AND return_date IS NULL",
    )
    .bind(borrowing_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(book_id) = book_id else {
        return Err(LibraryError::BorrowingNotFound { borrowing_id });
    };

    // The guard can only miss if available already equals quantity, i.e. the
    // store lost track of this loan. Refuse rather than break the invariant.
    let credited = sqlx::query(
        "UPDATE books SET available = available + 1 WHERE id = ? AND available < quantity",
    )
    .bind(book_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if credited == 0 {
        return Err(LibraryError::invalid_state(format!(
            "book {book_id} has an open borrowing but full availability"
        )));
    }

    let changes = sqlx::query(
        r#"
        UPDATE borrowings SET return_date = ?, status = 'returned'
        WHERE id = ? AND return_date IS NULL
        "#,
    )
    .bind(Utc::now())
    .bind(borrowing_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if changes == 0 {
        return Err(LibraryError::BorrowingNotFound { borrowing_id });
    }

    tx.commit().await?;

    debug!(borrowing_id, book_id, "book returned");
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use crate::storage::models::{NewBook, NewMember};
    use crate::storage::queries;
    use chrono::Utc;

    async fn setup(quantity: i64) -> (Database, i64, i64) {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let book_id = queries::insert_book(
            db.pool(),
            &NewBook::new("Dune".to_string(), "Frank Herbert".to_string(), quantity),
        )
        .await
        .expect("insert book");
        let member_id = queries::insert_member(db.pool(), &NewMember::new("Paul".to_string()))
            .await
            .expect("insert member");
        (db, book_id, member_id)
    }

    async fn available(db: &Database, book_id: i64) -> i64 {
        sqlx::query_scalar("SELECT available FROM books WHERE id = ?")
            .bind(book_id)
            .fetch_one(db.pool())
            .await
            .expect("available query")
    }

    #[tokio::test]
    async fn test_borrow_decrements_availability() {
        let (db, book_id, member_id) = setup(2).await;

        let borrowing_id = borrow_book(db.pool(), book_id, member_id)
            .await
            .expect("borrow failed");
        assert!(borrowing_id > 0);
        assert_eq!(available(&db, book_id).await, 1);
    }

    #[tokio::test]
    async fn test_borrow_sets_due_date_two_weeks_out() {
        let (db, book_id, member_id) = setup(1).await;

        let before = Utc::now();
        let borrowing_id = borrow_book(db.pool(), book_id, member_id)
            .await
            .expect("borrow failed");
        let after = Utc::now();

        let borrowing = queries::find_borrowing_by_id(db.pool(), borrowing_id)
            .await
            .expect("find")
            .expect("missing");

        let offset = borrowing.due_date - borrowing.borrow_date;
        assert_eq!(offset, Duration::days(LOAN_PERIOD_DAYS));
        assert!(borrowing.borrow_date >= before && borrowing.borrow_date <= after);
        assert!(borrowing.is_open());
    }

    #[tokio::test]
    async fn test_borrow_exhausted_book_fails() {
        let (db, book_id, member_id) = setup(1).await;

        borrow_book(db.pool(), book_id, member_id).await.expect("first borrow");
        let err = borrow_book(db.pool(), book_id, member_id)
            .await
            .expect_err("second borrow must fail");

        assert!(matches!(err, LibraryError::NotAvailable { .. }));
        assert_eq!(available(&db, book_id).await, 0, "never negative");
    }

    #[tokio::test]
    async fn test_borrow_unknown_book_fails() {
        let (db, _, member_id) = setup(1).await;

        let err = borrow_book(db.pool(), 4242, member_id)
            .await
            .expect_err("unknown book must fail");
        assert!(matches!(err, LibraryError::NotAvailable { book_id: 4242 }));
    }

    #[tokio::test]
    async fn test_borrow_unknown_member_rolls_back_decrement() {
        // The insert fails on the member foreign key after the decrement has
        // executed inside the unit; the decrement must not stick.
        let (db, book_id, _) = setup(3).await;

        let err = borrow_book(db.pool(), book_id, 4242)
            .await
            .expect_err("unknown member must fail");
        assert!(!err.is_business_error());

        assert_eq!(available(&db, book_id).await, 3, "decrement was rolled back");

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowings")
            .fetch_one(db.pool())
            .await
            .expect("count");
        assert_eq!(rows, 0, "no borrowing row leaked");
    }

    #[tokio::test]
    async fn test_return_round_trip() {
        let (db, book_id, member_id) = setup(2).await;

        let borrowing_id = borrow_book(db.pool(), book_id, member_id).await.expect("borrow");
        assert_eq!(available(&db, book_id).await, 1);

        let changes = return_book(db.pool(), borrowing_id).await.expect("return");
        assert_eq!(changes, 1);
        assert_eq!(available(&db, book_id).await, 2, "availability restored");

        let borrowing = queries::find_borrowing_by_id(db.pool(), borrowing_id)
            .await
            .expect("find")
            .expect("missing");
        assert!(borrowing.return_date.is_some());
        assert_eq!(borrowing.status, "returned");
    }

    #[tokio::test]
    async fn test_return_is_idempotent() {
        let (db, book_id, member_id) = setup(1).await;

        let borrowing_id = borrow_book(db.pool(), book_id, member_id).await.expect("borrow");
        return_book(db.pool(), borrowing_id).await.expect("first return");

        let err = return_book(db.pool(), borrowing_id)
            .await
            .expect_err("second return must fail");
        assert!(matches!(err, LibraryError::BorrowingNotFound { .. }));

        assert_eq!(available(&db, book_id).await, 1, "credited exactly once");
    }

    #[tokio::test]
    async fn test_return_unknown_borrowing_fails() {
        let (db, _, _) = setup(1).await;

        let err = return_book(db.pool(), 77).await.expect_err("must fail");
        assert!(matches!(err, LibraryError::BorrowingNotFound { borrowing_id: 77 }));
    }

    #[tokio::test]
    async fn test_last_copy_contended_borrow() {
        // Two borrow attempts race for the last copy: exactly one may win.
        let (db, book_id, member_id) = setup(1).await;

        let (a, b) = tokio::join!(
            borrow_book(db.pool(), book_id, member_id),
            borrow_book(db.pool(), book_id, member_id),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|s| **s).count();
        assert_eq!(successes, 1, "exactly one borrow may succeed");

        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser, Err(LibraryError::NotAvailable { .. })));
        assert_eq!(available(&db, book_id).await, 0, "ends at 0, not -1");
    }

    #[tokio::test]
    async fn test_availability_invariant_over_mixed_sequence() {
        let (db, book_id, member_id) = setup(2).await;

        let b1 = borrow_book(db.pool(), book_id, member_id).await.expect("b1");
        let b2 = borrow_book(db.pool(), book_id, member_id).await.expect("b2");
        assert!(borrow_book(db.pool(), book_id, member_id).await.is_err());

        return_book(db.pool(), b1).await.expect("r1");
        let b3 = borrow_book(db.pool(), book_id, member_id).await.expect("b3");
        return_book(db.pool(), b2).await.expect("r2");
        return_book(db.pool(), b3).await.expect("r3");

        assert_eq!(available(&db, book_id).await, 2);

        let open: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE return_date IS NULL",
        )
        .fetch_one(db.pool())
        .await
        .expect("count");
        assert_eq!(open, 0);
    }
}

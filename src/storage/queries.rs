// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Database query functions
//!
//! Plain CRUD over books and members plus the joined borrowing listing.
//! Anything that moves `books.available` lives in the lending module, not
//! here.

use crate::error::{LibraryError, Result};
use crate::storage::models::*;
use chrono::Utc;
use sqlx::SqlitePool;

// ============================================================================
// BOOK QUERIES
// ============================================================================

/// Insert a new book
///
/// Every copy of a freshly added book starts out available.
/// Returns the id of the inserted book.
pub async fn insert_book(pool: &SqlitePool, book: &NewBook) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO books (title, author, isbn, category, quantity, available, added_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.isbn)
    .bind(&book.category)
    .bind(book.quantity)
    .bind(book.quantity)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(LibraryError::from_database)?;

    Ok(result.last_insert_rowid())
}

/// Find book by ID
pub async fn find_book_by_id(pool: &SqlitePool, book_id: i64) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
        .bind(book_id)
        .fetch_optional(pool)
        .await?;

    Ok(book)
}

/// Find book by ISBN
pub async fn find_book_by_isbn(pool: &SqlitePool, isbn: &str) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = ?")
        .bind(isbn)
        .fetch_optional(pool)
        .await?;

    Ok(book)
}

/// List all books, newest first
pub async fn list_books(pool: &SqlitePool) -> Result<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id DESC")
        .fetch_all(pool)
        .await?;

    Ok(books)
}

/// Update an existing book (full field set)
///
/// Returns the number of rows changed (0 when the id is unknown).
pub async fn update_book(pool: &SqlitePool, book: &Book) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE books SET
            title = ?, author = ?, isbn = ?, category = ?,
            quantity = ?, available = ?
        WHERE id = ?
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.isbn)
    .bind(&book.category)
    .bind(book.quantity)
    .bind(book.available)
    .bind(book.id)
    .execute(pool)
    .await
    .map_err(LibraryError::from_database)?;

    Ok(result.rows_affected())
}

/// Delete a book
///
/// Fails with [`LibraryError::OpenBorrowings`] while copies are out on loan.
/// Closed lending history for the book is removed in the same transaction,
/// so the foreign key never blocks a legitimate delete.
pub async fn delete_book(pool: &SqlitePool, book_id: i64) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let open: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrowings WHERE book_id = ? AND return_date IS NULL",
    )
    .bind(book_id)
    .fetch_one(&mut *tx)
    .await?;

    if open > 0 {
        return Err(LibraryError::OpenBorrowings {
            entity: "book",
            id: book_id,
            count: open,
        });
    }

    sqlx::query("DELETE FROM borrowings WHERE book_id = ?")
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(book_id)
        .execute(&mut *tx)
        .await
        .map_err(LibraryError::from_database)?;

    tx.commit().await?;

    Ok(result.rows_affected())
}

/// Search books by substring across title, author, ISBN and category
///
/// SQLite LIKE is case-insensitive for ASCII, which gives the required
/// matching without a lower() dance.
pub async fn search_books(pool: &SqlitePool, term: &str) -> Result<Vec<Book>> {
    let pattern = format!("%{}%", term);
    let books = sqlx::query_as::<_, Book>(
        r#"
        SELECT * FROM books
        WHERE title LIKE ? OR author LIKE ? OR isbn LIKE ? OR category LIKE ?
        ORDER BY title
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    Ok(books)
}

// ============================================================================
// MEMBER QUERIES
// ============================================================================

/// Insert a new member
///
/// Returns the id of the inserted member.
pub async fn insert_member(pool: &SqlitePool, member: &NewMember) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO members (name, contact, address, join_date) VALUES (?, ?, ?, ?)",
    )
    .bind(&member.name)
    .bind(&member.contact)
    .bind(&member.address)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(LibraryError::from_database)?;

    Ok(result.last_insert_rowid())
}

/// Find member by ID
pub async fn find_member_by_id(pool: &SqlitePool, member_id: i64) -> Result<Option<Member>> {
    let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = ?")
        .bind(member_id)
        .fetch_optional(pool)
        .await?;

    Ok(member)
}

/// List all members, newest first
pub async fn list_members(pool: &SqlitePool) -> Result<Vec<Member>> {
    let members = sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY id DESC")
        .fetch_all(pool)
        .await?;

    Ok(members)
}

/// Update an existing member
pub async fn update_member(pool: &SqlitePool, member: &Member) -> Result<u64> {
    let result = sqlx::query("UPDATE members SET name = ?, contact = ?, address = ? WHERE id = ?")
        .bind(&member.name)
        .bind(&member.contact)
        .bind(&member.address)
        .bind(member.id)
        .execute(pool)
        .await
        .map_err(LibraryError::from_database)?;

    Ok(result.rows_affected())
}

/// Delete a member
///
/// Same policy as [`delete_book`]: open borrowings block the delete outright,
/// closed ones are removed along with the member.
pub async fn delete_member(pool: &SqlitePool, member_id: i64) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let open: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrowings WHERE member_id = ? AND return_date IS NULL",
    )
    .bind(member_id)
    .fetch_one(&mut *tx)
    .await?;

    if open > 0 {
        return Err(LibraryError::OpenBorrowings {
            entity: "member",
            id: member_id,
            count: open,
        });
    }

    sqlx::query("DELETE FROM borrowings WHERE member_id = ?")
        .bind(member_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(member_id)
        .execute(&mut *tx)
        .await
        .map_err(LibraryError::from_database)?;

    tx.commit().await?;

    Ok(result.rows_affected())
}

// ============================================================================
// BORROWING QUERIES
// ============================================================================

/// Find a borrowing by ID
pub async fn find_borrowing_by_id(
    pool: &SqlitePool,
    borrowing_id: i64,
) -> Result<Option<Borrowing>> {
    let borrowing = sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = ?")
        .bind(borrowing_id)
        .fetch_optional(pool)
        .await?;

    Ok(borrowing)
}

/// List all borrowings joined with book title and member name
///
/// Ordered by borrow date descending; id breaks ties so same-instant
/// borrowings list deterministically.
pub async fn list_borrowings(pool: &SqlitePool) -> Result<Vec<BorrowingRecord>> {
    let borrowings = sqlx::query_as::<_, BorrowingRecord>(
        r#"
        SELECT b.id, b.book_id, b.member_id, b.borrow_date, b.due_date,
               b.return_date, b.status,
               books.title AS book_title,
               members.name AS member_name
        FROM borrowings b
        JOIN books ON b.book_id = books.id
        JOIN members ON b.member_id = members.id
        ORDER BY b.borrow_date DESC, b.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(borrowings)
}

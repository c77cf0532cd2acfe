// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Reporting facade
//!
//! Read-only aggregate views derived from the borrowings and books tables.
//! Nothing here mutates or caches; every view is recomputed per request,
//! which is fine for a single-branch library's data volumes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::storage::models::BorrowingRecord;

/// An open borrowing past its due date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueBorrowing {
    pub record: BorrowingRecord,
    /// Whole days past due
    pub days_late: i64,
}

/// Borrow count for one title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularityEntry {
    pub title: String,
    pub borrow_count: i64,
}

/// Entity activity counts for one calendar day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub books_added: i64,
    pub members_joined: i64,
    pub books_borrowed: i64,
    pub books_returned: i64,
}

/// Borrowings currently open, newest first
pub async fn active_borrowings(pool: &SqlitePool) -> Result<Vec<BorrowingRecord>> {
    let records = sqlx::query_as::<_, BorrowingRecord>(
        r#"
        SELECT b.id, b.book_id, b.member_id, b.borrow_date, b.due_date,
               b.return_date, b.status,
               books.title AS book_title,
               members.name AS member_name
        FROM borrowings b
        JOIN books ON b.book_id = books.id
        JOIN members ON b.member_id = members.id
        WHERE b.return_date IS NULL
        ORDER BY b.borrow_date DESC, b.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Open borrowings past due at `now`, with days late
pub async fn overdue_borrowings(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<Vec<OverdueBorrowing>> {
    let overdue = active_borrowings(pool)
        .await?
        .into_iter()
        .filter(|r| r.is_overdue(now))
        .map(|record| {
            let days_late = (now - record.due_date).num_days();
            OverdueBorrowing { record, days_late }
        })
        .collect();

    Ok(overdue)
}

/// Titles ranked by how often they have been borrowed, descending
///
/// Counts every borrowing ever made, open or closed. Ties keep
/// first-borrowed order: counting walks the borrowings in id order and the
/// final sort is stable.
pub async fn popularity_ranking(pool: &SqlitePool) -> Result<Vec<PopularityEntry>> {
    let titles: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT books.title
        FROM borrowings
        JOIN books ON borrowings.book_id = books.id
        ORDER BY borrowings.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut ranking: Vec<PopularityEntry> = Vec::new();
    for title in titles {
        match ranking.iter_mut().find(|e| e.title == title) {
            Some(entry) => entry.borrow_count += 1,
            None => ranking.push(PopularityEntry {
                title,
                borrow_count: 1,
            }),
        }
    }

    ranking.sort_by(|a, b| b.borrow_count.cmp(&a.borrow_count));

    Ok(ranking)
}

/// Activity counts for the given calendar day
pub async fn daily_stats(pool: &SqlitePool, day: NaiveDate) -> Result<DailyStats> {
    let books_added: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE DATE(added_date) = ?")
            .bind(day)
            .fetch_one(pool)
            .await?;

    let members_joined: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE DATE(join_date) = ?")
            .bind(day)
            .fetch_one(pool)
            .await?;

    let books_borrowed: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE DATE(borrow_date) = ?")
            .bind(day)
            .fetch_one(pool)
            .await?;

    let books_returned: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrowings WHERE return_date IS NOT NULL AND DATE(return_date) = ?",
    )
    .bind(day)
    .fetch_one(pool)
    .await?;

    Ok(DailyStats {
        books_added,
        members_joined,
        books_borrowed,
        books_returned,
    })
}

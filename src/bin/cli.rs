// Shelfmark - Library Management Core
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Desktop CLI for poking at a Shelfmark store without the UI.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use shelfmark_core::{Library, NewBook, NewMember};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shelfmark-cli")]
#[command(about = "Shelfmark CLI - Desktop library management tool", long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(short, long, default_value = "library.db")]
    database: PathBuf,

    /// Emit listings as JSON instead of columns
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book to the catalog
    AddBook {
        title: String,
        author: String,
        #[arg(short, long)]
        isbn: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// List all books
    Books,
    /// Search books by title/author/ISBN/category substring
    Search { term: String },
    /// Register a member
    AddMember {
        name: String,
        #[arg(short, long)]
        contact: Option<String>,
        #[arg(short, long)]
        address: Option<String>,
    },
    /// List all members
    Members,
    /// Borrow a book for a member
    Borrow { book_id: i64, member_id: i64 },
    /// Return a borrowed book
    Return { borrowing_id: i64 },
    /// List all borrowings
    Borrowings,
    /// List overdue borrowings
    Overdue,
    /// Show titles ranked by borrow count
    Popular,
    /// Show today's activity counts
    Stats,
    /// Copy the store file into a directory
    Backup { dest_dir: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    let library = Library::open(&cli.database).await?;

    match cli.command {
        Commands::AddBook {
            title,
            author,
            isbn,
            category,
            quantity,
        } => {
            let id = library
                .add_book(NewBook {
                    title,
                    author,
                    isbn,
                    category,
                    quantity,
                })
                .await?;
            println!("Added book {id}");
        }
        Commands::Books => {
            let books = library.books().await?;
            if cli.json {
                print_json(&books)?;
            } else {
                for book in books {
                    println!(
                        "#{:<4} {:<40} {:<24} {}/{}",
                        book.id, book.title, book.author, book.available, book.quantity
                    );
                }
            }
        }
        Commands::Search { term } => {
            for book in library.search_books(&term).await? {
                println!("#{:<4} {:<40} {}", book.id, book.title, book.author);
            }
        }
        Commands::AddMember {
            name,
            contact,
            address,
        } => {
            let id = library
                .add_member(NewMember {
                    name,
                    contact,
                    address,
                })
                .await?;
            println!("Added member {id}");
        }
        Commands::Members => {
            let members = library.members().await?;
            if cli.json {
                print_json(&members)?;
            } else {
                for member in members {
                    println!(
                        "#{:<4} {:<30} {}",
                        member.id,
                        member.name,
                        member.contact.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Commands::Borrow { book_id, member_id } => {
            match library.borrow_book(book_id, member_id).await {
                Ok(id) => println!("Borrowing {id} created"),
                Err(e) => println!("Rejected: {}", e.user_message()),
            }
        }
        Commands::Return { borrowing_id } => match library.return_book(borrowing_id).await {
            Ok(_) => println!("Borrowing {borrowing_id} returned"),
            Err(e) => println!("Rejected: {}", e.user_message()),
        },
        Commands::Borrowings => {
            let records = library.borrowings().await?;
            if cli.json {
                print_json(&records)?;
            } else {
                for rec in records {
                    println!(
                        "#{:<4} {:<32} {:<24} {:<10} due {}",
                        rec.id,
                        rec.book_title,
                        rec.member_name,
                        rec.status,
                        rec.due_date.format("%Y-%m-%d")
                    );
                }
            }
        }
        Commands::Overdue => {
            for od in library.overdue_borrowings(Utc::now()).await? {
                println!(
                    "#{:<4} {:<32} {:<24} {} day(s) late",
                    od.record.id, od.record.book_title, od.record.member_name, od.days_late
                );
            }
        }
        Commands::Popular => {
            for entry in library.popularity_ranking().await? {
                println!("{:<40} {}", entry.title, entry.borrow_count);
            }
        }
        Commands::Stats => {
            let stats = library.daily_stats(Utc::now().date_naive()).await?;
            println!("Books added:     {}", stats.books_added);
            println!("Members joined:  {}", stats.members_joined);
            println!("Books borrowed:  {}", stats.books_borrowed);
            println!("Books returned:  {}", stats.books_returned);
        }
        Commands::Backup { dest_dir } => {
            let path = library.backup(&dest_dir).await?;
            println!("Backup written to {}", path.display());
        }
    }

    Ok(())
}

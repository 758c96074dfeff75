//! Statistics command handler

use anyhow::Result;

use shelf_core::stats::{collection_summaries, LibraryStats};
use shelf_core::Store;

use crate::output::{Output, OutputFormat};

/// How many genres and years the human report lists
const REPORT_ROWS: usize = 10;

/// Show library statistics
pub fn show(store: &Store, output: &Output) -> Result<()> {
    let stats = LibraryStats::compute(store.library());
    let collections = collection_summaries(store.library());

    match output.format {
        OutputFormat::Json => output.json(&serde_json::json!({
            "library": stats,
            "collections": collections
        })),
        OutputFormat::Quiet => {
            println!("{} {} {}", stats.total_books, stats.read_books, stats.unread_books);
        }
        OutputFormat::Human => {
            println!("Library Statistics");
            println!("==================");
            println!();
            println!("Books:    {}", stats.total_books);
            println!(
                "Read:     {} ({:.1}%)",
                stats.read_books, stats.read_percentage
            );
            println!("Unread:   {}", stats.unread_books);
            println!("Genres:   {}", stats.genre_count);
            println!("Authors:  {}", stats.author_count);
            match stats.average_rating {
                Some(avg) => println!("Rating:   {:.1} average", avg),
                None => println!("Rating:   (no rated books)"),
            }

            if !stats.books_by_genre.is_empty() {
                println!();
                println!("By genre:");
                for count in stats.books_by_genre.iter().take(REPORT_ROWS) {
                    println!("  {:<24} {}", count.label, count.count);
                }
            }

            if !stats.top_authors.is_empty() {
                println!();
                println!("Top authors:");
                for count in &stats.top_authors {
                    println!("  {:<24} {}", count.label, count.count);
                }
            }

            if !stats.genre_completion.is_empty() {
                println!();
                println!("Completion by genre:");
                for genre in stats.genre_completion.iter().take(REPORT_ROWS) {
                    println!(
                        "  {:<24} {}/{} ({:.0}%)",
                        genre.genre, genre.read, genre.total, genre.rate
                    );
                }
            }

            if !stats.books_by_year.is_empty() {
                println!();
                println!("By publication year (latest {}):", REPORT_ROWS);
                let skip = stats.books_by_year.len().saturating_sub(REPORT_ROWS);
                for (year, count) in stats.books_by_year.iter().skip(skip) {
                    println!("  {:<24} {}", year, count);
                }
            }

            if !stats.monthly_progress.is_empty() {
                println!();
                println!("Monthly progress:");
                for month in &stats.monthly_progress {
                    println!(
                        "  {}  +{} added, {} read  (total {} added, {} read)",
                        month.month,
                        month.added,
                        month.read,
                        month.cumulative_added,
                        month.cumulative_read
                    );
                }
            }

            if !collections.is_empty() {
                println!();
                println!("Collections:");
                for summary in &collections {
                    println!(
                        "  {:<24} {} book(s), {:.0}% read",
                        summary.name, summary.book_count, summary.read_percentage
                    );
                }
            }
        }
    }
    Ok(())
}

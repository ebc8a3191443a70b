// Output module
// Renders recommendation lists for the CLI


use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::engine::Recommendation;

const DESCRIPTION_WORD_LIMIT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// Render recommendations in the requested format.
#[inline]
pub fn render(recommendations: &[Recommendation], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(recommendations)),
        OutputFormat::Json => render_json(recommendations),
        OutputFormat::Csv => render_csv(recommendations),
    }
}

fn render_table(recommendations: &[Recommendation]) -> String {
    use std::fmt::Write;

    if recommendations.is_empty() {
        return "No matching books found.\n".to_string();
    }

    let mut out = String::new();
    for (rank, rec) in recommendations.iter().enumerate() {
        let book = &rec.book;
        let _ = writeln!(
            out,
            "{}. {} — {}",
            rank + 1,
            book.title,
            format_authors(&book.authors)
        );
        let _ = write!(
            out,
            "   Rating: {:.2}  Score: {:.3}  ISBN-13: {}",
            book.average_rating, rec.similarity, book.isbn13
        );
        if let Some(year) = book.published_year {
            let _ = write!(out, "  Year: {}", year);
        }
        if let Some(pages) = book.num_pages {
            let _ = write!(out, "  Pages: {}", pages);
        }
        out.push('\n');
        if !book.description.trim().is_empty() {
            let _ = writeln!(
                out,
                "   {}",
                truncate_words(&book.description, DESCRIPTION_WORD_LIMIT)
            );
        }
        out.push('\n');
    }
    out
}

fn render_json(recommendations: &[Recommendation]) -> Result<String> {
    serde_json::to_string_pretty(recommendations).context("Failed to serialize recommendations")
}

#[derive(Serialize)]
struct CsvRow<'a> {
    isbn13: i64,
    title: &'a str,
    authors: String,
    average_rating: f32,
    published_year: Option<i32>,
    num_pages: Option<u32>,
    similarity: f32,
}

fn render_csv(recommendations: &[Recommendation]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for rec in recommendations {
        writer
            .serialize(CsvRow {
                isbn13: rec.book.isbn13,
                title: &rec.book.title,
                authors: format_authors(&rec.book.authors),
                average_rating: rec.book.average_rating,
                published_year: rec.book.published_year,
                num_pages: rec.book.num_pages,
                similarity: rec.similarity,
            })
            .context("Failed to write CSV row")?;
    }
    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

/// Join the dataset's semicolon-separated author list for display:
/// "A" stays "A", "A;B" becomes "A and B", longer lists use commas with a
/// final "and".
#[inline]
pub fn format_authors(raw: &str) -> String {
    let authors: Vec<&str> = raw
        .split(';')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();

    match authors.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Truncate text to `limit` words, appending an ellipsis when shortened.
#[inline]
pub fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        words.join(" ")
    } else {
        format!("{}...", words[..limit].join(" "))
    }
}

/// Word-limited description used by both the CLI table and the web cards.
#[inline]
pub fn short_description(text: &str) -> String {
    truncate_words(text, DESCRIPTION_WORD_LIMIT)
}

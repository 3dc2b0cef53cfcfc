use colored::Colorize;
use memvec::search::preview;
use memvec::indexer::IndexEvent;
use memvec::{FileMatch, IndexReport, StatusReport};
use std::path::Path;

/// Characters of the closest segment shown per search result.
const RESULT_PREVIEW_CHARS: usize = 100;

fn display_name(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string())
}

pub fn print_index_event(event: IndexEvent<'_>) {
    match event {
        IndexEvent::Indexed { file, chunks } => println!(
            "  {} {} ({} chunks)",
            "✓".green(),
            display_name(&file.to_string_lossy()),
            chunks
        ),
        IndexEvent::Failed { file, error } => eprintln!(
            "  {} {}: {}",
            "✗".red(),
            display_name(&file.to_string_lossy()),
            error
        ),
    }
}

pub fn print_index_summary(report: &IndexReport) {
    println!();
    println!(
        "{} Complete: {} files, {} chunks",
        "✓".green(),
        report.files_processed,
        report.total_chunks
    );
    if !report.errors.is_empty() {
        println!("{} {} file(s) failed", "✗".red(), report.errors.len());
    }
}

pub fn print_search_results(query: &str, results: &[FileMatch]) {
    println!("Searching for: {}", query.bold());
    println!();

    if results.is_empty() {
        println!("No results found.");
        return;
    }

    for result in results {
        println!("{}", result.source.bold());
        println!("   Distance: {:.4}", result.min_distance);
        println!("   Tags: {}", result.tags);
        if let Some(first) = result.chunks.first() {
            println!(
                "   Preview: {}",
                preview(&first.content, RESULT_PREVIEW_CHARS).dimmed()
            );
        }
        println!();
    }
}

pub fn search_results_json(query: &str, results: &[FileMatch]) -> serde_json::Value {
    serde_json::json!({
        "query": query,
        "results_count": results.len(),
        "results": results,
    })
}

pub fn print_status(status: &StatusReport) {
    println!("{}", "=== EMBEDDING SYSTEM STATUS ===".bold());
    println!();
    for (key, value) in status.entries() {
        println!("  {}: {}", key, value);
    }
}

//! Console output for command results

use crate::ingest::{DeleteOutcome, DocumentListing, IndexingOutcome, IngestOutcome};
use crate::reconcile::SweepReport;
use crate::retrieve::RetrievalResponse;

/// Print an ingest result to console
pub fn print_ingest_outcome(outcome: &IngestOutcome) {
    let doc = &outcome.document;
    println!("\n✓ Ingested '{}'", doc.original_name);
    println!("  ID: {}", doc.id);
    println!("  Type: {} ({} bytes)", doc.file_type, doc.file_size);
    println!("  Status: {}", doc.status);

    match &outcome.indexing {
        IndexingOutcome::Succeeded { chunk_count } => {
            println!("  Chunks indexed: {}", chunk_count);
        }
        IndexingOutcome::Degraded { cause } => {
            println!("  ⚠ Indexing failed (document is stored, search may miss it):");
            println!("    {}", cause);
            println!("    Run 'archivist reconcile' once the index is back.");
        }
    }

    println!("  Embedding source: {}", outcome.embedding_source);
}

/// Print a document listing to console
pub fn print_documents(listing: &DocumentListing) {
    println!("\n📚 Documents\n");

    if listing.documents.is_empty() {
        println!("No documents uploaded. Use 'archivist ingest <file>' to add one.");
    }

    for doc in &listing.documents {
        println!("• {} [{}]", doc.original_name, doc.file_type);
        println!("  ID: {}", doc.id);
        println!(
            "  Status: {}, Chunks: {}, Size: {} bytes",
            doc.status, doc.chunk_count, doc.file_size
        );
        println!("  Created: {}", doc.created_at);
        println!();
    }

    if !listing.index_health.reachable {
        println!("⚠ Vector index unreachable; chunk counts may be stale.");
    }
}

/// Print query results to console
pub fn print_query_results(response: &RetrievalResponse) {
    if response.results.is_empty() {
        println!("\nNo results.");
        return;
    }

    println!("\n🔍 Results ({})\n", response.results.len());

    for (i, result) in response.results.iter().enumerate() {
        println!(
            "{}. [score {:.3}] document {} (chunk {})",
            i + 1,
            result.score,
            result.document_id,
            result.chunk_index
        );
        println!("   {}", excerpt(&result.content, 200));
        println!();
    }

    println!("Embedding source: {}", response.embedding_source);
}

/// Print a delete result to console
pub fn print_delete_outcome(outcome: &DeleteOutcome) {
    println!("✓ Deleted document {}", outcome.document_id);
    if !outcome.index_cleaned {
        println!("⚠ Index cleanup failed; run 'archivist reconcile' to sweep orphaned vectors.");
    }
}

/// Print a sweep report to console
pub fn print_sweep_report(report: &SweepReport) {
    println!("\n🔧 Reconciliation\n");
    println!("Documents examined: {}", report.examined);
    println!("Chunk counts corrected: {}", report.counts_corrected);
    println!("Orphaned index entries removed: {}", report.orphans_removed);
    if report.failures > 0 {
        println!("⚠ {} repairs failed; re-run once the index is reachable.", report.failures);
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let text = "héllo ".repeat(100);
        let cut = excerpt(&text, 50);
        assert!(cut.chars().count() <= 51);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_excerpt_short_text_unchanged() {
        assert_eq!(excerpt("hello world", 200), "hello world");
    }
}

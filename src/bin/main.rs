mod util;

use clap::{Parser, Subcommand};
use memvec::{
    LocalEmbedder, MemoryDirs, MemoryIndexer, MemorySearcher, SqliteVectorStore, collect_status,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "memvec")]
#[command(version, about = "Vector embedding service for a markdown memory tree", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Root of the memory tree
    #[clap(
        long,
        global = true,
        env = "MEMVEC_MEMORY_DIR",
        help = "Root of the memory tree containing profiles/, core/, knowledge/ and sessions/daily/."
    )]
    memory_dir: Option<PathBuf>,
    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

#[derive(Subcommand)]
enum Commands {
    /// Reindex every memory file
    Embed,
    /// Search indexed memory
    Search {
        /// Search query
        #[clap(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Maximum number of files to return
        #[clap(long, default_value = "5", help = "Maximum number of files to return.")]
        limit: usize,
        /// Output results as json instead of pretty text
        #[clap(long, help = "Output search results as json.")]
        json: bool,
    },
    /// Reindex a single file
    Update {
        /// Path of the memory file to reindex
        file: PathBuf,
    },
    /// Show store and memory tree diagnostics
    Status {
        /// Output status as json instead of pretty text
        #[clap(long, help = "Output status as json.")]
        json: bool,
    },
    /// Delete the on-disk vector store
    Clear,
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // usage errors exit with 1, --help and --version with 0
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let dirs = match cli.memory_dir {
        Some(root) => MemoryDirs::with_memory_root(root),
        None => MemoryDirs::new(),
    };

    match cli.command {
        Commands::Embed => {
            let memory_root = dirs.memory_root();
            println!("Embedding all memory files in: {}", memory_root.display());

            let embedder = LocalEmbedder::new_with_default_model()?;
            let store = SqliteVectorStore::open(&dirs.store_path())?;
            let report = MemoryIndexer::new(&embedder, &store)
                .index_all_with(&memory_root, util::print_index_event)?;

            util::print_index_summary(&report);
        }
        Commands::Search { query, limit, json } => {
            let query = query.join(" ");

            let embedder = LocalEmbedder::new_with_default_model()?;
            let store = SqliteVectorStore::open(&dirs.store_path())?;
            let results = MemorySearcher::new(&embedder, &store).search(&query, Some(limit))?;

            if json {
                let json_output = util::search_results_json(&query, &results);
                println!("{}", serde_json::to_string_pretty(&json_output)?);
            } else {
                util::print_search_results(&query, &results);
            }
        }
        Commands::Update { file } => {
            let embedder = LocalEmbedder::new_with_default_model()?;
            let store = SqliteVectorStore::open(&dirs.store_path())?;
            let chunks = MemoryIndexer::new(&embedder, &store).index_file(&file)?;

            println!("Updated: {} ({} chunks)", file.display(), chunks);
        }
        Commands::Status { json } => {
            let status = collect_status(&dirs.memory_root());
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                util::print_status(&status);
            }
        }
        Commands::Clear => {
            if SqliteVectorStore::destroy(&dirs.store_path())? {
                println!("Embeddings cleared");
            } else {
                println!("No embeddings to clear");
            }
        }
    }
    Ok(())
}

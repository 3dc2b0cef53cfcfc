pub mod render;

pub use render::{print_index_event, print_index_summary, print_search_results, print_status, search_results_json};

//! # visual-search CLI
//!
//! Command-line interface for property visual search.
//!
//! ## Usage
//! ```bash
//! visual-search import catalog.json
//! visual-search index --photos ./photos
//! visual-search search kitchen.jpg --output json
//! ```

mod cli;

use property_visual_search::Result;

fn main() -> Result<()> {
    property_visual_search::init_tracing();
    cli::run()
}

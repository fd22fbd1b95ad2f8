//! # CLI Module
//!
//! Command-line interface for property visual search.
//!
//! ## Usage
//! ```bash
//! # Load listings and their photo locations
//! visual-search import catalog.json
//!
//! # Fingerprint every photo (paths resolve against --photos)
//! visual-search index --photos ./photos
//!
//! # Find look-alike listings
//! visual-search search kitchen.jpg --city lisbon --limit 5
//!
//! # JSON output
//! visual-search search kitchen.jpg --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use property_visual_search::core::features::{FeatureExtractor, ImageFeatures};
use property_visual_search::core::imaging::ContainerFormat;
use property_visual_search::core::indexing::{BatchIndexingOutcome, IndexingPipeline};
use property_visual_search::core::scoring::{Comparison, SimilarityScorer};
use property_visual_search::core::search::{
    SearchFilter, SearchOrchestrator, SearchResponse, UploadedFile,
};
use property_visual_search::core::store::{
    ByteFetcher, Catalog, FeatureStore, FileFetcher, IndexStats, ListingType, SqliteStore,
};
use property_visual_search::error::{Result, VisualSearchError};
use property_visual_search::events::{Event, EventChannel, IndexEvent};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// Property Visual Search - find listings that look like your photo
#[derive(Parser, Debug)]
#[command(name = "visual-search")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Index database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the visual fingerprint of an image
    Features {
        image: PathBuf,
    },

    /// Score two images against each other
    Compare {
        query: PathBuf,
        candidate: PathBuf,
    },

    /// Load properties and photo locations from a JSON catalog
    Import {
        catalog: PathBuf,
    },

    /// Fingerprint the photos of properties (all properties if none given)
    Index {
        property_ids: Vec<String>,

        /// Directory relative photo paths resolve against
        #[arg(long)]
        photos: Option<PathBuf>,
    },

    /// Find properties with photos similar to an image
    Search {
        image: PathBuf,

        /// Minimum similarity (0-1)
        #[arg(long)]
        min_similarity: Option<f64>,

        /// Maximum number of results (capped at 20)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only properties offered this way (repeatable)
        #[arg(long = "listing-type")]
        listing_types: Vec<ListingTypeArg>,

        /// City substring, case-insensitive
        #[arg(long)]
        city: Option<String>,

        /// Country substring, case-insensitive
        #[arg(long)]
        country: Option<String>,

        /// Full filter as JSON (overrides the individual flags)
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show how much of the catalog is indexed
    Stats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListingTypeArg {
    Sale,
    Rent,
    ShortTermRent,
}

impl From<ListingTypeArg> for ListingType {
    fn from(arg: ListingTypeArg) -> Self {
        match arg {
            ListingTypeArg::Sale => ListingType::Sale,
            ListingTypeArg::Rent => ListingType::Rent,
            ListingTypeArg::ShortTermRent => ListingType::ShortTermRent,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let term = Term::stderr();
    let db_path = cli.db.unwrap_or_else(default_db_path);

    match cli.command {
        Commands::Features { image } => run_features(&term, cli.output, &image),
        Commands::Compare { query, candidate } => {
            run_compare(&term, cli.output, &query, &candidate)
        }
        Commands::Import { catalog } => run_import(&term, cli.output, &db_path, &catalog),
        Commands::Index {
            property_ids,
            photos,
        } => run_index(&term, cli.output, &db_path, property_ids, photos),
        Commands::Search {
            image,
            min_similarity,
            limit,
            listing_types,
            city,
            country,
            filter,
        } => {
            let filter = match filter {
                Some(json) => SearchFilter::from_json(&json)?,
                None => SearchFilter {
                    min_similarity,
                    limit,
                    listing_types: (!listing_types.is_empty())
                        .then(|| listing_types.into_iter().map(Into::into).collect()),
                    city,
                    country,
                },
            };
            run_search(&term, cli.output, &db_path, &image, &filter)
        }
        Commands::Stats => run_stats(&term, cli.output, &db_path),
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("property-visual-search")
        .join("index.db")
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    Ok(FileFetcher::new().fetch(&path.to_string_lossy())?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| VisualSearchError::Config(format!("could not render JSON: {e}")))?;
    println!("{json}");
    Ok(())
}

fn run_features(term: &Term, output: OutputFormat, image: &Path) -> Result<()> {
    let features = FeatureExtractor::extract(&read_image(image)?)?;
    match output {
        OutputFormat::Json => print_json(&features),
        OutputFormat::Pretty => {
            print_features(term, &features);
            Ok(())
        }
    }
}

fn print_features(term: &Term, features: &ImageFeatures) {
    term.write_line(&format!("  {} {}", style("pHash:").dim(), style(&features.p_hash).cyan()))
        .ok();
    term.write_line(&format!(
        "  {} {}",
        style("Colors:").dim(),
        features.dominant_colors.join(" ")
    ))
    .ok();
    term.write_line(&format!("  {} {}", style("Aspect ratio:").dim(), features.aspect_ratio))
        .ok();
    term.write_line(&format!("  {} {}", style("Brightness:").dim(), features.brightness))
        .ok();
}

fn run_compare(term: &Term, output: OutputFormat, query: &Path, candidate: &Path) -> Result<()> {
    let query = FeatureExtractor::extract(&read_image(query)?)?;
    let candidate = FeatureExtractor::extract(&read_image(candidate)?)?;
    let comparison = SimilarityScorer::compare(&query, &candidate);

    match output {
        OutputFormat::Json => print_json(&comparison),
        OutputFormat::Pretty => {
            print_comparison(term, &comparison);
            Ok(())
        }
    }
}

fn print_comparison(term: &Term, comparison: &Comparison) {
    term.write_line(&format!(
        "{} {}",
        style("Similarity:").bold(),
        style(format!("{:.1}%", comparison.similarity * 100.0)).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  structural {:.3}  color {:.3}  composition {:.3}",
        comparison.breakdown.structural,
        comparison.breakdown.color_palette,
        comparison.breakdown.composition
    ))
    .ok();
    term.write_line(&format!("  {}", style(&comparison.explanation).italic()))
        .ok();
}

fn run_import(term: &Term, output: OutputFormat, db_path: &Path, catalog: &Path) -> Result<()> {
    let store = SqliteStore::open(db_path)?;
    let (properties, media) = store.import_catalog(Catalog::from_json_file(catalog)?)?;

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "properties": properties,
            "media": media,
            "db": store.path(),
        })),
        OutputFormat::Pretty => {
            term.write_line(&format!(
                "{} Imported {} properties and {} media items into {}",
                style("✓").green().bold(),
                style(properties).cyan(),
                style(media).cyan(),
                store.path().display()
            ))
            .ok();
            Ok(())
        }
    }
}

fn run_index(
    term: &Term,
    output: OutputFormat,
    db_path: &Path,
    property_ids: Vec<String>,
    photos: Option<PathBuf>,
) -> Result<()> {
    let store = Arc::new(SqliteStore::open(db_path)?);
    let property_ids = if property_ids.is_empty() {
        store.property_ids()?
    } else {
        property_ids
    };
    let fetcher = match photos {
        Some(dir) => FileFetcher::with_base_dir(dir),
        None => FileFetcher::new(),
    };

    let (sender, receiver) = EventChannel::new();
    let pipeline = IndexingPipeline::builder()
        .media(store.clone())
        .store(store.clone())
        .fetcher(Arc::new(fetcher))
        .events(sender)
        .build()?;

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Index(IndexEvent::Started {
                    property_id,
                    total_photos,
                }) => {
                    pb.inc_length(total_photos as u64);
                    pb.set_message(property_id);
                }
                Event::Index(
                    IndexEvent::PhotoIndexed { .. }
                    | IndexEvent::PhotoSkipped { .. }
                    | IndexEvent::PhotoFailed { .. },
                ) => pb.inc(1),
                _ => {}
            }
        }
    });

    let batch = pipeline.index_properties(property_ids.as_slice());

    // Dropping the pipeline drops its sender and ends the event thread
    drop(pipeline);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match output {
        OutputFormat::Json => print_json(&batch),
        OutputFormat::Pretty => {
            print_batch(term, &batch, &store.stats()?);
            Ok(())
        }
    }
}

fn print_batch(term: &Term, batch: &BatchIndexingOutcome, stats: &IndexStats) {
    term.write_line(&format!("{} Indexing Complete", style("✓").green().bold()))
        .ok();
    term.write_line(&format!(
        "  {} photos indexed, {} failed across {} properties",
        style(batch.indexed_count).cyan(),
        style(batch.failed_count).yellow(),
        batch.outcomes.len()
    ))
    .ok();

    for outcome in &batch.outcomes {
        for failure in &outcome.failures {
            term.write_line(&format!(
                "    {} {}/{}: {}",
                style("✗").red(),
                outcome.property_id,
                failure.photo_id,
                style(&failure.error).dim()
            ))
            .ok();
        }
    }
    for failure in &batch.property_failures {
        term.write_line(&format!(
            "    {} {}: {}",
            style("✗").red(),
            failure.property_id,
            style(&failure.error).dim()
        ))
        .ok();
    }

    print_stats(term, stats);
}

fn run_search(
    term: &Term,
    output: OutputFormat,
    db_path: &Path,
    image: &Path,
    filter: &SearchFilter,
) -> Result<()> {
    let bytes = read_image(image)?;
    let store: Arc<dyn FeatureStore> = Arc::new(SqliteStore::open(db_path)?);
    let orchestrator = SearchOrchestrator::builder().store(store).build()?;

    orchestrator.validate_upload(Some(&UploadedFile {
        media_type: ContainerFormat::sniff(&bytes).media_type().to_string(),
        size_bytes: bytes.len() as u64,
    }))?;

    let response = orchestrator.find_similar(&bytes, filter)?;

    match output {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Pretty => {
            print_search(term, &response);
            Ok(())
        }
    }
}

fn print_search(term: &Term, response: &SearchResponse) {
    term.write_line(&format!(
        "{} {} similar properties in {}ms",
        style("✓").green().bold(),
        style(response.total).cyan(),
        response.processing_time_ms
    ))
    .ok();
    term.write_line("").ok();

    if response.results.is_empty() {
        term.write_line("  No similar properties found.").ok();
        return;
    }

    for (rank, result) in response.results.iter().enumerate() {
        term.write_line(&format!(
            "  {} {} {}",
            style(format!("{}.", rank + 1)).bold(),
            style(&result.property_id).bold(),
            style(format!("{:.1}%", result.similarity * 100.0)).cyan()
        ))
        .ok();
        term.write_line(&format!("     {}", result.explanation)).ok();
        term.write_line(&format!(
            "     {} {}",
            style("photo:").dim(),
            result
                .matched_photo
                .thumbnail_url
                .as_deref()
                .unwrap_or(&result.matched_photo.url)
        ))
        .ok();
    }
}

fn run_stats(term: &Term, output: OutputFormat, db_path: &Path) -> Result<()> {
    let stats = SqliteStore::open(db_path)?.stats()?;
    match output {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Pretty => {
            print_stats(term, &stats);
            Ok(())
        }
    }
}

fn print_stats(term: &Term, stats: &IndexStats) {
    term.write_line(&format!(
        "  {} of {} photos indexed ({}%)",
        style(stats.indexed_photos).cyan(),
        stats.total_photos,
        stats.coverage_percent
    ))
    .ok();
}

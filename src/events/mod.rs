//! # Events Module
//!
//! Progress reporting for indexing and search.
//!
//! ## Design
//! The core library emits events through channels so a CLI or any
//! other front end can subscribe without the core knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Index(IndexEvent::PhotoFailed { photo_id, message, .. }) = event {
//!             eprintln!("{photo_id}: {message}");
//!         }
//!     }
//! });
//!
//! let pipeline = IndexingPipeline::builder()
//!     .media(media)
//!     .store(store)
//!     .fetcher(fetcher)
//!     .events(sender)
//!     .build()?;
//! pipeline.index_property("p1")?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;

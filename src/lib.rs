//! Episode and season identity resolution against an external metadata
//! catalog: merged-release compaction, alternate episode orderings and
//! alias-based reattachment of unidentified files.

pub mod catalog;
pub mod config;
pub mod error;
pub mod library;
pub mod resolve;

pub use catalog::{Catalog, TmdbClient};
pub use error::{Error, Result};
pub use library::{Library, ShowHistory};
pub use resolve::{ResolvedMovieMetadata, ResolvedTvMetadata, Resolver};

//! Blobs - connected region records for image segmentation.
//!
//! This library provides the data layer of a blob extraction pipeline:
//! - Packed horizontal runs ([`HLine`]) with validated bit fields
//! - Finished blob records with bounds, pixel count, moments and orientation
//! - A compact 32-bit blob identity ([`Bid`])
//! - Pooled builder lists for the labeling pass ([`DLList`], [`ListPool`])
//! - Run-based 8-connected labeling and a compressed storage form
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use blobs::{label_runs_pooled, HorizontalLine, ListPool};
//!
//! let pool = ListPool::new();
//! let runs = [HorizontalLine::new(0, 3, 0), HorizontalLine::new(1, 2, 1)];
//! let mut blobs = label_runs_pooled(&pool, &runs, None)?;
//!
//! let blob = &mut blobs[0].blob;
//! blob.calculate_properties()?;
//! blob.calculate_moments()?;
//! println!("{} at {:?}, angle {}", blob.blob_id(), blob.center(), blob.orientation());
//! ```

pub mod bid;
pub mod blob;
pub mod bounds;
pub mod brototype;
pub mod compressed;
pub mod error;
pub mod hline;
pub mod labeling;
pub mod list;

// ============================================================================
// Runs and records
// ============================================================================

pub use bid::Bid;
pub use blob::{Blob, Moments, Properties};
pub use bounds::Bounds;
pub use compressed::{CompressedBlob, ShortLine};
pub use error::{BlobError, Result};
pub use hline::{HLine, HorizontalLine, Line32, Line64};

// ============================================================================
// Labeling
// ============================================================================

pub use brototype::Brototype;
pub use labeling::{LabeledBlob, label_runs, label_runs_pooled};
pub use list::{DLList, ListError, ListPool, NodeId, NodeState, PooledList};

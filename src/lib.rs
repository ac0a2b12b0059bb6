//! # pgx-ann
//!
//! An in-memory, persistable approximate-nearest-neighbour proximity-graph
//! search library.
//!
//! Given a dataset of fixed-dimension numeric vectors, builds a
//! neighbourhood graph answering top-k and radius queries under a chosen
//! distance metric, with incremental insertion/deletion and a
//! product-quantised inverted-index variant for memory-constrained search.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pgx_ann::{GraphKind, IndexFacade, IndexKind, IndexOptions, Metric, NeverCancel, ScalarKind};
//!
//! # fn main() -> pgx_ann::Result<()> {
//! let mut index = IndexFacade::create(
//!     IndexKind::Graph,
//!     GraphKind::Anng,
//!     Metric::L2,
//!     ScalarKind::F32,
//!     4,
//!     IndexOptions::default(),
//!     &[],
//! )?;
//! let id = index.insert(&[1.0, 2.0, 3.0, 4.0])?;
//! let outcome = index.search(&[1.0, 2.0, 3.0, 4.0], 1, f32::INFINITY, 0.1, &NeverCancel)?;
//! assert_eq!(outcome.hits[0].id, id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod concurrency;
pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod metric;
pub mod object_id;
pub mod quantized;
pub mod scalar;
pub mod search;
pub mod simd;
pub mod store;
mod sync;
pub mod util;

pub use concurrency::{ConcurrencyEnvelope, Operation, OperationPolicy};
pub use error::{Error, Result};
pub use graph::{AdjacencyList, Edge, GraphKind, NeighbourhoodGraph};
pub use index::{EdgeSizeForSearch, IndexFacade, IndexKind, IndexOptions, SeedKind};
pub use metric::Metric;
pub use object_id::ObjectId;
pub use quantized::{QuantisationParams, QuantisedInvertedIndex};
pub use scalar::ScalarKind;
pub use search::{CancellationToken, Hit, NeverCancel, SearchOutcome, SearchParams};
pub use store::{ObjectStore, VectorView};

//! Clients for the catalog's external collaborators: the embedding
//! provider and the vector index.
//!
//! The conversation runtime never talks to these services directly;
//! it goes through the [`Embedder`] and [`VectorIndex`] traits so the
//! tool registry can be constructed with injected handles (and tests
//! can substitute in-memory fakes).

mod embedding;
mod error;
mod index;
mod product;

pub use embedding::{Embedder, OpenAiEmbedder};
pub use error::{Error, Result};
pub use index::{Point, QdrantIndex, RetrievedPoint, ScoredPoint, VectorIndex, check_dimensions};
pub use product::{Payload, Product, product_url};

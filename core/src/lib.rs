//! Course recommendation engine: TF-IDF similarity over catalog text blended with a popularity prior.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod handle;
pub mod persist;
pub mod popularity;
pub mod tokenizer;
pub mod vectorizer;

pub use catalog::{parse_enrollment, parse_rating, CatalogItem};
pub use engine::{Engine, ScoredItem, DEFAULT_TOP_K};
pub use error::LoadError;
pub use handle::{EngineHandle, Readiness, Status};

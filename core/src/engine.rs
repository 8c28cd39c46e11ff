//! The recommendation engine: built once, then queried read-only.

use crate::catalog::{load_items, read_items, CatalogItem};
use crate::error::LoadError;
use crate::popularity::{normalize, raw_popularity};
use crate::vectorizer::{SparseVector, TfidfModel};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

pub const DEFAULT_TOP_K: usize = 5;
pub const SIMILARITY_WEIGHT: f64 = 0.85;
pub const POPULARITY_WEIGHT: f64 = 0.15;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedRecord {
    item: CatalogItem,
    vector: SparseVector,
    popularity: f64,
}

/// A ranked result with the parts of its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    pub item: CatalogItem,
    pub score: f64,
    pub similarity: f64,
    pub popularity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    model: TfidfModel,
    records: Vec<IndexedRecord>,
}

impl Engine {
    /// Build from a CSV corpus on disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Ok(Self::from_items(load_items(path)?))
    }

    /// Build from CSV read out of any reader.
    pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self, LoadError> {
        Ok(Self::from_items(read_items(reader, origin)?))
    }

    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        let texts: Vec<String> = items.iter().map(CatalogItem::composite_text).collect();
        let (model, vectors) = TfidfModel::fit_transform(&texts);
        let raw: Vec<f64> = items.iter().map(|i| raw_popularity(i.rating, i.students_enrolled)).collect();
        let popularity = normalize(&raw);

        let records: Vec<IndexedRecord> = items
            .into_iter()
            .zip(vectors)
            .zip(popularity)
            .map(|((item, vector), popularity)| IndexedRecord { item, vector, popularity })
            .collect();

        tracing::info!(num_items = records.len(), num_terms = model.num_terms(), "engine built");
        Self { model, records }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn num_terms(&self) -> usize { self.model.num_terms() }

    /// Popularity of every record, in corpus order.
    pub fn popularity(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.popularity).collect()
    }

    /// Up to `top_k` items best-first; an empty or blank query falls back to [`Engine::trending`].
    pub fn recommend(&self, query: &str, top_k: usize) -> Vec<CatalogItem> {
        self.rank(query, top_k).into_iter().map(|s| s.item).collect()
    }

    /// Up to `top_k` items by descending popularity, ties in corpus order.
    pub fn trending(&self, top_k: usize) -> Vec<CatalogItem> {
        self.rank_trending(top_k).into_iter().map(|s| s.item).collect()
    }

    /// Like [`Engine::recommend`] but keeps the score breakdown.
    pub fn rank(&self, query: &str, top_k: usize) -> Vec<ScoredItem> {
        if query.trim().is_empty() {
            return self.rank_trending(top_k);
        }
        let q = self.model.transform(query);
        tracing::debug!(query_len = query.len(), query_terms = q.entries.len(), "scoring query");

        let scored = self.records.iter().map(|r| {
            let similarity = if q.is_empty() { 0.0 } else { r.vector.cosine(&q) };
            (similarity, SIMILARITY_WEIGHT * similarity + POPULARITY_WEIGHT * r.popularity)
        });
        self.top(scored, top_k)
    }

    pub fn rank_trending(&self, top_k: usize) -> Vec<ScoredItem> {
        self.top(self.records.iter().map(|r| (0.0, r.popularity)), top_k)
    }

    fn top(&self, scored: impl Iterator<Item = (f64, f64)>, top_k: usize) -> Vec<ScoredItem> {
        let mut order: Vec<(usize, f64, f64)> =
            scored.enumerate().map(|(idx, (sim, score))| (idx, sim, score)).collect();
        // Stable sort keeps corpus order among equal scores.
        order.sort_by(|a, b| b.2.total_cmp(&a.2));
        order
            .into_iter()
            .take(top_k)
            .map(|(idx, similarity, score)| {
                let r = &self.records[idx];
                ScoredItem { item: r.item.clone(), score, similarity, popularity: r.popularity }
            })
            .collect()
    }
}

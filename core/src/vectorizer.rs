use crate::tokenizer::analyze;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub type TermId = u32;

/// Terms must occur in at least this many records to enter the vocabulary.
pub const MIN_DF: u32 = 2;

/// L2-normalized sparse vector, entries sorted by term id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub entries: Vec<(TermId, f64)>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Cosine similarity of two unit vectors; 0.0 when either is zero.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            match a.cmp(&b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot
    }
}

/// Vocabulary and IDF weights fitted once over the corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfModel {
    pub dictionary: HashMap<String, TermId>,
    pub idf: Vec<f64>,
}

impl TfidfModel {
    /// Fit the model and return it with one vector per document.
    pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> (Self, Vec<SparseVector>) {
        let analyzed: Vec<Vec<String>> = documents.iter().map(|d| analyze(d.as_ref())).collect();

        let mut df: BTreeMap<&str, u32> = BTreeMap::new();
        for terms in &analyzed {
            let unique: BTreeSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        // BTreeMap iteration keeps ids in lexicographic term order.
        let n = documents.len() as f64;
        let mut dictionary = HashMap::new();
        let mut idf = Vec::new();
        for (term, count) in df.into_iter().filter(|(_, c)| *c >= MIN_DF) {
            dictionary.insert(term.to_string(), idf.len() as TermId);
            idf.push(((1.0 + n) / (1.0 + count as f64)).ln() + 1.0);
        }

        let model = Self { dictionary, idf };
        let vectors = analyzed.iter().map(|terms| model.weigh(terms)).collect();
        (model, vectors)
    }

    pub fn num_terms(&self) -> usize { self.idf.len() }

    /// Vectorize new text against the fixed vocabulary. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&analyze(text))
    }

    fn weigh(&self, terms: &[String]) -> SparseVector {
        let mut tf: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in terms {
            if let Some(&tid) = self.dictionary.get(term) {
                *tf.entry(tid).or_insert(0) += 1;
            }
        }
        let mut entries: Vec<(TermId, f64)> = tf
            .into_iter()
            .map(|(tid, count)| (tid, count as f64 * self.idf[tid as usize]))
            .collect();
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() { *w /= norm; }
        }
        SparseVector { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rare_terms_are_pruned() {
        let docs = ["python basics", "python advanced", "cooking basics"];
        let (model, _) = TfidfModel::fit_transform(&docs);
        assert!(model.dictionary.contains_key("python"));
        assert!(model.dictionary.contains_key("basics"));
        assert!(!model.dictionary.contains_key("cooking"));
        assert!(!model.dictionary.contains_key("python basics"));
    }

    #[test]
    fn bigrams_enter_when_shared() {
        let docs = ["machine learning intro", "applied machine learning"];
        let (model, _) = TfidfModel::fit_transform(&docs);
        assert!(model.dictionary.contains_key("machine learning"));
    }

    #[test]
    fn vectors_are_unit_length() {
        let docs = ["python basics", "python advanced", "basics of python"];
        let (_, vectors) = TfidfModel::fit_transform(&docs);
        for v in &vectors {
            let norm: f64 = v.entries.iter().map(|(_, w)| w * w).sum();
            assert!((norm - 1.0).abs() < 1e-9);
            assert!((v.cosine(v) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn single_document_has_empty_vocabulary() {
        let (model, vectors) = TfidfModel::fit_transform(&["only one course"]);
        assert_eq!(model.num_terms(), 0);
        assert!(vectors[0].is_empty());
        assert_eq!(model.transform("course").cosine(&vectors[0]), 0.0);
    }

    #[test]
    fn out_of_vocabulary_query_is_zero() {
        let docs = ["python basics", "python advanced"];
        let (model, _) = TfidfModel::fit_transform(&docs);
        assert!(model.transform("gardening").is_empty());
    }
}

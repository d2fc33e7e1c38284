//! Term-vector cache and the dedupe/batch/reassemble step around inference.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::{EmbedError, Result};

/// LRU cache of term vectors. Capacity 0 disables caching.
pub(crate) struct TermCache {
    inner: Option<Mutex<LruCache<String, Vec<f32>>>>,
}

/// Vectors in input order plus how many distinct texts went to the model.
pub(crate) struct Resolved {
    pub vectors: Vec<Vec<f32>>,
    pub computed: usize,
}

impl TermCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|n| Mutex::new(LruCache::new(n))),
        }
    }

    fn lookup(&self, texts: &[String]) -> Vec<Option<Vec<f32>>> {
        match self.inner.as_ref().and_then(|c| c.lock().ok()) {
            Some(mut guard) => texts.iter().map(|t| guard.get(t).cloned()).collect(),
            None => vec![None; texts.len()],
        }
    }

    fn store(&self, texts: &[String], vectors: &[Vec<f32>]) {
        if let Some(mut guard) = self.inner.as_ref().and_then(|c| c.lock().ok()) {
            for (text, vector) in texts.iter().zip(vectors) {
                guard.put(text.clone(), vector.clone());
            }
        }
    }

    /// Return one vector per text, in input order.
    ///
    /// Cached texts are served directly. Each distinct miss is sent to
    /// `embed_chunk` once, in chunks of at most `batch_size`, and cached.
    pub fn resolve<F>(
        &self,
        model: &str,
        texts: &[String],
        batch_size: usize,
        mut embed_chunk: F,
    ) -> Result<Resolved>
    where
        F: FnMut(&[String]) -> Result<Vec<Vec<f32>>>,
    {
        let mut slots = self.lookup(texts);

        let misses: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.is_none().then_some(i))
            .collect();

        let mut pending: Vec<String> = Vec::new();
        let mut pending_index: HashMap<&str, usize> = HashMap::new();
        for &i in &misses {
            pending_index.entry(texts[i].as_str()).or_insert_with(|| {
                pending.push(texts[i].clone());
                pending.len() - 1
            });
        }

        let mut fresh: Vec<Vec<f32>> = Vec::with_capacity(pending.len());
        for chunk in pending.chunks(batch_size.max(1)) {
            let vectors = embed_chunk(chunk)?;
            if vectors.len() != chunk.len() {
                return Err(EmbedError::CountMismatch {
                    model: model.to_string(),
                    expected: chunk.len(),
                    found: vectors.len(),
                });
            }
            self.store(chunk, &vectors);
            fresh.extend(vectors);
        }

        for &i in &misses {
            slots[i] = Some(fresh[pending_index[texts[i].as_str()]].clone());
        }

        Ok(Resolved {
            vectors: slots.into_iter().flatten().collect(),
            computed: pending.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Encodes each text as `[len, first byte]` and records every chunk seen.
    fn recording(seen: &mut Vec<Vec<String>>) -> impl FnMut(&[String]) -> Result<Vec<Vec<f32>>> + '_ {
        move |chunk| {
            seen.push(chunk.to_vec());
            Ok(chunk
                .iter()
                .map(|t| vec![t.len() as f32, t.bytes().next().unwrap_or(0) as f32])
                .collect())
        }
    }

    #[test]
    fn test_duplicates_embedded_once_and_order_kept() {
        let cache = TermCache::new(0);
        let texts = terms(&["rash", "cleft lip", "rash", "fever", "cleft lip"]);
        let mut seen = Vec::new();

        let out = cache.resolve("m", &texts, 32, recording(&mut seen)).unwrap();

        assert_eq!(seen, vec![terms(&["rash", "cleft lip", "fever"])]);
        assert_eq!(out.computed, 3);
        assert_eq!(out.vectors.len(), 5);
        assert_eq!(out.vectors[0], vec![4.0, b'r' as f32]);
        assert_eq!(out.vectors[1], vec![9.0, b'c' as f32]);
        assert_eq!(out.vectors[0], out.vectors[2]);
        assert_eq!(out.vectors[1], out.vectors[4]);
        assert_eq!(out.vectors[3], vec![5.0, b'f' as f32]);
    }

    #[test]
    fn test_cache_hits_mixed_with_misses() {
        let cache = TermCache::new(16);
        let mut seen = Vec::new();
        cache
            .resolve("m", &terms(&["rash", "fever"]), 32, recording(&mut seen))
            .unwrap();

        let mut seen = Vec::new();
        let texts = terms(&["seizure", "rash", "ataxia", "fever"]);
        let out = cache.resolve("m", &texts, 32, recording(&mut seen)).unwrap();

        assert_eq!(seen, vec![terms(&["seizure", "ataxia"])]);
        assert_eq!(out.computed, 2);
        let firsts: Vec<f32> = out.vectors.iter().map(|v| v[1]).collect();
        assert_eq!(firsts, vec![b's' as f32, b'r' as f32, b'a' as f32, b'f' as f32]);
    }

    #[test]
    fn test_pending_split_into_batches() {
        let cache = TermCache::new(0);
        let texts = terms(&["a", "bb", "ccc", "dddd", "eeeee"]);
        let mut seen = Vec::new();

        let out = cache.resolve("m", &texts, 2, recording(&mut seen)).unwrap();

        let sizes: Vec<usize> = seen.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        let lens: Vec<f32> = out.vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lens, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_short_batch_is_count_mismatch() {
        let cache = TermCache::new(16);
        let err = cache
            .resolve("m", &terms(&["rash", "fever"]), 32, |_| Ok(vec![vec![1.0]]))
            .err()
            .unwrap();
        assert!(matches!(err, EmbedError::CountMismatch { expected: 2, found: 1, .. }));
    }
}

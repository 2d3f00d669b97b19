use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use crate::foundation::error::KakijunResult;
use crate::glyph::{BakedGlyph, bake};
use crate::ops::{self, AlphaParams, TransformParams};
use crate::svg::Artifact;

use super::fingerprint::{Fingerprint, OpTag, StableHasher, fingerprint_base};

#[derive(Clone, Debug)]
pub struct OpCacheOpts {
    /// Transform and composite results kept across passes.
    pub capacity: usize,
    /// Range results kept per range node for its current base.
    pub range_capacity: usize,
    /// Range nodes with a live slot; the least recently used slot is dropped first.
    pub range_slots: usize,
}

impl Default for OpCacheOpts {
    fn default() -> Self {
        Self {
            capacity: 256,
            range_capacity: 64,
            range_slots: 128,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub range_slots: usize,
}

/// Range results of one node for one base document.
struct RangeSlot {
    base: Fingerprint,
    baked: BakedGlyph,
    results: LruCache<(u32, u32), Artifact>,
}

/// Content-fingerprinted memoization of the document operations.
///
/// Owned by one evaluator (no process-wide state). A changed input changes the key, so
/// plain entries need no invalidation; range slots are reset when their base changes.
pub struct OpCache {
    entries: Mutex<LruCache<Fingerprint, Artifact>>,
    ranges: Mutex<LruCache<String, RangeSlot>>,
    range_capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for OpCache {
    fn default() -> Self {
        Self::new(OpCacheOpts::default())
    }
}

impl OpCache {
    pub fn new(opts: OpCacheOpts) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(non_zero(opts.capacity))),
            ranges: Mutex::new(LruCache::new(non_zero(opts.range_slots))),
            range_capacity: non_zero(opts.range_capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Bake `input` and select the clamped `[start, end]` range.
    ///
    /// `Ok(None)` when the input has no stroke carriers. Results are kept in `node`'s slot
    /// until that node sees a different base.
    pub fn range(
        &self,
        node: &str,
        input: &Artifact,
        start: i64,
        end: i64,
    ) -> KakijunResult<Option<Artifact>> {
        let base = fingerprint_base(input);
        let mut ranges = lock(&self.ranges);
        let reset = ranges.peek(node).is_none_or(|slot| slot.base != base);
        if reset {
            if ranges.pop(node).is_some() {
                tracing::debug!(node, "range base changed; clearing slot");
            }
            let baked = bake(input.as_str())?;
            ranges.put(
                node.to_string(),
                RangeSlot {
                    base,
                    baked,
                    results: LruCache::new(self.range_capacity),
                },
            );
        }
        let Some(slot) = ranges.get_mut(node) else {
            return Ok(None);
        };
        if !slot.baked.has_strokes() {
            return Ok(None);
        }
        let (s, e) = ops::clamp_bounds(start, end, slot.baked.count);
        if let Some(hit) = slot.results.get(&(s, e)) {
            self.hit(OpTag::Range);
            return Ok(Some(hit.clone()));
        }
        self.miss(OpTag::Range);
        let out = ops::select_range(&slot.baked.svg, s, e);
        slot.results.put((s, e), out.clone());
        Ok(Some(out))
    }

    pub fn transform(&self, input: &Artifact, params: TransformParams) -> Artifact {
        let params = params.sanitized();
        let mut h = StableHasher::tagged(OpTag::Transform);
        h.write_artifact(input);
        for v in [params.tx, params.ty, params.sx, params.sy] {
            h.write_f64(v);
        }
        self.memo(OpTag::Transform, h.finish(), || {
            ops::apply_transform(input, params)
        })
    }

    pub fn composite(&self, a: &Artifact, b: &Artifact) -> Artifact {
        if a.same(b) {
            return a.clone();
        }
        let mut h = StableHasher::tagged(OpTag::Composite);
        h.write_artifact(a);
        h.write_artifact(b);
        self.memo(OpTag::Composite, h.finish(), || ops::composite(a, b))
    }

    pub fn composite_alpha(&self, a: &Artifact, b: &Artifact, params: AlphaParams) -> Artifact {
        let mut h = StableHasher::tagged(OpTag::CompositeAlpha);
        h.write_artifact(a);
        h.write_artifact(b);
        h.write_f64(params.alpha_a);
        h.write_f64(params.alpha_b);
        h.write_bool(params.swap);
        self.memo(OpTag::CompositeAlpha, h.finish(), || {
            ops::composite_alpha(a, b, params)
        })
    }

    /// Drop the range slot of a node that left the graph.
    pub fn forget_node(&self, node: &str) {
        lock(&self.ranges).pop(node);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: lock(&self.entries).len(),
            range_slots: lock(&self.ranges).len(),
        }
    }

    fn memo(&self, tag: OpTag, key: Fingerprint, compute: impl FnOnce() -> Artifact) -> Artifact {
        if let Some(hit) = lock(&self.entries).get(&key).cloned() {
            self.hit(tag);
            return hit;
        }
        self.miss(tag);
        // Computed outside the lock; racing writers store the same value.
        let out = compute();
        lock(&self.entries).put(key, out.clone());
        out
    }

    fn hit(&self, tag: OpTag) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(op = ?tag, "op cache hit");
    }

    fn miss(&self, tag: OpTag) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(op = ?tag, "op cache miss");
    }
}

fn non_zero(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "../../tests/unit/cache/ops.rs"]
mod tests;

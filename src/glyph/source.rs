use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{KakijunError, KakijunResult};

#[cfg(feature = "remote")]
use super::fetch::HttpFetcher;
use super::fetch::{DirFetcher, GlyphFetcher};

/// Public KanjiVG mirror used as the first tier when remote fetching is enabled.
pub const DEFAULT_REMOTE_BASE: &str =
    "https://raw.githubusercontent.com/KanjiVG/kanjivg/master/kanji";

/// How often a waiting resolver re-checks the caller's cancellation token.
const CANCEL_POLL: Duration = Duration::from_millis(25);

#[derive(Clone, Debug)]
pub struct GlyphSourceOpts {
    /// Remote tier base URL; `None` disables the remote tier.
    pub remote_base: Option<String>,
    /// Directory holding `<codepoint_id>.svg` files.
    pub local_root: PathBuf,
    /// Upper bound per tier.
    pub timeout: Duration,
    /// Resolved glyphs kept in memory.
    pub cache_capacity: usize,
}

impl Default for GlyphSourceOpts {
    fn default() -> Self {
        Self {
            remote_base: if cfg!(feature = "remote") {
                Some(DEFAULT_REMOTE_BASE.to_string())
            } else {
                None
            },
            local_root: PathBuf::from("kanji"),
            timeout: Duration::from_secs(6),
            cache_capacity: 512,
        }
    }
}

/// Raw glyph source text for one character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphArtifact {
    pub codepoint_id: String,
    pub source: Arc<str>,
}

/// Resolves characters to raw glyph sources through an ordered list of tiers.
///
/// Successful resolutions are cached by codepoint id; failures are not, so a later call
/// retries every tier.
pub struct GlyphSource {
    tiers: Vec<Arc<dyn GlyphFetcher>>,
    timeout: Duration,
    cache: Mutex<LruCache<String, GlyphArtifact>>,
}

impl GlyphSource {
    pub fn new(opts: GlyphSourceOpts) -> Self {
        let mut tiers: Vec<Arc<dyn GlyphFetcher>> = Vec::with_capacity(2);
        if let Some(remote) = remote_tier(&opts) {
            tiers.push(remote);
        }
        tiers.push(Arc::new(DirFetcher::new(opts.local_root.clone())));
        Self::with_tiers(tiers, opts.timeout, opts.cache_capacity)
    }

    /// Build a source over explicit tiers, tried in order.
    pub fn with_tiers(
        tiers: Vec<Arc<dyn GlyphFetcher>>,
        timeout: Duration,
        cache_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            tiers,
            timeout,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn resolve(&self, ch: &str) -> KakijunResult<GlyphArtifact> {
        self.resolve_with_cancel(ch, &CancelToken::new())
    }

    #[tracing::instrument(level = "debug", skip(self, cancel))]
    pub fn resolve_with_cancel(
        &self,
        ch: &str,
        cancel: &CancelToken,
    ) -> KakijunResult<GlyphArtifact> {
        let id = codepoint_id(ch)?;
        if let Some(hit) = self.lock_cache().get(&id).cloned() {
            tracing::debug!(codepoint_id = %id, "glyph cache hit");
            return Ok(hit);
        }

        for tier in &self.tiers {
            if cancel.is_cancelled() {
                return Err(KakijunError::cancelled(format!("resolution of {id} cancelled")));
            }
            match fetch_bounded(Arc::clone(tier), &id, self.timeout, cancel) {
                Ok(text) => {
                    tracing::debug!(codepoint_id = %id, tier = tier.tier(), "glyph resolved");
                    let artifact = GlyphArtifact {
                        codepoint_id: id.clone(),
                        source: Arc::from(text),
                    };
                    self.lock_cache().put(id, artifact.clone());
                    return Ok(artifact);
                }
                Err(e @ KakijunError::Cancelled(_)) if cancel.is_cancelled() => return Err(e),
                Err(e) => {
                    tracing::debug!(codepoint_id = %id, tier = tier.tier(), error = %e, "glyph tier failed");
                }
            }
        }
        Err(KakijunError::not_found(format!(
            "no source tier produced glyph {id}"
        )))
    }

    /// Number of cached glyphs.
    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache<String, GlyphArtifact>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "remote")]
fn remote_tier(opts: &GlyphSourceOpts) -> Option<Arc<dyn GlyphFetcher>> {
    let base = opts.remote_base.as_ref()?;
    Some(Arc::new(HttpFetcher::new(base.clone(), opts.timeout)))
}

#[cfg(not(feature = "remote"))]
fn remote_tier(opts: &GlyphSourceOpts) -> Option<Arc<dyn GlyphFetcher>> {
    if opts.remote_base.is_some() {
        tracing::warn!("remote glyph tier requested but the `remote` feature is disabled");
    }
    None
}

/// Lowercase hex of the single code point in `ch`, zero-padded to 5 digits.
pub fn codepoint_id(ch: &str) -> KakijunResult<String> {
    let mut chars = ch.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(format!("{:05x}", u32::from(c))),
        _ => Err(KakijunError::invalid_input(format!(
            "expected exactly one character, got {ch:?}"
        ))),
    }
}

/// Run one tier on its own thread and wait for it, bounded by `timeout` and `cancel`.
///
/// An abandoned fetch keeps running until it returns; its result is dropped.
fn fetch_bounded(
    tier: Arc<dyn GlyphFetcher>,
    id: &str,
    timeout: Duration,
    cancel: &CancelToken,
) -> KakijunResult<String> {
    let tier_cancel = CancelToken::new();
    let (tx, rx) = mpsc::sync_channel(1);
    let worker_cancel = tier_cancel.clone();
    let worker_id = id.to_string();
    std::thread::Builder::new()
        .name("kakijun-fetch".to_string())
        .spawn(move || {
            let _ = tx.send(tier.fetch(&worker_id, &worker_cancel));
        })
        .map_err(|e| KakijunError::Other(anyhow::Error::new(e)))?;

    let deadline = Instant::now() + timeout;
    loop {
        let now = Instant::now();
        if now >= deadline {
            tier_cancel.cancel();
            return Err(KakijunError::not_found(format!(
                "fetch of {id} timed out after {timeout:?}"
            )));
        }
        match rx.recv_timeout((deadline - now).min(CANCEL_POLL)) {
            Ok(result) => return result,
            Err(RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    tier_cancel.cancel();
                    return Err(KakijunError::cancelled(format!("fetch of {id} cancelled")));
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(KakijunError::not_found(format!(
                    "fetch of {id} ended without a result"
                )));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/glyph/source.rs"]
mod tests;

use std::path::PathBuf;

use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{KakijunError, KakijunResult};

/// One tier of glyph source resolution.
///
/// Implementations may block; the caller bounds them with a timeout and may stop waiting at
/// any point, so a fetcher should check `cancel` between expensive steps.
pub trait GlyphFetcher: Send + Sync {
    /// Short label used in logs (`remote`, `local`).
    fn tier(&self) -> &str;

    /// Fetch the raw SVG text for a 5-hex-digit codepoint id.
    fn fetch(&self, codepoint_id: &str, cancel: &CancelToken) -> KakijunResult<String>;
}

/// Remote tier: `GET <base>/<codepoint_id>.svg`.
#[cfg(feature = "remote")]
pub struct HttpFetcher {
    base: String,
    agent: ureq::Agent,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    pub fn new(base: impl Into<String>, timeout: std::time::Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            base: base.into(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn url_for(&self, codepoint_id: &str) -> String {
        format!("{}/{codepoint_id}.svg", self.base.trim_end_matches('/'))
    }
}

#[cfg(feature = "remote")]
impl GlyphFetcher for HttpFetcher {
    fn tier(&self) -> &str {
        "remote"
    }

    fn fetch(&self, codepoint_id: &str, cancel: &CancelToken) -> KakijunResult<String> {
        if cancel.is_cancelled() {
            return Err(KakijunError::cancelled("remote fetch cancelled"));
        }
        let url = self.url_for(codepoint_id);
        // Non-2xx statuses surface as errors.
        let mut resp = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| KakijunError::not_found(format!("GET {url}: {e}")))?;
        if cancel.is_cancelled() {
            return Err(KakijunError::cancelled("remote fetch cancelled"));
        }
        resp.body_mut()
            .read_to_string()
            .map_err(|e| KakijunError::not_found(format!("read body of {url}: {e}")))
    }
}

/// Local tier: `<root>/<codepoint_id>.svg` on the filesystem.
#[derive(Clone, Debug)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, codepoint_id: &str) -> PathBuf {
        self.root.join(format!("{codepoint_id}.svg"))
    }
}

impl GlyphFetcher for DirFetcher {
    fn tier(&self) -> &str {
        "local"
    }

    fn fetch(&self, codepoint_id: &str, cancel: &CancelToken) -> KakijunResult<String> {
        if cancel.is_cancelled() {
            return Err(KakijunError::cancelled("local fetch cancelled"));
        }
        let path = self.path_for(codepoint_id);
        std::fs::read_to_string(&path)
            .map_err(|e| KakijunError::not_found(format!("read '{}': {e}", path.display())))
    }
}

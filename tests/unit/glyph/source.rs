use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

struct Static {
    body: Option<&'static str>,
    calls: AtomicUsize,
}

impl Static {
    fn ok(body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            body: Some(body),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            body: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GlyphFetcher for Static {
    fn tier(&self) -> &str {
        "static"
    }

    fn fetch(&self, codepoint_id: &str, _cancel: &CancelToken) -> KakijunResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body
            .map(|b| b.replace("{id}", codepoint_id))
            .ok_or_else(|| KakijunError::not_found("static miss"))
    }
}

struct Slow(Duration);

impl GlyphFetcher for Slow {
    fn tier(&self) -> &str {
        "slow"
    }

    fn fetch(&self, _codepoint_id: &str, _cancel: &CancelToken) -> KakijunResult<String> {
        std::thread::sleep(self.0);
        Ok("<svg/>".to_string())
    }
}

fn dyn_tier<T: GlyphFetcher + 'static>(tier: &Arc<T>) -> Arc<dyn GlyphFetcher> {
    tier.clone()
}

fn slow(d: Duration) -> Arc<dyn GlyphFetcher> {
    Arc::new(Slow(d))
}

fn source(tiers: Vec<Arc<dyn GlyphFetcher>>, timeout: Duration) -> GlyphSource {
    GlyphSource::with_tiers(tiers, timeout, 8)
}

#[test]
fn codepoint_ids_are_five_lowercase_hex_digits() {
    assert_eq!(codepoint_id("永").unwrap(), "06c38");
    assert_eq!(codepoint_id("a").unwrap(), "00061");
    assert_eq!(codepoint_id("😀").unwrap(), "1f600");
}

#[test]
fn anything_but_one_character_is_invalid_input() {
    for bad in ["", "ab", "永永"] {
        assert!(matches!(
            codepoint_id(bad),
            Err(KakijunError::InvalidInput(_))
        ));
    }
    let src = source(vec![dyn_tier(&Static::ok("<svg/>"))], Duration::from_secs(1));
    assert!(matches!(src.resolve(""), Err(KakijunError::InvalidInput(_))));
}

#[test]
fn first_successful_tier_wins_and_is_cached() {
    let first = Static::failing();
    let second = Static::ok("<svg id=\"{id}\"/>");
    let src = source(
        vec![dyn_tier(&first), dyn_tier(&second)],
        Duration::from_secs(1),
    );

    let art = src.resolve("永").unwrap();
    assert_eq!(art.codepoint_id, "06c38");
    assert_eq!(&*art.source, "<svg id=\"06c38\"/>");
    assert_eq!(src.cached_len(), 1);

    let again = src.resolve("永").unwrap();
    assert!(Arc::ptr_eq(&art.source, &again.source));
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
}

#[test]
fn failures_are_not_cached() {
    let tier = Static::failing();
    let src = source(vec![dyn_tier(&tier)], Duration::from_secs(1));
    assert!(matches!(src.resolve("永"), Err(KakijunError::NotFound(_))));
    assert!(matches!(src.resolve("永"), Err(KakijunError::NotFound(_))));
    assert_eq!(tier.calls(), 2);
    assert_eq!(src.cached_len(), 0);
}

#[test]
fn slow_tier_times_out_and_falls_through() {
    let fallback = Static::ok("<svg/>");
    let src = source(
        vec![slow(Duration::from_millis(500)), dyn_tier(&fallback)],
        Duration::from_millis(50),
    );
    let started = Instant::now();
    let art = src.resolve("永").unwrap();
    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(&*art.source, "<svg/>");
    assert_eq!(fallback.calls(), 1);
}

#[test]
fn caller_cancellation_stops_waiting() {
    let fallback = Static::ok("<svg/>");
    let src = source(
        vec![slow(Duration::from_secs(2)), dyn_tier(&fallback)],
        Duration::from_secs(5),
    );
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        trigger.cancel();
    });
    let started = Instant::now();
    let result = src.resolve_with_cancel("永", &cancel);
    canceller.join().unwrap();
    assert!(matches!(result, Err(KakijunError::Cancelled(_))));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(fallback.calls(), 0);
    assert_eq!(src.cached_len(), 0);
}

#[test]
fn already_cancelled_token_skips_every_tier() {
    let tier = Static::ok("<svg/>");
    let src = source(vec![dyn_tier(&tier)], Duration::from_secs(1));
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        src.resolve_with_cancel("永", &cancel),
        Err(KakijunError::Cancelled(_))
    ));
    assert_eq!(tier.calls(), 0);
}

#[test]
fn local_directory_tier_reads_codepoint_files() {
    let dir = std::env::temp_dir().join(format!("kakijun-source-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("06c38.svg"), "<svg>ei</svg>").unwrap();

    let src = GlyphSource::new(GlyphSourceOpts {
        remote_base: None,
        local_root: dir.clone(),
        timeout: Duration::from_secs(1),
        cache_capacity: 4,
    });
    assert_eq!(&*src.resolve("永").unwrap().source, "<svg>ei</svg>");
    assert!(matches!(src.resolve("水"), Err(KakijunError::NotFound(_))));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn cache_is_bounded() {
    let src = source(vec![dyn_tier(&Static::ok("<svg/>"))], Duration::from_secs(1));
    for c in "一二三四五六七八九十".chars() {
        src.resolve(&c.to_string()).unwrap();
    }
    assert_eq!(src.cached_len(), 8);
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::foundation::error::KakijunError;

struct Scripted {
    outcome: fn() -> KakijunResult<Option<Artifact>>,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(outcome: fn() -> KakijunResult<Option<Artifact>>) -> (Box<dyn Executor>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let exec: Box<dyn Executor> = Box::new(Self {
            outcome,
            calls: Arc::clone(&calls),
        });
        (exec, calls)
    }
}

impl Executor for Scripted {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn evaluate(&self, _graph: &Graph, _target: &NodeId) -> KakijunResult<Option<Artifact>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

fn target() -> NodeId {
    NodeId::from("n")
}

#[test]
fn success_never_touches_the_fallback() {
    let (primary, p_calls) = Scripted::new(|| Ok(Some(Artifact::from("<svg/>"))));
    let (fallback, f_calls) = Scripted::new(|| Ok(None));
    let exec = FallbackExecutor::new(primary, fallback);
    assert_eq!(
        exec.evaluate(&Graph::new(), &target()).unwrap(),
        Some(Artifact::from("<svg/>"))
    );
    assert_eq!(p_calls.load(Ordering::SeqCst), 1);
    assert_eq!(f_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn none_from_the_primary_is_final() {
    let (primary, _) = Scripted::new(|| Ok(None));
    let (fallback, f_calls) = Scripted::new(|| Ok(Some(Artifact::from("<svg/>"))));
    let exec = FallbackExecutor::new(primary, fallback);
    assert_eq!(exec.evaluate(&Graph::new(), &target()).unwrap(), None);
    assert_eq!(f_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn errors_retry_on_the_fallback() {
    let (primary, _) = Scripted::new(|| Err(KakijunError::evaluation("boom")));
    let (fallback, f_calls) = Scripted::new(|| Ok(Some(Artifact::from("<svg id=\"w\"/>"))));
    let exec = FallbackExecutor::new(primary, fallback);
    assert_eq!(
        exec.evaluate(&Graph::new(), &target()).unwrap(),
        Some(Artifact::from("<svg id=\"w\"/>"))
    );
    assert_eq!(f_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn both_failing_reports_the_fallback_error() {
    let (primary, _) = Scripted::new(|| Err(KakijunError::evaluation("primary")));
    let (fallback, _) = Scripted::new(|| Err(KakijunError::evaluation("fallback")));
    let exec = FallbackExecutor::new(primary, fallback);
    let err = exec.evaluate(&Graph::new(), &target()).unwrap_err();
    assert_eq!(err.to_string(), "evaluation error: fallback");
}

#[test]
fn panic_payloads_render_as_text() {
    let caught = std::panic::catch_unwind(|| panic!("bad {}", 7)).unwrap_err();
    assert_eq!(crate::exec::panic_message(caught.as_ref()), "bad 7");
    let caught = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
    assert_eq!(crate::exec::panic_message(caught.as_ref()), "static");
}

#[test]
fn evaluator_node_failures_stay_on_the_in_process_primary() {
    let settings = crate::exec::ExecutorSettings::default();
    let primary: Box<dyn Executor> =
        Box::new(crate::exec::InProcessExecutor::from_settings(&settings));
    let (fallback, f_calls) = Scripted::new(|| Ok(Some(Artifact::from("<svg/>"))));
    let exec = FallbackExecutor::new(primary, fallback);

    let mut g = Graph::new();
    g.add_node(target(), crate::graph::NodeKind::range(1, 2)).unwrap();
    assert_eq!(exec.evaluate(&g, &target()).unwrap(), None);
    assert_eq!(exec.evaluate(&g, &NodeId::from("absent")).unwrap(), None);
    assert_eq!(f_calls.load(Ordering::SeqCst), 0);
}

//! Execution policy end to end: response caching, timeouts, brute-force
//! throttling and CSRF protection. Timing tests run on the paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lintel_kernel::action::{ActionDescriptor, ActionError};
use lintel_kernel::component::{ComponentSpec, Origin};
use lintel_kernel::request::{Parameter, PathSegment, RouteDescriptor, Session};
use lintel_kernel::security::SESSION_TOKEN_KEY;
use lintel_kernel::{DispatchOutcome, KernelConfig, KernelError, RawRequest};
use lintel_testing::components::{
    CountingReportComponent, FormComponent, SecretComponent, SlowComponent,
};
use lintel_testing::dispatcher;

fn report_spec(calls: &Arc<AtomicUsize>, action: ActionDescriptor) -> ComponentSpec {
    let calls = calls.clone();
    ComponentSpec::new("report", Origin::App, move || {
        Box::new(CountingReportComponent {
            calls: calls.clone(),
        })
    })
    .with_actions(move |actions| actions.register(action.clone()))
}

fn report_action() -> ActionDescriptor {
    ActionDescriptor::new(
        "report.show",
        "report",
        "show",
        RouteDescriptor::new(vec![
            PathSegment::fixed("report"),
            PathSegment::numeric("id"),
        ]),
    )
}

fn body_of(outcome: DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Handled { response, .. } => response.body_string(),
        other => panic!("expected a handled dispatch, got {other:?}"),
    }
}

// ── Caching ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cached_actions_serve_repeats_without_reexecuting() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = dispatcher(
        vec![report_spec(&calls, report_action().cached())],
        KernelConfig::default(),
    );

    let first = dispatcher
        .dispatch(&RawRequest::http("/report/7"))
        .await
        .unwrap();
    assert_eq!(body_of(first), "report 7");

    let second = dispatcher
        .dispatch(&RawRequest::http("/report/7"))
        .await
        .unwrap();
    assert_eq!(body_of(second), "report 7");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cache_keys_differentiate_bound_values() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = dispatcher(
        vec![report_spec(&calls, report_action().cached())],
        KernelConfig::default(),
    );

    let one = dispatcher
        .dispatch(&RawRequest::http("/report/1"))
        .await
        .unwrap();
    let two = dispatcher
        .dispatch(&RawRequest::http("/report/2"))
        .await
        .unwrap();
    assert_eq!(body_of(one), "report 1");
    assert_eq!(body_of(two), "report 2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // the first key is still warm
    let again = dispatcher
        .dispatch(&RawRequest::http("/report/1"))
        .await
        .unwrap();
    assert_eq!(body_of(again), "report 1");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn cache_entries_expire_with_their_ttl() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = dispatcher(
        vec![report_spec(&calls, report_action().cached().with_cache_ttl(30))],
        KernelConfig::default(),
    );

    dispatcher
        .dispatch(&RawRequest::http("/report/7"))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(10)).await;
    dispatcher
        .dispatch(&RawRequest::http("/report/7"))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(21)).await;
    dispatcher
        .dispatch(&RawRequest::http("/report/7"))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_ttl_entries_never_expire() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = dispatcher(
        vec![report_spec(&calls, report_action().cached().with_cache_ttl(0))],
        KernelConfig::default(),
    );

    dispatcher
        .dispatch(&RawRequest::http("/report/7"))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(3600)).await;
    dispatcher
        .dispatch(&RawRequest::http("/report/7"))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ── Timeouts ───────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn timeouts_abort_slow_handlers() {
    let spec = ComponentSpec::new("slow", Origin::App, || {
        Box::new(SlowComponent { delay_ms: 100 })
    })
    .with_actions(|actions| {
        actions.register(
            ActionDescriptor::new(
                "slow.render",
                "slow",
                "render",
                RouteDescriptor::new(vec![PathSegment::fixed("slow")]),
            )
            .with_timeout_ms(50),
        )
    });
    let dispatcher = dispatcher(vec![spec], KernelConfig::default());

    let report = dispatcher
        .dispatch(&RawRequest::http("/slow"))
        .await
        .unwrap_err();

    assert!(matches!(
        report.current_context(),
        KernelError::Action(ActionError::Timeout { action, timeout_ms })
            if action == "slow.render" && *timeout_ms == 50
    ));
}

#[tokio::test(start_paused = true)]
async fn fast_handlers_beat_their_timeout() {
    let spec = ComponentSpec::new("slow", Origin::App, || {
        Box::new(SlowComponent { delay_ms: 20 })
    })
    .with_actions(|actions| {
        actions.register(
            ActionDescriptor::new(
                "slow.render",
                "slow",
                "render",
                RouteDescriptor::new(vec![PathSegment::fixed("slow")]),
            )
            .with_timeout_ms(50),
        )
    });
    let dispatcher = dispatcher(vec![spec], KernelConfig::default());

    let outcome = dispatcher
        .dispatch(&RawRequest::http("/slow"))
        .await
        .unwrap();
    assert_eq!(body_of(outcome), "slow done");
}

// ── Brute-force throttling ─────────────────────────────────────────────────

fn vault_spec() -> ComponentSpec {
    ComponentSpec::new("vault", Origin::App, || {
        Box::new(SecretComponent {
            secret: "4242".to_string(),
        })
    })
    .with_actions(|actions| {
        actions.register(
            ActionDescriptor::new(
                "vault.open",
                "vault",
                "open",
                RouteDescriptor::new(vec![PathSegment::fixed("vault")])
                    .with_parameter(Parameter::query("code")),
            )
            .brute_force_guarded(),
        )
    })
}

fn throttle_config() -> KernelConfig {
    let mut config = KernelConfig::default();
    config.brute_force_min_ms = 250;
    config.brute_force_max_ms = 250;
    config
}

#[tokio::test(start_paused = true)]
async fn wrong_guesses_are_delayed() {
    let dispatcher = dispatcher(vec![vault_spec()], throttle_config());

    let started = tokio::time::Instant::now();
    let outcome = dispatcher
        .dispatch(&RawRequest::http("/vault").with_query("code", "1111"))
        .await
        .unwrap();

    assert!(!outcome.is_handled());
    assert!(started.elapsed() >= Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn correct_guesses_pass_without_delay() {
    let dispatcher = dispatcher(vec![vault_spec()], throttle_config());

    let started = tokio::time::Instant::now();
    let outcome = dispatcher
        .dispatch(&RawRequest::http("/vault").with_query("code", "4242"))
        .await
        .unwrap();

    assert_eq!(body_of(outcome), "granted");
    assert!(started.elapsed() < Duration::from_millis(250));
}

// ── CSRF ───────────────────────────────────────────────────────────────────

fn form_spec() -> ComponentSpec {
    ComponentSpec::new("form", Origin::App, || Box::new(FormComponent)).with_actions(|actions| {
        actions.register(ActionDescriptor::new(
            "form.save",
            "form",
            "save",
            RouteDescriptor::new(vec![PathSegment::fixed("save")]).require_csrf(),
        ))
    })
}

#[tokio::test]
async fn csrf_routes_decline_tokenless_requests() {
    let dispatcher = dispatcher(vec![form_spec()], KernelConfig::default());

    let outcome = dispatcher.dispatch(&RawRequest::http("/save")).await.unwrap();

    match outcome {
        DispatchOutcome::NotFound { attempted } => {
            assert_eq!(attempted, vec!["form.save"]);
        }
        other => panic!("expected a declined dispatch, got {other:?}"),
    }
}

#[tokio::test]
async fn csrf_tokens_admit_matching_sessions() {
    let dispatcher = dispatcher(vec![form_spec()], KernelConfig::default());

    let session = Session::new();
    session.set(SESSION_TOKEN_KEY, "tok-123").await;
    let request = RawRequest::http("/save")
        .with_session(session)
        .with_body_field("csrf_token", "tok-123");

    let outcome = dispatcher.dispatch(&request).await.unwrap();
    assert_eq!(body_of(outcome), "form ok");
}

#[tokio::test]
async fn mismatched_csrf_tokens_decline() {
    let dispatcher = dispatcher(vec![form_spec()], KernelConfig::default());

    let session = Session::new();
    session.set(SESSION_TOKEN_KEY, "tok-123").await;
    let request = RawRequest::http("/save")
        .with_session(session)
        .with_body_field("csrf_token", "tok-999");

    let outcome = dispatcher.dispatch(&request).await.unwrap();
    assert!(!outcome.is_handled());
}

//! Dispatch behavior: structural matching, binding, fallthrough and entry
//! points, driven end to end through the dispatcher.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lintel_kernel::action::ActionDescriptor;
use lintel_kernel::component::{ComponentSpec, Origin};
use lintel_kernel::request::{Parameter, PathSegment, RouteDescriptor};
use lintel_kernel::security::ValidationRule;
use lintel_kernel::{DispatchOutcome, KernelConfig, RawRequest};
use lintel_testing::components::{
    CountingReportComponent, DeclineComponent, EchoComponent, PingComponent,
};
use lintel_testing::dispatcher;

fn handled(outcome: DispatchOutcome) -> (String, String) {
    match outcome {
        DispatchOutcome::Handled { action, response } => (action, response.body_string()),
        other => panic!("expected a handled dispatch, got {other:?}"),
    }
}

fn attempted(outcome: DispatchOutcome) -> Vec<String> {
    match outcome {
        DispatchOutcome::NotFound { attempted } => attempted,
        other => panic!("expected a miss, got {other:?}"),
    }
}

fn ping_spec() -> ComponentSpec {
    ComponentSpec::new("ping", Origin::App, || Box::new(PingComponent)).with_actions(|actions| {
        actions.register(ActionDescriptor::new(
            "ping.run",
            "ping",
            "ping",
            RouteDescriptor::new(vec![PathSegment::fixed("ping")]),
        ))
    })
}

#[tokio::test]
async fn a_fixed_route_dispatches_to_its_action() {
    let dispatcher = dispatcher(vec![ping_spec()], KernelConfig::default());

    let outcome = dispatcher.dispatch(&RawRequest::http("/ping")).await.unwrap();

    let (action, body) = handled(outcome);
    assert_eq!(action, "ping.run");
    assert_eq!(body, "pong");
}

#[tokio::test]
async fn fixed_segments_match_case_insensitively() {
    let dispatcher = dispatcher(vec![ping_spec()], KernelConfig::default());

    let outcome = dispatcher.dispatch(&RawRequest::http("/PiNg")).await.unwrap();
    assert!(outcome.is_handled());
}

#[tokio::test]
async fn variable_segments_bind_into_the_handler() {
    let spec = ComponentSpec::new("user", Origin::App, || Box::new(EchoComponent))
        .with_actions(|actions| {
            actions.register(ActionDescriptor::new(
                "user.show",
                "user",
                "show",
                RouteDescriptor::new(vec![
                    PathSegment::fixed("user"),
                    PathSegment::numeric("id"),
                ]),
            ))
        });
    let dispatcher = dispatcher(vec![spec], KernelConfig::default());

    let outcome = dispatcher
        .dispatch(&RawRequest::http("/user/42"))
        .await
        .unwrap();
    let (_, body) = handled(outcome);
    assert_eq!(body, "echo:42");

    // a non-numeric token is a structural miss, not a violation
    let miss = dispatcher
        .dispatch(&RawRequest::http("/user/abc"))
        .await
        .unwrap();
    assert_eq!(attempted(miss), Vec::<String>::new());
}

#[tokio::test]
async fn declines_fall_through_in_registration_order() {
    let gate = ComponentSpec::new("gate", Origin::App, || Box::new(DeclineComponent))
        .with_actions(|actions| {
            actions.register(ActionDescriptor::new(
                "gate.review",
                "gate",
                "review",
                RouteDescriptor::new(vec![PathSegment::fixed("doc")]),
            ))
        });
    let doc = ComponentSpec::new("doc", Origin::App, || Box::new(PingComponent)).with_actions(
        |actions| {
            actions.register(ActionDescriptor::new(
                "doc.show",
                "doc",
                "ping",
                RouteDescriptor::new(vec![PathSegment::fixed("doc")]),
            ))
        },
    );
    let dispatcher = dispatcher(vec![gate, doc], KernelConfig::default());

    let outcome = dispatcher.dispatch(&RawRequest::http("/doc")).await.unwrap();

    let (action, body) = handled(outcome);
    assert_eq!(action, "doc.show");
    assert_eq!(body, "pong");
}

#[tokio::test]
async fn a_declined_numeric_candidate_falls_to_the_text_one() {
    let by_id = ComponentSpec::new("directory", Origin::App, || Box::new(DeclineComponent))
        .with_actions(|actions| {
            actions.register(ActionDescriptor::new(
                "user.by_id",
                "directory",
                "review",
                RouteDescriptor::new(vec![
                    PathSegment::fixed("user"),
                    PathSegment::numeric("id"),
                ]),
            ))
        });
    let by_name = ComponentSpec::new("user", Origin::App, || Box::new(EchoComponent))
        .with_actions(|actions| {
            actions.register(ActionDescriptor::new(
                "user.by_name",
                "user",
                "show",
                RouteDescriptor::new(vec![
                    PathSegment::fixed("user"),
                    PathSegment::text("id"),
                ]),
            ))
        });
    let dispatcher = dispatcher(vec![by_id, by_name], KernelConfig::default());

    // "5" satisfies both shapes; the numeric candidate declines it
    let outcome = dispatcher
        .dispatch(&RawRequest::http("/user/5"))
        .await
        .unwrap();

    let (action, body) = handled(outcome);
    assert_eq!(action, "user.by_name");
    assert_eq!(body, "echo:5");
}

#[tokio::test]
async fn a_full_fallthrough_reports_every_attempt() {
    let first = ComponentSpec::new("first", Origin::App, || Box::new(DeclineComponent))
        .with_actions(|actions| {
            actions.register(ActionDescriptor::new(
                "first.review",
                "first",
                "review",
                RouteDescriptor::new(vec![PathSegment::fixed("review")]),
            ))
        });
    let second = ComponentSpec::new("second", Origin::App, || Box::new(DeclineComponent))
        .with_actions(|actions| {
            actions.register(ActionDescriptor::new(
                "second.review",
                "second",
                "review",
                RouteDescriptor::new(vec![PathSegment::fixed("review")]),
            ))
        });
    let dispatcher = dispatcher(vec![first, second], KernelConfig::default());

    let outcome = dispatcher
        .dispatch(&RawRequest::http("/review"))
        .await
        .unwrap();
    assert_eq!(attempted(outcome), vec!["first.review", "second.review"]);
}

#[tokio::test]
async fn unmatched_paths_have_an_empty_attempt_list() {
    let dispatcher = dispatcher(vec![ping_spec()], KernelConfig::default());

    let outcome = dispatcher
        .dispatch(&RawRequest::http("/nowhere"))
        .await
        .unwrap();
    assert_eq!(attempted(outcome), Vec::<String>::new());
}

#[tokio::test]
async fn binding_violations_skip_to_the_next_candidate() {
    let spec = ComponentSpec::new("item", Origin::App, || Box::new(EchoComponent))
        .with_actions(|actions| {
            actions.register(ActionDescriptor::new(
                "item.strict",
                "item",
                "show",
                RouteDescriptor::new(vec![
                    PathSegment::fixed("item"),
                    PathSegment::numeric("id").with_rules(vec![ValidationRule::MaxValue(10)]),
                ]),
            ))?;
            actions.register(ActionDescriptor::new(
                "item.any",
                "item",
                "show",
                RouteDescriptor::new(vec![
                    PathSegment::fixed("item"),
                    PathSegment::text("id"),
                ]),
            ))
        });
    let dispatcher = dispatcher(vec![spec], KernelConfig::default());

    // 99 violates the strict bound, so the lax candidate serves it
    let outcome = dispatcher
        .dispatch(&RawRequest::http("/item/99"))
        .await
        .unwrap();
    let (action, body) = handled(outcome);
    assert_eq!(action, "item.any");
    assert_eq!(body, "echo:99");

    // within the bound, the strict candidate wins on registration order
    let outcome = dispatcher
        .dispatch(&RawRequest::http("/item/7"))
        .await
        .unwrap();
    let (action, _) = handled(outcome);
    assert_eq!(action, "item.strict");
}

#[tokio::test]
async fn sql_probes_fail_binding_and_fall_through() {
    let spec = ComponentSpec::new("search", Origin::App, || Box::new(PingComponent))
        .with_actions(|actions| {
            actions.register(ActionDescriptor::new(
                "search.query",
                "search",
                "ping",
                RouteDescriptor::new(vec![PathSegment::fixed("search")])
                    .with_parameter(Parameter::query("q")),
            ))?;
            actions.register(ActionDescriptor::new(
                "search.plain",
                "search",
                "ping",
                RouteDescriptor::new(vec![PathSegment::fixed("search")]),
            ))
        });
    let dispatcher = dispatcher(vec![spec], KernelConfig::default());

    let outcome = dispatcher
        .dispatch(&RawRequest::http("/search").with_query("q", "1' or 1=1 --"))
        .await
        .unwrap();

    // the probing candidate is skipped on its violation, not executed
    let (action, body) = handled(outcome);
    assert_eq!(action, "search.plain");
    assert_eq!(body, "pong");
}

#[tokio::test]
async fn failed_candidates_are_listed_in_the_miss() {
    let spec = ComponentSpec::new("item", Origin::App, || Box::new(EchoComponent))
        .with_actions(|actions| {
            actions.register(ActionDescriptor::new(
                "item.strict",
                "item",
                "show",
                RouteDescriptor::new(vec![
                    PathSegment::fixed("item"),
                    PathSegment::numeric("id").with_rules(vec![ValidationRule::MaxValue(10)]),
                ]),
            ))
        });
    let dispatcher = dispatcher(vec![spec], KernelConfig::default());

    let outcome = dispatcher
        .dispatch(&RawRequest::http("/item/99"))
        .await
        .unwrap();
    assert_eq!(attempted(outcome), vec!["item.strict"]);
}

#[tokio::test]
async fn cli_only_actions_are_invisible_to_http() {
    let spec = ComponentSpec::new("tool", Origin::App, || Box::new(PingComponent)).with_actions(
        |actions| {
            actions.register(
                ActionDescriptor::new(
                    "tool.sweep",
                    "tool",
                    "ping",
                    RouteDescriptor::new(vec![PathSegment::fixed("sweep")]),
                )
                .cli_only(),
            )
        },
    );
    let dispatcher = dispatcher(vec![spec], KernelConfig::default());

    let web = dispatcher
        .dispatch(&RawRequest::http("/sweep"))
        .await
        .unwrap();
    assert_eq!(attempted(web), Vec::<String>::new());

    let cli = dispatcher.dispatch(&RawRequest::cli("/sweep")).await.unwrap();
    assert!(cli.is_handled());
}

#[tokio::test]
async fn the_first_handling_candidate_wins() {
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let spec_for = |name: &'static str, action: &'static str, calls: &Arc<AtomicUsize>| {
        let calls = calls.clone();
        ComponentSpec::new(name, Origin::App, move || {
            Box::new(CountingReportComponent {
                calls: calls.clone(),
            })
        })
        .with_actions(move |actions| {
            actions.register(ActionDescriptor::new(
                action,
                name,
                "show",
                RouteDescriptor::new(vec![PathSegment::fixed("report")]),
            ))
        })
    };

    let dispatcher = dispatcher(
        vec![
            spec_for("first", "report.first", &first_calls),
            spec_for("second", "report.second", &second_calls),
        ],
        KernelConfig::default(),
    );

    let outcome = dispatcher
        .dispatch(&RawRequest::http("/report"))
        .await
        .unwrap();

    let (action, _) = handled(outcome);
    assert_eq!(action, "report.first");
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

//! Component lifecycle through full dispatches: lazy loading, dependency
//! chains, cycle detection, init failure and teardown ordering.

use lintel_kernel::action::ActionDescriptor;
use lintel_kernel::component::{ComponentError, ComponentSpec, Origin};
use lintel_kernel::request::{PathSegment, RouteDescriptor};
use lintel_kernel::{Dispatcher, KernelConfig, KernelError, RawRequest};
use lintel_testing::components::{ChainComponent, FailingComponent, LifecycleLog};
use lintel_testing::{dispatcher, kernel_context};

fn chain_spec(name: &'static str, deps: Vec<&'static str>, log: &LifecycleLog) -> ComponentSpec {
    let log = log.clone();
    ComponentSpec::new(name, Origin::App, move || {
        Box::new(ChainComponent {
            name,
            log: log.clone(),
        })
    })
    .with_dependencies(deps)
}

fn touch_action(component: &'static str, path: &'static str) -> ActionDescriptor {
    ActionDescriptor::new(
        format!("{component}.touch"),
        component,
        "touch",
        RouteDescriptor::new(vec![PathSegment::fixed(path)]),
    )
}

fn entries(log: &LifecycleLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[tokio::test]
async fn components_load_lazily_on_first_dispatch() {
    let log = LifecycleLog::default();
    let eager = chain_spec("eager", vec![], &log)
        .with_actions(|actions| actions.register(touch_action("eager", "eager")));
    let idle = chain_spec("idle", vec![], &log);
    let dispatcher = dispatcher(vec![eager, idle], KernelConfig::default());

    // bootstrap loads nothing
    assert!(entries(&log).is_empty());

    let outcome = dispatcher
        .dispatch(&RawRequest::http("/eager"))
        .await
        .unwrap();
    assert!(outcome.is_handled());

    assert_eq!(entries(&log), vec!["init:eager"]);
    assert_eq!(
        dispatcher.context().registry().loaded_components().await,
        vec!["eager"]
    );
}

#[tokio::test]
async fn a_dependency_chain_loads_depth_first() {
    let log = LifecycleLog::default();
    let dispatcher = dispatcher(
        vec![
            chain_spec("alpha", vec!["beta"], &log)
                .with_actions(|actions| actions.register(touch_action("alpha", "alpha"))),
            chain_spec("beta", vec!["gamma"], &log),
            chain_spec("gamma", vec![], &log),
        ],
        KernelConfig::default(),
    );

    let outcome = dispatcher
        .dispatch(&RawRequest::http("/alpha"))
        .await
        .unwrap();
    assert!(outcome.is_handled());

    assert_eq!(entries(&log), vec!["init:gamma", "init:beta", "init:alpha"]);
}

#[tokio::test]
async fn cycles_fail_dispatch_fast() {
    let log = LifecycleLog::default();
    let dispatcher = dispatcher(
        vec![
            chain_spec("ouro-a", vec!["ouro-b"], &log)
                .with_actions(|actions| actions.register(touch_action("ouro-a", "ouro"))),
            chain_spec("ouro-b", vec!["ouro-a"], &log),
        ],
        KernelConfig::default(),
    );

    let report = dispatcher
        .dispatch(&RawRequest::http("/ouro"))
        .await
        .unwrap_err();

    match report.current_context() {
        KernelError::Component(ComponentError::DependencyCycle { path }) => {
            assert_eq!(path, &vec!["ouro-a", "ouro-b", "ouro-a"]);
        }
        other => panic!("expected a dependency cycle, got {other:?}"),
    }
    // detection is eager: no component ever initialized
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn shutdown_tears_down_in_load_order() {
    let log = LifecycleLog::default();
    let context = kernel_context(
        vec![
            chain_spec("alpha", vec!["beta"], &log)
                .with_actions(|actions| actions.register(touch_action("alpha", "alpha"))),
            chain_spec("beta", vec!["gamma"], &log),
            chain_spec("gamma", vec![], &log),
        ],
        KernelConfig::default(),
    );
    let dispatcher = Dispatcher::new(context.clone());

    dispatcher
        .dispatch(&RawRequest::http("/alpha"))
        .await
        .unwrap();
    context.shutdown().await.unwrap();

    assert_eq!(
        entries(&log),
        vec![
            "init:gamma",
            "init:beta",
            "init:alpha",
            "drop:gamma",
            "drop:beta",
            "drop:alpha"
        ]
    );
    assert!(context.registry().loaded_components().await.is_empty());
}

#[tokio::test]
async fn an_init_failure_unwinds_what_already_loaded() {
    let log = LifecycleLog::default();
    let flaky = ComponentSpec::new("flaky", Origin::App, || Box::new(FailingComponent))
        .with_dependencies(vec!["stable"])
        .with_actions(|actions| actions.register(touch_action("flaky", "flaky")));
    let dispatcher = dispatcher(
        vec![chain_spec("stable", vec![], &log), flaky],
        KernelConfig::default(),
    );

    let report = dispatcher
        .dispatch(&RawRequest::http("/flaky"))
        .await
        .unwrap_err();

    match report.current_context() {
        KernelError::Component(ComponentError::InitFailed { name, reason }) => {
            assert_eq!(name, "flaky");
            assert!(reason.contains("refusing to start"));
        }
        other => panic!("expected an init failure, got {other:?}"),
    }
    assert_eq!(entries(&log), vec!["init:stable", "drop:stable"]);
}

#[tokio::test]
async fn load_history_is_visible_through_the_context() {
    let log = LifecycleLog::default();
    let mut config = KernelConfig::default();
    config.trace_loads = true;
    let dispatcher = dispatcher(
        vec![
            chain_spec("alpha", vec!["beta"], &log)
                .with_actions(|actions| actions.register(touch_action("alpha", "alpha"))),
            chain_spec("beta", vec![], &log),
        ],
        config,
    );

    dispatcher
        .dispatch(&RawRequest::http("/alpha"))
        .await
        .unwrap();

    let history = dispatcher.context().registry().load_history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].target, "beta");
    assert_eq!(history[0].required_by.as_deref(), Some("alpha"));
    assert_eq!(history[1].target, "alpha");
    assert_eq!(history[1].required_by, None);
}

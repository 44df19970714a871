//! The built-in `status` component: liveness and kernel introspection.

use async_trait::async_trait;
use serde_json::json;
use std::time::Instant;

use lintel_kernel::action::ActionDescriptor;
use lintel_kernel::component::{
    Component, ComponentError, ComponentResult, ComponentSpec, Origin,
};
use lintel_kernel::request::{PathSegment, RouteDescriptor};
use lintel_kernel::{
    BoundRequest, HandlerOutcome, KernelContext, RawRequest, Response, ResponseKind,
};

pub struct StatusComponent {
    started: Instant,
    version: &'static str,
}

impl StatusComponent {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl Default for StatusComponent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Component for StatusComponent {
    async fn invoke(
        &mut self,
        method: &str,
        _request: &RawRequest,
        _binding: &BoundRequest,
        ctx: &KernelContext,
    ) -> ComponentResult<HandlerOutcome> {
        match method {
            "health" => {
                let mut doc = json!({
                    "status": "ok",
                    "version": self.version,
                    "uptime_secs": self.started.elapsed().as_secs(),
                    "components": ctx.registry().loaded_components().await,
                });
                if ctx.config().trace_loads {
                    doc["load_history"] =
                        serde_json::to_value(ctx.registry().load_history().await)?;
                }
                Ok(HandlerOutcome::Handled(Response::json(&doc)?))
            }
            other => Err(ComponentError::UnknownMethod {
                component: "status".to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Registration spec: `GET /status` answered by the `status.health` action.
pub fn status_spec() -> ComponentSpec {
    ComponentSpec::new("status", Origin::Core, || Box::new(StatusComponent::new()))
        .with_actions(|actions| {
            actions.register(
                ActionDescriptor::new(
                    "status.health",
                    "status",
                    "health",
                    RouteDescriptor::new(vec![PathSegment::fixed("status")]),
                )
                .with_origin(Origin::Core)
                .with_response_kind(ResponseKind::Json),
            )
        })
}

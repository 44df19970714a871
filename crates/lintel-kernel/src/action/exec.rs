//! The action execution pipeline.
//!
//! One [`run_action`] call walks the full policy ladder for a single
//! candidate action:
//!
//! ```text
//!   CLI gate ─▶ cache lookup ─▶ (timeout) load + security + invoke
//!            ─▶ cache store ─▶ brute-force throttle
//! ```
//!
//! Cache faults are soft: a backend error or an undecodable entry is logged
//! and treated as a miss, never surfaced to the caller. Security rejections
//! decline the action instead of failing dispatch. Timeouts and handler
//! errors are hard failures.

use error_stack::Report;
use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, warn};

use crate::cache::CachedOutcome;
use crate::context::KernelContext;
use crate::error::{KernelError, KernelResult};
use crate::request::{BoundRequest, EntryPoint, RawRequest};
use crate::response::Response;

use super::{ActionDescriptor, ActionError, HandlerOutcome};

/// Execute one action against an already-bound request.
pub async fn run_action(
    ctx: &KernelContext,
    action: &ActionDescriptor,
    request: &RawRequest,
    binding: &BoundRequest,
) -> KernelResult<HandlerOutcome> {
    if action.policy.cli_only && request.entry != EntryPoint::Cli {
        error!(action = %action.name, "action is CLI-only, refusing web dispatch");
        return Ok(HandlerOutcome::Handled(Response::empty()));
    }

    let cache_key = action.policy.cache.then(|| action.cache_key(binding));

    if let Some(key) = &cache_key {
        match ctx.cache().get(key).await {
            Ok(Some(bytes)) => match CachedOutcome::decode(&bytes) {
                Ok(cached) => {
                    debug!(action = %action.name, "serving from response cache");
                    let outcome = cached.into_outcome();
                    throttle_if_declined(ctx, action, &outcome).await;
                    return Ok(outcome);
                }
                Err(err) => {
                    debug!(action = %action.name, error = %err, "cached entry undecodable, treating as miss");
                }
            },
            Ok(None) => {}
            Err(err) => {
                debug!(action = %action.name, error = %err, "response cache unavailable, treating as miss");
            }
        }
    }

    let outcome = match action.policy.timeout_ms {
        Some(timeout_ms) => {
            let limit = Duration::from_millis(timeout_ms);
            match timeout(limit, invoke_target(ctx, action, request, binding)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(Report::new(KernelError::from(ActionError::Timeout {
                        action: action.name.clone(),
                        timeout_ms,
                    })));
                }
            }
        }
        None => invoke_target(ctx, action, request, binding).await?,
    };

    if let Some(key) = &cache_key {
        let ttl = action
            .policy
            .cache_ttl_secs
            .unwrap_or(ctx.config().cache_ttl_secs);
        match CachedOutcome::from_outcome(&outcome).encode() {
            Ok(bytes) => {
                if let Err(err) = ctx.cache().set(key, bytes, Duration::from_secs(ttl)).await {
                    debug!(action = %action.name, error = %err, "response cache store failed");
                }
            }
            Err(err) => {
                debug!(action = %action.name, error = %err, "outcome not cacheable");
            }
        }
    }

    throttle_if_declined(ctx, action, &outcome).await;
    Ok(outcome)
}

/// Load the serving component, run the route's security check, invoke.
async fn invoke_target(
    ctx: &KernelContext,
    action: &ActionDescriptor,
    request: &RawRequest,
    binding: &BoundRequest,
) -> KernelResult<HandlerOutcome> {
    let handle = ctx.registry().load(&action.component, action.origin).await?;

    if let Err(rejection) = action
        .route
        .security_check(request, ctx.guard(), &ctx.config().server_host)
        .await
    {
        warn!(action = %action.name, %rejection, "security check rejected the request");
        return Ok(HandlerOutcome::Declined);
    }

    let mut component = handle.write().await;
    component
        .invoke(&action.method, request, binding, ctx)
        .await
        .map_err(|err| {
            Report::new(KernelError::from(err))
                .attach(format!("while invoking action {}", action.name))
        })
}

// Randomized delay after a declined, guarded run. The window comes from the
// kernel config; min and max are swapped if misordered.
async fn throttle_if_declined(
    ctx: &KernelContext,
    action: &ActionDescriptor,
    outcome: &HandlerOutcome,
) {
    if !action.policy.brute_force_guard || outcome.is_handled() {
        return;
    }
    let config = ctx.config();
    let low = config.brute_force_min_ms.min(config.brute_force_max_ms);
    let high = config.brute_force_min_ms.max(config.brute_force_max_ms);
    let wait_ms = rand::thread_rng().gen_range(low..=high);
    debug!(action = %action.name, wait_ms, "declined under brute-force guard, delaying");
    sleep(Duration::from_millis(wait_ms)).await;
}

//! Request dispatch: offering a request to matching actions in order.
//!
//! Dispatch is a straight fallthrough over the action registry. Every
//! action whose route matches the tokenized path (and whose CLI policy
//! admits the entry point) is a candidate; candidates are offered the
//! request in registration order until one handles it. A candidate that
//! fails binding or declines is recorded and skipped, so a miss can report
//! exactly which actions were attempted.

use tracing::{debug, warn};

use crate::action::{run_action, HandlerOutcome};
use crate::context::KernelContext;
use crate::error::KernelResult;
use crate::request::{EntryPoint, RawRequest};
use crate::response::Response;

/// Terminal result of one dispatch pass.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Exactly one action produced a response.
    Handled { action: String, response: Response },
    /// No candidate produced a response; `attempted` lists, in order, the
    /// matching actions that were offered the request.
    NotFound { attempted: Vec<String> },
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled { .. })
    }
}

/// The kernel's front door: one dispatcher per kernel context.
#[derive(Clone)]
pub struct Dispatcher {
    context: KernelContext,
}

impl Dispatcher {
    pub fn new(context: KernelContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &KernelContext {
        &self.context
    }

    /// Offer `request` to every matching action until one handles it.
    ///
    /// At most one action produces the response. Binding failures and
    /// declines move on to the next candidate; handler errors and timeouts
    /// abort the pass.
    pub async fn dispatch(&self, request: &RawRequest) -> KernelResult<DispatchOutcome> {
        let tokens = request.tokens();
        let mut attempted = Vec::new();

        for action in self.context.actions().actions() {
            if action.policy.cli_only && request.entry != EntryPoint::Cli {
                continue;
            }
            if !action.route.matches_path(&tokens) {
                continue;
            }

            let binding = action.route.bind(request, self.context.guard());
            if !binding.is_valid() {
                warn!(
                    action = %action.name,
                    violations = binding.violations().len(),
                    "request failed validation, skipping candidate"
                );
                attempted.push(action.name.clone());
                continue;
            }

            match run_action(&self.context, action, request, &binding).await? {
                HandlerOutcome::Handled(response) => {
                    debug!(action = %action.name, "request handled");
                    return Ok(DispatchOutcome::Handled {
                        action: action.name.clone(),
                        response,
                    });
                }
                HandlerOutcome::Declined => {
                    debug!(action = %action.name, "action declined, trying next candidate");
                    attempted.push(action.name.clone());
                }
            }
        }

        debug!(path = %request.path, attempted = attempted.len(), "no action handled the request");
        Ok(DispatchOutcome::NotFound { attempted })
    }
}

use crate::action::{Action, Decision};
use crate::error::BoxError;
use crate::request::EvaluationContext;
use crate::rule::Clause;

/// Structured decision logging for one evaluation.
///
/// Every event carries the request's method, path and source address.
/// Email and phone are never logged.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DecisionLog<'a> {
    method: &'a str,
    path: &'a str,
    ip: &'a str,
}

impl<'a> DecisionLog<'a> {
    pub(crate) fn new(ctx: &'a EvaluationContext) -> Self {
        Self {
            method: &ctx.method,
            path: &ctx.path,
            ip: &ctx.ip_address,
        }
    }

    /// A path-matched rule whose conjunction did not hold.
    pub(crate) fn skipped(&self, index: usize, name: Option<&str>, clause: Clause) {
        tracing::debug!(
            method = %self.method,
            path = %self.path,
            ip = %self.ip,
            rule = index,
            rule_name = name.unwrap_or(""),
            failed = %clause,
            "rule not satisfied"
        );
    }

    /// The rule that decided the request.
    pub(crate) fn matched(&self, index: usize, name: Option<&str>, decision: Decision) {
        tracing::debug!(
            method = %self.method,
            path = %self.path,
            ip = %self.ip,
            rule = index,
            rule_name = name.unwrap_or(""),
            %decision,
            "rule matched"
        );
    }

    /// No rule applied.
    pub(crate) fn defaulted(&self, default_action: Action) {
        tracing::debug!(
            method = %self.method,
            path = %self.path,
            ip = %self.ip,
            decision = %Decision::from(default_action),
            "no rule matched, applying default action"
        );
    }

    /// A handler failed and aborted the evaluation.
    pub(crate) fn handler_failed(&self, index: usize, name: Option<&str>, err: &BoxError) {
        tracing::warn!(
            method = %self.method,
            path = %self.path,
            ip = %self.ip,
            rule = index,
            rule_name = name.unwrap_or(""),
            error = %err,
            "rule handler failed"
        );
    }
}

/// A resolver failed before any rule was examined.
pub(crate) fn resolver_failed(field: &'static str, err: &BoxError) {
    tracing::warn!(field, error = %err, "identity resolver failed");
}

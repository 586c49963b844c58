//! First-match rule evaluation.

use crate::action::{Action, Decision};
use crate::error::BoxError;
use crate::logging::DecisionLog;
use crate::request::EvaluationContext;
use crate::rule::{Clause, Rule};

/// Evaluates `rules` in order against one request.
///
/// The first rule whose path matches and whose whole conjunction holds
/// decides the request. A path-matched rule with a failing clause does not
/// stop the scan; later rules are still consulted. When no rule applies the
/// decision follows `default_action`.
///
/// Handlers are awaited one at a time, in rule order, and only for rules
/// whose other clauses already hold. A handler error is returned as-is and
/// ends the evaluation.
///
/// # Examples
///
/// ```
/// use request_acl::{evaluate, Action, Decision, EvaluationContext, Rule};
///
/// let rules: Vec<Rule<()>> = vec![
///     Rule::new(["/test"], Action::Accept).unwrap().with_methods(["GET"]),
/// ];
/// let ctx = EvaluationContext {
///     method: "GET".to_string(),
///     path: "/test".to_string(),
///     ..Default::default()
/// };
///
/// let decision = futures::executor::block_on(evaluate(&(), &ctx, &rules, Action::Drop));
/// assert_eq!(decision.unwrap(), Decision::Accept);
/// ```
pub async fn evaluate<R>(
    req: &R,
    ctx: &EvaluationContext,
    rules: &[Rule<R>],
    default_action: Action,
) -> Result<Decision, BoxError> {
    let log = DecisionLog::new(ctx);

    for (index, rule) in rules.iter().enumerate() {
        if !rule.covers_path(&ctx.path) {
            continue;
        }

        if let Some(clause) = rule.first_failed_clause(ctx) {
            log.skipped(index, rule.name(), clause);
            continue;
        }

        if let Some(handler) = rule.handler() {
            match handler(req).await {
                Ok(true) => {}
                Ok(false) => {
                    log.skipped(index, rule.name(), Clause::Handler);
                    continue;
                }
                Err(err) => {
                    log.handler_failed(index, rule.name(), &err);
                    return Err(err);
                }
            }
        }

        let decision = Decision::from(rule.action());
        log.matched(index, rule.name(), decision);
        return Ok(decision);
    }

    log.defaulted(default_action);
    Ok(Decision::from(default_action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::handler;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type R = ();

    fn ctx(method: &str, path: &str, roles: &[&str]) -> EvaluationContext {
        EvaluationContext {
            method: method.to_string(),
            path: path.to_string(),
            secure: false,
            origin: "http://website.com".to_string(),
            ip_address: "127.0.0.1".to_string(),
            email: Some("k@gmail.com".to_string()),
            phone: None,
            roles: roles.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn counting(counter: &Arc<AtomicUsize>, result: bool) -> crate::rule::Handler<R> {
        let counter = Arc::clone(counter);
        handler(move |_req: &R| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(result) }.boxed()
        })
    }

    #[tokio::test]
    async fn empty_rules_follow_default() {
        let req = ctx("GET", "/anything", &[]);
        assert_eq!(
            evaluate(&(), &req, &[], Action::Accept).await.unwrap(),
            Decision::Accept
        );
        assert_eq!(
            evaluate(&(), &req, &[], Action::Drop).await.unwrap(),
            Decision::Drop
        );
    }

    #[tokio::test]
    async fn method_mismatch_falls_to_default() {
        let rules: Vec<Rule<R>> = vec![Rule::new(["/test"], Action::Accept)
            .unwrap()
            .with_methods(["GET"])];

        let get = ctx("GET", "/test", &[]);
        let post = ctx("POST", "/test", &[]);
        assert_eq!(
            evaluate(&(), &get, &rules, Action::Drop).await.unwrap(),
            Decision::Accept
        );
        assert_eq!(
            evaluate(&(), &post, &rules, Action::Drop).await.unwrap(),
            Decision::Drop
        );
    }

    #[tokio::test]
    async fn path_matched_failure_continues_to_next_rule() {
        let rules: Vec<Rule<R>> = vec![
            Rule::new(["/test"], Action::Drop)
                .unwrap()
                .with_methods(["DELETE"]),
            Rule::new(["/test"], Action::Accept).unwrap(),
        ];

        let req = ctx("GET", "/test", &[]);
        assert_eq!(
            evaluate(&(), &req, &rules, Action::Drop).await.unwrap(),
            Decision::Accept
        );
    }

    #[tokio::test]
    async fn first_satisfied_rule_wins() {
        let later = Arc::new(AtomicUsize::new(0));
        let rules: Vec<Rule<R>> = vec![
            Rule::new(["/*"], Action::Drop).unwrap(),
            Rule::new(["/*"], Action::Accept)
                .unwrap()
                .with_handler(counting(&later, true)),
        ];

        let req = ctx("GET", "/test", &[]);
        assert_eq!(
            evaluate(&(), &req, &rules, Action::Accept).await.unwrap(),
            Decision::Drop
        );
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falsy_handler_falls_through() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let rules: Vec<Rule<R>> = vec![
            Rule::new(["/test"], Action::Drop)
                .unwrap()
                .with_handler(counting(&first, false)),
            Rule::new(["/test"], Action::Accept)
                .unwrap()
                .with_handler(counting(&second, true)),
        ];

        let req = ctx("GET", "/test", &[]);
        assert_eq!(
            evaluate(&(), &req, &rules, Action::Drop).await.unwrap(),
            Decision::Accept
        );
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_not_called_when_other_clauses_fail() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rules: Vec<Rule<R>> = vec![Rule::new(["/test"], Action::Accept)
            .unwrap()
            .with_roles(["ops"])
            .with_handler(counting(&calls, true))];

        let req = ctx("GET", "/test", &["admin"]);
        assert_eq!(
            evaluate(&(), &req, &rules, Action::Drop).await.unwrap(),
            Decision::Drop
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_handler_aborts() {
        let after = Arc::new(AtomicUsize::new(0));
        let rules: Vec<Rule<R>> = vec![
            Rule::new(["/test"], Action::Accept)
                .unwrap()
                .with_handler(handler(|_req: &R| {
                    async move { Err::<bool, BoxError>("lookup failed".into()) }.boxed()
                })),
            Rule::new(["/test"], Action::Accept)
                .unwrap()
                .with_handler(counting(&after, true)),
        ];

        let req = ctx("GET", "/test", &[]);
        let err = evaluate(&(), &req, &rules, Action::Accept)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "lookup failed");
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn roles_scenario() {
        let rules: Vec<Rule<R>> = vec![Rule::new(["/*"], Action::Accept)
            .unwrap()
            .with_roles(["admin"])];

        let admin = ctx("GET", "/test", &["admin", "user"]);
        let nobody = ctx("GET", "/test", &[]);
        assert_eq!(
            evaluate(&(), &admin, &rules, Action::Drop).await.unwrap(),
            Decision::Accept
        );
        assert_eq!(
            evaluate(&(), &nobody, &rules, Action::Drop).await.unwrap(),
            Decision::Drop
        );
    }

    #[tokio::test]
    async fn unmatched_path_skips_rule_entirely() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rules: Vec<Rule<R>> = vec![Rule::new(["/admin/*"], Action::Drop)
            .unwrap()
            .with_handler(counting(&calls, true))];

        let req = ctx("GET", "/public", &[]);
        assert_eq!(
            evaluate(&(), &req, &rules, Action::Accept).await.unwrap(),
            Decision::Accept
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

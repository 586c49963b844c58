//! Integration tests for the web boundary: strategies, guard and config files.

use futures::{future, FutureExt};
use request_acl::web::{guard, reject, Direct, HostRequest, PopulationStrategy, Proxied};
use request_acl::{AccessGate, Action, Connection, Error, GateConfig, Rule, User};

type Req = http::Request<()>;

fn request(path: &str, headers: &[(&str, &str)], tls: bool) -> Req {
    let mut builder = http::Request::builder().method("GET").uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let mut req = builder.body(()).unwrap();
    req.extensions_mut().insert(Connection {
        peer_addr: "10.0.0.7:43110".parse().unwrap(),
        tls,
    });
    req
}

#[tokio::test]
async fn direct_strategy_ignores_proxy_headers() {
    let config = GateConfig::from_toml_str(
        r#"
populationStrategy = "direct"

[[rules]]
paths = ["/*"]
ipAddresses = ["10.0.0.*"]
secure = true
action = "ACCEPT"
"#,
    )
    .unwrap();
    let gate = AccessGate::<Req>::from_config(config).unwrap();

    let forwarded = request(
        "/",
        &[("x-forwarded-for", "203.0.113.1"), ("x-forwarded-proto", "https")],
        true,
    );
    assert!(gate.check(&forwarded).await.is_ok());

    let plain = request("/", &[("x-forwarded-proto", "https")], false);
    assert!(gate.check(&plain).await.unwrap_err().is_forbidden());
}

#[tokio::test]
async fn proxied_strategy_is_the_default() {
    let config = GateConfig::from_toml_str(
        r#"
[[rules]]
paths = ["/*"]
ipAddresses = ["203.0.113.*"]
secure = true
action = "ACCEPT"
"#,
    )
    .unwrap();
    let gate = AccessGate::<Req>::from_config(config).unwrap();

    let forwarded = request(
        "/",
        &[
            ("x-forwarded-for", "203.0.113.1, 10.0.0.1"),
            ("x-forwarded-proto", "https"),
        ],
        false,
    );
    assert!(gate.check(&forwarded).await.is_ok());

    let ctx = gate.context(&forwarded).await.unwrap();
    assert_eq!(ctx.ip_address, "203.0.113.1");
    assert!(ctx.secure);
}

#[tokio::test]
async fn secure_false_requires_plain_connection() {
    let gate = AccessGate::<Req>::builder()
        .population_strategy(Direct)
        .rule(Rule::new(["/*"], Action::Accept).unwrap().with_secure(false))
        .build()
        .unwrap();

    assert!(gate.check(&request("/", &[], false)).await.is_ok());
    assert!(gate.check(&request("/", &[], true)).await.is_err());
}

struct RealIpHeader;

impl PopulationStrategy<Req> for RealIpHeader {
    fn method(&self, req: &Req) -> String {
        req.method_name().to_string()
    }

    fn path(&self, req: &Req) -> String {
        req.uri_path().to_string()
    }

    fn is_secure(&self, _req: &Req) -> bool {
        true
    }

    fn origin(&self, req: &Req) -> String {
        req.header("origin").unwrap_or_default().to_string()
    }

    fn ip_address(&self, req: &Req) -> String {
        req.header("x-real-ip").unwrap_or_default().to_string()
    }
}

#[tokio::test]
async fn custom_strategy_overrides_configured_name() {
    let config = GateConfig::from_json_str(
        r#"{
            "populationStrategy": "proxied",
            "rules": [ { "paths": ["/*"], "ipAddresses": ["192.0.2.*"], "secure": true, "action": "ACCEPT" } ]
        }"#,
    )
    .unwrap();
    let gate = AccessGate::<Req>::builder()
        .config(config)
        .population_strategy(RealIpHeader)
        .build()
        .unwrap();

    let req = request("/", &[("x-real-ip", "192.0.2.44")], false);
    assert!(gate.check(&req).await.is_ok());

    let req = request("/", &[("x-forwarded-for", "192.0.2.44")], false);
    assert!(gate.check(&req).await.is_err());
}

#[tokio::test]
async fn configured_name_is_validated_even_when_overridden() {
    let config = GateConfig {
        population_strategy: Some("Proxied".to_string()),
        ..Default::default()
    };
    let result = AccessGate::<Req>::builder()
        .config(config)
        .population_strategy(Proxied)
        .build();
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[tokio::test]
async fn guard_passes_or_rejects() {
    let gate = AccessGate::<Req>::builder()
        .rule(Rule::new(["/public/*"], Action::Accept).unwrap())
        .build()
        .unwrap();

    assert!(guard(&gate, &request("/public/index.html", &[], false))
        .await
        .is_ok());

    let resp = guard(&gate, &request("/private", &[], false))
        .await
        .unwrap_err();
    assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
    assert_eq!(resp.body(), "Forbidden");
}

#[tokio::test]
async fn guard_maps_resolver_failure_to_500() {
    let gate = AccessGate::<Req>::builder()
        .default_action(Action::Accept)
        .roles_resolver(|_req: &Req| future::ready(Err("role service timeout".into())).boxed())
        .build()
        .unwrap();

    let resp = guard(&gate, &request("/", &[], false)).await.unwrap_err();
    assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!resp.body().contains("timeout"));
}

#[test]
fn reject_configuration_error() {
    let err = Error::from(request_acl::ConfigError::UnknownStrategy("koa".into()));
    let resp = reject(&err);
    assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn resolvers_can_read_headers_instead_of_user() {
    let gate = AccessGate::<Req>::builder()
        .email_resolver(|req: &Req| {
            let email = req.header("x-auth-email").map(str::to_string);
            future::ready(Ok(email)).boxed()
        })
        .rule(
            Rule::new(["/*"], Action::Accept)
                .unwrap()
                .with_users(["*@example.org"]),
        )
        .build()
        .unwrap();

    let mut req = request("/", &[("x-auth-email", "ana@example.org")], false);
    req.extensions_mut().insert(User {
        email: Some("someone@else.net".to_string()),
        ..Default::default()
    });
    assert!(gate.check(&req).await.is_ok());
}

#[tokio::test]
async fn loads_gate_from_toml_file() {
    let path = std::env::temp_dir().join(format!("request-acl-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
defaultAction = "DROP"

[[rules]]
name = "health"
paths = ["/healthz"]
action = "ACCEPT"

[[rules]]
name = "staff"
paths = [{ regex = "^/staff(/|$)" }]
roles = ["staff", "admin"]
action = "ACCEPT"
"#,
    )
    .unwrap();

    let config = GateConfig::load(&path);
    std::fs::remove_file(&path).ok();
    let config = config.unwrap();
    config.validate().unwrap();

    let gate = AccessGate::<Req>::from_config(config).unwrap();
    assert!(gate.check(&request("/healthz", &[], false)).await.is_ok());

    let mut staff = request("/staff/roster", &[], false);
    assert!(gate.check(&staff).await.is_err());
    staff.extensions_mut().insert(User {
        email: Some("lee@example.org".to_string()),
        phone: None,
        roles: vec!["staff".to_string()],
    });
    assert!(gate.check(&staff).await.is_ok());
}

#[tokio::test]
async fn loads_gate_from_json_file() {
    let path = std::env::temp_dir().join(format!("request-acl-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{ "defaultAction": "ACCEPT", "rules": [ { "paths": ["/admin*"], "action": "DROP" } ] }"#,
    )
    .unwrap();

    let config = GateConfig::load(&path);
    std::fs::remove_file(&path).ok();
    let gate = AccessGate::<Req>::from_config(config.unwrap()).unwrap();

    assert!(gate.check(&request("/admin/panel", &[], false)).await.is_err());
    assert!(gate.check(&request("/home", &[], false)).await.is_ok());
}

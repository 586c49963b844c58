//! Access gate request flow demonstration.
//!
//! This example shows how a web service puts the gate in front of its
//! handlers:
//! 1. Load the rule list from configuration
//! 2. Attach an async handler to a named rule
//! 3. Tag each request with connection and identity extensions
//! 4. Run `guard` and either continue or return the rejection response
//!
//! Run with: `cargo run --example gate_flow`

use futures::{future, FutureExt};
use request_acl::web::guard;
use request_acl::{AccessGate, Connection, GateConfig, User};

const CONFIG: &str = r#"
defaultAction = "DROP"
populationStrategy = "proxied"

[[rules]]
name = "health"
paths = ["/healthz"]
methods = ["GET"]
action = "ACCEPT"

[[rules]]
name = "admin"
paths = ["/admin/*"]
roles = ["admin"]
secure = true
action = "ACCEPT"

[[rules]]
name = "maintenance"
paths = [{ regex = "^/api/v[0-9]+/" }]
action = "ACCEPT"
"#;

type Req = http::Request<()>;

fn request(method: &str, path: &str, user: Option<User>, headers: &[(&str, &str)]) -> Req {
    let mut builder = http::Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let mut req = builder.body(()).expect("valid request");
    req.extensions_mut().insert(Connection {
        peer_addr: "10.1.0.20:55012".parse().expect("valid address"),
        tls: false,
    });
    if let Some(user) = user {
        req.extensions_mut().insert(user);
    }
    req
}

async fn serve(gate: &AccessGate<Req>, label: &str, req: Req) {
    println!("\n=== {label} ===");
    println!("   {} {}", req.method(), req.uri().path());

    match guard(gate, &req).await {
        Ok(()) => println!("   -> 200 OK (handler runs)"),
        Err(resp) => println!("   -> {} {}", resp.status().as_u16(), resp.body()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Access Gate Request Flow");
    println!("========================");

    let config = GateConfig::from_toml_str(CONFIG)?;
    config.validate()?;

    let gate = AccessGate::<Req>::builder()
        .config(config)
        .handler("maintenance", |req: &Req| {
            let open = !req.headers().contains_key("x-maintenance-window");
            future::ready(Ok(open)).boxed()
        })
        .build()?;

    println!("\nLoaded {} rules, default {}", gate.rules().len(), gate.default_action());

    let admin = User {
        email: Some("ops@example.org".to_string()),
        phone: None,
        roles: vec!["admin".to_string()],
    };

    serve(&gate, "Health probe", request("GET", "/healthz", None, &[])).await;
    serve(
        &gate,
        "Admin over plain HTTP",
        request("GET", "/admin/users", Some(admin.clone()), &[]),
    )
    .await;
    serve(
        &gate,
        "Admin behind TLS-terminating proxy",
        request(
            "GET",
            "/admin/users",
            Some(admin),
            &[("x-forwarded-proto", "https"), ("x-forwarded-for", "198.51.100.7")],
        ),
    )
    .await;
    serve(&gate, "API call", request("POST", "/api/v2/orders", None, &[])).await;
    serve(
        &gate,
        "API call during maintenance",
        request("POST", "/api/v2/orders", None, &[("x-maintenance-window", "1")]),
    )
    .await;
    serve(&gate, "Unlisted path", request("GET", "/reports", None, &[])).await;

    println!("\n=== Summary ===");
    println!("The first rule whose clauses all hold decides; otherwise DROP.");

    Ok(())
}

#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Memory backend: every test binary gets a fresh, empty store
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_contacts-api"));
        cmd.env("APP_ENV", "development")
            .env("HOST", "127.0.0.1")
            .env("CONTACTS_API_PORT", port.to_string())
            .env("DATABASE_URL", "memory://")
            .env("SECURITY_JWT_SECRET", "integration-test-secret-0123456789abcdef")
            .env_remove("SECURITY_JWT_PREVIOUS_SECRET")
            .env("SECURITY_BCRYPT_COST", "4")
            .env("BOOTSTRAP_ADMIN_USERNAME", ADMIN_USERNAME)
            .env("BOOTSTRAP_ADMIN_PASSWORD", ADMIN_PASSWORD)
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Logs in and returns the response body (`token`, `userId`, `role`).
pub async fn login(server: &TestServer, username: &str, password: &str) -> Result<Value> {
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login for {} failed: {}", username, res.status());
    Ok(res.json().await?)
}

pub async fn admin_token(server: &TestServer) -> Result<String> {
    let body = login(server, ADMIN_USERNAME, ADMIN_PASSWORD).await?;
    body["token"]
        .as_str()
        .map(str::to_string)
        .context("login response has no token")
}

/// Creates a regular user through the admin API and returns a token for it.
pub async fn user_token(server: &TestServer, username: &str, password: &str) -> Result<(i64, String)> {
    let admin = admin_token(server).await?;
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/users"))
        .bearer_auth(&admin)
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "creating {} failed: {}", username, res.status());

    let body = login(server, username, password).await?;
    let id = body["userId"].as_i64().context("login response has no userId")?;
    let token = body["token"].as_str().context("login response has no token")?.to_string();
    Ok((id, token))
}

pub fn contact_body(first_name: &str) -> Value {
    json!({
        "firstName": first_name,
        "lastName": "Doe",
        "email": "jane@example.com",
        "tajNumber": "123456789",
        "taxId": "1234567890",
        "motherName": "Mary",
        "birthDate": "1990-04-01",
        "phoneNumbers": ["1234567890"],
        "addresses": [{ "street": "Main St", "city": "X", "zipCode": "00000" }]
    })
}

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use branch_notes_api::auth::{generate_jwt, Claims};
use branch_notes_api::config::{PaginationConfig, SecurityConfig};
use branch_notes_api::database::models::{Note, User};
use branch_notes_api::database::MemoryStore;
use branch_notes_api::{app, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";

/// A server on its own port, backed by a fresh in-memory store
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            store.clone(),
            PaginationConfig {
                default_limit: 20,
                max_limit: 100,
            },
            SecurityConfig {
                jwt_secret: JWT_SECRET.to_string(),
                jwt_expiry_hours: 1,
                cors_origins: Vec::new(),
            },
        );

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn user(&self, email: &str) -> User {
        self.store.insert_user(User::new(email)).await
    }

    /// POST /users/:id/branches and return the new branch id
    pub async fn create_branch(&self, user_id: Uuid) -> Result<Uuid> {
        let body: Value = self
            .client
            .post(self.url(&format!("/users/{}/branches", user_id)))
            .send()
            .await?
            .json()
            .await?;
        let id = body["newBranch"]["id"]
            .as_str()
            .context("response has no newBranch.id")?;
        Ok(Uuid::parse_str(id)?)
    }

    /// Give a branch a latest note written by `author` `minutes_ago` minutes ago
    pub async fn touch(&self, branch_id: Uuid, author: Uuid, minutes_ago: i64) -> Result<()> {
        let note = self
            .store
            .insert_note(Note::new(author, Utc::now() - Duration::minutes(minutes_ago)))
            .await;
        self.store.set_latest_note(branch_id, note.id).await?;
        Ok(())
    }

    pub async fn get_json(&self, path: &str) -> Result<(reqwest::StatusCode, Value)> {
        let res = self.client.get(self.url(path)).send().await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }

    pub async fn share(
        &self,
        branch_id: Uuid,
        email: &str,
        permission: &str,
    ) -> Result<(reqwest::StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(&format!("/branches/{}/sharing", branch_id)))
            .json(&serde_json::json!({
                "sharingInfo": { "email": email, "permission": permission }
            }))
            .send()
            .await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }
}

pub fn token_for(user_id: Uuid) -> String {
    generate_jwt(&Claims::new(user_id, 1), JWT_SECRET).expect("failed to sign test token")
}

pub fn branch_ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry["branch"]["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

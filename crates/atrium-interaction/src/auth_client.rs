//! Client for the relay's mock auth endpoints.

use crate::error::TransportError;
use atrium_core::auth::{AccessToken, Identity, LoginRequest, RegisterRequest};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    server_url: String,
}

#[derive(Deserialize)]
struct RegisterResponse {
    message: String,
}

impl AuthClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `POST /auth/login`; a 401 surfaces as `TransportError::Status`.
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, TransportError> {
        let body = LoginRequest {
            username: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(format!("{}/auth/login", self.server_url))
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }

    /// `POST /auth/register`; returns the server's confirmation message.
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, TransportError> {
        let response = self
            .client
            .post(format!("{}/auth/register", self.server_url))
            .json(request)
            .send()
            .await?;
        let body: RegisterResponse = read_json(response).await?;
        Ok(body.message)
    }

    /// `GET /auth/auth` with a bearer token.
    pub async fn whoami(&self, token: &str) -> Result<Identity, TransportError> {
        let response = self
            .client
            .get(format!("{}/auth/auth", self.server_url))
            .bearer_auth(token)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(TransportError::from_status(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
}

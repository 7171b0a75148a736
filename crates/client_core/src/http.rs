use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::ColorState,
    error::LampError,
    protocol::{ColorStateResponse, LampCommand},
};
use tracing::debug;
use url::Url;

use crate::LampBackend;

/// Talks to the lamp's HTTP listener; every command is a `GET /?<query>`.
pub struct HttpLampBackend {
    http: Client,
    base: Url,
}

impl HttpLampBackend {
    pub fn new(server_url: &str) -> Result<Self, LampError> {
        Self::with_client(server_url, Client::new())
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, LampError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LampError::Transport(err.to_string()))?;
        Self::with_client(server_url, http)
    }

    fn with_client(server_url: &str, http: Client) -> Result<Self, LampError> {
        let base = Url::parse(server_url.trim()).map_err(|err| {
            LampError::Transport(format!("invalid server url {server_url:?}: {err}"))
        })?;
        Ok(Self { http, base })
    }

    pub fn command_url(&self, command: &LampCommand) -> Url {
        let mut url = self.base.clone();
        let query = command.query_string();
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        url
    }
}

#[async_trait]
impl LampBackend for HttpLampBackend {
    async fn send(&self, command: LampCommand) -> Result<ColorState, LampError> {
        let url = self.command_url(&command);
        debug!(command = command.name(), %url, "sending lamp command");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| LampError::Transport(err.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(LampError::Status(status.as_u16()));
        }

        let body: ColorStateResponse = res
            .json()
            .await
            .map_err(|err| LampError::MalformedResponse(err.to_string()))?;
        body.into_state()
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;

//! RabbitMQ management HTTP API client.
//!
//! Credentials are passed in by the caller; do not log them.

use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use rmqt_schemas::{Binding, DestinationKind, Exchange, Queue, VHost};

use crate::wire::{
    BindingDeclare, ExchangeDeclare, QueueDeclare, RawAliveness, RawApiError, RawBinding,
    RawExchange, RawQueue, RawVhost,
};
use crate::{BindingSpec, ExchangeSpec, ManagementClient, ManagementError, QueueSpec};

#[derive(Debug, Clone)]
pub struct HttpManagementClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl HttpManagementClient {
    /// `base_url` is the management listener root, e.g. `http://localhost:15672`.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ManagementError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ManagementError::InvalidRequest(format!("invalid management url '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ManagementError::InvalidRequest(format!(
                "management url '{base_url}' cannot carry a path"
            )));
        }
        let http = Client::builder()
            .build()
            .map_err(|e| ManagementError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password: password.into(),
        })
    }

    /// `<base>/api/<segments...>`, every segment percent-encoded on its own
    /// (the default vhost `/` becomes `%2F`).
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ManagementError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ManagementError::InvalidRequest(format!(
                    "management url '{}' cannot carry a path",
                    self.base_url
                ))
            })?;
            path.pop_if_empty().push("api").extend(segments);
        }
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T, ManagementError> {
        debug!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .map_err(|e| ManagementError::Transport(e.to_string()))?;
        let resp = check_status(resp, resource)?;
        resp.json::<T>()
            .map_err(|e| ManagementError::Decode(format!("{resource}: {e}")))
    }

    fn send_json<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        resource: &str,
    ) -> Result<(), ManagementError> {
        debug!(%url, %method, "send");
        let resp = self
            .http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .map_err(|e| ManagementError::Transport(e.to_string()))?;
        check_status(resp, resource)?;
        Ok(())
    }
}

/// 404 is NotFound; any other non-2xx becomes `Api` with the broker's reason.
fn check_status(resp: Response, resource: &str) -> Result<Response, ManagementError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ManagementError::not_found(resource));
    }
    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<RawApiError>(&body)
        .ok()
        .and_then(|e| e.message())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });
    Err(ManagementError::Api {
        status: status.as_u16(),
        message: format!("{resource}: {message}"),
    })
}

impl ManagementClient for HttpManagementClient {
    fn list_vhosts(&self) -> Result<Vec<VHost>, ManagementError> {
        let url = self.endpoint(&["vhosts"])?;
        let raw: Vec<RawVhost> = self.get_json(url, "vhosts")?;
        Ok(raw.into_iter().map(RawVhost::into_model).collect())
    }

    fn get_vhost(&self, name: &str) -> Result<VHost, ManagementError> {
        let url = self.endpoint(&["vhosts", name])?;
        let raw: RawVhost = self.get_json(url, &format!("vhost '{name}'"))?;
        Ok(raw.into_model())
    }

    fn create_vhost(&self, name: &str) -> Result<(), ManagementError> {
        let url = self.endpoint(&["vhosts", name])?;
        self.send_json(
            Method::PUT,
            url,
            &serde_json::json!({}),
            &format!("vhost '{name}'"),
        )
    }

    fn get_exchange(&self, vhost: &str, name: &str) -> Result<Exchange, ManagementError> {
        let url = self.endpoint(&["exchanges", vhost, name])?;
        let raw: RawExchange = self.get_json(url, &format!("exchange '{vhost}/{name}'"))?;
        Ok(raw.into_model())
    }

    fn create_exchange(&self, vhost: &str, spec: &ExchangeSpec) -> Result<(), ManagementError> {
        let url = self.endpoint(&["exchanges", vhost, &spec.name])?;
        self.send_json(
            Method::PUT,
            url,
            &ExchangeDeclare::from(spec),
            &format!("exchange '{vhost}/{}'", spec.name),
        )
    }

    fn get_queue(&self, vhost: &str, name: &str) -> Result<Queue, ManagementError> {
        let url = self.endpoint(&["queues", vhost, name])?;
        let raw: RawQueue = self.get_json(url, &format!("queue '{vhost}/{name}'"))?;
        Ok(raw.into_model())
    }

    fn create_queue(&self, vhost: &str, spec: &QueueSpec) -> Result<(), ManagementError> {
        let url = self.endpoint(&["queues", vhost, &spec.name])?;
        self.send_json(
            Method::PUT,
            url,
            &QueueDeclare::from(spec),
            &format!("queue '{vhost}/{}'", spec.name),
        )
    }

    fn get_bindings_for_queue(
        &self,
        vhost: &str,
        queue: &str,
    ) -> Result<Vec<Binding>, ManagementError> {
        let url = self.endpoint(&["queues", vhost, queue, "bindings"])?;
        let raw: Vec<RawBinding> =
            self.get_json(url, &format!("bindings of queue '{vhost}/{queue}'"))?;
        Ok(raw.into_iter().map(RawBinding::into_model).collect())
    }

    fn get_bindings_with_destination_exchange(
        &self,
        vhost: &str,
        exchange: &str,
    ) -> Result<Vec<Binding>, ManagementError> {
        let url = self.endpoint(&["exchanges", vhost, exchange, "bindings", "destination"])?;
        let raw: Vec<RawBinding> = self.get_json(
            url,
            &format!("bindings into exchange '{vhost}/{exchange}'"),
        )?;
        Ok(raw.into_iter().map(RawBinding::into_model).collect())
    }

    fn create_binding(&self, vhost: &str, spec: &BindingSpec) -> Result<(), ManagementError> {
        let dest_segment = match spec.destination_kind {
            DestinationKind::Queue => "q",
            DestinationKind::Exchange => "e",
        };
        let url = self.endpoint(&[
            "bindings",
            vhost,
            "e",
            &spec.source,
            dest_segment,
            &spec.destination,
        ])?;
        self.send_json(
            Method::POST,
            url,
            &BindingDeclare::from(spec),
            &format!(
                "binding '{vhost}/{}' -> '{vhost}/{}'",
                spec.source, spec.destination
            ),
        )
    }

    fn list_exchanges(&self, vhost: &str) -> Result<Vec<Exchange>, ManagementError> {
        let url = self.endpoint(&["exchanges", vhost])?;
        let raw: Vec<RawExchange> = self.get_json(url, &format!("exchanges of '{vhost}'"))?;
        Ok(raw.into_iter().map(RawExchange::into_model).collect())
    }

    fn list_queues(&self, vhost: &str) -> Result<Vec<Queue>, ManagementError> {
        let url = self.endpoint(&["queues", vhost])?;
        let raw: Vec<RawQueue> = self.get_json(url, &format!("queues of '{vhost}'"))?;
        Ok(raw.into_iter().map(RawQueue::into_model).collect())
    }

    fn list_bindings(&self, vhost: &str) -> Result<Vec<Binding>, ManagementError> {
        let url = self.endpoint(&["bindings", vhost])?;
        let raw: Vec<RawBinding> = self.get_json(url, &format!("bindings of '{vhost}'"))?;
        Ok(raw.into_iter().map(RawBinding::into_model).collect())
    }

    fn is_alive(&self, vhost: &str) -> Result<bool, ManagementError> {
        let url = self.endpoint(&["aliveness-test", vhost])?;
        let raw: RawAliveness = self.get_json(url, &format!("aliveness of '{vhost}'"))?;
        Ok(raw.status.eq_ignore_ascii_case("ok"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpManagementClient {
        HttpManagementClient::new(base, "guest", "guest").unwrap()
    }

    #[test]
    fn default_vhost_is_percent_encoded() {
        let c = client("http://localhost:15672");
        let url = c.endpoint(&["queues", "/", "q1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:15672/api/queues/%2F/q1");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let c = client("http://broker.internal/rabbit/");
        let url = c.endpoint(&["exchanges", "prod", "orders"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://broker.internal/rabbit/api/exchanges/prod/orders"
        );
    }

    #[test]
    fn names_with_reserved_characters_are_encoded() {
        let c = client("http://localhost:15672");
        let url = c
            .endpoint(&["bindings", "a/b", "e", "ex one", "q", "q#1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:15672/api/bindings/a%2Fb/e/ex%20one/q/q%231"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpManagementClient::new("not a url", "u", "p").unwrap_err();
        assert!(matches!(err, ManagementError::InvalidRequest(_)));

        let err = HttpManagementClient::new("mailto:ops@example.com", "u", "p").unwrap_err();
        assert!(matches!(err, ManagementError::InvalidRequest(_)));
    }
}

use crate::connector::config::ControlPlaneConfig;
use crate::connector::spec::ConnectorSpec;
use crate::error::StreamSQLResult;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

/// Status and body of one control-plane response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new<B>(status: u16, body: B) -> Self
    where
        B: Into<String>,
    {
        HttpReply {
            status,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        HttpReply::new(status, "")
    }
}

/// The four calls made against the capture-connector runtime. Transport
/// failures are errors; every HTTP status is a reply and is interpreted by
/// the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn get_root(&self) -> StreamSQLResult<HttpReply>;

    async fn get_connector(&self, name: &str) -> StreamSQLResult<HttpReply>;

    async fn delete_connector(&self, name: &str) -> StreamSQLResult<HttpReply>;

    async fn post_connector(&self, spec: &ConnectorSpec) -> StreamSQLResult<HttpReply>;
}

pub struct KafkaConnectClient {
    config: ControlPlaneConfig,
    client: Client,
}

impl KafkaConnectClient {
    pub fn new(config: &ControlPlaneConfig) -> StreamSQLResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(KafkaConnectClient {
            config: config.clone(),
            client,
        })
    }

    fn connector_url(&self, name: &str) -> String {
        format!("{}/connectors/{}", self.config.url, name)
    }

    async fn into_reply(response: reqwest::Response) -> StreamSQLResult<HttpReply> {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl ControlPlane for KafkaConnectClient {
    async fn get_root(&self) -> StreamSQLResult<HttpReply> {
        let url = format!("{}/", self.config.url);
        let response = self
            .client
            .get(url)
            .timeout(self.config.probe_timeout)
            .send()
            .await?;
        Self::into_reply(response).await
    }

    async fn get_connector(&self, name: &str) -> StreamSQLResult<HttpReply> {
        debug!("GET {}", self.connector_url(name));
        let response = self.client.get(self.connector_url(name)).send().await?;
        Self::into_reply(response).await
    }

    async fn delete_connector(&self, name: &str) -> StreamSQLResult<HttpReply> {
        debug!("DELETE {}", self.connector_url(name));
        let response = self.client.delete(self.connector_url(name)).send().await?;
        Self::into_reply(response).await
    }

    async fn post_connector(&self, spec: &ConnectorSpec) -> StreamSQLResult<HttpReply> {
        let url = format!("{}/connectors", self.config.url);
        debug!("POST {} ({})", url, spec.name);
        let response = self
            .client
            .post(url)
            .timeout(self.config.create_timeout)
            .json(spec)
            .send()
            .await?;
        Self::into_reply(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_url() {
        let config = ControlPlaneConfig {
            url: "http://localhost:8083".to_string(),
            ..ControlPlaneConfig::default()
        };
        let client = KafkaConnectClient::new(&config).unwrap();
        assert_eq!(
            client.connector_url("mssql-source-connector-db1-dbo_Customers"),
            "http://localhost:8083/connectors/mssql-source-connector-db1-dbo_Customers"
        );
    }

    #[test]
    fn test_http_reply_status() {
        let reply = HttpReply::status(204);
        assert_eq!(reply.status, 204);
        assert!(reply.body.is_empty());
    }
}

//! reqwest client for the upstream customer API
//!
//! `GET <url>?limit=N&last=<cursor>`, optionally with a bearer credential.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::models::{CustomerPage, ExternalCustomer};

use super::{CustomerSource, PageRequest, SourceError};

pub struct HttpCustomerSource {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpCustomerSource {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }
}

#[async_trait]
impl CustomerSource for HttpCustomerSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<ExternalCustomer>, SourceError> {
        let mut query: Vec<(&str, String)> = vec![("limit", request.limit.to_string())];
        if let Some(last) = &request.last {
            query.push(("last", last.to_string()));
        }

        let mut builder = self.client.get(&self.url).query(&query);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let page: CustomerPage = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        let records = page.into_records();
        tracing::debug!(
            count = records.len(),
            last = ?request.last.as_ref().map(|c| c.as_str()),
            "Fetched customer page"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::CustomerId;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_limit_cursor_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers"))
            .and(query_param("limit", "250"))
            .and(query_param("last", "77"))
            .and(header("authorization", "Bearer upstream-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": 78, "customerId": 78}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpCustomerSource::new(
            format!("{}/customers", server.uri()),
            Some("upstream-token".into()),
        )
        .unwrap();

        let records = source
            .fetch_page(&PageRequest {
                limit: 250,
                last: CustomerId::parse("77"),
            })
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].external_id().unwrap().as_str(), "78");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let source = HttpCustomerSource::new(server.uri(), None).unwrap();
        let err = source
            .fetch_page(&PageRequest {
                limit: 10,
                last: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let source = HttpCustomerSource::new(server.uri(), None).unwrap();
        let err = source
            .fetch_page(&PageRequest {
                limit: 10,
                last: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Decode(_)));
    }
}

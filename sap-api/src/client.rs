use crate::config::SapConfig;
use crate::errors::CallerError;
use crate::metrics_defs::SAP_REQUEST_DURATION;
use bytes::Bytes;
use reqwest::RequestBuilder;
use reqwest::header::ACCEPT;
use std::time::{Duration, Instant};
use tracing::debug;

pub const BUSINESS_USER_COLLECTION_API: &str = "BusinessUserCollectionData";
pub const EMPLOYEE_BASIC_DATA_API: &str = "EmployeeBasicDataData";

/// HTTP access to the SAP `c4codataapi` OData service.
#[derive(Clone)]
pub struct SapClient {
    client: reqwest::Client,
    service_url: String,
    api_key: String,
}

impl SapClient {
    pub fn new(config: &SapConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let service_url = format!(
            "{}/{}",
            config.base_url.as_str().trim_end_matches('/'),
            "c4codataapi"
        );

        Ok(SapClient {
            client: builder.build()?,
            service_url,
            api_key: config.api_key.clone(),
        })
    }

    /// GET `{base}/c4codataapi/{api}?$filter={field} eq '{value}'`.
    ///
    /// `value` is interpolated verbatim; a quote inside it is not escaped.
    pub async fn get_filtered(
        &self,
        api: &str,
        field: &str,
        value: &str,
    ) -> Result<Bytes, CallerError> {
        let url = format!("{}/{}", self.service_url, api);
        let filter = format!("{field} eq '{value}'");
        let request = self.client.get(url).query(&[("$filter", filter)]);

        self.send(request, api).await
    }

    /// GET a URL taken from a previous response, e.g. a deferred navigation link.
    pub async fn get_url(&self, url: &str, entity: &'static str) -> Result<Bytes, CallerError> {
        self.send(self.client.get(url), entity).await
    }

    async fn send(&self, request: RequestBuilder, entity: &str) -> Result<Bytes, CallerError> {
        let start = Instant::now();
        let response = request
            .header("APIKey", &self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        shared::histogram!(SAP_REQUEST_DURATION, "entity" => entity.to_string())
            .record(start.elapsed().as_secs_f64());

        let status = response.status();
        debug!(url = %response.url(), %status, "SAP response");
        if !status.is_success() {
            return Err(CallerError::UnexpectedStatus {
                url: response.url().to_string(),
                status,
            });
        }

        Ok(response.bytes().await?)
    }
}

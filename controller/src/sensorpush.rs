//! SensorPush cloud API reader.
//!
//! Each read signs in with the account credentials, exchanges the
//! authorization for an access token and asks for the most recent samples of
//! one sensor. The first sample returned is the latest.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use greenhouse_common::{TemperatureSample, SECRET_SENSORPUSH_PASSWORD, SECRET_SENSORPUSH_USER};

use crate::{error::UpstreamError, secrets::SecretProvider};

pub const SENSORPUSH_API_URL: &str = "https://api.sensorpush.com/api/v1";

#[async_trait]
pub trait SensorReader: Send + Sync {
    async fn latest_sample(
        &self,
        sensor_id: &str,
        sample_limit: u32,
    ) -> Result<TemperatureSample, UpstreamError>;
}

pub struct SensorPushClient {
    client: reqwest::Client,
    secrets: Arc<dyn SecretProvider>,
    api_url: String,
}

#[derive(Debug, Serialize)]
struct AuthorizeRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    authorization: Option<String>,
}

#[derive(Debug, Serialize)]
struct AccessTokenRequest<'a> {
    authorization: &'a str,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    accesstoken: Option<String>,
}

#[derive(Debug, Serialize)]
struct SamplesRequest<'a> {
    limit: u32,
    sensors: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
struct SamplesResponse {
    #[serde(default)]
    sensors: HashMap<String, Vec<RawSample>>,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    observed: Option<String>,
    temperature: Option<RawTemperature>,
}

/// The API sends numbers, but string-encoded readings have been seen too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTemperature {
    Number(f64),
    Text(String),
}

impl RawSample {
    /// A missing or non-numeric temperature becomes NaN so the controller
    /// rejects the sample instead of acting on a guess.
    fn into_sample(self, sensor_id: &str) -> TemperatureSample {
        let value = match self.temperature {
            Some(RawTemperature::Number(value)) => value,
            Some(RawTemperature::Text(text)) => text.trim().parse().unwrap_or(f64::NAN),
            None => f64::NAN,
        };

        let sample = TemperatureSample::new(sensor_id, value);
        match self.observed.as_deref().and_then(parse_observed) {
            Some(observed) => sample.observed_at(observed),
            None => sample,
        }
    }
}

fn parse_observed(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|observed| observed.with_timezone(&Utc))
}

fn latest_from(
    response: SamplesResponse,
    sensor_id: &str,
) -> Result<TemperatureSample, UpstreamError> {
    let mut sensors = response.sensors;
    let samples = sensors
        .remove(sensor_id)
        .ok_or_else(|| UpstreamError::UnknownSensor(sensor_id.to_string()))?;
    let latest = samples
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::NoSamples(sensor_id.to_string()))?;
    Ok(latest.into_sample(sensor_id))
}

impl SensorPushClient {
    pub fn new(
        secrets: Arc<dyn SecretProvider>,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(client, secrets, SENSORPUSH_API_URL.to_string()))
    }

    pub fn with_client(
        client: reqwest::Client,
        secrets: Arc<dyn SecretProvider>,
        api_url: String,
    ) -> Self {
        Self {
            client,
            secrets,
            api_url,
        }
    }

    async fn access_token(&self) -> Result<String, UpstreamError> {
        let email = self.secrets.get_secret(SECRET_SENSORPUSH_USER).await?;
        let password = self.secrets.get_secret(SECRET_SENSORPUSH_PASSWORD).await?;

        let authorized: AuthorizeResponse = self
            .post_json(
                "oauth/authorize",
                None,
                &AuthorizeRequest {
                    email: &email,
                    password: &password,
                },
            )
            .await?;
        let authorization = authorized
            .authorization
            .ok_or(UpstreamError::NotAuthorized)?;

        let token: AccessTokenResponse = self
            .post_json(
                "oauth/accesstoken",
                None,
                &AccessTokenRequest {
                    authorization: &authorization,
                },
            )
            .await?;
        token.accesstoken.ok_or(UpstreamError::NotAuthorized)
    }

    async fn post_json<B, T>(
        &self,
        path: &str,
        access_token: Option<&str>,
        body: &B,
    ) -> Result<T, UpstreamError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let mut request = self
            .client
            .post(format!("{}/{path}", self.api_url))
            .json(body);
        if let Some(token) = access_token {
            request = request.header(reqwest::header::AUTHORIZATION, token);
        }

        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response.json::<T>().await.map_err(request_error)
    }
}

fn request_error(err: reqwest::Error) -> UpstreamError {
    UpstreamError::Request(err.without_url())
}

#[async_trait]
impl SensorReader for SensorPushClient {
    async fn latest_sample(
        &self,
        sensor_id: &str,
        sample_limit: u32,
    ) -> Result<TemperatureSample, UpstreamError> {
        let token = self.access_token().await?;
        let response: SamplesResponse = self
            .post_json(
                "samples",
                Some(&token),
                &SamplesRequest {
                    limit: sample_limit,
                    sensors: [sensor_id],
                },
            )
            .await?;

        let sample = latest_from(response, sensor_id)?;
        debug!(
            sensor = sensor_id,
            value = sample.value,
            "fetched latest sensor sample"
        );
        Ok(sample)
    }
}

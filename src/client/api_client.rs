use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::{
    models::WorkoutEntryResponse,
    services::{
        auth_service::{LoginResponse, MessageResponse},
        workout_service::{
            DailyWorkoutsResponse, LogWorkoutRequest, WorkoutHistoryResponse, WorkoutLoggedResponse,
            WorkoutSummaryResponse, WorkoutTotalsResponse,
        },
    },
    utils::{build_client, join_url, ClientError},
};

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct NewAccount<'a> {
    email: &'a str,
    password: &'a str,
    username: &'a str,
}

/// Client for the account/workout API used by the training app.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: build_client(timeout),
        }
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn read<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ClientError> {
        let status = response.status();

        if !status.is_success() {
            // Error bodies carry a `message` the app shows verbatim
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<R>().await.map_err(ClientError::from)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<R, ClientError> {
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Self::read(response).await
    }

    pub async fn signup(&self, email: &str, password: &str, username: &str) -> Result<MessageResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/signup"))
            .json(&NewAccount { email, password, username })
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&Credentials { email, password })
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn log_workout(&self, request: &LogWorkoutRequest) -> Result<WorkoutLoggedResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/api/workouts"))
            .json(request)
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn workouts_on_date(&self, email: &str, date: NaiveDate) -> Result<DailyWorkoutsResponse, ClientError> {
        self.get(
            "/api/workouts",
            &[("email", email.to_string()), ("date", date.format("%Y-%m-%d").to_string())],
        )
        .await
    }

    pub async fn workout_summary(&self, email: &str) -> Result<WorkoutSummaryResponse, ClientError> {
        self.get("/api/workout-summary", &[("email", email.to_string())]).await
    }

    pub async fn workout_totals(&self, email: &str) -> Result<WorkoutTotalsResponse, ClientError> {
        self.get("/api/workout-totals", &[("email", email.to_string())]).await
    }

    pub async fn history(
        &self,
        email: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WorkoutEntryResponse>, ClientError> {
        let query = history_query(email, from, to);
        let response: WorkoutHistoryResponse = self.get("/api/workouts/history", &query).await?;
        Ok(response.workouts)
    }
}

fn history_query(email: &str, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Vec<(&'static str, String)> {
    let mut query = vec![("email", email.to_string())];
    if let Some(from) = from {
        query.push(("from", from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = to {
        query.push(("to", to.format("%Y-%m-%d").to_string()));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("http://192.168.1.5:3000/", Duration::from_secs(10));
        assert_eq!(client.url("/api/workouts"), "http://192.168.1.5:3000/api/workouts");
    }

    #[test]
    fn test_history_query_skips_open_bounds() {
        let from = NaiveDate::from_ymd_opt(2025, 5, 1);
        let query = history_query("ana@example.com", from, None);
        assert_eq!(
            query,
            vec![("email", "ana@example.com".to_string()), ("from", "2025-05-01".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        // Port 9 (discard) is closed on any sane test machine
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(10));
        let err = client.workout_summary("ana@example.com").await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }

    #[tokio::test]
    async fn test_silent_server_hits_configured_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accepts connections and never answers
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = ApiClient::new(format!("http://{}", addr), Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = client.workout_totals("ana@example.com").await.unwrap_err();

        assert!(matches!(err, ClientError::Http(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

//! PostgREST (Supabase REST) store implementation.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, Url};
use tracing::instrument;

use answercheck_core::model::{Subject, SubmissionRecord, SubmissionUpdate, TaskRecord};
use answercheck_core::traits::{
    progress_table, task_bank_table, PageRequest, SubmissionStore, TaskCatalog,
};

use crate::error::{from_reqwest, from_status, StoreError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const SUBMISSION_COLUMNS: &str = "user_id,task_id,user_answer,score";
const TASK_COLUMNS: &str = "id,answer,points,task_number";

/// Store backed by a PostgREST endpoint, addressed as `{base_url}/rest/v1/{table}`.
pub struct PostgrestStore {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, api_key: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
            client,
        })
    }

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> Result<Url, StoreError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        Url::parse_with_params(&url, params)
            .map_err(|e| StoreError::NetworkError(format!("invalid store URL {url}: {e}")))
    }

    /// Send a request and map failures and error statuses onto `StoreError`.
    async fn send(
        &self,
        method: Method,
        table: &str,
        params: &[(&str, String)],
        body: Option<&SubmissionUpdate>,
    ) -> Result<reqwest::Response, StoreError> {
        let url = self.table_url(table, params)?;
        let mut request = self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key));
        if let Some(body) = body {
            request = request.header("Prefer", "return=minimal").json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| from_reqwest(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            return Err(from_status(status, retry_after.as_deref(), body, table));
        }
        Ok(response)
    }
}

#[async_trait]
impl TaskCatalog for PostgrestStore {
    #[instrument(skip(self), fields(%subject))]
    async fn get_task(&self, subject: Subject, task_id: i64) -> anyhow::Result<Option<TaskRecord>> {
        let table = task_bank_table(subject);
        let params = [
            ("select", TASK_COLUMNS.to_string()),
            ("id", format!("eq.{task_id}")),
            ("limit", "1".to_string()),
        ];
        let response = self.send(Method::GET, &table, &params, None).await?;
        let mut rows: Vec<TaskRecord> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("task {task_id} in {table}: {e}")))?;
        Ok(rows.pop())
    }
}

#[async_trait]
impl SubmissionStore for PostgrestStore {
    fn name(&self) -> &str {
        "postgrest"
    }

    #[instrument(skip(self), fields(%subject, offset = page.offset, limit = page.limit))]
    async fn fetch_submissions(
        &self,
        subject: Subject,
        page: PageRequest,
    ) -> anyhow::Result<Vec<SubmissionRecord>> {
        let table = progress_table(subject);
        let params = [
            ("select", SUBMISSION_COLUMNS.to_string()),
            ("order", "user_id.asc,task_id.asc".to_string()),
            ("offset", page.offset.to_string()),
            ("limit", page.limit.to_string()),
        ];
        let response = self.send(Method::GET, &table, &params, None).await?;
        let rows = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("{table}: {e}")))?;
        Ok(rows)
    }

    #[instrument(skip(self, update), fields(%subject))]
    async fn update_submission(
        &self,
        subject: Subject,
        user_id: &str,
        task_id: i64,
        update: &SubmissionUpdate,
    ) -> anyhow::Result<()> {
        let table = progress_table(subject);
        let params = [
            ("user_id", format!("eq.{user_id}")),
            ("task_id", format!("eq.{task_id}")),
        ];
        self.send(Method::PATCH, &table, &params, Some(update))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use answercheck_core::model::PointValue;

    fn store(server: &MockServer) -> PostgrestStore {
        PostgrestStore::new(&server.uri(), "test-key").unwrap()
    }

    #[tokio::test]
    async fn fetches_a_page_of_submissions() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/chemistry_ege_progress"))
            .and(header("apikey", "test-key"))
            .and(header("Authorization", "Bearer test-key"))
            .and(query_param("offset", "1000"))
            .and(query_param("limit", "1000"))
            .and(query_param("select", SUBMISSION_COLUMNS))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"user_id": "u1", "task_id": 14, "user_answer": "123", "score": 2},
                {"user_id": "u2", "task_id": "null", "user_answer": null, "score": null}
            ])))
            .mount(&server)
            .await;

        let rows = store(&server)
            .fetch_submissions(Subject::Chemistry, PageRequest { offset: 1000, limit: 1000 })
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].parsed_task_id(), Some(14));
        assert_eq!(rows[1].parsed_task_id(), None);
    }

    #[tokio::test]
    async fn gets_task_or_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/biology_ege_task_bank"))
            .and(query_param("id", "eq.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 7, "answer": "12/21", "points": 2, "task_number": "№2"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/biology_ege_task_bank"))
            .and(query_param("id", "eq.8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let store = store(&server);
        let task = store.get_task(Subject::Biology, 7).await.unwrap().unwrap();
        assert_eq!(task.points, PointValue::Two);
        assert_eq!(task.task_number.as_deref(), Some("№2"));
        assert!(store.get_task(Subject::Biology, 8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn patches_one_submission() {
        let server = MockServer::start().await;
        let update = SubmissionUpdate {
            score: 1,
            is_completed: true,
            last_updated: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        };

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/chemistry_ege_progress"))
            .and(query_param("user_id", "eq.user 1"))
            .and(query_param("task_id", "eq.14"))
            .and(body_json(serde_json::json!({
                "score": 1,
                "is_completed": true,
                "last_updated": "2025-01-01T00:00:00Z"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .update_submission(Subject::Chemistry, "user 1", 14, &update)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = store(&server)
            .fetch_submissions(Subject::Chemistry, PageRequest::first(10))
            .await
            .unwrap_err();
        let store_err = err.downcast_ref::<StoreError>().unwrap();
        assert!(store_err.is_permanent());
        assert!(err.to_string().contains("authentication"));
    }

    #[tokio::test]
    async fn rate_limiting() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let err = store(&server)
            .get_task(Subject::Chemistry, 1)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>().and_then(StoreError::retry_after_ms),
            Some(2000)
        );
    }

    #[tokio::test]
    async fn missing_table() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = store(&server)
            .fetch_submissions(Subject::Biology, PageRequest::first(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::TableNotFound(t)) if t == "biology_ege_progress"
        ));
    }

    #[tokio::test]
    async fn undecodable_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = store(&server)
            .fetch_submissions(Subject::Biology, PageRequest::first(10))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Decode(_))));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let store = PostgrestStore::new("https://example.supabase.co/", "k").unwrap();
        let url = store
            .table_url("chemistry_ege_progress", &[("id", "eq.1".to_string())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.supabase.co/rest/v1/chemistry_ege_progress?id=eq.1"
        );
    }
}

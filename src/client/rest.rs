//! # REST 데이터 클라이언트
//!
//! PostgREST 호환 엔드포인트(Supabase의 `/rest/v1`)를 [`reqwest`]로 호출합니다.
//!
//! | 요청 | HTTP |
//! |------|------|
//! | select | `GET /rest/v1/{table}?select=..&col=eq.value` |
//! | select + single | 위와 같고 `Accept: application/vnd.pgrst.object+json` |
//! | insert | `POST /rest/v1/{table}` |
//! | update | `PATCH /rest/v1/{table}?col=eq.value` |
//!
//! 쓰기 요청은 `Prefer: return=representation`으로 저장된 행을 돌려받습니다.

use super::{ClientError, Credentials, DataClient, Filter, Request, Row};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

/// BaaS REST API 클라이언트
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestClient {
    /// * `base_url` - 프로젝트 URL (예: `https://xyz.supabase.co`)
    /// * `anon_key` - 공개(anon) API 키
    pub fn new(base_url: &str, anon_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        let token = credentials
            .access_token
            .as_deref()
            .unwrap_or(&self.anon_key);
        builder
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {token}"))
    }

    /// 응답을 행 목록으로 변환합니다. 실패 상태 코드면 본문의 `message`를 꺼냅니다.
    async fn rows(response: reqwest::Response) -> Result<Vec<Row>, ClientError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::new(error_message(status.as_u16(), &body)));
        }
        parse_rows(&body)
    }
}

#[async_trait]
impl DataClient for RestClient {
    async fn execute(
        &self,
        credentials: &Credentials,
        request: Request,
    ) -> Result<Vec<Row>, ClientError> {
        let builder = match request {
            Request::Select {
                table,
                columns,
                filters,
                single,
            } => {
                let mut params = vec![("select".to_string(), columns.to_param())];
                params.extend(filter_params(&filters));
                let builder = self.http.get(self.table_url(&table)).query(&params);
                if single {
                    builder.header(ACCEPT, SINGLE_OBJECT)
                } else {
                    builder
                }
            }
            Request::Insert { table, row } => self
                .http
                .post(self.table_url(&table))
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&row),
            Request::Update {
                table,
                row,
                filters,
            } => self
                .http
                .patch(self.table_url(&table))
                .query(&filter_params(&filters))
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&row),
        };

        let response = self.authorized(builder, credentials).send().await?;
        Self::rows(response).await
    }
}

/// `column=eq.value` 쿼리 파라미터
fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| {
            let value = match &f.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (f.column.clone(), format!("eq.{value}"))
        })
        .collect()
}

/// 배열이면 그대로, 단일 객체(`.single()` 응답)면 한 행짜리 목록으로 만듭니다.
/// 본문이 비어 있으면 (return=minimal) 빈 목록입니다.
fn parse_rows(body: &str) -> Result<Vec<Row>, ClientError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(ClientError::new(format!("unexpected row shape: {other}"))),
            })
            .collect(),
        Ok(Value::Object(map)) => Ok(vec![map]),
        Ok(other) => Err(ClientError::new(format!("unexpected response: {other}"))),
        Err(err) => Err(ClientError::new(err.to_string())),
    }
}

/// 에러 본문 `{ "message": "..." }`에서 메시지를 꺼냅니다.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("request failed with status {status}")
            } else {
                body.to_string()
            }
        })
}

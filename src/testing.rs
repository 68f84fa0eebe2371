//! 테스트 공용 도우미: 인메모리 SQLite 세션, 시드 데이터, 항상 실패하는 클라이언트

use crate::client::{
    ClientError, Credentials, DataClient, Request, Row, Session, SqliteClient,
};
use crate::models::{ReservationId, ReservationPayload, Status};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// 마이그레이션이 적용된 인메모리 DB 세션.
/// 인메모리 DB는 연결마다 따로 생기므로 연결을 하나로 고정합니다.
pub async fn memory_session() -> Session {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Session::new(Arc::new(SqliteClient::new(pool)), Credentials::default())
}

pub async fn seed_courses(session: &Session, titles: &[&str]) {
    for title in titles {
        let row = json!({ "title": title }).as_object().cloned().unwrap();
        session.table("diving_courses").insert(row).await.unwrap();
    }
}

/// 2026-10-14 09:30 UTC, 2명, 담당 佐藤
pub fn payload(user_name: &str, status: Status) -> ReservationPayload {
    ReservationPayload {
        user_name: user_name.to_string(),
        course_title: "体験ダイビング".to_string(),
        reservation_datetime_1: Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap(),
        participants: 2,
        status,
        staff: "佐藤".to_string(),
    }
}

/// 예약을 저장하고 서버가 부여한 id를 돌려줍니다.
pub async fn seed(session: &Session, payload: ReservationPayload) -> ReservationId {
    let stored = session
        .table("reservations")
        .insert(payload.into_row())
        .await
        .unwrap();
    stored[0]["id"].as_i64().unwrap()
}

/// 모든 요청에 같은 메시지로 실패하는 클라이언트. 호출 횟수를 셉니다.
pub struct FailingClient {
    message: String,
    pub calls: AtomicUsize,
}

impl FailingClient {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataClient for FailingClient {
    async fn execute(
        &self,
        _credentials: &Credentials,
        _request: Request,
    ) -> Result<Vec<Row>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ClientError::new(self.message.clone()))
    }
}

pub fn failing_session(message: &str) -> (Session, Arc<FailingClient>) {
    let client = Arc::new(FailingClient::new(message));
    (
        Session::new(client.clone(), Credentials::default()),
        client,
    )
}

//! # 원격 데이터 클라이언트 (Remote Data Client)
//!
//! 예약 콘솔은 자체 비즈니스 로직 없이 외부 데이터베이스 서비스에 모든 읽기/쓰기를 위임합니다.
//! 이 모듈은 그 경계를 **테이블 단위 요청 계약**으로 정의합니다:
//!
//! ```text
//! session.table("reservations").select("id, status").eq("status", "確認済").fetch()
//! session.table("reservations").select("*").eq("id", 3).single().fetch()
//! session.table("reservations").insert(row)
//! session.table("reservations").update(row).eq("id", 3).execute()
//! ```
//!
//! 모든 실패는 사람이 읽을 수 있는 메시지 문자열 하나로만 전달됩니다 (`ClientError`).
//!
//! ## 구현체
//! - `rest`: PostgREST 호환 REST 엔드포인트 (reqwest)
//! - `sqlite`: 로컬 SQLite 파일 (sqlx), 개발 / 테스트용

pub mod rest;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

pub use rest::RestClient;
pub use sqlite::SqliteClient;

/// 원격 저장소가 돌려주는 한 행(row). 컬럼 이름 → JSON 값.
pub type Row = Map<String, Value>;

/// `.single()` 요청이 정확히 한 행을 찾지 못했을 때의 메시지 (PostgREST와 동일한 문구)
pub const SINGLE_ROW_MESSAGE: &str = "JSON object requested, multiple (or no) rows returned";

/// 원격 클라이언트 에러.
///
/// 구조화된 에러 코드는 없고, 메시지 문자열만 존재합니다.
/// 화면에는 이 메시지가 그대로 표시됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClientError {
    pub message: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for ClientError {
    fn from(err: sqlx::Error) -> Self {
        // sqlx 에러는 DB 드라이버 메시지를 그대로 노출합니다 (예: CHECK constraint failed)
        match err {
            sqlx::Error::Database(db) => Self::new(db.message()),
            other => Self::new(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// 조회할 컬럼 목록
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Columns {
    /// `*`: 테이블의 모든 컬럼
    All,
    /// 쉼표로 구분된 컬럼 목록
    Only(Vec<String>),
}

impl Columns {
    /// `"*"` 또는 `"id, user_name, status"` 형태의 문자열을 파싱합니다.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || text == "*" {
            return Columns::All;
        }
        Columns::Only(
            text.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// REST의 `select=` 파라미터 값
    pub fn to_param(&self) -> String {
        match self {
            Columns::All => "*".to_string(),
            Columns::Only(columns) => columns.join(","),
        }
    }
}

/// 등호(equality) 필터 하나: `column = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

/// 데이터 클라이언트가 실행하는 요청
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Select {
        table: String,
        columns: Columns,
        filters: Vec<Filter>,
        /// true이면 정확히 한 행이 아닐 때 실패합니다
        single: bool,
    },
    Insert {
        table: String,
        row: Row,
    },
    Update {
        table: String,
        row: Row,
        filters: Vec<Filter>,
    },
}

impl Request {
    pub fn table(&self) -> &str {
        match self {
            Request::Select { table, .. }
            | Request::Insert { table, .. }
            | Request::Update { table, .. } => table,
        }
    }
}

/// 호출자 자격 증명. 로그인 세션의 access token이 있으면 그것을 사용합니다.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub access_token: Option<String>,
}

/// 원격 데이터 저장소 계약.
///
/// `Arc<dyn DataClient>`로 공유되므로 `Send + Sync`가 필요합니다.
#[async_trait]
pub trait DataClient: Send + Sync {
    /// 요청을 실행하고 결과 행들을 반환합니다.
    /// insert / update는 저장된 행(representation)을 돌려줍니다.
    async fn execute(&self, credentials: &Credentials, request: Request)
        -> Result<Vec<Row>, ClientError>;

    /// 연결 정리. 애플리케이션 종료 시 한 번 호출됩니다.
    async fn close(&self) {}
}

/// 명시적 세션 컨텍스트.
///
/// 애플리케이션 경계(`main`)에서 한 번 만들어지고, 모든 데이터 접근 함수에 인자로 전달됩니다.
/// 내부의 클라이언트는 `Arc`라서 clone 비용이 거의 없습니다.
#[derive(Clone)]
pub struct Session {
    client: Arc<dyn DataClient>,
    credentials: Credentials,
}

impl Session {
    pub fn new(client: Arc<dyn DataClient>, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// 테이블 단위 요청을 시작합니다.
    pub fn table(&self, name: &str) -> Table<'_> {
        Table {
            session: self,
            name: name.to_string(),
        }
    }

    /// 연결 해제 (종료 시)
    pub async fn close(&self) {
        self.client.close().await;
    }

    async fn run(&self, request: Request) -> Result<Vec<Row>, ClientError> {
        tracing::debug!(table = request.table(), ?request, "remote request");
        let result = self.client.execute(&self.credentials, request).await;
        if let Err(err) = &result {
            tracing::debug!(error = %err, "remote request failed");
        }
        result
    }
}

/// `session.table(name)`의 결과
pub struct Table<'s> {
    session: &'s Session,
    name: String,
}

impl<'s> Table<'s> {
    pub fn select(self, columns: &str) -> Select<'s> {
        Select {
            session: self.session,
            table: self.name,
            columns: Columns::parse(columns),
            filters: Vec::new(),
            single: false,
        }
    }

    pub async fn insert(self, row: Row) -> Result<Vec<Row>, ClientError> {
        self.session
            .run(Request::Insert {
                table: self.name,
                row,
            })
            .await
    }

    pub fn update(self, row: Row) -> Update<'s> {
        Update {
            session: self.session,
            table: self.name,
            row,
            filters: Vec::new(),
        }
    }
}

/// SELECT 요청 빌더
pub struct Select<'s> {
    session: &'s Session,
    table: String,
    columns: Columns,
    filters: Vec<Filter>,
    single: bool,
}

impl<'s> Select<'s> {
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// 정확히 한 행만 기대합니다 (0행 / 2행 이상이면 에러)
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub async fn fetch(self) -> Result<Vec<Row>, ClientError> {
        self.session
            .run(Request::Select {
                table: self.table,
                columns: self.columns,
                filters: self.filters,
                single: self.single,
            })
            .await
    }
}

/// UPDATE 요청 빌더
pub struct Update<'s> {
    session: &'s Session,
    table: String,
    row: Row,
    filters: Vec<Filter>,
}

impl<'s> Update<'s> {
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub async fn execute(self) -> Result<Vec<Row>, ClientError> {
        self.session
            .run(Request::Update {
                table: self.table,
                row: self.row,
                filters: self.filters,
            })
            .await
    }
}

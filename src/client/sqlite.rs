//! # SQLite 데이터 클라이언트
//!
//! 원격 데이터 클라이언트 계약을 로컬 SQLite 파일 위에서 실행합니다.
//! 개발 환경에서 BaaS 없이 콘솔을 띄우거나, 테스트에서 인메모리 DB로 사용합니다.
//!
//! ## 동작 방식
//! - 테이블/컬럼 이름은 `pragma_table_info`로 실제 스키마와 대조한 뒤에만 SQL에 넣습니다.
//! - 값은 항상 `?` 플레이스홀더로 바인딩합니다.
//! - 결과 행은 SQLite의 `json_object(...)`로 만든 JSON 텍스트를 `Row`로 파싱합니다.

use super::{
    ClientError, Columns, Credentials, DataClient, Filter, Request, Row, SINGLE_ROW_MESSAGE,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    query::Query,
    sqlite::{Sqlite, SqliteArguments, SqlitePool},
    Row as _,
};

/// `SqlitePool` 기반 데이터 클라이언트
#[derive(Clone)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 테이블의 컬럼 이름 목록. 테이블이 없으면 에러입니다.
    async fn table_columns(&self, table: &str) -> Result<Vec<String>, ClientError> {
        check_identifier(table)?;
        let columns: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(table)
                .fetch_all(&self.pool)
                .await?;

        if columns.is_empty() {
            return Err(ClientError::new(format!(
                "relation \"public.{table}\" does not exist"
            )));
        }
        Ok(columns.into_iter().map(|(name,)| name).collect())
    }

    async fn fetch_rows(&self, sql: &str, values: Vec<&Value>) -> Result<Vec<Row>, ClientError> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let text: String = row.try_get(0)?;
                match serde_json::from_str(&text) {
                    Ok(Value::Object(map)) => Ok(map),
                    Ok(other) => Err(ClientError::new(format!("unexpected row shape: {other}"))),
                    Err(err) => Err(ClientError::new(err.to_string())),
                }
            })
            .collect()
    }
}

#[async_trait]
impl DataClient for SqliteClient {
    async fn execute(
        &self,
        _credentials: &Credentials,
        request: Request,
    ) -> Result<Vec<Row>, ClientError> {
        match request {
            Request::Select {
                table,
                columns,
                filters,
                single,
            } => {
                let known = self.table_columns(&table).await?;
                let projection = match columns {
                    Columns::All => known.clone(),
                    Columns::Only(columns) => {
                        for column in &columns {
                            check_column(&table, &known, column)?;
                        }
                        columns
                    }
                };

                let mut sql = format!(
                    "SELECT {} FROM {}",
                    json_projection(&projection),
                    quote(&table)
                );
                push_where(&mut sql, &table, &known, &filters)?;

                let rows = self
                    .fetch_rows(&sql, filters.iter().map(|f| &f.value).collect())
                    .await?;
                if single && rows.len() != 1 {
                    return Err(ClientError::new(SINGLE_ROW_MESSAGE));
                }
                Ok(rows)
            }
            Request::Insert { table, row } => {
                let known = self.table_columns(&table).await?;
                if row.is_empty() {
                    return Err(ClientError::new("insert requires at least one column"));
                }
                for column in row.keys() {
                    check_column(&table, &known, column)?;
                }

                let names: Vec<String> = row.keys().map(|c| quote(c)).collect();
                let placeholders = vec!["?"; row.len()].join(", ");
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                    quote(&table),
                    names.join(", "),
                    placeholders,
                    json_projection(&known)
                );
                self.fetch_rows(&sql, row.values().collect()).await
            }
            Request::Update {
                table,
                row,
                filters,
            } => {
                let known = self.table_columns(&table).await?;
                if row.is_empty() {
                    return Err(ClientError::new("update requires at least one column"));
                }
                for column in row.keys() {
                    check_column(&table, &known, column)?;
                }

                let assignments: Vec<String> =
                    row.keys().map(|c| format!("{} = ?", quote(c))).collect();
                let mut sql = format!("UPDATE {} SET {}", quote(&table), assignments.join(", "));
                push_where(&mut sql, &table, &known, &filters)?;
                sql.push_str(&format!(" RETURNING {}", json_projection(&known)));

                // SET 값 → WHERE 값 순서로 바인딩
                let values = row
                    .values()
                    .chain(filters.iter().map(|f| &f.value))
                    .collect();
                self.fetch_rows(&sql, values).await
            }
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// 식별자는 영문자/숫자/밑줄만 허용합니다.
fn check_identifier(name: &str) -> Result<(), ClientError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ClientError::new(format!("invalid identifier \"{name}\"")))
    }
}

fn check_column(table: &str, known: &[String], column: &str) -> Result<(), ClientError> {
    check_identifier(column)?;
    if known.iter().any(|k| k == column) {
        Ok(())
    } else {
        Err(ClientError::new(format!(
            "column {table}.{column} does not exist"
        )))
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

/// `json_object('a', "a", 'b', "b")`
fn json_projection(columns: &[String]) -> String {
    let pairs: Vec<String> = columns
        .iter()
        .map(|c| format!("'{c}', {}", quote(c)))
        .collect();
    format!("json_object({})", pairs.join(", "))
}

fn push_where(
    sql: &mut String,
    table: &str,
    known: &[String],
    filters: &[Filter],
) -> Result<(), ClientError> {
    if filters.is_empty() {
        return Ok(());
    }
    let mut conditions = Vec::with_capacity(filters.len());
    for filter in filters {
        check_column(table, known, &filter.column)?;
        conditions.push(format!("{} = ?", quote(&filter.column)));
    }
    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
    Ok(())
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        // 배열/객체는 JSON 텍스트로 저장
        other => query.bind(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Session;
    use crate::testing;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_returns_stored_row_with_defaults() {
        let session = testing::memory_session().await;
        let stored = session
            .table("diving_courses")
            .insert(row(json!({ "title": "体験ダイビング" })))
            .await
            .unwrap();

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["title"], json!("体験ダイビング"));
        assert!(stored[0]["id"].is_i64());
        assert!(stored[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn select_applies_equality_filters() {
        let session = testing::memory_session().await;
        testing::seed_courses(&session, &["体験ダイビング", "ファンダイビング"]).await;

        let rows = session
            .table("diving_courses")
            .select("title")
            .eq("title", "ファンダイビング")
            .fetch()
            .await
            .unwrap();

        assert_eq!(rows, vec![row(json!({ "title": "ファンダイビング" }))]);
    }

    #[tokio::test]
    async fn single_requires_exactly_one_row() {
        let session = testing::memory_session().await;
        testing::seed_courses(&session, &["A", "B"]).await;

        let none = session
            .table("diving_courses")
            .select("*")
            .eq("title", "missing")
            .single()
            .fetch()
            .await;
        assert_eq!(none, Err(ClientError::new(SINGLE_ROW_MESSAGE)));

        let many = session.table("diving_courses").select("*").single().fetch().await;
        assert_eq!(many, Err(ClientError::new(SINGLE_ROW_MESSAGE)));
    }

    #[tokio::test]
    async fn unknown_names_are_rejected() {
        let session = testing::memory_session().await;

        let err = session.table("nope").select("*").fetch().await.unwrap_err();
        assert_eq!(err.message, "relation \"public.nope\" does not exist");

        let err = session
            .table("diving_courses")
            .select("title, price")
            .fetch()
            .await
            .unwrap_err();
        assert_eq!(err.message, "column diving_courses.price does not exist");

        let err = session
            .table("diving_courses")
            .select("*")
            .eq("title; DROP TABLE x", "a")
            .fetch()
            .await
            .unwrap_err();
        assert!(err.message.starts_with("invalid identifier"));
    }

    #[tokio::test]
    async fn update_touches_only_matching_rows() {
        let session: Session = testing::memory_session().await;
        testing::seed_courses(&session, &["A", "B"]).await;

        let updated = session
            .table("diving_courses")
            .update(row(json!({ "title": "C" })))
            .eq("title", "A")
            .execute()
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);

        let titles = session
            .table("diving_courses")
            .select("title")
            .fetch()
            .await
            .unwrap();
        let titles: Vec<&Value> = titles.iter().map(|r| &r["title"]).collect();
        assert_eq!(titles, vec![&json!("C"), &json!("B")]);
    }

    #[tokio::test]
    async fn constraint_violations_surface_driver_message() {
        let session = testing::memory_session().await;
        let err = session
            .table("reservations")
            .insert(row(json!({
                "user_name": "山田",
                "course_title": "A",
                "reservation_datetime_1": "2026-10-14T09:30:00Z",
                "participants": 0,
                "status": "未確認",
                "staff": "佐藤",
            })))
            .await
            .unwrap_err();
        assert!(err.message.contains("CHECK constraint failed"), "{}", err.message);
    }
}

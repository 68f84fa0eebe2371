//! # 캘린더 라우트 핸들러
//!
//! - `GET /api/v1/calendar?view=week&date=2026-10-14&selected=3`
//! - `GET /api/v1/calendar?view=week&date=2026-10-14&nav=next` → 2026-10-21 주
//!
//! `view`, `date`, `nav`, `selected`는 브라우저 쪽 UI 상태를 그대로 전달받는 것입니다.
//! 서버는 전체 예약을 한 번 조회한 뒤, 그 상태를 적용한 화면 데이터를 돌려줍니다.

use super::AppState;
use crate::{
    controllers::{CalendarController, Navigate},
    error::AppError,
    models::{CalendarView, DateOutOfRange, ReservationId},
};
use axum::{
    extract::{Query, State}, // Query: URL 쿼리 문자열을 구조체로 역직렬화
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc}; // NaiveDate: 시간대 없는 날짜 (`2026-10-14`)
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub view: Option<String>,
    pub date: Option<NaiveDate>,
    /// 툴바 이동: `prev` / `next` / `today`
    pub nav: Option<String>,
    /// 상세 모달을 열 예약 id
    pub selected: Option<ReservationId>,
}

pub async fn show_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, AppError> {
    // 빈 값은 기본 보기(month)로 취급합니다.
    let view = match query.view.as_deref() {
        None | Some("") => CalendarView::default(),
        Some(name) => name
            .parse()
            .map_err(|err: crate::models::UnknownView| AppError::BadRequest(err.to_string()))?,
    };

    let nav = match query.nav.as_deref() {
        None | Some("") => None,
        Some("prev") => Some(Navigate::Previous),
        Some("next") => Some(Navigate::Next),
        Some("today") => Some(Navigate::Today),
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "unknown calendar navigation \"{other}\""
            )))
        }
    };

    // 모든 날짜는 UTC 기준입니다.
    let today = Utc::now().date_naive();
    let mut controller = CalendarController::new(today);
    if let Some(date) = query.date {
        controller.navigate_to(date);
    }
    controller.set_view(view);
    if let Some(action) = nav {
        controller.navigate(action, today);
    }

    // 날짜 범위 끝에서는 보기 범위를 만들 수 없으므로 조회 전에 거절합니다
    controller.visible_range().map_err(bad_request)?;
    controller.load(&state.session).await;

    match query.selected {
        // 조회가 실패했으면 모달 없이 에러 화면만 돌려줍니다
        Some(id) if controller.state().loaded().is_some() => {
            if !controller.select_reservation(id) {
                return Err(AppError::NotFound);
            }
        }
        _ => controller.close_modal(),
    }

    // map_err(): DateOutOfRange를 AppError로 바꾼 뒤 `?`로 전파
    let page = controller.page().map_err(bad_request)?;
    let status = if page.error.is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    Ok((status, Json(page)).into_response())
}

fn bad_request(err: DateOutOfRange) -> AppError {
    AppError::BadRequest(err.to_string())
}

#[cfg(test)]
mod tests {
    use crate::{models::Status, routes, testing};
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn calendar_returns_visible_events_and_modal() {
        let session = testing::memory_session().await;
        let id = testing::seed(&session, testing::payload("山田", Status::Confirmed)).await;
        let app = routes::router(routes::AppState { session });

        let (status, body) = get(
            app.clone(),
            &format!("/api/v1/calendar?view=week&date=2026-10-14&selected={id}"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], json!("week"));
        assert_eq!(body["range_start"], json!("2026-10-11"));
        assert_eq!(body["events"].as_array().unwrap().len(), 1);
        assert_eq!(body["events"][0]["title"], json!("山田 - 体験ダイビング"));
        assert_eq!(body["events"][0]["end"], json!("2026-10-14T10:30:00Z"));
        assert_eq!(body["modal"]["lines"][0]["value"], json!("山田"));
        assert_eq!(body["messages"]["today"], json!("今日"));

        let (status, _) = get(app.clone(), "/api/v1/calendar?selected=999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(app.clone(), "/api/v1/calendar?view=year").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(app, "/api/v1/calendar?nav=sideways").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn navigation_moves_by_view_unit() {
        let session = testing::memory_session().await;
        testing::seed(&session, testing::payload("山田", Status::Confirmed)).await;
        let app = routes::router(routes::AppState { session });

        let (status, body) = get(
            app.clone(),
            "/api/v1/calendar?view=week&date=2026-10-14&nav=next",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["date"], json!("2026-10-21"));
        assert_eq!(body["range_start"], json!("2026-10-18"));
        assert!(body["events"].as_array().unwrap().is_empty());

        let (_, body) = get(app, "/api/v1/calendar?view=month&date=2026-11-14&nav=prev").await;
        assert_eq!(body["date"], json!("2026-10-14"));
        assert_eq!(body["range_start"], json!("2026-09-27"));
        assert_eq!(body["events"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn calendar_failure_surfaces_message() {
        let (session, _) = testing::failing_session("JWT expired");
        let app = routes::router(routes::AppState { session });

        let (status, body) = get(app, "/api/v1/calendar").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], json!("JWT expired"));
        assert_eq!(body["modal"], Value::Null);
    }

    #[tokio::test]
    async fn dates_at_the_end_of_the_range_are_bad_requests() {
        let (session, client) = testing::failing_session("unused");
        let app = routes::router(routes::AppState { session });

        for view in ["month", "week", "day", "agenda"] {
            // +262142-12-31 (NaiveDate::MAX)
            let uri = format!("/api/v1/calendar?view={view}&date=%2B262142-12-31");
            let (status, body) = get(app.clone(), &uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{view}");
            assert_eq!(body["error"]["code"], json!("bad_request"));
        }

        let (status, _) = get(
            app,
            "/api/v1/calendar?view=month&date=%2B262142-12-15",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(client.calls(), 0);
    }
}

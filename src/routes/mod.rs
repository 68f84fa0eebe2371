//! # 라우트 핸들러 모듈
//!
//! 예약 화면 세 개를 구동하는 HTTP 핸들러들입니다.
//!
//! - `reservations`: 예약 목록, 추가/편집 폼, 저장
//! - `calendar`: 예약 캘린더
//! - `health`: 서버 상태 확인

pub mod calendar;
pub mod health;
pub mod reservations;

// 핸들러 함수들을 `routes::list_reservations`처럼 바로 쓸 수 있도록 다시 내보냅니다.
pub use calendar::*;
pub use health::*;
pub use reservations::*;

use crate::client::Session;
use axum::{routing::get, Router}; // get(): GET 메서드 라우팅, 체이닝으로 .post()/.put() 추가

/// 애플리케이션 공유 상태
///
/// 세션은 `main`에서 한 번 만들어지고, 핸들러는 요청마다 이것을 데이터 접근 함수에 넘깁니다.
// Axum의 State Extractor가 요청마다 clone하므로 Clone이 필요합니다.
// Session 안의 클라이언트는 Arc로 공유되어 clone해도 연결은 하나입니다.
#[derive(Clone)]
pub struct AppState {
    pub session: Session,
}

/// `/api/v1` 아래의 모든 라우트
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route("/reservations/new", get(new_reservation_form))
        .route(
            "/reservations/{id}",
            get(edit_reservation_form).put(update_reservation),
        )
        .route("/calendar", get(show_calendar))
        .route("/health", get(health_check))
        // with_state(): 모든 핸들러가 State<AppState>로 꺼내 쓸 상태를 주입
        .with_state(state);

    // nest(): 위 라우트들을 `/api/v1` 접두사 아래에 배치
    Router::new().nest("/api/v1", api_routes)
}

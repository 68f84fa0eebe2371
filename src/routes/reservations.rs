//! # 예약 라우트 핸들러
//!
//! 예약 목록과 예약 폼 화면의 데이터를 JSON으로 제공합니다.
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/v1/reservations?status= | `list_reservations` | 예약 목록 (상태 필터) |
//! | GET | /api/v1/reservations/new | `new_reservation_form` | 추가 폼 |
//! | GET | /api/v1/reservations/{id} | `edit_reservation_form` | 편집 폼 |
//! | POST | /api/v1/reservations | `create_reservation` | 예약 추가 |
//! | PUT | /api/v1/reservations/{id} | `update_reservation` | 예약 전체 덮어쓰기 |
//!
//! 요청마다 컨트롤러를 새로 만들기 때문에 화면 간에 공유되는 상태는 없습니다.

use super::AppState;
use crate::{
    client::Session, // 요청마다 넘겨받는 세션 컨텍스트
    controllers::{self, FormField, FormMode, ReservationFormController, ReservationListController},
    error::AppError,
    models::ReservationId,
};
use axum::{
    extract::{Path, Query, State}, // Axum Extractor: 요청에서 데이터 추출
    http::StatusCode,
    response::{IntoResponse, Response}, // 상태 코드 + 본문을 직접 조합할 때 사용
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap; // 필드 이름 순으로 정렬된 원시 입력값

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// 빈 값이면 전체
    pub status: Option<String>,
}

/// `GET /reservations?status=確認済`
///
/// 조회 실패는 에러 응답(502)으로, 0건은 `empty_message`가 있는 정상 응답으로 돌려줍니다.
pub async fn list_reservations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    // as_deref(): Option<String> → Option<&str> (소유권 이동 없이 빌려서 해석)
    // `?`: 알 수 없는 상태 값이면 여기서 400 응답으로 빠져나갑니다.
    let filter = controllers::parse_filter(query.status.as_deref())?;

    let mut controller = ReservationListController::new();
    controller.load(&state.session, filter).await;

    let view = controller.view();
    // 조회 실패도 화면 데이터(error 포함)는 그대로 내려보내고 상태 코드만 바꿉니다.
    let status = if view.error.is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    Ok((status, Json(view)).into_response())
}

/// `GET /reservations/new`
pub async fn new_reservation_form(State(state): State<AppState>) -> Response {
    form_page(&state.session, None).await
}

/// `GET /reservations/{id}`
///
/// 존재하지 않는 id여도 폼은 그대로 그리고, `error`에 메시지를 담습니다.
pub async fn edit_reservation_form(
    State(state): State<AppState>,
    Path(id): Path<ReservationId>,
) -> Response {
    form_page(&state.session, Some(id)).await
}

async fn form_page(session: &Session, id: Option<ReservationId>) -> Response {
    let mut controller = ReservationFormController::new(FormMode::from_id(id));
    controller.initialize(session, id).await;
    // page()는 컨트롤러를 빌려 쓰는 뷰이므로 응답으로 직렬화하는 동안만 살아 있습니다.
    Json(controller.page()).into_response()
}

/// `POST /reservations` + `{ "user_name": "...", "participants": "2", ... }`
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(fields): Json<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    submit_form(&state.session, FormMode::Create, fields).await
}

/// `PUT /reservations/{id}` + 폼 전체 필드
pub async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<ReservationId>,
    Json(fields): Json<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    submit_form(&state.session, FormMode::Edit(id), fields).await
}

/// 원시 입력값을 반영 → 필수 항목 검사 → 저장.
///
/// 편집 모드는 저장된 예약을 먼저 불러온 뒤 보낸 필드만 덮어씁니다.
/// 본문에 없는 필드는 기존 값을 유지합니다.
///
/// - 편집 대상 조회 실패: 422 + 폼 화면 (`error`에 메시지, 저장 요청은 보내지 않음)
/// - 필수 항목 위반: 422 + `missing` 필드 목록 (저장 요청은 보내지 않음)
/// - 저장 실패: 422 + 입력값이 그대로 남은 폼 화면 (`error`에 백엔드 메시지)
/// - 성공: 200 + `{ "redirect": "/reservations" }`
async fn submit_form(
    session: &Session,
    mode: FormMode,
    fields: BTreeMap<String, String>,
) -> Result<Response, AppError> {
    let mut controller = ReservationFormController::new(mode);
    if let FormMode::Edit(id) = mode {
        controller.initialize(session, Some(id)).await;
        if controller.error().is_some() {
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(controller.page())).into_response());
        }
    }

    // &fields: 맵을 빌려서 순회 (name, raw 모두 &String)
    for (name, raw) in &fields {
        controller.update_field(name, raw)?;
    }

    let missing = controller.form().missing_required();
    if !missing.is_empty() {
        let labels: Vec<&str> = missing.iter().map(|f: &FormField| f.label()).collect();
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "missing": missing, "labels": labels })),
        )
            .into_response());
    }

    match controller.submit(session).await {
        Ok(submitted) => Ok(Json(submitted).into_response()),
        Err(_) => {
            // 폼을 다시 그리기 위한 코스 목록 (입력값은 건드리지 않음)
            controller.load_courses(session).await;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(controller.page())).into_response())
        }
    }
}

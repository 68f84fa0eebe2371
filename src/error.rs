//! # 에러 처리 모듈
//!
//! 콘솔에서 발생하는 에러를 하나의 `AppError`로 통합하고, HTTP 응답으로 변환합니다.
//!
//! 에러 분류:
//! - 원격 조회/쓰기 실패 (`Remote`): 백엔드 메시지를 그대로 화면에 전달
//! - 행 디코딩 실패 (`Decode`): 원격 데이터가 예약 형식에 맞지 않음
//! - 잘못된 입력 (`BadRequest`): 알 수 없는 필드, 상태, 보기 이름 등
//!
//! 자동 재시도는 없습니다. 사용자가 다시 불러오거나 다시 제출해야 합니다.

use crate::{client::ClientError, models::DecodeError};
use axum::{
    http::StatusCode,                   // HTTP 상태 코드 (400, 404, 502 등)
    response::{IntoResponse, Response}, // Axum의 응답 변환 트레이트
    Json,                               // JSON 응답 래퍼
};
use serde_json::json; // json! 매크로: JSON 객체를 간편하게 생성
use thiserror::Error; // thiserror: Display와 std::error::Error를 derive로 구현

// #[from]: 해당 에러 타입에서 AppError로의 From 변환을 자동 생성합니다.
// 그래서 핸들러와 db 함수에서 `?` 하나로 ClientError/DecodeError를 전파할 수 있습니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 원격 데이터 클라이언트 실패 (HTTP 502).
    /// Display가 백엔드 메시지 그대로라서 화면 표시에 바로 쓸 수 있습니다.
    #[error("{0}")]
    Remote(#[from] ClientError),

    /// 원격 행을 예약으로 해석할 수 없음 (HTTP 502)
    #[error("{0}")]
    Decode(#[from] DecodeError),
}

impl IntoResponse for AppError {
    /// `{ "error": { "code": "...", "message": "..." } }` 형태의 JSON 에러 응답
    fn into_response(self) -> Response {
        // 튜플로 (상태 코드, 에러 코드, 메시지)를 한 번에 결정합니다.
        // `ref`: self를 이동하지 않고 variant 안의 값을 빌려서 매칭
        let (status, code, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Remote(ref e) => {
                tracing::warn!("Remote data error: {}", e);
                (StatusCode::BAD_GATEWAY, "remote_error", e.message.clone())
            }
            AppError::Decode(ref e) => {
                tracing::warn!("Decode error: {}", e);
                (StatusCode::BAD_GATEWAY, "decode_error", e.to_string())
            }
        };

        // (StatusCode, Json) 튜플도 IntoResponse를 구현합니다.
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));
        (status, body).into_response()
    }
}

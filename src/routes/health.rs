//! # 헬스체크(Health Check) 핸들러
//!
//! - `GET /api/v1/health` → `{ "status": "ok" }`
//!
//! 원격 데이터 서비스에는 요청하지 않습니다. 콘솔 서버 프로세스가 살아 있는지만 확인합니다.

use axum::Json;                // JSON 응답 래퍼
use serde_json::{json, Value}; // JSON 생성 유틸리티

/// `GET /health`
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

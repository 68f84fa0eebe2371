//! # 다이빙 코스 모델
//!
//! 예약 콘솔은 `diving_courses` 테이블에서 `title` 컬럼만 읽어 예약 폼의 선택지로 씁니다.

use crate::client::Row;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CourseTitle {
    pub title: String,
}

impl CourseTitle {
    pub fn from_row(row: Row) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(row))
    }
}

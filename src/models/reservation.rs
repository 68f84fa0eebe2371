//! # 예약(Reservation) 모델
//!
//! 원격 저장소의 `reservations` 테이블 한 행을 타입이 있는 구조체로 다룹니다.
//!
//! ## 구조체 역할
//! - `Status`: 예약 상태 (未確認 / 確認済 / 完了), 닫힌 열거형
//! - `Reservation`: 검증을 거쳐 디코딩된 예약 레코드 (조회용)
//! - `ReservationPayload`: insert / update 요청 본문 (id, created_at 제외)
//!
//! 원격 행은 임의의 JSON이므로, `Reservation::from_row`에서 필드를 검증합니다.
//! 잘못된 일시, 알 수 없는 상태, 1 미만의 인원 수는 `DecodeError`로 거부됩니다.

use super::EVENT_DURATION_MINUTES;
use crate::client::Row;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// 서버가 부여하는 예약 ID
pub type ReservationId = i64;

/// 예약 상태
///
/// JSON / DB에는 일본어 라벨 그대로 저장됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// 未確認: 새 예약의 기본값
    #[default]
    #[serde(rename = "未確認")]
    Unconfirmed,
    /// 確認済
    #[serde(rename = "確認済")]
    Confirmed,
    /// 完了
    #[serde(rename = "完了")]
    Completed,
}

impl Status {
    /// 선택지 표시 순서
    pub const ALL: [Status; 3] = [Status::Unconfirmed, Status::Confirmed, Status::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Unconfirmed => "未確認",
            Status::Confirmed => "確認済",
            Status::Completed => "完了",
        }
    }

    /// 목록 화면의 상태 배지 색상 클래스
    pub fn badge_class(self) -> &'static str {
        match self {
            Status::Unconfirmed => "bg-blue-200 text-blue-800",
            Status::Confirmed => "bg-green-200 text-green-800",
            Status::Completed => "bg-gray-200 text-gray-800",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown reservation status \"{0}\"")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// 예약 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub user_name: String,
    pub course_title: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub reservation_datetime_1: DateTime<Utc>,
    pub participants: i32,
    pub status: Status,
    pub staff: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// 원격 행 디코딩 실패
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed reservation row: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("reservation {id}: participants must be at least 1, got {value}")]
    Participants { id: ReservationId, value: i32 },

    #[error("reservation {id}: reservation_datetime_1 is out of range")]
    OutOfRange { id: ReservationId },
}

impl Reservation {
    /// 원격 행을 검증하며 `Reservation`으로 변환합니다.
    pub fn from_row(row: Row) -> Result<Self, DecodeError> {
        let reservation: Reservation = serde_json::from_value(Value::Object(row))?;
        if reservation.participants < 1 {
            return Err(DecodeError::Participants {
                id: reservation.id,
                value: reservation.participants,
            });
        }
        // 캘린더 이벤트의 끝 시각(시작 + 표시 길이)을 만들 수 있어야 합니다
        let end = reservation
            .reservation_datetime_1
            .checked_add_signed(Duration::minutes(EVENT_DURATION_MINUTES));
        if end.is_none() {
            return Err(DecodeError::OutOfRange { id: reservation.id });
        }
        Ok(reservation)
    }
}

/// insert / update 요청 본문.
///
/// update는 부분 패치가 아니라 폼의 모든 필드를 덮어씁니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationPayload {
    pub user_name: String,
    pub course_title: String,
    pub reservation_datetime_1: DateTime<Utc>,
    pub participants: i32,
    pub status: Status,
    pub staff: String,
}

impl ReservationPayload {
    pub fn into_row(self) -> Row {
        match serde_json::to_value(self) {
            Ok(Value::Object(row)) => row,
            // 필드가 모두 문자열/숫자/일시라서 직렬화는 항상 객체를 만듭니다
            _ => Row::new(),
        }
    }
}

/// 목록 테이블과 상세 모달의 일시 표시 (ja-JP `toLocaleString` 형식, 월/일/시는 0을 채우지 않음)
pub fn display_datetime(value: &DateTime<Utc>) -> String {
    value.format("%Y/%-m/%-d %-H:%M:%S").to_string()
}

/// 타임스탬프 디코딩: RFC 3339, 또는 타임존 없는 `YYYY-MM-DDTHH:MM[:SS]` (UTC로 해석)
pub mod timestamp {
    use super::*;

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    pub fn parse(text: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        // Postgres의 `2026-10-14 09:30:00+00` 형식
        if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z") {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp \"{text}\"")))
    }
}

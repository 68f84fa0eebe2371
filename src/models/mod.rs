//! # 데이터 모델 모듈
//!
//! 예약 콘솔에서 사용하는 데이터 구조체들을 정의합니다.
//! - `reservation`: 예약 레코드, 상태 열거형, 쓰기 본문
//! - `calendar`: 예약에서 파생되는 캘린더 이벤트와 보기 단위
//! - `course`: 예약 폼의 코스 선택지

pub mod calendar;
pub mod course;
pub mod reservation;

pub use calendar::*;
pub use course::*;
pub use reservation::*;

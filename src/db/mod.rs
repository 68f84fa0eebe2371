//! # 데이터 접근 계층 (Data Access Layer)
//!
//! 컨트롤러가 보내는 원격 조회/쓰기 요청을 한 곳에 모아둔 모듈입니다.
//! 각 함수는 `Session`을 첫 번째 인자로 받습니다.
//!
//! - `reservations`: 예약 목록 / 단건 조회, 추가, 전체 덮어쓰기
//! - `courses`: 코스 이름 목록

pub mod courses;
pub mod reservations;

pub use courses::*;
pub use reservations::*;

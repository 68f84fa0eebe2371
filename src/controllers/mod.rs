//! # 화면 컨트롤러 모듈
//!
//! 예약 화면 세 개의 상태와 데이터 바인딩을 담당합니다.
//! 각 컨트롤러는 자기가 조회한 데이터를 따로 들고 있으며, 공유 캐시는 없습니다.
//!
//! - `list`: 예약 목록 (상태 필터)
//! - `calendar`: 예약 캘린더 (보기 단위, 날짜 이동, 상세 모달)
//! - `form`: 예약 추가 / 편집 폼
//! - `generation`: 오래된 응답을 버리기 위한 요청 세대 토큰

pub mod calendar;
pub mod form;
pub mod generation;
pub mod list;

pub use calendar::*;
pub use form::*;
pub use generation::*;
pub use list::*;

use serde::Serialize;

/// 화면 표시용 로딩 문구
pub const LOADING_MESSAGE: &str = "読み込み中...";

/// 조회 사이클의 상태: Idle → Loading → (Loaded | Failed)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    /// 백엔드 메시지 그대로
    Failed(String),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

//! # 예약 목록 컨트롤러
//!
//! 상태 필터에 맞는 예약 목록을 조회하고 표 형태의 화면 데이터로 만듭니다.
//!
//! ## 상태 전이
//! ```text
//! Idle ──begin──▶ Loading ──complete──▶ Loaded(list) | Failed(message)
//!                    ▲                         │
//!                    └──── 필터 변경 (처음부터 다시 조회) ────┘
//! ```
//!
//! 생성 / 편집 화면으로의 이동은 라우팅이 담당하고, 이 컨트롤러는 경로 문자열만 제공합니다.

use super::{LoadState, RequestGeneration, Ticket, LOADING_MESSAGE};
use crate::client::Session;
use crate::db::{self, ReservationList};
use crate::error::AppError;
use crate::models::{display_datetime, Reservation, Status};
use serde::Serialize;

pub const LIST_TITLE: &str = "予約一覧";
pub const EMPTY_MESSAGE: &str = "予約データがありません。";
pub const NEW_RESERVATION_PATH: &str = "/reservations/new";

#[derive(Debug, Default)]
pub struct ReservationListController {
    filter: Option<Status>,
    state: LoadState<ReservationList>,
    generation: RequestGeneration,
}

impl ReservationListController {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 조회를 시작합니다. 이전 결과는 버리고 Loading으로 돌아갑니다.
    pub fn begin(&mut self, filter: Option<Status>) -> Ticket {
        self.filter = filter;
        self.state = LoadState::Loading;
        self.generation.issue()
    }

    /// 조회 결과를 반영합니다. 오래된 티켓의 결과는 버리고 `false`를 돌려줍니다.
    pub fn complete(&mut self, ticket: Ticket, result: Result<ReservationList, AppError>) -> bool {
        if !self.generation.is_current(ticket) {
            tracing::warn!("discarding stale reservation list response");
            return false;
        }
        self.state = match result {
            Ok(list) => LoadState::Loaded(list),
            Err(err) => LoadState::Failed(err.to_string()),
        };
        true
    }

    /// begin → 조회 → complete 를 한 번에 수행합니다.
    pub async fn load(
        &mut self,
        session: &Session,
        filter: Option<Status>,
    ) -> &LoadState<ReservationList> {
        let ticket = self.begin(filter);
        let result = db::list_reservations(session, filter).await;
        self.complete(ticket, result);
        &self.state
    }

    /// 조회에 성공했지만 행이 없을 때 (에러가 아닌 빈 상태)
    pub fn is_empty(&self) -> bool {
        matches!(&self.state, LoadState::Loaded(list) if list.reservations.is_empty())
    }

    /// 화면 데이터
    pub fn view(&self) -> ListView {
        let rows = self
            .state
            .loaded()
            .map(|list| list.reservations.iter().map(ListRow::from).collect())
            .unwrap_or_default();

        ListView {
            title: LIST_TITLE,
            filter: self.filter,
            filter_options: filter_options(self.filter),
            new_path: NEW_RESERVATION_PATH,
            loading: self.state.is_loading(),
            loading_message: self.state.is_loading().then_some(LOADING_MESSAGE),
            error: self.state.error().map(str::to_string),
            empty_message: self.is_empty().then_some(EMPTY_MESSAGE),
            skipped_rows: self.state.loaded().map_or(0, |list| list.skipped_rows),
            rows,
        }
    }
}

/// `<select>`의 선택지 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// 상태 필터 선택지: すべて(빈 값) + 상태 세 개
pub fn filter_options(current: Option<Status>) -> Vec<SelectOption> {
    let mut options = vec![SelectOption {
        value: String::new(),
        label: "すべて".to_string(),
        selected: current.is_none(),
    }];
    options.extend(Status::ALL.into_iter().map(|status| SelectOption {
        value: status.as_str().to_string(),
        label: status.as_str().to_string(),
        selected: current == Some(status),
    }));
    options
}

/// 필터 쿼리 값 해석: 빈 문자열은 "전체"입니다.
pub fn parse_filter(raw: Option<&str>) -> Result<Option<Status>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|err: crate::models::UnknownStatus| AppError::BadRequest(err.to_string())),
    }
}

#[derive(Debug, Serialize)]
pub struct ListView {
    pub title: &'static str,
    pub filter: Option<Status>,
    pub filter_options: Vec<SelectOption>,
    pub new_path: &'static str,
    pub loading: bool,
    pub loading_message: Option<&'static str>,
    pub error: Option<String>,
    pub empty_message: Option<&'static str>,
    pub skipped_rows: usize,
    pub rows: Vec<ListRow>,
}

/// 표의 한 줄
#[derive(Debug, Serialize)]
pub struct ListRow {
    pub id: i64,
    pub user_name: String,
    pub course_title: String,
    pub reservation_datetime_1: String,
    pub participants: i32,
    pub status: Status,
    pub status_class: &'static str,
    pub staff: String,
    pub created_at: String,
    pub edit_path: String,
}

impl From<&Reservation> for ListRow {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id,
            user_name: r.user_name.clone(),
            course_title: r.course_title.clone(),
            reservation_datetime_1: display_datetime(&r.reservation_datetime_1),
            participants: r.participants,
            status: r.status,
            status_class: r.status.badge_class(),
            staff: r.staff.clone(),
            created_at: display_datetime(&r.created_at),
            edit_path: format!("/reservations/{}", r.id),
        }
    }
}

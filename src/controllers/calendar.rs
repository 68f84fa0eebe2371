//! # 예약 캘린더 컨트롤러
//!
//! 전체 예약을 필터 없이 조회한 뒤, 각 예약을 1시간짜리 캘린더 이벤트로 바꿉니다.
//!
//! 보기 단위(월/주/일/일정)와 현재 날짜는 로컬 UI 상태입니다.
//! 보기를 바꾸거나 날짜를 이동해도 다시 조회하지 않습니다.
//! 이벤트 선택 / 모달 닫기도 백엔드와 무관한 순수 상태 전이입니다.

use super::{LoadState, RequestGeneration, Ticket, LOADING_MESSAGE};
use crate::client::Session;
use crate::db;
use crate::error::AppError;
use crate::models::*;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

pub const CALENDAR_TITLE: &str = "予約カレンダー";
pub const DETAIL_TITLE: &str = "予約詳細";
pub const CLOSE_LABEL: &str = "閉じる";

/// 툴바의 이동 버튼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigate {
    Previous,
    Next,
    Today,
}

#[derive(Debug)]
pub struct CalendarController {
    state: LoadState<Vec<CalendarEvent>>,
    view: CalendarView,
    date: NaiveDate,
    selected: Option<CalendarEvent>,
    generation: RequestGeneration,
}

impl CalendarController {
    /// 월 보기, `today` 기준으로 시작합니다.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            state: LoadState::Idle,
            view: CalendarView::default(),
            date: today,
            selected: None,
            generation: RequestGeneration::default(),
        }
    }

    pub fn state(&self) -> &LoadState<Vec<CalendarEvent>> {
        &self.state
    }

    pub fn begin(&mut self) -> Ticket {
        self.state = LoadState::Loading;
        self.generation.issue()
    }

    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<CalendarEvent>, AppError>,
    ) -> bool {
        if !self.generation.is_current(ticket) {
            tracing::warn!("discarding stale calendar response");
            return false;
        }
        self.state = match result {
            Ok(events) => LoadState::Loaded(events),
            Err(err) => LoadState::Failed(err.to_string()),
        };
        true
    }

    /// 전체 예약을 조회해 이벤트로 변환합니다.
    pub async fn load(&mut self, session: &Session) -> &LoadState<Vec<CalendarEvent>> {
        let ticket = self.begin();
        let result = fetch_events(session).await;
        self.complete(ticket, result);
        &self.state
    }

    pub fn set_view(&mut self, view: CalendarView) {
        self.view = view;
    }

    pub fn navigate_to(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn navigate(&mut self, action: Navigate, today: NaiveDate) {
        self.date = match action {
            Navigate::Previous => self.view.step(self.date, false),
            Navigate::Next => self.view.step(self.date, true),
            Navigate::Today => today,
        };
    }

    /// 현재 보기 단위와 날짜로 계산한 표시 범위
    pub fn visible_range(&self) -> Result<(NaiveDate, NaiveDate), DateOutOfRange> {
        self.view.range(self.date)
    }

    /// 현재 보기 범위와 겹치는 이벤트. 범위를 계산할 수 없으면 비어 있습니다.
    pub fn visible_events(&self) -> Vec<&CalendarEvent> {
        let Ok((from, to)) = self.visible_range() else {
            return Vec::new();
        };
        let from = from.and_time(NaiveTime::MIN).and_utc();
        let to = to.and_time(NaiveTime::MIN).and_utc();
        self.state
            .loaded()
            .map(|events| events.iter().filter(|e| e.overlaps(from, to)).collect())
            .unwrap_or_default()
    }

    /// 이벤트를 선택해 상세 모달을 엽니다.
    pub fn select_event(&mut self, event: &CalendarEvent) {
        self.selected = Some(event.clone());
    }

    /// 불러온 이벤트 중 예약 id로 선택합니다. 없으면 모달을 닫고 `false`.
    pub fn select_reservation(&mut self, id: ReservationId) -> bool {
        let found = self
            .state
            .loaded()
            .and_then(|events| events.iter().find(|e| e.reservation.id == id))
            .cloned();
        match found {
            Some(event) => {
                self.select_event(&event);
                true
            }
            None => {
                self.close_modal();
                false
            }
        }
    }

    pub fn close_modal(&mut self) {
        self.selected = None;
    }

    /// 모달에 표시할 원본 예약
    pub fn selected(&self) -> Option<&Reservation> {
        self.selected.as_ref().map(|event| &event.reservation)
    }

    pub fn page(&self) -> Result<CalendarPage<'_>, DateOutOfRange> {
        let (range_start, range_end) = self.visible_range()?;
        Ok(CalendarPage {
            title: CALENDAR_TITLE,
            view: self.view,
            date: self.date,
            range_start,
            range_end,
            messages: CALENDAR_MESSAGES,
            loading: self.state.is_loading(),
            loading_message: self.state.is_loading().then_some(LOADING_MESSAGE),
            error: self.state.error(),
            events: self.visible_events(),
            modal: self.selected().map(ReservationDetail::from),
        })
    }
}

async fn fetch_events(session: &Session) -> Result<Vec<CalendarEvent>, AppError> {
    let list = db::list_reservations(session, None).await?;
    Ok(list.reservations.into_iter().map(to_calendar_event).collect())
}

#[derive(Debug, Serialize)]
pub struct CalendarPage<'a> {
    pub title: &'static str,
    pub view: CalendarView,
    pub date: NaiveDate,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub messages: CalendarMessages,
    pub loading: bool,
    pub loading_message: Option<&'static str>,
    pub error: Option<&'a str>,
    pub events: Vec<&'a CalendarEvent>,
    pub modal: Option<ReservationDetail>,
}

/// 상세 모달의 한 줄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailLine {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationDetail {
    pub title: &'static str,
    pub lines: Vec<DetailLine>,
    pub close_label: &'static str,
}

impl From<&Reservation> for ReservationDetail {
    fn from(r: &Reservation) -> Self {
        let line = |label, value| DetailLine { label, value };
        Self {
            title: DETAIL_TITLE,
            lines: vec![
                line("ユーザー名", r.user_name.clone()),
                line("コース名", r.course_title.clone()),
                line("予約日時", display_datetime(&r.reservation_datetime_1)),
                line("参加人数", r.participants.to_string()),
                line("ステータス", r.status.to_string()),
                line("担当スタッフ", r.staff.clone()),
                line("作成日時", display_datetime(&r.created_at)),
            ],
            close_label: CLOSE_LABEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::{Duration, TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn loads_every_reservation_as_one_hour_event() {
        let session = testing::memory_session().await;
        for (name, status) in [("A", Status::Unconfirmed), ("B", Status::Completed)] {
            testing::seed(&session, testing::payload(name, status)).await;
        }

        let mut calendar = CalendarController::new(day(2026, 10, 1));
        let events = calendar.load(&session).await.loaded().unwrap().clone();

        assert_eq!(events.len(), 2);
        for event in &events {
            assert_eq!(event.end - event.start, Duration::minutes(60));
        }
        assert_eq!(events[0].title, "A - 体験ダイビング");
    }

    #[tokio::test]
    async fn view_changes_and_navigation_do_not_refetch() {
        let (session, client) = testing::failing_session("unreachable");
        let mut calendar = CalendarController::new(day(2026, 10, 14));
        calendar.load(&session).await;
        assert_eq!(calendar.state().error(), Some("unreachable"));

        calendar.set_view(CalendarView::Week);
        calendar.navigate(Navigate::Next, day(2026, 10, 14));
        calendar.navigate(Navigate::Next, day(2026, 10, 14));
        assert_eq!(calendar.page().unwrap().date, day(2026, 10, 28));
        calendar.navigate(Navigate::Today, day(2026, 10, 14));
        assert_eq!(calendar.page().unwrap().date, day(2026, 10, 14));

        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn visible_events_follow_view_range() {
        let session = testing::memory_session().await;
        let mut later = testing::payload("later", Status::Confirmed);
        later.reservation_datetime_1 = Utc.with_ymd_and_hms(2026, 11, 20, 10, 0, 0).unwrap();
        testing::seed(&session, testing::payload("october", Status::Confirmed)).await;
        testing::seed(&session, later).await;

        let mut calendar = CalendarController::new(day(2026, 10, 14));
        calendar.load(&session).await;
        assert_eq!(calendar.visible_events().len(), 1);

        calendar.set_view(CalendarView::Day);
        calendar.navigate_to(day(2026, 11, 20));
        let visible = calendar.visible_events();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].reservation.user_name, "later");

        calendar.navigate_to(day(2026, 11, 21));
        assert!(calendar.visible_events().is_empty());
    }

    #[tokio::test]
    async fn month_view_includes_adjacent_days_of_the_grid() {
        let session = testing::memory_session().await;
        let mut september = testing::payload("september", Status::Confirmed);
        september.reservation_datetime_1 = Utc.with_ymd_and_hms(2026, 9, 28, 10, 0, 0).unwrap();
        testing::seed(&session, september).await;

        // 2026년 10월 그리드는 9월 27일(일)부터 시작합니다
        let mut calendar = CalendarController::new(day(2026, 10, 14));
        calendar.load(&session).await;
        let page = calendar.page().unwrap();
        assert_eq!(page.range_start, day(2026, 9, 27));
        assert_eq!(page.events.len(), 1);
    }

    #[test]
    fn date_at_the_end_of_chrono_range_is_an_error() {
        let mut calendar = CalendarController::new(NaiveDate::MAX);
        assert_eq!(
            calendar.visible_range(),
            Err(DateOutOfRange(NaiveDate::MAX))
        );
        assert!(calendar.page().is_err());
        assert!(calendar.visible_events().is_empty());

        calendar.navigate(Navigate::Today, day(2026, 10, 14));
        assert!(calendar.page().is_ok());
    }

    #[tokio::test]
    async fn selecting_opens_modal_with_full_reservation() {
        let session = testing::memory_session().await;
        let id = testing::seed(&session, testing::payload("山田", Status::Confirmed)).await;

        let mut calendar = CalendarController::new(day(2026, 10, 14));
        calendar.load(&session).await;
        let event = calendar.state().loaded().unwrap()[0].clone();

        calendar.select_event(&event);
        let selected = calendar.selected().unwrap();
        assert_eq!(selected.id, id);
        assert_eq!(selected.staff, "佐藤");

        let page = calendar.page().unwrap();
        let modal = page.modal.unwrap();
        assert_eq!(modal.lines.len(), 7);
        assert_eq!(modal.lines[0].value, "山田");
        assert_eq!(modal.lines[4].value, "確認済");

        calendar.close_modal();
        assert!(calendar.selected().is_none());
        assert!(calendar.page().unwrap().modal.is_none());
    }

    #[tokio::test]
    async fn selecting_unknown_reservation_keeps_modal_closed() {
        let session = testing::memory_session().await;
        let mut calendar = CalendarController::new(day(2026, 10, 14));
        calendar.load(&session).await;
        assert!(!calendar.select_reservation(99));
        assert!(calendar.selected().is_none());
    }

    #[tokio::test]
    async fn reselecting_unknown_reservation_closes_open_modal() {
        let session = testing::memory_session().await;
        let id = testing::seed(&session, testing::payload("山田", Status::Confirmed)).await;

        let mut calendar = CalendarController::new(day(2026, 10, 14));
        calendar.load(&session).await;
        assert!(calendar.select_reservation(id));
        assert_eq!(calendar.selected().map(|r| r.id), Some(id));

        assert!(!calendar.select_reservation(id + 100));
        assert!(calendar.selected().is_none());
    }

    #[test]
    fn stale_calendar_response_is_discarded() {
        let mut calendar = CalendarController::new(day(2026, 10, 14));
        let old = calendar.begin();
        let new = calendar.begin();
        assert!(calendar.complete(new, Ok(Vec::new())));
        assert!(!calendar.complete(old, Err(AppError::BadRequest("late".into()))));
        assert_eq!(calendar.state(), &LoadState::Loaded(Vec::new()));
    }
}

//! # 캘린더 이벤트 모델
//!
//! 예약을 캘린더에 표시하기 위한 파생 데이터입니다. DB에 저장되지 않습니다.
//!
//! - `CalendarEvent`: 예약 하나를 시작~종료 시간 범위로 투영한 것
//! - `CalendarView`: 월 / 주 / 일 / 일정(agenda) 표시 단위
//! - `CalendarMessages`: 캘린더 UI의 일본어 라벨

use super::Reservation;
use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// 예약 한 건의 표시 길이 (분).
/// 코스별 소요 시간 데이터와는 연결되어 있지 않은 고정값입니다.
pub const EVENT_DURATION_MINUTES: i64 = 60;

/// agenda 보기가 보여주는 일 수
pub const AGENDA_LENGTH_DAYS: u64 = 30;

/// 캘린더 이벤트
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    /// `"{user_name} - {course_title}"`
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    /// 상세 모달에 그대로 표시하기 위한 원본 예약
    pub reservation: Reservation,
}

/// 예약 → 캘린더 이벤트
pub fn to_calendar_event(reservation: Reservation) -> CalendarEvent {
    let start = reservation.reservation_datetime_1;
    // `Reservation::from_row`가 끝 시각이 표현 가능한지 확인해 둡니다
    let end = start
        .checked_add_signed(Duration::minutes(EVENT_DURATION_MINUTES))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    CalendarEvent {
        title: format!("{} - {}", reservation.user_name, reservation.course_title),
        start,
        end,
        all_day: false,
        reservation,
    }
}

impl CalendarEvent {
    /// 반열림 구간 `[from, to)`과 겹치는지
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start < to && from < self.end
    }
}

/// 캘린더 표시 단위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    #[default]
    Month,
    Week,
    Day,
    Agenda,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown calendar view \"{0}\"")]
pub struct UnknownView(pub String);

impl FromStr for CalendarView {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(CalendarView::Month),
            "week" => Ok(CalendarView::Week),
            "day" => Ok(CalendarView::Day),
            "agenda" => Ok(CalendarView::Agenda),
            other => Err(UnknownView(other.to_string())),
        }
    }
}

/// 보기 범위를 계산할 수 없는 날짜 (`NaiveDate`의 표현 범위 끝 근처)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("date {0} is outside the supported calendar range")]
pub struct DateOutOfRange(pub NaiveDate);

impl CalendarView {
    /// 현재 날짜를 기준으로 화면에 보이는 날짜 범위 `[시작일, 끝일)`.
    ///
    /// 월 보기는 그 달을 덮는 주 전체(일요일 시작)를 보여주므로,
    /// 앞뒤 달의 날짜도 일부 범위에 들어갑니다.
    /// 주 보기는 일요일에 시작합니다.
    pub fn range(self, date: NaiveDate) -> Result<(NaiveDate, NaiveDate), DateOutOfRange> {
        let range = match self {
            CalendarView::Month => month_grid(date),
            CalendarView::Week => week_start(date)
                .and_then(|start| Some((start, start.checked_add_days(Days::new(7))?))),
            CalendarView::Day => date.succ_opt().map(|end| (date, end)),
            CalendarView::Agenda => date
                .checked_add_days(Days::new(AGENDA_LENGTH_DAYS))
                .map(|end| (date, end)),
        };
        range.ok_or(DateOutOfRange(date))
    }

    /// 다음 / 이전 이동 한 단위
    pub fn step(self, date: NaiveDate, forward: bool) -> NaiveDate {
        let moved = match (self, forward) {
            (CalendarView::Month, true) => date.checked_add_months(Months::new(1)),
            (CalendarView::Month, false) => date.checked_sub_months(Months::new(1)),
            (CalendarView::Week, true) => date.checked_add_days(Days::new(7)),
            (CalendarView::Week, false) => date.checked_sub_days(Days::new(7)),
            (CalendarView::Day, true) => date.checked_add_days(Days::new(1)),
            (CalendarView::Day, false) => date.checked_sub_days(Days::new(1)),
            (CalendarView::Agenda, true) => date.checked_add_days(Days::new(AGENDA_LENGTH_DAYS)),
            (CalendarView::Agenda, false) => date.checked_sub_days(Days::new(AGENDA_LENGTH_DAYS)),
        };
        moved.unwrap_or(date)
    }
}

/// 그 주의 일요일
fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    let offset = date.weekday().num_days_from_sunday() as u64;
    date.checked_sub_days(Days::new(offset))
}

/// 1일이 든 주의 일요일 ~ 말일이 든 주의 다음 일요일
fn month_grid(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first = date.with_day(1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    let start = week_start(first)?;
    let end = week_start(last)?.checked_add_days(Days::new(7))?;
    Some((start, end))
}

/// 캘린더 UI 라벨
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CalendarMessages {
    pub next: &'static str,
    pub previous: &'static str,
    pub today: &'static str,
    pub month: &'static str,
    pub week: &'static str,
    pub day: &'static str,
    pub agenda: &'static str,
    pub date: &'static str,
    pub time: &'static str,
    pub event: &'static str,
    pub no_events_in_range: &'static str,
}

pub const CALENDAR_MESSAGES: CalendarMessages = CalendarMessages {
    next: "次",
    previous: "前",
    today: "今日",
    month: "月",
    week: "週",
    day: "日",
    agenda: "予定",
    date: "日付",
    time: "時間",
    event: "イベント",
    no_events_in_range: "この期間にイベントはありません。",
};

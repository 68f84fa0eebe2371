//! # 예약 폼 컨트롤러
//!
//! 예약 추가(create)와 편집(edit)을 한 폼에서 처리합니다.
//!
//! ## 처리 흐름
//! 1. `initialize`: 코스 이름 목록을 먼저 조회하고, 편집 모드면 예약 한 건을 추가로 조회
//! 2. `update_field`: 입력값을 필드에 반영 (인원 수는 매 입력마다 정수로 변환)
//! 3. `submit`: 편집이면 id 기준 전체 덮어쓰기, 추가면 폼 전체를 insert
//!
//! 필수 항목 검사는 입력 계층(`FormState::missing_required`)의 몫이며,
//! 입력 계층은 위반이 없을 때만 `submit`을 호출합니다.
//! 제출 시 코스 목록과의 대조는 하지 않습니다.

use super::{RequestGeneration, SelectOption, Ticket};
use crate::client::Session;
use crate::db;
use crate::error::AppError;
use crate::models::*;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const COURSE_PLACEHOLDER: &str = "コースを選択してください";
pub const COURSE_FETCH_FAILED: &str = "コースの取得に失敗しました。";
pub const LIST_PATH: &str = "/reservations";

/// `<input type="datetime-local">` 값 형식 (분 단위)
pub const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// 폼 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "id", rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit(ReservationId),
}

impl FormMode {
    pub fn from_id(id: Option<ReservationId>) -> Self {
        id.map_or(FormMode::Create, FormMode::Edit)
    }

    pub fn title(self) -> &'static str {
        match self {
            FormMode::Create => "新規予約追加",
            FormMode::Edit(_) => "予約編集",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            FormMode::Create => "追加",
            FormMode::Edit(_) => "更新",
        }
    }
}

/// 폼 입력 필드 (`name` 속성 값과 같습니다)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    UserName,
    CourseTitle,
    #[serde(rename = "reservation_datetime_1")]
    ReservationDatetime,
    Participants,
    Status,
    Staff,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::UserName,
        FormField::CourseTitle,
        FormField::ReservationDatetime,
        FormField::Participants,
        FormField::Status,
        FormField::Staff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormField::UserName => "user_name",
            FormField::CourseTitle => "course_title",
            FormField::ReservationDatetime => "reservation_datetime_1",
            FormField::Participants => "participants",
            FormField::Status => "status",
            FormField::Staff => "staff",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::UserName => "ユーザー名",
            FormField::CourseTitle => "コース名",
            FormField::ReservationDatetime => "予約日時",
            FormField::Participants => "参加人数",
            FormField::Status => "ステータス",
            FormField::Staff => "担当スタッフ",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| FormError::UnknownField(s.to_string()))
    }
}

/// 폼 입력 에러
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown form field \"{0}\"")]
    UnknownField(String),

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),

    /// 필수 항목이 비어 있거나 형식이 맞지 않음
    #[error("required fields missing: {}", join_fields(.0))]
    MissingRequired(Vec<FormField>),
}

fn join_fields(fields: &[FormField]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// 폼의 로컬 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub user_name: String,
    pub course_title: String,
    /// `YYYY-MM-DDTHH:MM` (UTC)
    pub reservation_datetime_1: String,
    /// 숫자가 아닌 입력은 `None` (보정하지 않고 그대로 둡니다)
    pub participants: Option<i32>,
    pub status: Status,
    pub staff: String,
}

impl Default for FormState {
    /// 추가 모드 기본값: 인원 1명, 상태 未確認, 나머지는 빈 문자열
    fn default() -> Self {
        Self {
            user_name: String::new(),
            course_title: String::new(),
            reservation_datetime_1: String::new(),
            participants: Some(1),
            status: Status::Unconfirmed,
            staff: String::new(),
        }
    }
}

impl FormState {
    /// 저장된 예약으로 폼을 채웁니다. 일시는 분 단위 입력 형식으로 잘라냅니다.
    pub fn from_reservation(reservation: &Reservation) -> Self {
        Self {
            user_name: reservation.user_name.clone(),
            course_title: reservation.course_title.clone(),
            reservation_datetime_1: format_datetime_input(&reservation.reservation_datetime_1),
            participants: Some(reservation.participants),
            status: reservation.status,
            staff: reservation.staff.clone(),
        }
    }

    /// 원시 입력값을 필드에 반영합니다.
    pub fn set(&mut self, field: FormField, raw: &str) -> Result<(), FormError> {
        match field {
            FormField::UserName => self.user_name = raw.to_string(),
            FormField::CourseTitle => self.course_title = raw.to_string(),
            FormField::ReservationDatetime => self.reservation_datetime_1 = raw.to_string(),
            FormField::Participants => self.participants = raw.trim().parse().ok(),
            FormField::Status => self.status = raw.parse()?,
            FormField::Staff => self.staff = raw.to_string(),
        }
        Ok(())
    }

    /// 입력 계층의 필수 항목 / 타입 제약 위반 목록.
    /// 비어 있는 문자열, 숫자가 아닌 인원 수, 해석할 수 없는 일시가 해당됩니다.
    pub fn missing_required(&self) -> Vec<FormField> {
        let mut missing = Vec::new();
        if self.user_name.is_empty() {
            missing.push(FormField::UserName);
        }
        if self.course_title.is_empty() {
            missing.push(FormField::CourseTitle);
        }
        if parse_datetime_input(&self.reservation_datetime_1).is_none() {
            missing.push(FormField::ReservationDatetime);
        }
        if self.participants.is_none() {
            missing.push(FormField::Participants);
        }
        if self.staff.is_empty() {
            missing.push(FormField::Staff);
        }
        missing
    }

    /// 저장 요청 본문. 필수 항목이 하나라도 비면 에러입니다.
    pub fn to_payload(&self) -> Result<ReservationPayload, FormError> {
        let missing = self.missing_required();
        let (Some(reservation_datetime_1), Some(participants), true) = (
            parse_datetime_input(&self.reservation_datetime_1),
            self.participants,
            missing.is_empty(),
        ) else {
            return Err(FormError::MissingRequired(missing));
        };

        Ok(ReservationPayload {
            user_name: self.user_name.clone(),
            course_title: self.course_title.clone(),
            reservation_datetime_1,
            participants,
            status: self.status,
            staff: self.staff.clone(),
        })
    }
}

pub fn format_datetime_input(value: &DateTime<Utc>) -> String {
    value.format(DATETIME_INPUT_FORMAT).to_string()
}

/// `datetime-local` 값 해석. 초 단위가 붙은 값도 받습니다.
pub fn parse_datetime_input(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DATETIME_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// 제출 성공 후 이동할 곳
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submitted {
    pub redirect: &'static str,
}

/// `initialize`에서 조회한 데이터.
/// 코스 조회가 성공한 뒤 예약 조회가 실패할 수 있으므로 예약 쪽 결과를 따로 둡니다.
#[derive(Debug)]
pub struct InitialData {
    pub courses: Vec<String>,
    pub reservation: Result<Option<Reservation>, String>,
}

#[derive(Debug)]
pub struct ReservationFormController {
    mode: FormMode,
    courses: Vec<String>,
    form: FormState,
    loading: bool,
    error: Option<String>,
    generation: RequestGeneration,
}

impl ReservationFormController {
    /// 기본값으로 채워진 폼. 아직 아무것도 조회하지 않은 상태입니다.
    pub fn new(mode: FormMode) -> Self {
        Self {
            mode,
            courses: Vec::new(),
            form: FormState::default(),
            loading: false,
            error: None,
            generation: RequestGeneration::default(),
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 조회를 시작합니다. 모드(id)가 바뀌면 새 티켓이 이전 조회를 무효로 만듭니다.
    pub fn begin(&mut self, mode: FormMode) -> Ticket {
        self.mode = mode;
        self.loading = true;
        self.error = None;
        self.generation.issue()
    }

    pub fn complete(&mut self, ticket: Ticket, result: Result<InitialData, String>) -> bool {
        if !self.generation.is_current(ticket) {
            tracing::warn!("discarding stale reservation form response");
            return false;
        }
        self.loading = false;
        match result {
            Ok(InitialData {
                courses,
                reservation,
            }) => {
                self.courses = courses;
                match reservation {
                    Ok(Some(reservation)) => self.form = FormState::from_reservation(&reservation),
                    Ok(None) => self.form = FormState::default(),
                    Err(message) => self.error = Some(message),
                }
            }
            Err(message) => self.error = Some(message),
        }
        true
    }

    /// 코스 목록(항상) + 편집 대상 예약(편집 모드)을 조회합니다.
    pub async fn initialize(
        &mut self,
        session: &Session,
        id: Option<ReservationId>,
    ) -> &FormState {
        let mode = FormMode::from_id(id);
        let ticket = self.begin(mode);
        let result = fetch_initial(session, mode).await;
        self.complete(ticket, result);
        &self.form
    }

    /// 제출 실패 화면을 다시 그릴 때처럼, 입력값은 그대로 두고 코스 목록만 갱신합니다.
    pub async fn load_courses(&mut self, session: &Session) {
        match fetch_courses(session).await {
            Ok(courses) => self.courses = courses,
            Err(message) => self.error = Some(message),
        }
    }

    /// 필드 이름(`name` 속성)과 원시 입력값으로 폼을 갱신합니다.
    pub fn update_field(&mut self, name: &str, raw: &str) -> Result<&FormState, FormError> {
        let field: FormField = name.parse()?;
        self.form.set(field, raw)?;
        Ok(&self.form)
    }

    /// 폼을 저장합니다.
    ///
    /// 실패하면 백엔드 메시지를 폼 에러로 남기고, 입력값은 되돌리지 않습니다.
    pub async fn submit(&mut self, session: &Session) -> Result<Submitted, String> {
        self.loading = true;
        self.error = None;

        let result = match self.form.to_payload() {
            Ok(payload) => match self.mode {
                FormMode::Edit(id) => db::update_reservation(session, id, payload).await,
                FormMode::Create => db::insert_reservation(session, payload).await,
            },
            Err(err) => Err(err.into()),
        };
        self.loading = false;

        match result {
            Ok(()) => Ok(Submitted { redirect: LIST_PATH }),
            Err(err) => {
                let message = err.to_string();
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// 코스 선택지: 안내 문구(빈 값) + 코스 이름들
    pub fn course_options(&self) -> Vec<SelectOption> {
        let current = self.form.course_title.as_str();
        let mut options = vec![SelectOption {
            value: String::new(),
            label: COURSE_PLACEHOLDER.to_string(),
            selected: current.is_empty(),
        }];
        options.extend(self.courses.iter().map(|title| SelectOption {
            value: title.clone(),
            label: title.clone(),
            selected: title == current,
        }));
        options
    }

    pub fn status_options(&self) -> Vec<SelectOption> {
        Status::ALL
            .into_iter()
            .map(|status| SelectOption {
                value: status.as_str().to_string(),
                label: status.as_str().to_string(),
                selected: status == self.form.status,
            })
            .collect()
    }

    pub fn page(&self) -> FormPage<'_> {
        FormPage {
            title: self.mode.title(),
            mode: self.mode,
            loading: self.loading,
            error: self.error(),
            form: &self.form,
            labels: FormField::ALL
                .into_iter()
                .map(|field| FieldLabel {
                    name: field.name(),
                    label: field.label(),
                })
                .collect(),
            course_options: self.course_options(),
            status_options: self.status_options(),
            submit_label: self.mode.submit_label(),
            cancel_path: LIST_PATH,
        }
    }
}

async fn fetch_courses(session: &Session) -> Result<Vec<String>, String> {
    db::list_course_titles(session).await.map_err(|err| {
        tracing::error!(error = %err, "failed to fetch courses");
        COURSE_FETCH_FAILED.to_string()
    })
}

/// 코스를 먼저 조회하고, 실패하면 예약 조회는 하지 않습니다.
async fn fetch_initial(session: &Session, mode: FormMode) -> Result<InitialData, String> {
    let courses = fetch_courses(session).await?;
    let reservation = match mode {
        FormMode::Create => Ok(None),
        FormMode::Edit(id) => db::get_reservation(session, id)
            .await
            .map(Some)
            .map_err(|err| err.to_string()),
    };
    Ok(InitialData {
        courses,
        reservation,
    })
}

#[derive(Debug, Serialize)]
pub struct FieldLabel {
    pub name: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FormPage<'a> {
    pub title: &'static str,
    pub mode: FormMode,
    pub loading: bool,
    pub error: Option<&'a str>,
    pub form: &'a FormState,
    pub labels: Vec<FieldLabel>,
    pub course_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub submit_label: &'static str,
    pub cancel_path: &'static str,
}

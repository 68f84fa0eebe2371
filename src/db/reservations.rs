//! # 예약 데이터 접근 함수
//!
//! `reservations` 테이블에 대한 조회/추가/수정 요청입니다.
//! 모든 함수는 `Session` 참조를 받아 원격 데이터 클라이언트로 요청을 보냅니다.
//! 삭제는 콘솔에서 지원하지 않습니다.

use crate::client::{ClientError, Session, SINGLE_ROW_MESSAGE};
use crate::error::AppError;
use crate::models::*;

pub const RESERVATIONS: &str = "reservations";

/// 목록 / 캘린더 표시에 필요한 컬럼
pub const RESERVATION_COLUMNS: &str =
    "id, user_name, course_title, reservation_datetime_1, participants, status, staff, created_at";

/// 조회 결과: 디코딩된 예약과, 형식이 맞지 않아 건너뛴 행의 수
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationList {
    pub reservations: Vec<Reservation>,
    pub skipped_rows: usize,
}

/// 예약 목록을 조회합니다.
///
/// `status`가 있으면 해당 상태와 정확히 일치하는 행만, 없으면 전체를 가져옵니다.
/// 정렬은 지정하지 않습니다 (백엔드가 돌려준 순서 그대로).
pub async fn list_reservations(
    session: &Session,
    status: Option<Status>,
) -> Result<ReservationList, AppError> {
    let mut query = session.table(RESERVATIONS).select(RESERVATION_COLUMNS);
    if let Some(status) = status {
        query = query.eq("status", status.as_str());
    }
    let rows = query.fetch().await?;

    let mut list = ReservationList::default();
    for row in rows {
        match Reservation::from_row(row) {
            Ok(reservation) => list.reservations.push(reservation),
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed reservation row");
                list.skipped_rows += 1;
            }
        }
    }
    Ok(list)
}

/// ID로 예약 한 건을 조회합니다. 정확히 한 행이 아니면 에러입니다.
pub async fn get_reservation(
    session: &Session,
    id: ReservationId,
) -> Result<Reservation, AppError> {
    let mut rows = session
        .table(RESERVATIONS)
        .select("*")
        .eq("id", id)
        .single()
        .fetch()
        .await?;

    match rows.pop() {
        Some(row) if rows.is_empty() => Ok(Reservation::from_row(row)?),
        _ => Err(ClientError::new(SINGLE_ROW_MESSAGE).into()),
    }
}

/// 새 예약을 추가합니다. id / created_at은 서버가 부여합니다.
pub async fn insert_reservation(
    session: &Session,
    payload: ReservationPayload,
) -> Result<(), AppError> {
    let stored = session.table(RESERVATIONS).insert(payload.into_row()).await?;
    if let Some(id) = stored.first().and_then(|row| row.get("id")) {
        tracing::info!(%id, "reservation created");
    }
    Ok(())
}

/// 예약 전체 필드를 덮어씁니다 (부분 패치가 아님).
pub async fn update_reservation(
    session: &Session,
    id: ReservationId,
    payload: ReservationPayload,
) -> Result<(), AppError> {
    session
        .table(RESERVATIONS)
        .update(payload.into_row())
        .eq("id", id)
        .execute()
        .await?;
    tracing::info!(id, "reservation updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn filter_restricts_to_matching_status() {
        let session = testing::memory_session().await;
        testing::seed(&session, testing::payload("A", Status::Confirmed)).await;
        testing::seed(&session, testing::payload("B", Status::Unconfirmed)).await;
        testing::seed(&session, testing::payload("C", Status::Confirmed)).await;

        let confirmed = list_reservations(&session, Some(Status::Confirmed)).await.unwrap();
        assert_eq!(confirmed.reservations.len(), 2);
        assert!(confirmed
            .reservations
            .iter()
            .all(|r| r.status == Status::Confirmed));

        let all = list_reservations(&session, None).await.unwrap();
        assert_eq!(all.reservations.len(), 3);
        assert_eq!(all.skipped_rows, 0);
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped_and_counted() {
        let session = testing::memory_session().await;
        testing::seed(&session, testing::payload("A", Status::Confirmed)).await;
        insert_bad_row(&session).await;

        let all = list_reservations(&session, None).await.unwrap();
        assert_eq!(all.reservations.len(), 1);
        assert_eq!(all.skipped_rows, 1);
    }

    /// 일시 컬럼에 날짜가 아닌 값이 들어간 행
    async fn insert_bad_row(session: &Session) {
        let mut row = testing::payload("broken", Status::Completed).into_row();
        row.insert("reservation_datetime_1".into(), "someday".into());
        session.table(RESERVATIONS).insert(row).await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_reservation_is_an_error() {
        let session = testing::memory_session().await;
        let err = get_reservation(&session, 404).await.unwrap_err();
        assert_eq!(err.to_string(), SINGLE_ROW_MESSAGE);
    }

    #[tokio::test]
    async fn update_overwrites_all_fields() {
        let session = testing::memory_session().await;
        let id = testing::seed(&session, testing::payload("A", Status::Unconfirmed)).await;

        let mut payload = testing::payload("A2", Status::Completed);
        payload.participants = 4;
        update_reservation(&session, id, payload.clone()).await.unwrap();

        let stored = get_reservation(&session, id).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.user_name, "A2");
        assert_eq!(stored.participants, 4);
        assert_eq!(stored.status, Status::Completed);
        assert_eq!(stored.reservation_datetime_1, payload.reservation_datetime_1);
    }
}

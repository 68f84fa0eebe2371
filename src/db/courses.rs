//! # 코스 데이터 접근 함수

use crate::client::Session;
use crate::error::AppError;
use crate::models::CourseTitle;

pub const DIVING_COURSES: &str = "diving_courses";

/// 예약 폼의 선택지로 쓸 코스 이름 목록. 순서는 백엔드가 돌려준 그대로입니다.
pub async fn list_course_titles(session: &Session) -> Result<Vec<String>, AppError> {
    let rows = session.table(DIVING_COURSES).select("title").fetch().await?;

    let mut titles = Vec::with_capacity(rows.len());
    for row in rows {
        match CourseTitle::from_row(row) {
            Ok(course) => titles.push(course.title),
            Err(err) => tracing::warn!(error = %err, "skipping malformed course row"),
        }
    }
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn lists_titles_in_backend_order() {
        let session = testing::memory_session().await;
        testing::seed_courses(&session, &["体験ダイビング", "ファンダイビング"]).await;

        let titles = list_course_titles(&session).await.unwrap();
        assert_eq!(titles, vec!["体験ダイビング", "ファンダイビング"]);
    }
}

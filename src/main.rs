//! # 다이빙 예약 콘솔 서버 진입점
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. 데이터 백엔드 선택 (원격 REST 또는 로컬 SQLite)
//! 4. 세션 컨텍스트 생성
//! 5. API 라우터 + 프론트엔드 정적 파일 설정
//! 6. HTTP 서버 시작, 종료 시 세션 정리

// ── 모듈 선언 ──
mod client;
mod config;
mod controllers;
mod db;
mod error;
mod models;
mod routes;
#[cfg(test)]
mod testing;

use anyhow::Result; // anyhow::Result: 어떤 에러 타입이든 담을 수 있는 범용 Result 타입
use axum::Router;
use client::{Credentials, DataClient, RestClient, Session, SqliteClient};
use config::{Backend, Config}; // 우리가 만든 설정 모듈
use routes::AppState;
use sqlx::sqlite::SqlitePoolOptions; // SQLite 연결 풀 설정 옵션
use std::{path::Path, sync::Arc}; // Arc: 여러 스레드가 공유하는 참조 카운트 포인터
use tower_http::{
    cors::{Any, CorsLayer},           // CORS: 다른 출처의 프론트엔드 요청 허용
    services::{ServeDir, ServeFile},  // 정적 파일 서빙
    trace::TraceLayer,                // HTTP 요청/응답 로깅 미들웨어
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt}; // 로깅 초기화 유틸리티

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 이 크레이트와 tower_http, axum을 debug 레벨로 출력합니다.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diving_console=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // `?`: 설정이 잘못되면 ConfigError가 anyhow::Error로 변환되어 main이 종료됩니다.
    let config = Config::from_env()?;
    tracing::info!(
        "Starting diving console server on {}:{}",
        config.host,
        config.port
    );

    // ── 3단계: 데이터 백엔드 선택 ──
    let (client, credentials) = connect(&config.backend).await?;

    // ── 4단계: 세션 컨텍스트 ──
    // 여기서 한 번 만들고, 라우트 핸들러는 AppState를 통해 받아 씁니다.
    let session = Session::new(client, credentials);
    // clone(): 라우터에 하나를 넘기고, 종료 시 close()용으로 하나를 남겨 둡니다.
    let state = AppState {
        session: session.clone(),
    };

    // ── 5단계: 라우터 설정 ──
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = routes::router(state);
    let frontend_dist = Path::new(&config.frontend_dist);
    let app: Router = if frontend_dist.exists() {
        tracing::info!("Serving frontend static files from {}", config.frontend_dist);

        // SPA이므로 찾을 수 없는 경로는 index.html로 돌려보냅니다.
        let serve_dir = ServeDir::new(frontend_dist)
            .not_found_service(ServeFile::new(frontend_dist.join("index.html")));

        api.fallback_service(serve_dir)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    } else {
        tracing::warn!("Frontend dist directory not found, serving API only");

        api.layer(cors).layer(TraceLayer::new_for_http())
    };

    // ── 6단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // with_graceful_shutdown(): 신호를 받으면 진행 중인 요청을 마친 뒤 종료
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 종료 시 백엔드 연결 해제
    session.close().await;
    tracing::info!("Session closed");

    Ok(())
}

/// 설정된 백엔드에 맞는 데이터 클라이언트를 만듭니다.
///
/// 로컬 SQLite는 연결 풀을 만들고 마이그레이션을 적용합니다.
async fn connect(backend: &Backend) -> Result<(Arc<dyn DataClient>, Credentials)> {
    match backend {
        Backend::Rest {
            url,
            anon_key,
            access_token,
        } => {
            tracing::info!("Using remote data service at {}", url);
            let client = RestClient::new(url, anon_key.clone());
            let credentials = Credentials {
                access_token: access_token.clone(),
            };
            // Arc::new(): 구체 타입을 Arc<dyn DataClient>로 감싸 반환
            Ok((Arc::new(client), credentials))
        }
        Backend::Sqlite { database_url } => {
            tracing::info!("Using local SQLite database {}", database_url);

            // 데이터베이스 파일이 들어갈 디렉토리가 없으면 생성합니다.
            if let Some(dir) = sqlite_parent_dir(database_url) {
                if !dir.exists() {
                    tokio::fs::create_dir_all(dir).await?;
                    tracing::info!("Created database directory: {}", dir.display());
                }
            }

            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;

            tracing::info!("Running database migrations...");
            // migrate!: 컴파일 시점에 migrations/ 폴더의 SQL 파일을 바이너리에 포함
            sqlx::migrate!("./migrations").run(&pool).await?;

            Ok((Arc::new(SqliteClient::new(pool)), Credentials::default()))
        }
    }
}

/// `sqlite:data/console.db?mode=rwc` → `data`
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Ctrl+C를 받으면 서버를 정상 종료합니다.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_parent_dir_extracts_directory() {
        assert_eq!(
            sqlite_parent_dir("sqlite:data/console.db?mode=rwc"),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_parent_dir("sqlite:console.db"), None);
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
    }
}

//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수(또는 `.env`)에서 서버 설정값을 읽어옵니다.
//!
//! 설정 항목:
//! - `SUPABASE_URL`: 설정되어 있으면 원격 REST 백엔드를 사용
//! - `SUPABASE_ANON_KEY`: REST 백엔드의 공개 API 키 (`SUPABASE_URL`과 함께 필수)
//! - `SUPABASE_ACCESS_TOKEN`: 로그인 사용자의 access token (선택)
//! - `DATABASE_URL`: REST 백엔드가 아닐 때 쓰는 로컬 SQLite 경로
//! - `HOST` / `PORT`: 서버 바인딩 주소
//! - `FRONTEND_DIST`: 빌드된 프론트엔드 정적 파일 디렉토리

use std::env;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite:data/console.db?mode=rwc";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
}

/// 데이터 백엔드 선택
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// PostgREST 호환 원격 서비스
    Rest {
        url: String,
        anon_key: String,
        access_token: Option<String>,
    },
    /// 로컬 SQLite 파일 (마이그레이션을 자동 적용)
    Sqlite { database_url: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    pub frontend_dist: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 환경변수 조회 함수를 받아 설정을 만듭니다.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = match lookup("SUPABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => Backend::Rest {
                url,
                anon_key: lookup("SUPABASE_ANON_KEY")
                    .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
                access_token: lookup("SUPABASE_ACCESS_TOKEN"),
            },
            None => Backend::Sqlite {
                database_url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            },
        };

        Ok(Self {
            backend,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .and_then(|port| port.parse().ok())
                .unwrap_or(3000),
            frontend_dist: lookup("FRONTEND_DIST")
                .unwrap_or_else(|| "../frontend/dist".to_string()),
        })
    }
}

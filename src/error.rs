//! 결합형 생성기 에러 정의

use thiserror::Error;

use crate::core::unicode::JamoError;
use crate::model::pattern::PatternError;

/// kcombine 전용 Result 타입
pub type Result<T, E = CombineError> = std::result::Result<T, E>;

/// 모델 로드/생성 중 발생하는 에러
#[derive(Debug, Error)]
pub enum CombineError {
    /// 파일 읽기/쓰기 실패
    #[error("파일 입출력 오류: {path} - {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 모델 파일의 값 파싱 실패
    #[error("{file}:{line} 파싱 오류: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    /// 규칙 패턴/템플릿 오류
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// 자모 조합 실패
    #[error(transparent)]
    Jamo(#[from] JamoError),

    /// 설정 파일 파싱 실패
    #[error("설정 파싱 오류: {0}")]
    Config(#[from] serde_json::Error),

    /// 필수 전제 조건 목록 파일 없음
    #[error("전제 조건 목록 파일이 없습니다: {0}")]
    MissingList(String),
}

impl CombineError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        CombineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(file: &str, line: usize, reason: impl Into<String>) -> Self {
        CombineError::Parse {
            file: file.to_owned(),
            line,
            reason: reason.into(),
        }
    }
}

//! 패턴 엔진의 에러 타입.
//!
//! 에러 분류는 두 단계입니다:
//! - 입력 검증 실패는 즉시 `PatternError`로 반환되며 복구하지 않습니다.
//! - 후보별 수치 퇴화(0 길이 다리, 퇴화된 추세선 등)는 에러가 아니라
//!   임계값 검사에서 탈락하는 값으로 처리되어 조용히 버려집니다.

use thiserror::Error;

/// 핵심 패턴 엔진 에러.
#[derive(Debug, Error)]
pub enum PatternError {
    /// 잘못된 입력 (필수 컬럼 누락, 시간순 정렬 위반 등)
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 데이터 부족 에러
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 패턴 엔진 작업을 위한 Result 타입.
pub type PatternResult<T> = Result<T, PatternError>;

impl PatternError {
    /// 치명적인 에러인지 확인합니다.
    ///
    /// 입력 검증 에러는 호출자가 입력을 고치기 전까지 재시도가 무의미합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PatternError::InvalidInput(_))
    }
}

//! 기술적 지표 계산.
//!
//! 패턴 확인 단계에서 쓰이는 지표들을 제공합니다:
//! - **trend**: SMA, EMA, MACD
//! - **momentum**: RSI
//! - **volatility**: 볼린저 밴드
//!
//! 지표는 f64 종가 시계열을 입력받고, 워밍업 구간은 `None`으로 표시한
//! `Vec<Option<f64>>`를 반환합니다.

pub mod momentum;
pub mod trend;
pub mod volatility;

pub use momentum::RsiParams;
pub use trend::{EmaParams, MacdParams, MacdResult, SmaParams};
pub use volatility::{BollingerBandsParams, BollingerBandsResult};

use thiserror::Error;

/// 지표 계산 에러.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 데이터 부족 에러
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),
}

/// 지표 계산을 위한 Result 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// 지표 계산 진입점.
///
/// 확인 단계가 필요로 하는 지표들을 하나의 인터페이스로 묶습니다.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    pub fn new() -> Self {
        Self
    }

    /// 단순 이동평균 (SMA)
    pub fn sma(&self, values: &[f64], params: SmaParams) -> IndicatorResult<Vec<Option<f64>>> {
        trend::sma(values, params)
    }

    /// 지수 이동평균 (EMA)
    pub fn ema(&self, values: &[f64], params: EmaParams) -> IndicatorResult<Vec<Option<f64>>> {
        trend::ema(values, params)
    }

    /// MACD (이동평균 수렴확산)
    pub fn macd(&self, values: &[f64], params: MacdParams) -> IndicatorResult<MacdResult> {
        trend::macd(values, params)
    }

    /// RSI (상대강도지수)
    pub fn rsi(&self, values: &[f64], params: RsiParams) -> IndicatorResult<Vec<Option<f64>>> {
        momentum::rsi(values, params)
    }

    /// 볼린저 밴드
    pub fn bollinger_bands(
        &self,
        values: &[f64],
        params: BollingerBandsParams,
    ) -> IndicatorResult<BollingerBandsResult> {
        volatility::bollinger_bands(values, params)
    }
}

//! 시장 데이터 타입 및 구조체.
//!
//! 이 모듈은 패턴 엔진이 소비하는 시장 데이터 타입을 정의합니다:
//! - `Kline` - OHLCV 캔들스틱 데이터
//! - `TrendDirection` - 패턴의 추세 방향
//! - `validate_series` - 입력 시계열 검증

use crate::error::{PatternError, PatternResult};
use crate::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV 캔들스틱 데이터.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kline {
    /// 거래 심볼 (예: "BTC/USDT")
    pub ticker: String,
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 캔들 시작 시간
    pub open_time: DateTime<Utc>,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: Decimal,
    /// 캔들 종료 시간
    pub close_time: DateTime<Utc>,
}

impl Kline {
    /// 새 캔들을 생성합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ticker: impl Into<String>,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            timeframe,
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time: open_time + timeframe.duration(),
        }
    }

    /// 캔들 몸통 크기(절대값)를 반환합니다.
    pub fn body_size(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉(종가 < 시가)인지 확인합니다.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// 패턴의 추세 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// 상승 추세
    Bullish,
    /// 하락 추세
    Bearish,
}

impl TrendDirection {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            TrendDirection::Bullish => TrendDirection::Bearish,
            TrendDirection::Bearish => TrendDirection::Bullish,
        }
    }
}

/// 입력 시계열을 검증합니다.
///
/// 엔진은 입력을 수선하지 않습니다. 수집/저장 계층이 시간순 정렬을 보장해야
/// 하며, 위반 시 즉시 에러를 반환합니다.
///
/// # 검증 항목
/// - `open_time`이 엄격하게 증가 (중복 타임스탬프 불허)
///
/// # 에러
/// 정렬 위반 또는 중복 타임스탬프 발견 시 `PatternError::InvalidInput`
pub fn validate_series(klines: &[Kline]) -> PatternResult<()> {
    for window in klines.windows(2) {
        if window[1].open_time <= window[0].open_time {
            return Err(PatternError::InvalidInput(format!(
                "시계열이 시간순이 아닙니다: {} 다음에 {}",
                window[0].open_time, window[1].open_time
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn create_test_kline(index: i64, close: Decimal) -> Kline {
        let time =
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(index);
        Kline::new(
            "BTC/USDT",
            Timeframe::H1,
            time,
            close - dec!(1),
            close + dec!(2),
            close - dec!(2),
            close,
            dec!(1000),
        )
    }

    #[test]
    fn test_kline_helpers() {
        let k = create_test_kline(0, dec!(100));
        assert_eq!(k.body_size(), dec!(1));
        assert_eq!(k.range(), dec!(4));
        assert!(k.is_bullish());
        assert!(!k.is_bearish());
    }

    #[test]
    fn test_close_time_follows_timeframe() {
        let k = create_test_kline(0, dec!(100));
        assert_eq!(k.close_time - k.open_time, chrono::Duration::hours(1));
    }

    #[test]
    fn test_validate_series_ordered() {
        let klines: Vec<Kline> = (0..5).map(|i| create_test_kline(i, dec!(100))).collect();
        assert!(validate_series(&klines).is_ok());
    }

    #[test]
    fn test_validate_series_rejects_duplicates() {
        let mut klines: Vec<Kline> = (0..5).map(|i| create_test_kline(i, dec!(100))).collect();
        klines[3].open_time = klines[2].open_time;

        let result = validate_series(&klines);
        assert!(matches!(result, Err(PatternError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_series_rejects_disorder() {
        let mut klines: Vec<Kline> = (0..5).map(|i| create_test_kline(i, dec!(100))).collect();
        klines.swap(1, 2);

        assert!(validate_series(&klines).is_err());
    }

    #[test]
    fn test_trend_direction_opposite() {
        assert_eq!(
            TrendDirection::Bullish.opposite(),
            TrendDirection::Bearish
        );
    }

    #[test]
    fn test_empty_series_is_valid() {
        assert!(validate_series(&[]).is_ok());
    }
}

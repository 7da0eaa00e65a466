//! 기술적 지표 확인(technical confirmation).
//!
//! 탐지된 패턴의 종료 지점 앞뒤 `window`바 구간에서 RSI, 볼린저 밴드,
//! MACD가 패턴의 방향과 부합하는지 평가합니다. 확인은 필터가 아닙니다:
//! 불일치해도 패턴은 버려지지 않고 점수만 낮아지며, 지표를 계산할
//! 데이터가 부족하면 확인 없이(None) 패턴이 그대로 보고됩니다.

use serde::{Deserialize, Serialize};

use pattern_core::{Kline, TrendDirection};

use crate::dec_to_f64;
use crate::indicators::{
    BollingerBandsParams, IndicatorEngine, MacdParams, RsiParams,
};

/// 확인 단계 파라미터.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationParams {
    /// 패턴 종료 지점 앞뒤로 살펴볼 바 수
    pub window: usize,
    /// RSI 과매수 기준
    pub rsi_overbought: f64,
    /// RSI 과매도 기준
    pub rsi_oversold: f64,
}

impl Default for ConfirmationParams {
    fn default() -> Self {
        Self {
            window: 20,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
        }
    }
}

/// 패턴에 대한 기술적 지표 확인 결과.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TechnicalConfirmation {
    /// RSI가 패턴 방향과 부합 (반전 전 과매수/과매도 도달)
    pub rsi_confirmation: bool,
    /// 가격이 방향에 맞는 볼린저 밴드에 닿음
    pub bb_confirmation: bool,
    /// MACD 히스토그램이 패턴 방향으로 움직임
    pub macd_confirmation: bool,
    /// 확인된 지표 비율 (0, 1/3, 2/3, 1)
    pub technical_score: f64,
}

/// 기술적 확인 평가기.
#[derive(Debug, Clone)]
pub struct TechnicalConfirmer {
    params: ConfirmationParams,
    indicators: IndicatorEngine,
}

impl TechnicalConfirmer {
    pub fn new(params: ConfirmationParams) -> Self {
        Self {
            params,
            indicators: IndicatorEngine::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ConfirmationParams::default())
    }

    /// 패턴 종료 지점에서의 지표 부합 여부를 평가합니다.
    ///
    /// 데이터가 부족해 지표를 계산할 수 없으면 `None`을 반환하고,
    /// 호출 측은 확인 없이 패턴을 보고합니다.
    pub fn evaluate(
        &self,
        klines: &[Kline],
        end_index: usize,
        trend: TrendDirection,
    ) -> Option<TechnicalConfirmation> {
        if end_index >= klines.len() {
            return None;
        }
        let closes: Vec<f64> = klines.iter().map(|k| dec_to_f64(k.close)).collect();

        let rsi = match self.indicators.rsi(&closes, RsiParams::default()) {
            Ok(values) => values,
            Err(error) => {
                tracing::debug!(%error, "RSI 계산 불가, 확인 생략");
                return None;
            }
        };
        let bands = match self
            .indicators
            .bollinger_bands(&closes, BollingerBandsParams::default())
        {
            Ok(result) => result,
            Err(error) => {
                tracing::debug!(%error, "볼린저 밴드 계산 불가, 확인 생략");
                return None;
            }
        };
        let macd = match self.indicators.macd(&closes, MacdParams::default()) {
            Ok(result) => result,
            Err(error) => {
                tracing::debug!(%error, "MACD 계산 불가, 확인 생략");
                return None;
            }
        };

        let lo = end_index.saturating_sub(self.params.window);
        let hi = (end_index + self.params.window).min(klines.len() - 1);

        // RSI: 구간 마지막 값이 50선을 방향에 맞게 넘었거나, 구간 안에서
        // 과매도(상승 패턴)/과매수(하락 패턴)에 도달했으면 확인
        let rsi_last = rsi[lo..=hi].iter().flatten().last().copied();
        let rsi_confirmation = match trend {
            TrendDirection::Bearish => {
                rsi_last.is_some_and(|v| v < 50.0)
                    || rsi[lo..=hi]
                        .iter()
                        .flatten()
                        .any(|v| *v >= self.params.rsi_overbought)
            }
            TrendDirection::Bullish => {
                rsi_last.is_some_and(|v| v > 50.0)
                    || rsi[lo..=hi]
                        .iter()
                        .flatten()
                        .any(|v| *v <= self.params.rsi_oversold)
            }
        };

        // 볼린저 밴드: 방향에 맞는 밴드 터치 여부
        let bb_confirmation = (lo..=hi).any(|i| match trend {
            TrendDirection::Bearish => bands.upper[i]
                .map(|band| dec_to_f64(klines[i].high) >= band)
                .unwrap_or(false),
            TrendDirection::Bullish => bands.lower[i]
                .map(|band| dec_to_f64(klines[i].low) <= band)
                .unwrap_or(false),
        });

        // MACD: 히스토그램이 패턴 방향으로 움직이는지
        let macd_confirmation = if hi == 0 {
            false
        } else {
            match (macd.histogram[hi - 1], macd.histogram[hi]) {
                (Some(previous), Some(current)) => match trend {
                    TrendDirection::Bullish => current > previous,
                    TrendDirection::Bearish => current < previous,
                },
                _ => false,
            }
        };

        let confirmed = [rsi_confirmation, bb_confirmation, macd_confirmation]
            .iter()
            .filter(|c| **c)
            .count();

        Some(TechnicalConfirmation {
            rsi_confirmation,
            bb_confirmation,
            macd_confirmation,
            technical_score: confirmed as f64 / 3.0,
        })
    }
}

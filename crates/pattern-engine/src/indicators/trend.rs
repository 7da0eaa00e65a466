//! 추세 지표: SMA, EMA, MACD.

use serde::{Deserialize, Serialize};

use super::{IndicatorError, IndicatorResult};

/// SMA 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmaParams {
    /// 이동평균 기간
    pub period: usize,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// EMA 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmaParams {
    /// 이동평균 기간
    pub period: usize,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self { period: 12 }
    }
}

/// MACD 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdParams {
    /// 단기 EMA 기간
    pub fast_period: usize,
    /// 장기 EMA 기간
    pub slow_period: usize,
    /// 시그널 EMA 기간
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD 계산 결과.
#[derive(Debug, Clone)]
pub struct MacdResult {
    /// MACD 선 (단기 EMA - 장기 EMA)
    pub macd: Vec<Option<f64>>,
    /// 시그널 선 (MACD의 EMA)
    pub signal: Vec<Option<f64>>,
    /// 히스토그램 (MACD - 시그널)
    pub histogram: Vec<Option<f64>>,
}

/// 단순 이동평균을 계산합니다.
///
/// 앞쪽 `period - 1`개는 워밍업 구간으로 `None`입니다.
pub fn sma(values: &[f64], params: SmaParams) -> IndicatorResult<Vec<Option<f64>>> {
    let period = params.period;
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "SMA 기간은 0보다 커야 합니다".to_string(),
        ));
    }
    if values.len() < period {
        return Err(IndicatorError::InsufficientData {
            required: period,
            provided: values.len(),
        });
    }

    let mut result = vec![None; values.len()];
    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = Some(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        result[i] = Some(sum / period as f64);
    }

    Ok(result)
}

/// 지수 이동평균을 계산합니다.
///
/// 첫 값은 초기 `period`개의 단순 평균으로 시드하고, 이후
/// `multiplier = 2 / (period + 1)`로 갱신합니다.
pub fn ema(values: &[f64], params: EmaParams) -> IndicatorResult<Vec<Option<f64>>> {
    let period = params.period;
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "EMA 기간은 0보다 커야 합니다".to_string(),
        ));
    }
    if values.len() < period {
        return Err(IndicatorError::InsufficientData {
            required: period,
            provided: values.len(),
        });
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = vec![None; values.len()];

    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..values.len() {
        prev = (values[i] - prev) * multiplier + prev;
        result[i] = Some(prev);
    }

    Ok(result)
}

/// MACD를 계산합니다.
///
/// MACD 선은 장기 EMA가 정의된 시점부터, 시그널 선은 거기서 다시
/// `signal_period`만큼 워밍업을 거친 시점부터 정의됩니다.
pub fn macd(values: &[f64], params: MacdParams) -> IndicatorResult<MacdResult> {
    if params.fast_period >= params.slow_period {
        return Err(IndicatorError::InvalidParameter(format!(
            "단기 기간({})은 장기 기간({})보다 짧아야 합니다",
            params.fast_period, params.slow_period
        )));
    }

    let required = params.slow_period + params.signal_period;
    if values.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            provided: values.len(),
        });
    }

    let fast = ema(values, EmaParams { period: params.fast_period })?;
    let slow = ema(values, EmaParams { period: params.slow_period })?;

    let n = values.len();
    let mut macd_line = vec![None; n];
    for i in 0..n {
        if let (Some(f), Some(s)) = (fast[i], slow[i]) {
            macd_line[i] = Some(f - s);
        }
    }

    // MACD가 정의된 구간만 꺼내 시그널 EMA를 적용
    let macd_start = params.slow_period - 1;
    let defined: Vec<f64> = macd_line[macd_start..].iter().map(|v| v.unwrap_or(0.0)).collect();
    let signal_defined = ema(&defined, EmaParams { period: params.signal_period })?;

    let mut signal = vec![None; n];
    let mut histogram = vec![None; n];
    for (offset, value) in signal_defined.iter().enumerate() {
        let i = macd_start + offset;
        signal[i] = *value;
        if let (Some(m), Some(s)) = (macd_line[i], signal[i]) {
            histogram[i] = Some(m - s);
        }
    }

    Ok(MacdResult {
        macd: macd_line,
        signal,
        histogram,
    })
}

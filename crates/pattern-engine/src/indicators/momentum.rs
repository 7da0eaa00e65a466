//! 모멘텀 지표: RSI.

use serde::{Deserialize, Serialize};

use super::{IndicatorError, IndicatorResult};

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RsiParams {
    /// RSI 기간
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// RSI(상대강도지수)를 계산합니다.
///
/// Wilder 평활화를 사용합니다: 첫 평균 상승/하락 폭은 초기 `period`개
/// 변화량의 단순 평균이고, 이후는
/// `avg = (prev * (period - 1) + current) / period`로 갱신됩니다.
/// 앞쪽 `period`개 값은 워밍업 구간으로 `None`입니다.
pub fn rsi(values: &[f64], params: RsiParams) -> IndicatorResult<Vec<Option<f64>>> {
    let period = params.period;
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "RSI 기간은 0보다 커야 합니다".to_string(),
        ));
    }
    if values.len() < period + 1 {
        return Err(IndicatorError::InsufficientData {
            required: period + 1,
            provided: values.len(),
        });
    }

    let n = values.len();
    let mut result = vec![None; n];

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = values[i] - values[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss += -change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for i in period + 1..n {
        let change = values[i] - values[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        result[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(result)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_warmup() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&values, RsiParams::default()).unwrap();

        assert_eq!(result[13], None);
        assert!(result[14].is_some());
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&values, RsiParams::default()).unwrap();
        assert!((result[29].unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let values: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
        let result = rsi(&values, RsiParams::default()).unwrap();
        assert!(result[29].unwrap() < 1e-9);
    }

    #[test]
    fn test_rsi_bounded() {
        let values: Vec<f64> = (0..100)
            .map(|i| 100.0 + 10.0 * ((i as f64) * 0.7).sin())
            .collect();
        let result = rsi(&values, RsiParams::default()).unwrap();

        for value in result.iter().flatten() {
            assert!(*value >= 0.0 && *value <= 100.0);
        }
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let values = vec![1.0; 10];
        assert!(matches!(
            rsi(&values, RsiParams::default()),
            Err(IndicatorError::InsufficientData {
                required: 15,
                provided: 10
            })
        ));
    }
}

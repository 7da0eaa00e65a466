//! 변동성 지표: 볼린저 밴드.

use serde::{Deserialize, Serialize};

use super::trend::{sma, SmaParams};
use super::IndicatorResult;

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균/표준편차 기간
    pub period: usize,
    /// 표준편차 배수
    pub std_dev_multiplier: f64,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

/// 볼린저 밴드 계산 결과.
#[derive(Debug, Clone)]
pub struct BollingerBandsResult {
    /// 상단 밴드 (중심 + 배수 × 표준편차)
    pub upper: Vec<Option<f64>>,
    /// 중심 밴드 (SMA)
    pub middle: Vec<Option<f64>>,
    /// 하단 밴드 (중심 - 배수 × 표준편차)
    pub lower: Vec<Option<f64>>,
}

/// 볼린저 밴드를 계산합니다.
///
/// 중심은 SMA, 표준편차는 같은 구간의 모집단 표준편차입니다.
pub fn bollinger_bands(
    values: &[f64],
    params: BollingerBandsParams,
) -> IndicatorResult<BollingerBandsResult> {
    let period = params.period;
    let middle = sma(values, SmaParams { period })?;

    let n = values.len();
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    for i in period - 1..n {
        let mean = match middle[i] {
            Some(m) => m,
            None => continue,
        };
        let window = &values[i + 1 - period..=i];
        let variance =
            window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();

        upper[i] = Some(mean + params.std_dev_multiplier * std_dev);
        lower[i] = Some(mean - params.std_dev_multiplier * std_dev);
    }

    Ok(BollingerBandsResult {
        upper,
        middle,
        lower,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_series_collapses_bands() {
        let values = vec![100.0; 30];
        let result = bollinger_bands(&values, BollingerBandsParams::default()).unwrap();

        assert!((result.upper[29].unwrap() - 100.0).abs() < 1e-9);
        assert!((result.middle[29].unwrap() - 100.0).abs() < 1e-9);
        assert!((result.lower[29].unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_band_ordering() {
        let values: Vec<f64> = (0..60)
            .map(|i| 100.0 + 5.0 * ((i as f64) * 0.3).sin())
            .collect();
        let result = bollinger_bands(&values, BollingerBandsParams::default()).unwrap();

        for i in 19..60 {
            let upper = result.upper[i].unwrap();
            let middle = result.middle[i].unwrap();
            let lower = result.lower[i].unwrap();
            assert!(upper >= middle && middle >= lower);
        }
    }

    #[test]
    fn test_warmup_is_none() {
        let values = vec![100.0; 30];
        let result = bollinger_bands(&values, BollingerBandsParams::default()).unwrap();
        assert_eq!(result.upper[18], None);
        assert_eq!(result.middle[18], None);
    }
}

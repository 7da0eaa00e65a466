//! 스윙 포인트(swing point) 추출.
//!
//! 두 가지 추출 방식을 제공합니다:
//! - `detect_swings` - 종가를 이동평균으로 평활화한 뒤 ±window 구간에서
//!   엄격한 극값을 찾는 방식. 고전 차트 패턴 매칭에 사용됩니다.
//! - `raw_extrema` - 평활화 없이 고가/저가 원본에서 이웃 비교로 극값을
//!   찾는 방식. 비율 정밀도가 중요한 하모닉 매칭에 사용됩니다.

use chrono::{DateTime, Utc};
use pattern_core::Kline;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dec_to_f64;

/// 스윙 포인트 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    /// 고점 (local maximum)
    Peak,
    /// 저점 (local minimum)
    Trough,
}

/// 추출된 스윙 포인트.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swing {
    /// 시계열 내 바 인덱스
    pub index: usize,
    /// 해당 바의 시작 시간
    pub timestamp: DateTime<Utc>,
    /// 스윙 가격 (평활 방식은 종가, 원본 방식은 고가/저가)
    pub price: Decimal,
    /// 고점/저점 구분
    pub kind: SwingKind,
}

/// 패턴을 구성하는 주요 지점.
///
/// 스윙에서 종류 정보를 떼어낸 형태로, 패턴 결과에 포함됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternPoint {
    /// 시계열 내 바 인덱스
    pub index: usize,
    /// 해당 바의 시작 시간
    pub timestamp: DateTime<Utc>,
    /// 가격
    pub price: Decimal,
}

impl From<&Swing> for PatternPoint {
    fn from(swing: &Swing) -> Self {
        Self {
            index: swing.index,
            timestamp: swing.timestamp,
            price: swing.price,
        }
    }
}

/// 스윙 추출 파라미터.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingParams {
    /// 극값 판정 구간 반경 (±window 바)
    pub window: usize,
    /// 평활화 이동평균 기간
    pub smoothing: usize,
    /// 원본 극값 방식에서 인접 스윙 간 최소 바 간격
    pub min_distance: usize,
}

impl Default for SwingParams {
    fn default() -> Self {
        Self {
            window: 10,
            smoothing: 5,
            min_distance: 5,
        }
    }
}

/// 스윙 포인트 추출기.
#[derive(Debug, Clone)]
pub struct SwingDetector {
    params: SwingParams,
}

impl SwingDetector {
    /// 주어진 파라미터로 추출기를 생성합니다.
    pub fn new(params: SwingParams) -> Self {
        Self { params }
    }

    /// 기본 파라미터로 추출기를 생성합니다.
    pub fn with_defaults() -> Self {
        Self::new(SwingParams::default())
    }

    /// 평활화된 종가에서 엄격한 극값을 추출합니다.
    ///
    /// 인덱스 `i`가 고점이 되려면 평활 종가가 `[i-window, i+window]`의
    /// 다른 모든 값보다 엄격하게 커야 합니다 (저점은 반대). 양 끝
    /// `window`개 바는 구간이 완전하지 않으므로 후보에서 제외됩니다.
    ///
    /// 반환되는 스윙의 가격은 평활값이 아니라 해당 바의 원본 종가입니다.
    pub fn detect_swings(&self, klines: &[Kline]) -> Vec<Swing> {
        let window = self.params.window;
        let n = klines.len();
        if n < 2 * window + 1 {
            return Vec::new();
        }

        let closes: Vec<f64> = klines.iter().map(|k| dec_to_f64(k.close)).collect();
        let smoothed = Self::smooth(&closes, self.params.smoothing);

        let mut swings = Vec::new();
        for i in window..n - window {
            let value = smoothed[i];
            let mut is_peak = true;
            let mut is_trough = true;

            for j in i - window..=i + window {
                if j == i {
                    continue;
                }
                if smoothed[j] >= value {
                    is_peak = false;
                }
                if smoothed[j] <= value {
                    is_trough = false;
                }
                if !is_peak && !is_trough {
                    break;
                }
            }

            if is_peak {
                swings.push(Swing {
                    index: i,
                    timestamp: klines[i].open_time,
                    price: klines[i].close,
                    kind: SwingKind::Peak,
                });
            } else if is_trough {
                swings.push(Swing {
                    index: i,
                    timestamp: klines[i].open_time,
                    price: klines[i].close,
                    kind: SwingKind::Trough,
                });
            }
        }

        swings
    }

    /// 평활화 없이 고가/저가 원본에서 극값을 추출합니다.
    ///
    /// 양쪽 이웃보다 엄격하게 높은 고가가 고점, 엄격하게 낮은 저가가
    /// 저점입니다. 직전에 채택한 같은 종류의 극값과 `min_distance`바
    /// 미만으로 가까우면 더 극단적인 쪽만 남깁니다(탐욕적 교체).
    pub fn raw_extrema(&self, klines: &[Kline]) -> Vec<Swing> {
        let n = klines.len();
        if n < 3 {
            return Vec::new();
        }

        let highs: Vec<f64> = klines.iter().map(|k| dec_to_f64(k.high)).collect();
        let lows: Vec<f64> = klines.iter().map(|k| dec_to_f64(k.low)).collect();

        let peak_indices = Self::scan_extrema(&highs, self.params.min_distance, true);
        let trough_indices = Self::scan_extrema(&lows, self.params.min_distance, false);

        let mut swings: Vec<Swing> = Vec::with_capacity(peak_indices.len() + trough_indices.len());
        for i in peak_indices {
            swings.push(Swing {
                index: i,
                timestamp: klines[i].open_time,
                price: klines[i].high,
                kind: SwingKind::Peak,
            });
        }
        for i in trough_indices {
            swings.push(Swing {
                index: i,
                timestamp: klines[i].open_time,
                price: klines[i].low,
                kind: SwingKind::Trough,
            });
        }

        swings.sort_by_key(|s| s.index);
        swings
    }

    /// 후행 이동평균으로 평활화합니다.
    ///
    /// 앞쪽 `period - 1`개 바는 완전한 구간이 없으므로 첫 완전 평균값으로
    /// 뒤에서 채웁니다(backward fill).
    fn smooth(values: &[f64], period: usize) -> Vec<f64> {
        let n = values.len();
        if period <= 1 || n < period {
            return values.to_vec();
        }

        let mut smoothed = vec![0.0; n];
        let mut sum: f64 = values[..period].iter().sum();
        smoothed[period - 1] = sum / period as f64;
        for i in period..n {
            sum += values[i] - values[i - period];
            smoothed[i] = sum / period as f64;
        }
        for i in 0..period - 1 {
            smoothed[i] = smoothed[period - 1];
        }

        smoothed
    }

    /// 이웃 비교 극값 인덱스를 탐욕적 교체 규칙으로 수집합니다.
    fn scan_extrema(values: &[f64], min_distance: usize, find_peaks: bool) -> Vec<usize> {
        let n = values.len();
        let mut indices: Vec<usize> = Vec::new();

        for i in 1..n - 1 {
            let is_extremum = if find_peaks {
                values[i] > values[i - 1] && values[i] > values[i + 1]
            } else {
                values[i] < values[i - 1] && values[i] < values[i + 1]
            };
            if !is_extremum {
                continue;
            }

            if let Some(&last) = indices.last() {
                if i - last < min_distance {
                    let more_extreme = if find_peaks {
                        values[i] > values[last]
                    } else {
                        values[i] < values[last]
                    };
                    if more_extreme {
                        *indices.last_mut().unwrap() = i;
                    }
                    continue;
                }
            }
            indices.push(i);
        }

        indices
    }
}

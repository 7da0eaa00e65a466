//! 고전 차트 패턴(classic chart pattern) 매칭.
//!
//! 평활화된 스윙 포인트에서 반전 패턴(reversal)과 지속 패턴
//! (continuation)을 탐지합니다:
//! - **reversal**: 헤드앤숄더, 이중/삼중 천정·바닥
//! - **continuation**: 상승/하락/대칭 삼각형, 깃발/페넌트
//!
//! 신뢰도 스케일은 과거 구현과의 호환을 위해 패턴 계열마다 다릅니다.
//! 헤드앤숄더는 0~100(기준 40), 나머지는 0~1(기준 0.4)입니다. 계열 간
//! 비교에는 `ChartPatternType::confidence_scale`로 정규화한 값을
//! 사용해야 합니다.

pub mod continuation;
pub mod reversal;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pattern_core::{Kline, TrendDirection};

use crate::confirm::TechnicalConfirmation;
use crate::scan::ScanStats;
use crate::swing::{PatternPoint, Swing, SwingDetector, SwingKind, SwingParams};
use crate::dec_to_f64;

/// 고전 차트 패턴 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartPatternType {
    HeadAndShoulders,
    InverseHeadAndShoulders,
    DoubleTop,
    DoubleBottom,
    TripleTop,
    TripleBottom,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
    BullishFlag,
    BearishFlag,
    BullishPennant,
    BearishPennant,
}

impl ChartPatternType {
    /// 표기 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartPatternType::HeadAndShoulders => "Head and Shoulders",
            ChartPatternType::InverseHeadAndShoulders => "Inverse Head and Shoulders",
            ChartPatternType::DoubleTop => "Double Top",
            ChartPatternType::DoubleBottom => "Double Bottom",
            ChartPatternType::TripleTop => "Triple Top",
            ChartPatternType::TripleBottom => "Triple Bottom",
            ChartPatternType::AscendingTriangle => "Ascending Triangle",
            ChartPatternType::DescendingTriangle => "Descending Triangle",
            ChartPatternType::SymmetricalTriangle => "Symmetrical Triangle",
            ChartPatternType::BullishFlag => "Bullish Flag",
            ChartPatternType::BearishFlag => "Bearish Flag",
            ChartPatternType::BullishPennant => "Bullish Pennant",
            ChartPatternType::BearishPennant => "Bearish Pennant",
        }
    }

    /// 해당 패턴 계열의 신뢰도 스케일 상한.
    ///
    /// `confidence / confidence_scale()`로 0~1 정규화 값을 얻습니다.
    pub fn confidence_scale(&self) -> f64 {
        match self {
            ChartPatternType::HeadAndShoulders | ChartPatternType::InverseHeadAndShoulders => {
                100.0
            }
            _ => 1.0,
        }
    }

    /// 계열별 최소 신뢰도 (해당 계열 스케일 기준).
    pub fn min_confidence(&self) -> f64 {
        match self {
            ChartPatternType::HeadAndShoulders | ChartPatternType::InverseHeadAndShoulders => {
                40.0
            }
            _ => 0.4,
        }
    }
}

impl std::fmt::Display for ChartPatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 탐지된 고전 차트 패턴.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPattern {
    /// 패턴 종류
    pub pattern_type: ChartPatternType,
    /// 추세 방향 (돌파 예상 방향)
    pub trend: TrendDirection,
    /// 신뢰도 (계열별 스케일, `confidence_scale` 참고)
    pub confidence: f64,
    /// 패턴을 구성하는 주요 지점 (시간순)
    pub key_points: Vec<PatternPoint>,
    /// 돌파 기준 가격
    pub breakout_level: Decimal,
    /// 목표 가격
    pub target_price: Decimal,
    /// 손절 가격
    pub stop_loss: Decimal,
    /// 지지/저항 수준
    pub support_resistance: Vec<Decimal>,
    /// 거래량 확인 여부
    pub volume_confirmation: bool,
    /// 기술적 지표 확인 (확인 단계에서 채워짐)
    pub confirmation: Option<TechnicalConfirmation>,
    /// 패턴 시작 바 인덱스
    pub start_index: usize,
    /// 패턴 종료 바 인덱스
    pub end_index: usize,
    /// 패턴 시작 시간
    pub start_time: DateTime<Utc>,
    /// 패턴 종료 시간
    pub end_time: DateTime<Utc>,
}

impl ChartPattern {
    /// 0~1로 정규화된 신뢰도를 반환합니다.
    pub fn normalized_confidence(&self) -> f64 {
        self.confidence / self.pattern_type.confidence_scale()
    }
}

/// 고전 패턴 매칭 파라미터.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassicParams {
    /// 스윙 극값 판정 구간 반경
    pub window: usize,
    /// 스윙 평활화 기간
    pub smoothing: usize,
    /// 패턴 최소 크기 (바)
    pub min_pattern_size: usize,
    /// 가격 동등성 허용 오차 (0.02 = 2%)
    pub tolerance: f64,
    /// 깃발 기둥(pole) 탐색 구간 (바)
    pub pole_lookback: usize,
    /// 기둥으로 인정할 최소 변동률 (0.05 = 5%)
    pub min_pole_move: f64,
    /// 조정 구간(consolidation)의 최소 길이 (바)
    pub min_consolidation: usize,
}

impl Default for ClassicParams {
    fn default() -> Self {
        Self {
            window: 20,
            smoothing: 5,
            min_pattern_size: 20,
            tolerance: 0.02,
            pole_lookback: 10,
            min_pole_move: 0.05,
            min_consolidation: 5,
        }
    }
}

/// 고전 차트 패턴 매처.
#[derive(Debug, Clone)]
pub struct ClassicMatcher {
    params: ClassicParams,
}

impl ClassicMatcher {
    pub fn new(params: ClassicParams) -> Self {
        Self { params }
    }

    pub fn with_defaults() -> Self {
        Self::new(ClassicParams::default())
    }

    pub fn params(&self) -> &ClassicParams {
        &self.params
    }

    /// 시계열을 스캔하여 고전 패턴과 스캔 통계를 반환합니다.
    pub fn scan(&self, klines: &[Kline]) -> (Vec<ChartPattern>, ScanStats) {
        let detector = SwingDetector::new(SwingParams {
            window: self.params.window,
            smoothing: self.params.smoothing,
            min_distance: self.params.window / 2,
        });
        let swings = detector.detect_swings(klines);

        let peaks: Vec<Swing> = swings
            .iter()
            .filter(|s| s.kind == SwingKind::Peak)
            .cloned()
            .collect();
        let troughs: Vec<Swing> = swings
            .iter()
            .filter(|s| s.kind == SwingKind::Trough)
            .cloned()
            .collect();

        let mut patterns = Vec::new();
        let mut stats = ScanStats::default();

        patterns.extend(self.detect_head_and_shoulders(klines, &peaks, &troughs, &mut stats));
        patterns.extend(self.detect_double_patterns(klines, &peaks, &troughs, &mut stats));
        patterns.extend(self.detect_triple_patterns(klines, &peaks, &troughs, &mut stats));
        patterns.extend(self.detect_triangles(klines, &peaks, &troughs, &mut stats));
        patterns.extend(self.detect_flags_pennants(klines, &mut stats));

        (patterns, stats)
    }

    /// 스캔하여 패턴만 반환합니다.
    pub fn detect(&self, klines: &[Kline]) -> Vec<ChartPattern> {
        self.scan(klines).0
    }

    /// 후보 탈락을 통계에 집계하고 debug 로그를 남깁니다.
    fn note_rejection(
        &self,
        stats: &mut ScanStats,
        pattern: ChartPatternType,
        reason: crate::scan::SkipReason,
        index: usize,
    ) {
        stats.candidates_rejected += 1;
        tracing::debug!(
            pattern = %pattern,
            reason = reason.as_str(),
            index,
            "고전 후보 탈락"
        );
    }

    /// 두 인덱스 사이(양 끝 제외)에서 가장 극단적인 스윙을 찾습니다.
    pub(crate) fn extreme_between<'a>(
        swings: &'a [Swing],
        lo: usize,
        hi: usize,
        find_min: bool,
    ) -> Option<&'a Swing> {
        swings
            .iter()
            .filter(|s| s.index > lo && s.index < hi)
            .min_by(|a, b| {
                let (pa, pb) = (dec_to_f64(a.price), dec_to_f64(b.price));
                let ordering = pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal);
                if find_min {
                    ordering
                } else {
                    ordering.reverse()
                }
            })
    }

    /// 구간 평균 거래량을 반환합니다.
    pub(crate) fn average_volume(klines: &[Kline], lo: usize, hi: usize) -> f64 {
        if lo > hi || hi >= klines.len() {
            return 0.0;
        }
        let count = (hi - lo + 1) as f64;
        let sum: f64 = klines[lo..=hi].iter().map(|k| dec_to_f64(k.volume)).sum();
        sum / count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_confidence_scale_per_family() {
        assert_eq!(ChartPatternType::HeadAndShoulders.confidence_scale(), 100.0);
        assert_eq!(ChartPatternType::DoubleTop.confidence_scale(), 1.0);
        assert_eq!(ChartPatternType::AscendingTriangle.confidence_scale(), 1.0);
    }

    #[test]
    fn test_extreme_between_excludes_bounds() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let swing = |i: usize, price: Decimal| Swing {
            index: i,
            timestamp: base + chrono::Duration::hours(i as i64),
            price,
            kind: SwingKind::Trough,
        };
        let swings = vec![
            swing(5, dec!(80)),
            swing(10, dec!(95)),
            swing(15, dec!(90)),
            swing(20, dec!(70)),
        ];

        let min = ClassicMatcher::extreme_between(&swings, 5, 20, true).unwrap();
        assert_eq!(min.index, 15);

        let max = ClassicMatcher::extreme_between(&swings, 5, 20, false).unwrap();
        assert_eq!(max.index, 10);

        assert!(ClassicMatcher::extreme_between(&swings, 10, 15, true).is_none());
    }

    #[test]
    fn test_average_volume_bounds() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let klines: Vec<Kline> = (0..5)
            .map(|i| {
                Kline::new(
                    "BTC/USDT",
                    pattern_core::Timeframe::H1,
                    base + chrono::Duration::hours(i),
                    dec!(100),
                    dec!(101),
                    dec!(99),
                    dec!(100),
                    Decimal::from((i + 1) * 100),
                )
            })
            .collect();

        assert!((ClassicMatcher::average_volume(&klines, 0, 4) - 300.0).abs() < 1e-9);
        assert_eq!(ClassicMatcher::average_volume(&klines, 3, 10), 0.0);
    }
}

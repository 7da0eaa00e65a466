//! 반전 패턴 탐지: 헤드앤숄더, 이중/삼중 천정·바닥.

use pattern_core::{Kline, TrendDirection};

use super::{ChartPattern, ChartPatternType, ClassicMatcher};
use crate::scan::{ScanStats, SkipReason};
use crate::swing::{PatternPoint, Swing};
use crate::{dec_to_f64, f64_to_dec};

impl ClassicMatcher {
    /// 헤드앤숄더 패턴을 탐지합니다.
    ///
    /// 연속된 세 고점에서 가운데(머리)가 양쪽 어깨보다 2% 이상 높고,
    /// 어깨 사이의 두 저점이 목선(neckline)을 이루는 형태를 찾습니다.
    /// 어깨 차이는 `tolerance`, 목선 차이는 `tolerance / 2`, 좌우 폭
    /// 비대칭은 20%를 넘으면 탈락합니다. 신뢰도는 0~100 스케일이며
    /// 40 미만은 버립니다.
    pub(super) fn detect_head_and_shoulders(
        &self,
        klines: &[Kline],
        peaks: &[Swing],
        troughs: &[Swing],
        stats: &mut ScanStats,
    ) -> Vec<ChartPattern> {
        let pattern_type = ChartPatternType::HeadAndShoulders;
        let mut patterns = Vec::new();

        for window in peaks.windows(3) {
            stats.windows_examined += 1;
            let (left, head, right) = (&window[0], &window[1], &window[2]);
            let left_price = dec_to_f64(left.price);
            let head_price = dec_to_f64(head.price);
            let right_price = dec_to_f64(right.price);

            // 머리는 양쪽 어깨보다 최소 2% 높아야 한다 (경계 포함)
            if head_price < left_price * 1.02 || head_price < right_price * 1.02 {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, left.index);
                continue;
            }
            if right.index - left.index < self.params.min_pattern_size {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, left.index);
                continue;
            }

            let neck_left = Self::extreme_between(troughs, left.index, head.index, true);
            let neck_right = Self::extreme_between(troughs, head.index, right.index, true);
            let (neck_left, neck_right) = match (neck_left, neck_right) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    self.note_rejection(
                        stats,
                        pattern_type,
                        SkipReason::GeometryViolation,
                        left.index,
                    );
                    continue;
                }
            };

            let shoulder_avg = (left_price + right_price) / 2.0;
            let shoulder_diff_pct = (left_price - right_price).abs() / shoulder_avg;

            let neck_left_price = dec_to_f64(neck_left.price);
            let neck_right_price = dec_to_f64(neck_right.price);
            let neck_avg = (neck_left_price + neck_right_price) / 2.0;
            let neck_diff_pct = (neck_left_price - neck_right_price).abs() / neck_avg;

            let width_left = (head.index - left.index) as f64;
            let width_right = (right.index - head.index) as f64;
            let width_asym = (width_left - width_right).abs() / width_left.max(width_right);

            // 어깨 동등성, 목선 정렬, 좌우 폭 대칭은 허용 오차를 넘으면
            // 기하 위반으로 즉시 탈락하고, 허용 오차 안에서만 점수화된다
            if shoulder_diff_pct > self.params.tolerance
                || neck_diff_pct > self.params.tolerance / 2.0
                || width_asym > 0.2
            {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, left.index);
                continue;
            }

            let shoulder_symmetry = (1.0 - shoulder_diff_pct / self.params.tolerance).clamp(0.0, 1.0);
            let neckline_alignment =
                (1.0 - neck_diff_pct / (self.params.tolerance / 2.0)).clamp(0.0, 1.0);
            let time_symmetry = (1.0 - width_asym / 0.2).clamp(0.0, 1.0);
            let head_height_pct = (head_price - shoulder_avg) / shoulder_avg;

            let confidence = 100.0
                * (0.3 * shoulder_symmetry
                    + 0.3 * neckline_alignment
                    + 0.2 * time_symmetry
                    + head_height_pct.min(0.2));

            if confidence < pattern_type.min_confidence() {
                self.note_rejection(stats, pattern_type, SkipReason::BelowConfidence, left.index);
                continue;
            }

            let height = head_price - neck_avg;
            let right_volume = dec_to_f64(klines[right.index].volume);
            let avg_volume = Self::average_volume(klines, left.index, right.index);
            let volume_confirmation = right_volume >= 1.5 * avg_volume;

            patterns.push(ChartPattern {
                pattern_type,
                trend: TrendDirection::Bearish,
                confidence,
                key_points: vec![
                    PatternPoint::from(left),
                    PatternPoint::from(neck_left),
                    PatternPoint::from(head),
                    PatternPoint::from(neck_right),
                    PatternPoint::from(right),
                ],
                breakout_level: f64_to_dec(neck_avg),
                target_price: f64_to_dec(neck_avg - height),
                stop_loss: f64_to_dec(head_price * 1.01),
                support_resistance: vec![f64_to_dec(neck_avg), f64_to_dec(head_price)],
                volume_confirmation,
                confirmation: None,
                start_index: left.index,
                end_index: right.index,
                start_time: left.timestamp,
                end_time: right.timestamp,
            });
        }

        patterns
    }

    /// 이중 천정/바닥 패턴을 탐지합니다.
    pub(super) fn detect_double_patterns(
        &self,
        klines: &[Kline],
        peaks: &[Swing],
        troughs: &[Swing],
        stats: &mut ScanStats,
    ) -> Vec<ChartPattern> {
        let mut patterns = self.detect_two_point(klines, peaks, troughs, true, stats);
        patterns.extend(self.detect_two_point(klines, troughs, peaks, false, stats));
        patterns
    }

    /// 삼중 천정/바닥 패턴을 탐지합니다.
    pub(super) fn detect_triple_patterns(
        &self,
        klines: &[Kline],
        peaks: &[Swing],
        troughs: &[Swing],
        stats: &mut ScanStats,
    ) -> Vec<ChartPattern> {
        let mut patterns = self.detect_three_point(klines, peaks, troughs, true, stats);
        patterns.extend(self.detect_three_point(klines, troughs, peaks, false, stats));
        patterns
    }

    /// 두 극값과 그 사이의 반대 극값으로 이중 패턴을 판정합니다.
    ///
    /// `is_top`이면 고점 쌍에서 이중 천정을, 아니면 저점 쌍에서 이중
    /// 바닥을 찾습니다. 거래량 확인은 둘째 극값의 거래량이 첫째의
    /// 1.2배를 엄격히 초과할 때만 인정됩니다.
    fn detect_two_point(
        &self,
        klines: &[Kline],
        extremes: &[Swing],
        opposites: &[Swing],
        is_top: bool,
        stats: &mut ScanStats,
    ) -> Vec<ChartPattern> {
        let pattern_type = if is_top {
            ChartPatternType::DoubleTop
        } else {
            ChartPatternType::DoubleBottom
        };
        let tolerance = self.params.tolerance;
        let mut patterns = Vec::new();

        for window in extremes.windows(2) {
            stats.windows_examined += 1;
            let (first, second) = (&window[0], &window[1]);
            let spacing = second.index - first.index;
            if spacing < self.params.min_pattern_size / 2 {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }

            let first_price = dec_to_f64(first.price);
            let second_price = dec_to_f64(second.price);
            let avg_price = (first_price + second_price) / 2.0;
            if avg_price <= 0.0 {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }

            let diff_pct = (first_price - second_price).abs() / avg_price;
            if diff_pct > tolerance {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }

            let middle = match Self::extreme_between(opposites, first.index, second.index, is_top) {
                Some(m) => m,
                None => {
                    self.note_rejection(
                        stats,
                        pattern_type,
                        SkipReason::GeometryViolation,
                        first.index,
                    );
                    continue;
                }
            };
            let middle_price = dec_to_f64(middle.price);
            let depth_pct = if is_top {
                (avg_price - middle_price) / avg_price
            } else {
                (middle_price - avg_price) / avg_price
            };
            if depth_pct < 0.02 {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }

            let left_span = (middle.index - first.index) as f64;
            let right_span = (second.index - middle.index) as f64;
            let time_asym = (left_span - right_span).abs() / spacing as f64;
            // 시간 비대칭 20% 초과는 기하 위반
            if time_asym > 0.2 {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }

            let first_volume = dec_to_f64(klines[first.index].volume);
            let second_volume = dec_to_f64(klines[second.index].volume);
            let volume_confirmation = second_volume > 1.2 * first_volume;

            let equality_score = 1.0 - diff_pct / tolerance;
            let depth_score = (depth_pct / 0.04).min(1.0);
            let time_score = (1.0 - time_asym / 0.5).clamp(0.0, 1.0);
            let volume_score = if volume_confirmation { 1.0 } else { 0.0 };

            let confidence = 0.3 * equality_score
                + 0.3 * depth_score
                + 0.25 * time_score
                + 0.15 * volume_score;

            if confidence < pattern_type.min_confidence() {
                self.note_rejection(stats, pattern_type, SkipReason::BelowConfidence, first.index);
                continue;
            }

            let height = (avg_price - middle_price).abs();
            let (trend, target, stop) = if is_top {
                (
                    TrendDirection::Bearish,
                    middle_price - height,
                    first_price.max(second_price) * 1.01,
                )
            } else {
                (
                    TrendDirection::Bullish,
                    middle_price + height,
                    first_price.min(second_price) * 0.99,
                )
            };

            patterns.push(ChartPattern {
                pattern_type,
                trend,
                confidence,
                key_points: vec![
                    PatternPoint::from(first),
                    PatternPoint::from(middle),
                    PatternPoint::from(second),
                ],
                breakout_level: f64_to_dec(middle_price),
                target_price: f64_to_dec(target),
                stop_loss: f64_to_dec(stop),
                support_resistance: vec![f64_to_dec(middle_price), f64_to_dec(avg_price)],
                volume_confirmation,
                confirmation: None,
                start_index: first.index,
                end_index: second.index,
                start_time: first.timestamp,
                end_time: second.timestamp,
            });
        }

        patterns
    }

    /// 세 극값과 그 사이의 반대 극값 둘로 삼중 패턴을 판정합니다.
    fn detect_three_point(
        &self,
        klines: &[Kline],
        extremes: &[Swing],
        opposites: &[Swing],
        is_top: bool,
        stats: &mut ScanStats,
    ) -> Vec<ChartPattern> {
        let pattern_type = if is_top {
            ChartPatternType::TripleTop
        } else {
            ChartPatternType::TripleBottom
        };
        let tolerance = self.params.tolerance;
        let mut patterns = Vec::new();

        for window in extremes.windows(3) {
            stats.windows_examined += 1;
            let (first, second, third) = (&window[0], &window[1], &window[2]);
            if third.index - first.index < self.params.min_pattern_size {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }

            let prices = [
                dec_to_f64(first.price),
                dec_to_f64(second.price),
                dec_to_f64(third.price),
            ];
            let mean_price = prices.iter().sum::<f64>() / 3.0;
            if mean_price <= 0.0 {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }
            let max_dev_pct = prices
                .iter()
                .map(|p| (p - mean_price).abs() / mean_price)
                .fold(0.0, f64::max);
            if max_dev_pct > tolerance {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }

            let middle_left = Self::extreme_between(opposites, first.index, second.index, is_top);
            let middle_right = Self::extreme_between(opposites, second.index, third.index, is_top);
            let (middle_left, middle_right) = match (middle_left, middle_right) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    self.note_rejection(
                        stats,
                        pattern_type,
                        SkipReason::GeometryViolation,
                        first.index,
                    );
                    continue;
                }
            };

            let middle_avg =
                (dec_to_f64(middle_left.price) + dec_to_f64(middle_right.price)) / 2.0;
            let depth_pct = if is_top {
                (mean_price - middle_avg) / mean_price
            } else {
                (middle_avg - mean_price) / mean_price
            };
            if depth_pct < 0.02 {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }

            let left_span = (second.index - first.index) as f64;
            let right_span = (third.index - second.index) as f64;
            let time_asym = (left_span - right_span).abs() / left_span.max(right_span);
            // 시간 비대칭 20% 초과는 기하 위반
            if time_asym > 0.2 {
                self.note_rejection(stats, pattern_type, SkipReason::GeometryViolation, first.index);
                continue;
            }

            let first_volume = dec_to_f64(klines[first.index].volume);
            let last_volume = dec_to_f64(klines[third.index].volume);
            let volume_confirmation = last_volume > 1.2 * first_volume;

            let equality_score = 1.0 - max_dev_pct / tolerance;
            let depth_score = (depth_pct / 0.04).min(1.0);
            let time_score = (1.0 - time_asym / 0.5).clamp(0.0, 1.0);
            let volume_score = if volume_confirmation { 1.0 } else { 0.0 };

            let confidence = 0.3 * equality_score
                + 0.3 * depth_score
                + 0.25 * time_score
                + 0.15 * volume_score;

            if confidence < pattern_type.min_confidence() {
                self.note_rejection(stats, pattern_type, SkipReason::BelowConfidence, first.index);
                continue;
            }

            let height = (mean_price - middle_avg).abs();
            let extreme = if is_top {
                prices.iter().fold(f64::MIN, |a, &b| a.max(b))
            } else {
                prices.iter().fold(f64::MAX, |a, &b| a.min(b))
            };
            let (trend, target, stop) = if is_top {
                (
                    TrendDirection::Bearish,
                    middle_avg - height,
                    extreme * 1.01,
                )
            } else {
                (
                    TrendDirection::Bullish,
                    middle_avg + height,
                    extreme * 0.99,
                )
            };

            patterns.push(ChartPattern {
                pattern_type,
                trend,
                confidence,
                key_points: vec![
                    PatternPoint::from(first),
                    PatternPoint::from(middle_left),
                    PatternPoint::from(second),
                    PatternPoint::from(middle_right),
                    PatternPoint::from(third),
                ],
                breakout_level: f64_to_dec(middle_avg),
                target_price: f64_to_dec(target),
                stop_loss: f64_to_dec(stop),
                support_resistance: vec![f64_to_dec(middle_avg), f64_to_dec(mean_price)],
                volume_confirmation,
                confirmation: None,
                start_index: first.index,
                end_index: third.index,
                start_time: first.timestamp,
                end_time: third.timestamp,
            });
        }

        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pattern_core::Timeframe;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::swing::SwingKind;

    fn create_klines(len: usize) -> Vec<Kline> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                Kline::new(
                    "BTC/USDT",
                    Timeframe::H1,
                    base + chrono::Duration::hours(i as i64),
                    dec!(100),
                    dec!(101),
                    dec!(99),
                    dec!(100),
                    dec!(1000),
                )
            })
            .collect()
    }

    fn swing(klines: &[Kline], index: usize, price: f64, kind: SwingKind) -> Swing {
        Swing {
            index,
            timestamp: klines[index].open_time,
            price: Decimal::try_from(price).unwrap(),
            kind,
        }
    }

    #[test]
    fn test_head_and_shoulders_symmetric() {
        let mut klines = create_klines(80);
        // 오른쪽 어깨에서 거래량 급증
        klines[60].volume = dec!(2000);

        let peaks = vec![
            swing(&klines, 20, 110.0, SwingKind::Peak),
            swing(&klines, 40, 125.0, SwingKind::Peak),
            swing(&klines, 60, 110.0, SwingKind::Peak),
        ];
        let troughs = vec![
            swing(&klines, 30, 100.0, SwingKind::Trough),
            swing(&klines, 50, 100.0, SwingKind::Trough),
        ];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_head_and_shoulders(&klines, &peaks, &troughs, &mut stats);

        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.pattern_type, ChartPatternType::HeadAndShoulders);
        assert_eq!(p.trend, TrendDirection::Bearish);
        assert!(p.confidence > 80.0, "confidence = {}", p.confidence);
        assert!(p.volume_confirmation);
        // 목표가 = 목선 - (머리 - 목선) = 100 - 25 = 75
        assert_eq!(p.target_price, dec!(75));
        assert_eq!(p.key_points.len(), 5);
        // 주요 지점은 시간순이어야 한다
        for pair in p.key_points.windows(2) {
            assert!(pair[0].index < pair[1].index);
        }
    }

    #[test]
    fn test_head_must_exceed_shoulders() {
        let klines = create_klines(80);
        // 머리가 어깨보다 1%만 높음: 탈락
        let peaks = vec![
            swing(&klines, 20, 110.0, SwingKind::Peak),
            swing(&klines, 40, 111.0, SwingKind::Peak),
            swing(&klines, 60, 110.0, SwingKind::Peak),
        ];
        let troughs = vec![
            swing(&klines, 30, 100.0, SwingKind::Trough),
            swing(&klines, 50, 100.0, SwingKind::Trough),
        ];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_head_and_shoulders(&klines, &peaks, &troughs, &mut stats);

        assert!(patterns.is_empty());
        assert_eq!(stats.candidates_rejected, 1);
    }

    #[test]
    fn test_head_and_shoulders_unequal_shoulders_rejected() {
        let klines = create_klines(80);
        // 어깨 차이 약 9.5%: 허용 오차 2%를 크게 벗어남
        let peaks = vec![
            swing(&klines, 20, 110.0, SwingKind::Peak),
            swing(&klines, 40, 125.0, SwingKind::Peak),
            swing(&klines, 60, 100.0, SwingKind::Peak),
        ];
        let troughs = vec![
            swing(&klines, 30, 95.0, SwingKind::Trough),
            swing(&klines, 50, 95.0, SwingKind::Trough),
        ];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_head_and_shoulders(&klines, &peaks, &troughs, &mut stats);

        assert!(patterns.is_empty());
        assert_eq!(stats.candidates_rejected, 1);
    }

    #[test]
    fn test_head_and_shoulders_unaligned_neckline_rejected() {
        let klines = create_klines(80);
        let peaks = vec![
            swing(&klines, 20, 110.0, SwingKind::Peak),
            swing(&klines, 40, 125.0, SwingKind::Peak),
            swing(&klines, 60, 110.0, SwingKind::Peak),
        ];
        // 목선 차이 3%: 허용 오차 1% 초과
        let troughs = vec![
            swing(&klines, 30, 100.0, SwingKind::Trough),
            swing(&klines, 50, 103.0, SwingKind::Trough),
        ];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_head_and_shoulders(&klines, &peaks, &troughs, &mut stats);

        assert!(patterns.is_empty());
        assert_eq!(stats.candidates_rejected, 1);
    }

    #[test]
    fn test_head_and_shoulders_wide_width_asymmetry_rejected() {
        let klines = create_klines(80);
        // 좌우 폭 10 대 30: 비대칭 66% > 20%
        let peaks = vec![
            swing(&klines, 20, 110.0, SwingKind::Peak),
            swing(&klines, 30, 125.0, SwingKind::Peak),
            swing(&klines, 60, 110.0, SwingKind::Peak),
        ];
        let troughs = vec![
            swing(&klines, 25, 100.0, SwingKind::Trough),
            swing(&klines, 45, 100.0, SwingKind::Trough),
        ];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_head_and_shoulders(&klines, &peaks, &troughs, &mut stats);

        assert!(patterns.is_empty());
        assert_eq!(stats.candidates_rejected, 1);
    }

    #[test]
    fn test_head_exactly_two_percent_above_shoulders_accepted() {
        let klines = create_klines(80);
        // 머리가 어깨보다 정확히 2% 높음: 경계값은 통과해야 한다
        let peaks = vec![
            swing(&klines, 20, 100.0, SwingKind::Peak),
            swing(&klines, 40, 102.0, SwingKind::Peak),
            swing(&klines, 60, 100.0, SwingKind::Peak),
        ];
        let troughs = vec![
            swing(&klines, 30, 98.0, SwingKind::Trough),
            swing(&klines, 50, 98.0, SwingKind::Trough),
        ];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_head_and_shoulders(&klines, &peaks, &troughs, &mut stats);

        assert_eq!(patterns.len(), 1);
        // 대칭 성분 만점 + 머리 높이 2%: 100 × (0.3 + 0.3 + 0.2 + 0.02) = 82
        assert!((patterns[0].confidence - 82.0).abs() < 1e-9);
    }

    #[test]
    fn test_double_top_detected() {
        let mut klines = create_klines(60);
        klines[10].volume = dec!(1000);
        klines[40].volume = dec!(1300);

        let peaks = vec![
            swing(&klines, 10, 120.0, SwingKind::Peak),
            swing(&klines, 40, 120.5, SwingKind::Peak),
        ];
        let troughs = vec![swing(&klines, 25, 110.0, SwingKind::Trough)];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_double_patterns(&klines, &peaks, &troughs, &mut stats);

        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.pattern_type, ChartPatternType::DoubleTop);
        assert_eq!(p.trend, TrendDirection::Bearish);
        assert!(p.volume_confirmation);
        assert!(p.confidence >= 0.4);
        assert_eq!(p.key_points.len(), 3);
    }

    #[test]
    fn test_double_top_volume_boundary_is_strict() {
        // 거래량이 정확히 1.2배: 엄격 초과 조건이므로 확인 실패
        let mut klines = create_klines(60);
        klines[10].volume = dec!(1000);
        klines[40].volume = dec!(1200);

        let peaks = vec![
            swing(&klines, 10, 120.0, SwingKind::Peak),
            swing(&klines, 40, 120.0, SwingKind::Peak),
        ];
        let troughs = vec![swing(&klines, 25, 110.0, SwingKind::Trough)];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_double_patterns(&klines, &peaks, &troughs, &mut stats);

        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert!(!p.volume_confirmation);
        // 거래량 성분(0.15)이 빠진 신뢰도: 0.3 + 0.3 + 0.25 = 0.85
        assert!((p.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_double_bottom_detected() {
        let klines = create_klines(60);
        let troughs = vec![
            swing(&klines, 12, 90.0, SwingKind::Trough),
            swing(&klines, 42, 90.0, SwingKind::Trough),
        ];
        let peaks = vec![swing(&klines, 27, 99.0, SwingKind::Peak)];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_double_patterns(&klines, &peaks, &troughs, &mut stats);

        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.pattern_type, ChartPatternType::DoubleBottom);
        assert_eq!(p.trend, TrendDirection::Bullish);
        // 목표가 = 목선 + (목선 - 바닥) = 99 + 9 = 108
        assert_eq!(p.target_price, dec!(108));
    }

    #[test]
    fn test_double_top_wide_time_asymmetry_rejected() {
        let klines = create_klines(60);
        // 중간 저점이 한쪽으로 치우침: 비대칭 |23-7|/30 ≈ 53% > 20%
        let peaks = vec![
            swing(&klines, 10, 120.0, SwingKind::Peak),
            swing(&klines, 40, 120.0, SwingKind::Peak),
        ];
        let troughs = vec![swing(&klines, 33, 110.0, SwingKind::Trough)];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_double_patterns(&klines, &peaks, &troughs, &mut stats);

        assert!(patterns.is_empty());
        assert_eq!(stats.candidates_rejected, 1);
    }

    #[test]
    fn test_triple_top_wide_time_asymmetry_rejected() {
        let klines = create_klines(80);
        // 고점 간격 35 대 15: 비대칭 20/35 ≈ 57% > 20%
        let peaks = vec![
            swing(&klines, 10, 120.0, SwingKind::Peak),
            swing(&klines, 45, 121.0, SwingKind::Peak),
            swing(&klines, 60, 120.0, SwingKind::Peak),
        ];
        let troughs = vec![
            swing(&klines, 25, 112.0, SwingKind::Trough),
            swing(&klines, 52, 112.0, SwingKind::Trough),
        ];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_triple_patterns(&klines, &peaks, &troughs, &mut stats);

        assert!(patterns.is_empty());
        assert_eq!(stats.candidates_rejected, 1);
    }

    #[test]
    fn test_double_top_unequal_peaks_rejected() {
        let klines = create_klines(60);
        // 고점 차이 5%: 허용 오차 2% 초과
        let peaks = vec![
            swing(&klines, 10, 120.0, SwingKind::Peak),
            swing(&klines, 40, 126.0, SwingKind::Peak),
        ];
        let troughs = vec![swing(&klines, 25, 110.0, SwingKind::Trough)];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_double_patterns(&klines, &peaks, &troughs, &mut stats);

        assert!(patterns.is_empty());
    }

    #[test]
    fn test_triple_top_detected() {
        let mut klines = create_klines(80);
        klines[15].volume = dec!(1000);
        klines[65].volume = dec!(1500);

        let peaks = vec![
            swing(&klines, 15, 120.0, SwingKind::Peak),
            swing(&klines, 40, 121.0, SwingKind::Peak),
            swing(&klines, 65, 120.0, SwingKind::Peak),
        ];
        let troughs = vec![
            swing(&klines, 27, 112.0, SwingKind::Trough),
            swing(&klines, 52, 112.0, SwingKind::Trough),
        ];

        let matcher = ClassicMatcher::with_defaults();
        let mut stats = ScanStats::default();
        let patterns = matcher.detect_triple_patterns(&klines, &peaks, &troughs, &mut stats);

        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.pattern_type, ChartPatternType::TripleTop);
        assert!(p.volume_confirmation);
        assert_eq!(p.key_points.len(), 5);
    }
}

//! 지속 패턴 탐지: 삼각형, 깃발/페넌트.

use pattern_core::{Kline, TrendDirection};

use super::{ChartPattern, ChartPatternType, ClassicMatcher};
use crate::scan::{ScanStats, SkipReason};
use crate::swing::{PatternPoint, Swing};
use crate::trendline::TrendLine;
use crate::{dec_to_f64, f64_to_dec};

impl ClassicMatcher {
    /// 삼각형 패턴을 탐지합니다.
    ///
    /// 연속된 고점 쌍과 저점 쌍에 각각 추세선을 적합하고, 평균 가격으로
    /// 정규화한 기울기로 분류합니다. `tolerance / 10` 미만이면 수평으로
    /// 간주합니다:
    /// - 상승: 수평 상단 + 상승 하단
    /// - 하락: 수평 하단 + 하락 상단
    /// - 대칭: 하락 상단 + 상승 하단
    ///
    /// 두 선의 꼭짓점(apex)이 마지막 스윙 뒤 `2 × min_pattern_size`바
    /// 안에 있어야 합니다.
    pub(super) fn detect_triangles(
        &self,
        klines: &[Kline],
        peaks: &[Swing],
        troughs: &[Swing],
        stats: &mut ScanStats,
    ) -> Vec<ChartPattern> {
        let mut patterns = Vec::new();
        let flat_threshold = self.params.tolerance / 10.0;
        let horizon = 2.0 * self.params.min_pattern_size as f64;

        for peak_pair in peaks.windows(2) {
            for trough_pair in troughs.windows(2) {
                stats.windows_examined += 1;
                let (p1, p2) = (&peak_pair[0], &peak_pair[1]);
                let (t1, t2) = (&trough_pair[0], &trough_pair[1]);

                // 두 쌍의 구간이 겹쳐야 한다
                let inner_start = p1.index.max(t1.index);
                let inner_end = p2.index.min(t2.index);
                if inner_start >= inner_end {
                    self.note_rejection(
                        stats,
                        ChartPatternType::SymmetricalTriangle,
                        SkipReason::GeometryViolation,
                        p1.index,
                    );
                    continue;
                }

                let span_start = p1.index.min(t1.index);
                let span_end = p2.index.max(t2.index);
                if span_end >= klines.len() {
                    continue;
                }

                let (p1f, p2f) = (dec_to_f64(p1.price), dec_to_f64(p2.price));
                let (t1f, t2f) = (dec_to_f64(t1.price), dec_to_f64(t2.price));
                let mean_price = (p1f + p2f + t1f + t2f) / 4.0;
                if mean_price <= 0.0 {
                    continue;
                }

                let upper = TrendLine::fit(&[(p1.index, p1f), (p2.index, p2f)]);
                let lower = TrendLine::fit(&[(t1.index, t1f), (t2.index, t2f)]);
                let upper_slope = upper.slope / mean_price;
                let lower_slope = lower.slope / mean_price;

                let triangle_type = if upper_slope.abs() < flat_threshold
                    && lower_slope > flat_threshold
                {
                    ChartPatternType::AscendingTriangle
                } else if lower_slope.abs() < flat_threshold && upper_slope < -flat_threshold {
                    ChartPatternType::DescendingTriangle
                } else if upper_slope < -flat_threshold && lower_slope > flat_threshold {
                    ChartPatternType::SymmetricalTriangle
                } else {
                    self.note_rejection(
                        stats,
                        ChartPatternType::SymmetricalTriangle,
                        SkipReason::GeometryViolation,
                        p1.index,
                    );
                    continue;
                };

                let apex = match upper.intersection_x(&lower) {
                    Some(x) => x,
                    None => {
                        self.note_rejection(
                            stats,
                            triangle_type,
                            SkipReason::NoConvergence,
                            p1.index,
                        );
                        continue;
                    }
                };
                if apex <= span_end as f64 || apex >= span_end as f64 + horizon {
                    self.note_rejection(stats, triangle_type, SkipReason::NoConvergence, p1.index);
                    continue;
                }

                let convergence_score =
                    (1.0 - (apex - span_end as f64) / horizon).clamp(0.0, 1.0);
                let height = p1f.max(p2f) - t1f.min(t2f);
                let height_score = ((height / mean_price) / 0.05).clamp(0.0, 1.0);

                // 추세선에 닿은 바의 수
                let touch_tolerance = self.params.tolerance / 2.0 * mean_price;
                let mut touches = 0usize;
                for i in span_start..=span_end {
                    let high = dec_to_f64(klines[i].high);
                    let low = dec_to_f64(klines[i].low);
                    if (high - upper.value_at(i as f64)).abs() <= touch_tolerance {
                        touches += 1;
                    }
                    if (low - lower.value_at(i as f64)).abs() <= touch_tolerance {
                        touches += 1;
                    }
                }
                let touch_score = (touches as f64 / 6.0).min(1.0);

                let (volume_decline, volume_confirmation) =
                    Self::volume_decline(klines, span_start, span_end);
                let volume_score = (volume_decline / 0.3).clamp(0.0, 1.0);

                let confidence = 0.3 * convergence_score
                    + 0.25 * height_score
                    + 0.25 * touch_score
                    + 0.2 * volume_score;
                if confidence < triangle_type.min_confidence() {
                    self.note_rejection(stats, triangle_type, SkipReason::BelowConfidence, p1.index);
                    continue;
                }

                let end_x = span_end as f64;
                let upper_end = upper.value_at(end_x);
                let lower_end = lower.value_at(end_x);

                let (trend, breakout, target, stop) = match triangle_type {
                    ChartPatternType::AscendingTriangle => (
                        TrendDirection::Bullish,
                        upper_end,
                        upper_end + height,
                        lower_end,
                    ),
                    ChartPatternType::DescendingTriangle => (
                        TrendDirection::Bearish,
                        lower_end,
                        lower_end - height,
                        upper_end,
                    ),
                    _ => {
                        // 대칭 삼각형은 직전 추세 방향으로 돌파한다고 본다
                        let lookback = span_start.saturating_sub(self.params.min_pattern_size);
                        let rising = dec_to_f64(klines[span_start].close)
                            >= dec_to_f64(klines[lookback].close);
                        if rising {
                            (
                                TrendDirection::Bullish,
                                upper_end,
                                upper_end + height,
                                lower_end,
                            )
                        } else {
                            (
                                TrendDirection::Bearish,
                                lower_end,
                                lower_end - height,
                                upper_end,
                            )
                        }
                    }
                };

                let mut key_points = vec![
                    PatternPoint::from(p1),
                    PatternPoint::from(t1),
                    PatternPoint::from(p2),
                    PatternPoint::from(t2),
                ];
                key_points.sort_by_key(|p| p.index);

                patterns.push(ChartPattern {
                    pattern_type: triangle_type,
                    trend,
                    confidence,
                    key_points,
                    breakout_level: f64_to_dec(breakout),
                    target_price: f64_to_dec(target),
                    stop_loss: f64_to_dec(stop),
                    support_resistance: vec![f64_to_dec(lower_end), f64_to_dec(upper_end)],
                    volume_confirmation,
                    confirmation: None,
                    start_index: span_start,
                    end_index: span_end,
                    start_time: klines[span_start].open_time,
                    end_time: klines[span_end].open_time,
                });
            }
        }

        patterns
    }

    /// 깃발/페넌트 패턴을 탐지합니다.
    ///
    /// 급격한 기둥(pole) 이후의 조정 구간에 고가/저가 채널을 적합합니다.
    /// 채널이 평행하면 깃발, 수렴하면 페넌트입니다.
    pub(super) fn detect_flags_pennants(
        &self,
        klines: &[Kline],
        stats: &mut ScanStats,
    ) -> Vec<ChartPattern> {
        let n = klines.len();
        let lookback = self.params.pole_lookback;
        let mut patterns = Vec::new();
        if n < lookback + self.params.min_consolidation + 1 {
            return patterns;
        }

        let closes: Vec<f64> = klines.iter().map(|k| dec_to_f64(k.close)).collect();
        let highs: Vec<f64> = klines.iter().map(|k| dec_to_f64(k.high)).collect();
        let lows: Vec<f64> = klines.iter().map(|k| dec_to_f64(k.low)).collect();
        let flat_threshold = self.params.tolerance / 10.0;

        let mut i = lookback;
        while i + self.params.min_consolidation < n {
            let base = closes[i - lookback];
            if base <= 0.0 {
                i += 1;
                continue;
            }
            let move_pct = (closes[i] - base) / base;
            if move_pct.abs() < self.params.min_pole_move {
                i += 1;
                continue;
            }
            stats.windows_examined += 1;

            let consolidation_len = (n - 1 - i).min(20);
            let consolidation_end = i + consolidation_len;
            let high_points: Vec<(usize, f64)> =
                (i..=consolidation_end).map(|j| (j, highs[j])).collect();
            let low_points: Vec<(usize, f64)> =
                (i..=consolidation_end).map(|j| (j, lows[j])).collect();
            let upper = TrendLine::fit(&high_points);
            let lower = TrendLine::fit(&low_points);

            let upper_slope = upper.slope / closes[i];
            let lower_slope = lower.slope / closes[i];
            let bullish = move_pct > 0.0;

            let converging = upper_slope < -flat_threshold && lower_slope > flat_threshold;
            let parallel = (upper_slope - lower_slope).abs() <= flat_threshold;
            let counter_trend = if bullish {
                upper_slope <= flat_threshold
            } else {
                upper_slope >= -flat_threshold
            };

            let pattern_type = if converging {
                if bullish {
                    ChartPatternType::BullishPennant
                } else {
                    ChartPatternType::BearishPennant
                }
            } else if parallel && counter_trend {
                if bullish {
                    ChartPatternType::BullishFlag
                } else {
                    ChartPatternType::BearishFlag
                }
            } else {
                self.note_rejection(
                    stats,
                    if bullish {
                        ChartPatternType::BullishFlag
                    } else {
                        ChartPatternType::BearishFlag
                    },
                    SkipReason::GeometryViolation,
                    i,
                );
                i += 1;
                continue;
            };

            // 채널 품질: 바가 채널 선에서 벗어난 평균 잔차
            let mut residual_sum = 0.0;
            for j in i..=consolidation_end {
                residual_sum += (highs[j] - upper.value_at(j as f64)).abs();
                residual_sum += (lows[j] - lower.value_at(j as f64)).abs();
            }
            let mean_residual = residual_sum / (2.0 * (consolidation_len + 1) as f64);
            let quality_score =
                (1.0 - (mean_residual / closes[i]) / self.params.tolerance).clamp(0.0, 1.0);

            let pole_score =
                (move_pct.abs() / (2.0 * self.params.min_pole_move)).clamp(0.0, 1.0);
            let duration_score = (consolidation_len as f64 / 10.0).clamp(0.0, 1.0);

            let pole_volume = Self::average_volume(klines, i - lookback, i);
            let consolidation_volume = Self::average_volume(klines, i, consolidation_end);
            let volume_decline = if pole_volume > 0.0 {
                ((pole_volume - consolidation_volume) / pole_volume).max(0.0)
            } else {
                0.0
            };
            let volume_score = (volume_decline / 0.3).clamp(0.0, 1.0);

            let confidence = 0.3 * pole_score
                + 0.25 * quality_score
                + 0.25 * duration_score
                + 0.2 * volume_score;
            if confidence < pattern_type.min_confidence() {
                self.note_rejection(stats, pattern_type, SkipReason::BelowConfidence, i);
                i += 1;
                continue;
            }

            let end_x = consolidation_end as f64;
            let upper_end = upper.value_at(end_x);
            let lower_end = lower.value_at(end_x);
            let pole_height = (closes[i] - base).abs();
            let (trend, breakout, target, stop) = if bullish {
                (
                    TrendDirection::Bullish,
                    upper_end,
                    upper_end + pole_height,
                    lower_end,
                )
            } else {
                (
                    TrendDirection::Bearish,
                    lower_end,
                    lower_end - pole_height,
                    upper_end,
                )
            };

            let point = |index: usize| PatternPoint {
                index,
                timestamp: klines[index].open_time,
                price: klines[index].close,
            };

            patterns.push(ChartPattern {
                pattern_type,
                trend,
                confidence,
                key_points: vec![point(i - lookback), point(i), point(consolidation_end)],
                breakout_level: f64_to_dec(breakout),
                target_price: f64_to_dec(target),
                stop_loss: f64_to_dec(stop),
                support_resistance: vec![f64_to_dec(lower_end), f64_to_dec(upper_end)],
                volume_confirmation: volume_decline > 0.0,
                confirmation: None,
                start_index: i - lookback,
                end_index: consolidation_end,
                start_time: klines[i - lookback].open_time,
                end_time: klines[consolidation_end].open_time,
            });

            // 같은 조정 구간을 중복 보고하지 않는다
            i += consolidation_len.max(1);
        }

        patterns
    }

    /// 구간 전·후반의 평균 거래량 감소율을 반환합니다.
    fn volume_decline(klines: &[Kline], lo: usize, hi: usize) -> (f64, bool) {
        if hi <= lo + 1 {
            return (0.0, false);
        }
        let mid = lo + (hi - lo) / 2;
        let first_half = Self::average_volume(klines, lo, mid);
        let second_half = Self::average_volume(klines, mid + 1, hi);
        if first_half <= 0.0 {
            return (0.0, false);
        }
        let decline = ((first_half - second_half) / first_half).max(0.0);
        (decline, decline > 0.0)
    }
}

//! 하모닉 패턴(harmonic pattern) 매칭.
//!
//! X-A-B-C-D 다섯 스윙의 다리(leg) 길이 비율을 피보나치 목표값과
//! 비교하여 Gartley, Butterfly, Bat, Crab, Shark, Cypher 패턴을
//! 탐지합니다. 비율 3개 중 2개 이상이 허용 오차(25%) 안에 들어야
//! 후보가 되고, 허용 오차 내 비율의 평균 근접도에 전체 편차 패널티를
//! 곱해 신뢰도를 산출합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use chrono::{DateTime, Duration, Utc};
use pattern_core::{Kline, TrendDirection};

use crate::scan::{ScanStats, SkipReason};
use crate::swing::{PatternPoint, Swing, SwingDetector, SwingParams};
use crate::{dec_to_f64, f64_to_dec};

/// 하모닉 패턴 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarmonicPatternType {
    Gartley,
    Butterfly,
    Bat,
    Crab,
    Shark,
    Cypher,
}

impl HarmonicPatternType {
    /// 전체 패턴 종류.
    pub const ALL: [HarmonicPatternType; 6] = [
        HarmonicPatternType::Gartley,
        HarmonicPatternType::Butterfly,
        HarmonicPatternType::Bat,
        HarmonicPatternType::Crab,
        HarmonicPatternType::Shark,
        HarmonicPatternType::Cypher,
    ];

    /// 다리 비율 목표값 `(XA/AB, BC/AB, CD/BC)`.
    ///
    /// XA/AB는 B의 되돌림 깊이의 역수로 표현됩니다. 예를 들어 Gartley의
    /// B = 0.618 XA 되돌림은 XA/AB = 1.618에 해당합니다. Shark는 C가
    /// A를 넘는 확장 다리를 가지므로 BC/AB 목표가 큽니다.
    pub fn ratio_targets(&self) -> (f64, f64, f64) {
        match self {
            HarmonicPatternType::Gartley => (1.618, 0.618, 1.272),
            HarmonicPatternType::Butterfly => (1.272, 0.618, 1.618),
            HarmonicPatternType::Bat => (2.0, 0.618, 2.0),
            HarmonicPatternType::Crab => (1.618, 0.618, 2.618),
            HarmonicPatternType::Shark => (2.618, 2.618, 0.886),
            HarmonicPatternType::Cypher => (2.0, 1.414, 0.786),
        }
    }

    /// 패턴별 최소 신뢰도.
    ///
    /// Crab과 Shark는 다리 폭이 넓어 거짓 양성이 잦으므로 기준이 높습니다.
    pub fn min_confidence(&self) -> f64 {
        match self {
            HarmonicPatternType::Gartley | HarmonicPatternType::Bat => 0.25,
            HarmonicPatternType::Butterfly | HarmonicPatternType::Cypher => 0.30,
            HarmonicPatternType::Crab | HarmonicPatternType::Shark => 0.35,
        }
    }

    /// 표기 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            HarmonicPatternType::Gartley => "Gartley",
            HarmonicPatternType::Butterfly => "Butterfly",
            HarmonicPatternType::Bat => "Bat",
            HarmonicPatternType::Crab => "Crab",
            HarmonicPatternType::Shark => "Shark",
            HarmonicPatternType::Cypher => "Cypher",
        }
    }
}

impl std::fmt::Display for HarmonicPatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 패턴을 구성하는 X, A, B, C, D 다섯 지점.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XabcdPoints {
    pub x: PatternPoint,
    pub a: PatternPoint,
    pub b: PatternPoint,
    pub c: PatternPoint,
    pub d: PatternPoint,
}

/// 다리 길이와 비율.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HarmonicRatios {
    /// |A - X|
    pub xa: f64,
    /// |B - A|
    pub ab: f64,
    /// |C - B|
    pub bc: f64,
    /// |D - C|
    pub cd: f64,
    /// XA / AB (분모 0이면 0.0)
    pub xa_ab: f64,
    /// BC / AB (분모 0이면 0.0)
    pub bc_ab: f64,
    /// CD / BC (분모 0이면 0.0)
    pub cd_bc: f64,
}

impl HarmonicRatios {
    /// 다섯 지점에서 다리 길이와 비율을 계산합니다.
    pub fn from_points(points: &XabcdPoints) -> Self {
        let x = dec_to_f64(points.x.price);
        let a = dec_to_f64(points.a.price);
        let b = dec_to_f64(points.b.price);
        let c = dec_to_f64(points.c.price);
        let d = dec_to_f64(points.d.price);

        let xa = (a - x).abs();
        let ab = (b - a).abs();
        let bc = (c - b).abs();
        let cd = (d - c).abs();

        Self {
            xa,
            ab,
            bc,
            cd,
            xa_ab: safe_ratio(xa, ab),
            bc_ab: safe_ratio(bc, ab),
            cd_bc: safe_ratio(cd, bc),
        }
    }
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// 탐지된 하모닉 패턴.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarmonicPattern {
    /// 패턴 종류
    pub pattern_type: HarmonicPatternType,
    /// X-A-B-C-D 지점
    pub points: XabcdPoints,
    /// 다리 길이와 비율
    pub ratios: HarmonicRatios,
    /// 추세 방향 (A > X이면 상승)
    pub trend: TrendDirection,
    /// 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
    /// 잠재적 반전 구간 (D 가격 ± 허용 오차)
    pub reversal_zone: (Decimal, Decimal),
    /// 패턴 시작 시간 (X)
    pub start_time: DateTime<Utc>,
    /// 패턴 종료 시간 (D)
    pub end_time: DateTime<Utc>,
}

/// 하모닉 매칭 파라미터.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarmonicParams {
    /// 스윙으로 인정할 최소 가격 변동 비율 (0.005 = 0.5%)
    pub min_swing: f64,
    /// 비율 허용 오차 (0.25 = 목표값의 ±25%)
    pub tolerance: f64,
    /// 인접 스윙 간 최소 시간 간격 (분)
    pub min_gap_minutes: i64,
    /// 원본 극값 추출의 최소 바 간격
    pub min_distance: usize,
}

impl Default for HarmonicParams {
    fn default() -> Self {
        Self {
            min_swing: 0.005,
            tolerance: 0.25,
            min_gap_minutes: 60,
            min_distance: 5,
        }
    }
}

/// 하모닉 패턴 매처.
#[derive(Debug, Clone)]
pub struct HarmonicMatcher {
    params: HarmonicParams,
}

impl HarmonicMatcher {
    pub fn new(params: HarmonicParams) -> Self {
        Self { params }
    }

    pub fn with_defaults() -> Self {
        Self::new(HarmonicParams::default())
    }

    /// 시계열을 스캔하여 하모닉 패턴과 스캔 통계를 반환합니다.
    pub fn scan(&self, klines: &[Kline]) -> (Vec<HarmonicPattern>, ScanStats) {
        let detector = SwingDetector::new(SwingParams {
            min_distance: self.params.min_distance,
            ..Default::default()
        });
        let swings = detector.raw_extrema(klines);
        let significant = self.filter_significant(&swings);

        let mut patterns = Vec::new();
        let mut stats = ScanStats::default();

        for window in significant.windows(5) {
            stats.windows_examined += 1;
            // 같은 바에서 고점과 저점이 동시에 나오면(장악형 바 등) 창의
            // 시간이 단조 증가하지 않으므로 창 전체를 거른다
            if !Self::window_is_ordered(window) {
                stats.candidates_rejected += 1;
                tracing::debug!(
                    reason = SkipReason::GeometryViolation.as_str(),
                    x_index = window[0].index,
                    "하모닉 창 탈락"
                );
                continue;
            }
            let points = XabcdPoints {
                x: PatternPoint::from(&window[0]),
                a: PatternPoint::from(&window[1]),
                b: PatternPoint::from(&window[2]),
                c: PatternPoint::from(&window[3]),
                d: PatternPoint::from(&window[4]),
            };
            let ratios = HarmonicRatios::from_points(&points);

            for pattern_type in HarmonicPatternType::ALL {
                match self.try_match(pattern_type, &points, &ratios) {
                    Ok(pattern) => patterns.push(pattern),
                    Err(reason) => {
                        stats.candidates_rejected += 1;
                        tracing::debug!(
                            pattern = %pattern_type,
                            reason = reason.as_str(),
                            x_index = points.x.index,
                            "하모닉 후보 탈락"
                        );
                    }
                }
            }
        }

        (patterns, stats)
    }

    /// 스캔하여 패턴만 반환합니다.
    pub fn detect(&self, klines: &[Kline]) -> Vec<HarmonicPattern> {
        self.scan(klines).0
    }

    /// 창의 타임스탬프가 엄격하게 증가하는지 확인합니다.
    fn window_is_ordered(window: &[Swing]) -> bool {
        window
            .windows(2)
            .all(|pair| pair[1].timestamp > pair[0].timestamp)
    }

    /// 최소 변동률과 최소 시간 간격을 만족하는 스윙만 남깁니다.
    fn filter_significant(&self, swings: &[Swing]) -> Vec<Swing> {
        let min_gap = Duration::minutes(self.params.min_gap_minutes);
        let mut filtered: Vec<Swing> = Vec::with_capacity(swings.len());

        for swing in swings {
            match filtered.last() {
                None => filtered.push(swing.clone()),
                Some(last) => {
                    let last_price = dec_to_f64(last.price);
                    if last_price == 0.0 {
                        continue;
                    }
                    let move_pct =
                        (dec_to_f64(swing.price) - last_price).abs() / last_price;
                    let gap = swing.timestamp - last.timestamp;
                    if move_pct >= self.params.min_swing && gap >= min_gap {
                        filtered.push(swing.clone());
                    }
                }
            }
        }

        filtered
    }

    /// 한 후보 창을 한 패턴 템플릿과 대조합니다.
    fn try_match(
        &self,
        pattern_type: HarmonicPatternType,
        points: &XabcdPoints,
        ratios: &HarmonicRatios,
    ) -> Result<HarmonicPattern, SkipReason> {
        // 구조적 거부 규칙은 비율 적합도와 무관하게 적용된다
        match pattern_type {
            HarmonicPatternType::Shark => {
                if points.c.price <= points.a.price {
                    return Err(SkipReason::StructuralVeto);
                }
            }
            HarmonicPatternType::Cypher => {
                let (low, high) = if points.x.price <= points.a.price {
                    (points.x.price, points.a.price)
                } else {
                    (points.a.price, points.x.price)
                };
                if points.c.price < low || points.c.price > high {
                    return Err(SkipReason::StructuralVeto);
                }
            }
            _ => {}
        }

        let confidence = self.score(pattern_type, ratios)?;

        let trend = if points.a.price > points.x.price {
            TrendDirection::Bullish
        } else {
            TrendDirection::Bearish
        };

        let d_price = dec_to_f64(points.d.price);
        let reversal_zone = (
            f64_to_dec(d_price * (1.0 - self.params.tolerance)),
            f64_to_dec(d_price * (1.0 + self.params.tolerance)),
        );

        Ok(HarmonicPattern {
            pattern_type,
            points: points.clone(),
            ratios: *ratios,
            trend,
            confidence,
            reversal_zone,
            start_time: points.x.timestamp,
            end_time: points.d.timestamp,
        })
    }

    /// 비율 적합도로 신뢰도를 산출합니다.
    ///
    /// 비율 3개 중 2개 이상이 목표값의 ±tolerance 안에 있어야 하고,
    /// 허용 오차 내 비율의 평균 근접도에 전체 편차 패널티
    /// `1 - min(총편차/3, 0.5)`를 곱합니다.
    fn score(
        &self,
        pattern_type: HarmonicPatternType,
        ratios: &HarmonicRatios,
    ) -> Result<f64, SkipReason> {
        let (t1, t2, t3) = pattern_type.ratio_targets();
        let pairs = [
            (ratios.xa_ab, t1),
            (ratios.bc_ab, t2),
            (ratios.cd_bc, t3),
        ];

        let tolerance = self.params.tolerance;
        let mut within = 0usize;
        let mut closeness_sum = 0.0;
        let mut total_deviation = 0.0;

        for (ratio, target) in pairs {
            let deviation = (ratio - target).abs() / target;
            total_deviation += deviation;
            if deviation <= tolerance {
                within += 1;
                closeness_sum += 1.0 - deviation / tolerance;
            }
        }

        if within < 2 {
            return Err(SkipReason::RatioOutOfTolerance);
        }

        let penalty = 1.0 - (total_deviation / 3.0).min(0.5);
        let confidence = (closeness_sum / within as f64 * penalty).clamp(0.0, 1.0);

        if confidence < pattern_type.min_confidence() {
            return Err(SkipReason::BelowConfidence);
        }

        Ok(confidence)
    }
}

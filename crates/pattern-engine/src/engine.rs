//! 패턴 엔진 오케스트레이션.
//!
//! 입력 검증 → 하모닉/고전 매칭 → 기술적 확인 → 신뢰도 순위화를 한 번의
//! 호출로 수행합니다. 엔진은 상태를 갖지 않으며 인스턴스 ID 카운터만
//! 공유합니다. 카운터를 `Arc`로 주입하면 여러 심볼을 병렬로 스캔해도
//! ID가 전역적으로 유일합니다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pattern_core::{validate_series, Kline, PatternResult};

use crate::classic::{ChartPattern, ClassicMatcher, ClassicParams};
use crate::confirm::{ConfirmationParams, TechnicalConfirmer};
use crate::harmonic::{HarmonicMatcher, HarmonicParams, HarmonicPattern};
use crate::scan::ScanStats;

/// 엔진 설정.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 하모닉 매칭 파라미터
    pub harmonic: HarmonicParams,
    /// 고전 패턴 매칭 파라미터
    pub classic: ClassicParams,
    /// 기술적 확인 파라미터
    pub confirmation: ConfirmationParams,
}

/// 탐지된 패턴의 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum PatternKind {
    /// 하모닉 패턴
    Harmonic(HarmonicPattern),
    /// 고전 차트 패턴
    Chart(ChartPattern),
}

/// 인스턴스 ID가 부여된 탐지 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPattern {
    /// 엔진 수명 동안 유일한 인스턴스 ID (1부터 시작)
    pub instance_id: u64,
    /// 패턴 본문
    pub pattern: PatternKind,
}

impl DetectedPattern {
    /// 0~1로 정규화된 신뢰도를 반환합니다.
    ///
    /// 하모닉과 대부분의 고전 패턴은 이미 0~1 스케일이고, 헤드앤숄더
    /// 계열만 0~100 스케일을 100으로 나눕니다.
    pub fn normalized_confidence(&self) -> f64 {
        normalized_confidence(&self.pattern)
    }

    /// 패턴 이름을 반환합니다.
    pub fn label(&self) -> &'static str {
        match &self.pattern {
            PatternKind::Harmonic(p) => p.pattern_type.as_str(),
            PatternKind::Chart(p) => p.pattern_type.as_str(),
        }
    }

    /// 패턴 시작 시간을 반환합니다.
    pub fn start_time(&self) -> DateTime<Utc> {
        match &self.pattern {
            PatternKind::Harmonic(p) => p.start_time,
            PatternKind::Chart(p) => p.start_time,
        }
    }

    /// 패턴 종료 시간을 반환합니다.
    pub fn end_time(&self) -> DateTime<Utc> {
        match &self.pattern {
            PatternKind::Harmonic(p) => p.end_time,
            PatternKind::Chart(p) => p.end_time,
        }
    }
}

fn normalized_confidence(pattern: &PatternKind) -> f64 {
    match pattern {
        PatternKind::Harmonic(p) => p.confidence,
        PatternKind::Chart(p) => p.normalized_confidence(),
    }
}

/// 한 번의 탐지 호출 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    /// 정규화 신뢰도 내림차순으로 정렬된 패턴들
    pub patterns: Vec<DetectedPattern>,
    /// 스캔 통계
    pub stats: ScanStats,
}

/// 패턴 탐지 엔진.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    config: EngineConfig,
    counter: Arc<AtomicU64>,
}

impl PatternEngine {
    /// 자체 카운터를 갖는 엔진을 생성합니다.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 기본 설정으로 엔진을 생성합니다.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// 공유 카운터로 엔진을 생성합니다.
    ///
    /// 여러 엔진이 같은 카운터를 공유하면 병렬 스캔에서도 인스턴스 ID가
    /// 전역적으로 유일합니다.
    pub fn with_counter(config: EngineConfig, counter: Arc<AtomicU64>) -> Self {
        Self { config, counter }
    }

    /// 지금까지 발급된 인스턴스 수를 반환합니다.
    pub fn instance_count(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// 시계열을 스캔하여 순위화된 탐지 결과를 반환합니다.
    ///
    /// 입력이 시간순이 아니면 `PatternError::InvalidInput`을 반환하고,
    /// 그 외의 후보별 실패는 에러가 아니라 통계로 집계됩니다.
    pub fn detect(&self, klines: &[Kline]) -> PatternResult<DetectionReport> {
        validate_series(klines)?;

        let harmonic = HarmonicMatcher::new(self.config.harmonic.clone());
        let classic = ClassicMatcher::new(self.config.classic.clone());
        let confirmer = TechnicalConfirmer::new(self.config.confirmation.clone());

        let (harmonics, harmonic_stats) = harmonic.scan(klines);
        let (mut charts, classic_stats) = classic.scan(klines);

        // 확인 단계는 필터가 아니므로 실패(None)해도 패턴은 유지된다
        for chart in &mut charts {
            chart.confirmation = confirmer.evaluate(klines, chart.end_index, chart.trend);
        }

        let mut stats = harmonic_stats;
        stats.merge(&classic_stats);

        let mut kinds: Vec<PatternKind> = Vec::with_capacity(harmonics.len() + charts.len());
        kinds.extend(harmonics.into_iter().map(PatternKind::Harmonic));
        kinds.extend(charts.into_iter().map(PatternKind::Chart));

        // 안정 정렬이므로 동률은 탐지 순서를 유지하고 결과는 결정적이다
        kinds.sort_by(|a, b| {
            normalized_confidence(b)
                .partial_cmp(&normalized_confidence(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let patterns: Vec<DetectedPattern> = kinds
            .into_iter()
            .map(|pattern| DetectedPattern {
                instance_id: self.counter.fetch_add(1, Ordering::Relaxed) + 1,
                pattern,
            })
            .collect();

        tracing::info!(
            bars = klines.len(),
            patterns = patterns.len(),
            windows = stats.windows_examined,
            rejected = stats.candidates_rejected,
            "패턴 스캔 완료"
        );

        Ok(DetectionReport { patterns, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pattern_core::{PatternError, Timeframe};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn create_kline(index: i64, close: f64) -> Kline {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let close = Decimal::try_from(close).unwrap();
        Kline::new(
            "BTC/USDT",
            Timeframe::H1,
            base + chrono::Duration::hours(index),
            close,
            close + dec!(0.5),
            close - dec!(0.5),
            close,
            dec!(1000),
        )
    }

    /// 상승 추세 위의 사인파: 하모닉 스캔이 후보를 내는 합성 시계열.
    fn sine_on_uptrend(len: usize) -> Vec<Kline> {
        (0..len)
            .map(|i| {
                let close = 100.0
                    + 0.5 * i as f64
                    + 10.0 * (2.0 * std::f64::consts::PI * i as f64 / 40.0).sin();
                create_kline(i as i64, close)
            })
            .collect()
    }

    #[test]
    fn test_unordered_input_is_fatal_error() {
        let engine = PatternEngine::with_defaults();
        let mut klines: Vec<Kline> = (0..30).map(|i| create_kline(i, 100.0)).collect();
        klines.swap(10, 11);

        let error = engine.detect(&klines).unwrap_err();
        assert!(matches!(error, PatternError::InvalidInput(_)));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_flat_series_yields_empty_report() {
        let engine = PatternEngine::with_defaults();
        let klines: Vec<Kline> = (0..100).map(|i| create_kline(i, 100.0)).collect();

        let report = engine.detect(&klines).unwrap();
        assert!(report.patterns.is_empty());
    }

    #[test]
    fn test_empty_series_is_ok() {
        let engine = PatternEngine::with_defaults();
        let report = engine.detect(&[]).unwrap();
        assert!(report.patterns.is_empty());
        assert_eq!(report.stats.windows_examined, 0);
    }

    #[test]
    fn test_patterns_sorted_by_normalized_confidence() {
        let engine = PatternEngine::with_defaults();
        let report = engine.detect(&sine_on_uptrend(200)).unwrap();

        assert!(!report.patterns.is_empty());
        for pair in report.patterns.windows(2) {
            assert!(
                pair[0].normalized_confidence() >= pair[1].normalized_confidence() - 1e-12
            );
        }
    }

    #[test]
    fn test_detection_is_deterministic() {
        let engine = PatternEngine::with_defaults();
        let klines = sine_on_uptrend(200);

        let first = engine.detect(&klines).unwrap();
        let second = engine.detect(&klines).unwrap();

        let summary = |report: &DetectionReport| -> Vec<(String, u64)> {
            report
                .patterns
                .iter()
                .map(|p| {
                    (
                        p.label().to_string(),
                        (p.normalized_confidence() * 1e9) as u64,
                    )
                })
                .collect()
        };
        assert_eq!(summary(&first), summary(&second));
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_instance_ids_unique_and_monotonic() {
        let engine = PatternEngine::with_defaults();
        let klines = sine_on_uptrend(200);

        let first = engine.detect(&klines).unwrap();
        let second = engine.detect(&klines).unwrap();

        let mut ids: Vec<u64> = first
            .patterns
            .iter()
            .chain(second.patterns.iter())
            .map(|p| p.instance_id)
            .collect();
        let count = ids.len() as u64;
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len() as u64, count);
        assert_eq!(engine.instance_count(), count);
    }

    #[test]
    fn test_shared_counter_across_engines() {
        let counter = Arc::new(AtomicU64::new(0));
        let engine_a = PatternEngine::with_counter(EngineConfig::default(), counter.clone());
        let engine_b = PatternEngine::with_counter(EngineConfig::default(), counter.clone());
        let klines = sine_on_uptrend(200);

        let report_a = engine_a.detect(&klines).unwrap();
        let report_b = engine_b.detect(&klines).unwrap();

        let mut ids: Vec<u64> = report_a
            .patterns
            .iter()
            .chain(report_b.patterns.iter())
            .map(|p| p.instance_id)
            .collect();
        let count = ids.len() as u64;
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len() as u64, count);
        assert_eq!(counter.load(Ordering::Relaxed), count);
    }

    #[test]
    fn test_normalized_confidence_bounded() {
        let engine = PatternEngine::with_defaults();
        let report = engine.detect(&sine_on_uptrend(200)).unwrap();

        for pattern in &report.patterns {
            let confidence = pattern.normalized_confidence();
            assert!((0.0..=1.0).contains(&confidence));
        }
    }
}

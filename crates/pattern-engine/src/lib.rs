//! 기하학적 차트 패턴 인식 엔진.
//!
//! OHLCV 시계열에서 스윙 포인트를 추출하고, 고전적 차트 패턴
//! (헤드앤숄더, 이중/삼중 천정·바닥, 삼각형, 깃발/페넌트)과
//! 하모닉 패턴(Gartley, Butterfly, Bat, Crab, Shark, Cypher)을
//! 탐지하여 신뢰도 점수와 함께 반환합니다.
//!
//! # 파이프라인
//!
//! ```text
//! Kline 시계열
//!   → 스윙 추출 (swing)
//!   → 추세선 적합 (trendline)
//!   → 하모닉 매칭 (harmonic) / 고전 패턴 매칭 (classic)
//!   → 기술적 확인 (confirm)
//!   → 순위화된 DetectionReport (engine)
//! ```
//!
//! # 사용 예
//!
//! ```no_run
//! use pattern_engine::{EngineConfig, PatternEngine};
//!
//! let engine = PatternEngine::new(EngineConfig::default());
//! let klines = vec![]; // 수집 계층에서 로드
//! let report = engine.detect(&klines).unwrap();
//! for detected in &report.patterns {
//!     println!("{}: {:.2}", detected.label(), detected.normalized_confidence());
//! }
//! ```

pub mod classic;
pub mod confirm;
pub mod engine;
pub mod harmonic;
pub mod indicators;
pub mod scan;
pub mod swing;
pub mod trendline;

pub use classic::{ChartPattern, ChartPatternType, ClassicMatcher, ClassicParams};
pub use confirm::{ConfirmationParams, TechnicalConfirmation, TechnicalConfirmer};
pub use engine::{DetectedPattern, DetectionReport, EngineConfig, PatternEngine, PatternKind};
pub use harmonic::{
    HarmonicMatcher, HarmonicParams, HarmonicPattern, HarmonicPatternType, HarmonicRatios,
    XabcdPoints,
};
pub use scan::ScanStats;
pub use swing::{PatternPoint, Swing, SwingDetector, SwingKind, SwingParams};
pub use trendline::TrendLine;

use rust_decimal::Decimal;

/// Decimal 가격을 기하 연산용 f64로 변환합니다.
///
/// 패턴 기하와 점수 계산은 f64로 수행하고, 가격 수준을 외부에 돌려줄
/// 때만 Decimal로 복원합니다.
pub(crate) fn dec_to_f64(value: Decimal) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

/// f64 가격 수준을 Decimal로 복원합니다.
pub(crate) fn f64_to_dec(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

//! # Pattern Core
//!
//! 차트 패턴 인식 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 패턴 엔진 전반에서 사용되는 기본 타입을 제공합니다:
//! - OHLCV 캔들 데이터 구조체 (`Kline`)
//! - 타임프레임 정의 (`Timeframe`)
//! - 추세 방향 (`TrendDirection`)
//! - 에러 타입 (`PatternError`)
//! - 로깅 인프라

pub mod error;
pub mod logging;
pub mod market_data;
pub mod timeframe;

pub use error::{PatternError, PatternResult};
pub use logging::{init_logging, init_logging_from_env, LogConfig, LogFormat};
pub use market_data::{validate_series, Kline, TrendDirection};
pub use timeframe::Timeframe;

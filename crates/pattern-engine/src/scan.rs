//! 스캔 통계 및 후보 탈락 사유.
//!
//! 후보 패턴이 조건을 만족하지 못하면 조용히 버리는 대신 사유를 분류해
//! debug 로그로 남기고 통계에 집계합니다. 엔진 호출 결과의
//! `DetectionReport.stats`로 노출되어 테스트에서 검증할 수 있습니다.

use serde::{Deserialize, Serialize};

/// 한 번의 스캔에서 집계된 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// 검토한 후보 창(window)의 수
    pub windows_examined: u64,
    /// 임계값/구조 검사에서 탈락한 후보의 수
    pub candidates_rejected: u64,
}

impl ScanStats {
    /// 다른 스캔의 통계를 합산합니다.
    pub fn merge(&mut self, other: &ScanStats) {
        self.windows_examined += other.windows_examined;
        self.candidates_rejected += other.candidates_rejected;
    }
}

/// 후보 탈락 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipReason {
    /// 허용 오차 내 비율이 2개 미만
    RatioOutOfTolerance,
    /// 신뢰도가 패턴별 최소 기준 미달
    BelowConfidence,
    /// 구조적 거부 규칙 위반 (Shark의 C>A, Cypher의 C 위치 등)
    StructuralVeto,
    /// 기하 조건 위반 (대칭/깊이/간격 등)
    GeometryViolation,
    /// 추세선이 수렴하지 않거나 꼭짓점이 허용 구간 밖
    NoConvergence,
}

impl SkipReason {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            SkipReason::RatioOutOfTolerance => "ratio_out_of_tolerance",
            SkipReason::BelowConfidence => "below_confidence",
            SkipReason::StructuralVeto => "structural_veto",
            SkipReason::GeometryViolation => "geometry_violation",
            SkipReason::NoConvergence => "no_convergence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_accumulates() {
        let mut total = ScanStats {
            windows_examined: 10,
            candidates_rejected: 4,
        };
        total.merge(&ScanStats {
            windows_examined: 5,
            candidates_rejected: 2,
        });

        assert_eq!(total.windows_examined, 15);
        assert_eq!(total.candidates_rejected, 6);
    }

    #[test]
    fn test_skip_reason_labels() {
        assert_eq!(SkipReason::StructuralVeto.as_str(), "structural_veto");
        assert_eq!(SkipReason::NoConvergence.as_str(), "no_convergence");
    }
}

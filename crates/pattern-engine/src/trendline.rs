//! 추세선(trendline) 적합.
//!
//! 스윙 포인트들의 (바 인덱스, 가격) 집합에 최소제곱 직선을 적합합니다.
//! x축은 바 인덱스이므로 기울기 단위는 "가격/바"입니다.

use serde::{Deserialize, Serialize};

/// 최소제곱으로 적합된 직선.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    /// 기울기 (가격/바)
    pub slope: f64,
    /// y절편
    pub intercept: f64,
}

impl TrendLine {
    /// (인덱스, 가격) 점들에 최소제곱 직선을 적합합니다.
    ///
    /// 점이 2개 미만이거나 x가 퇴화된 경우(모든 점이 같은 인덱스)에는
    /// 기울기 0, 절편 0의 퇴화선을 반환합니다. 퇴화선은 이후 임계값
    /// 검사에서 자연스럽게 탈락합니다.
    pub fn fit(points: &[(usize, f64)]) -> Self {
        let n = points.len();
        if n < 2 {
            return Self {
                slope: 0.0,
                intercept: 0.0,
            };
        }

        let n_f = n as f64;
        let sum_x: f64 = points.iter().map(|(x, _)| *x as f64).sum();
        let sum_y: f64 = points.iter().map(|(_, y)| *y).sum();
        let sum_xy: f64 = points.iter().map(|(x, y)| *x as f64 * *y).sum();
        let sum_x2: f64 = points.iter().map(|(x, _)| (*x as f64).powi(2)).sum();

        let denominator = n_f * sum_x2 - sum_x * sum_x;
        if denominator.abs() < f64::EPSILON {
            return Self {
                slope: 0.0,
                intercept: 0.0,
            };
        }

        let slope = (n_f * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n_f;

        Self { slope, intercept }
    }

    /// 주어진 바 인덱스에서의 직선 값을 반환합니다.
    pub fn value_at(&self, index: f64) -> f64 {
        self.slope * index + self.intercept
    }

    /// 다른 직선과의 교차 x좌표를 반환합니다.
    ///
    /// 기울기 차이가 1e-12 미만이면 평행으로 간주하고 `None`을 반환합니다.
    pub fn intersection_x(&self, other: &TrendLine) -> Option<f64> {
        let slope_diff = self.slope - other.slope;
        if slope_diff.abs() < 1e-12 {
            return None;
        }
        Some((other.intercept - self.intercept) / slope_diff)
    }

    /// 퇴화선(적합 불가) 여부를 반환합니다.
    pub fn is_degenerate(&self) -> bool {
        self.slope == 0.0 && self.intercept == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_exact_line() {
        // y = 2x + 1
        let points = [(0, 1.0), (1, 3.0), (2, 5.0), (3, 7.0)];
        let line = TrendLine::fit(&points);

        assert!((line.slope - 2.0).abs() < 1e-9);
        assert!((line.intercept - 1.0).abs() < 1e-9);
        assert!((line.value_at(10.0) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_under_two_points_is_degenerate() {
        assert!(TrendLine::fit(&[]).is_degenerate());
        assert!(TrendLine::fit(&[(5, 100.0)]).is_degenerate());
    }

    #[test]
    fn test_fit_noisy_points() {
        let points = [(0, 10.1), (1, 11.9), (2, 14.2), (3, 15.8)];
        let line = TrendLine::fit(&points);

        assert!(line.slope > 1.5 && line.slope < 2.5);
    }

    #[test]
    fn test_intersection() {
        let rising = TrendLine {
            slope: 1.0,
            intercept: 0.0,
        };
        let falling = TrendLine {
            slope: -1.0,
            intercept: 10.0,
        };

        let x = rising.intersection_x(&falling).unwrap();
        assert!((x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_lines_do_not_intersect() {
        let a = TrendLine {
            slope: 0.5,
            intercept: 0.0,
        };
        let b = TrendLine {
            slope: 0.5,
            intercept: 3.0,
        };

        assert!(a.intersection_x(&b).is_none());
    }
}

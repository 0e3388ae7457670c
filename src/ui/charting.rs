use crate::scores::ChartPoint;

/// X (test number) and Y (value) bounds for a history chart.
/// `y_floor` keeps the axis readable when every value is tiny.
pub fn compute_chart_params(points: &[ChartPoint], y_floor: f64) -> (f64, f64) {
    let highest = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);

    let last_test = points.last().map_or(1.0, |p| p.test as f64).max(1.0);

    (last_test, highest.max(y_floor).round())
}

pub fn chart_tuples(points: &[ChartPoint]) -> Vec<(f64, f64)> {
    points.iter().copied().map(Into::into).collect()
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(test: usize, value: f64) -> ChartPoint {
        ChartPoint { test, value }
    }

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[], 10.0);
        assert_eq!(x, 1.0);
        assert_eq!(y, 10.0);
    }

    #[test]
    fn test_compute_chart_params_uses_last_test_and_peak() {
        let points = [point(1, 40.0), point(2, 72.4), point(3, 55.0)];
        let (x, y) = compute_chart_params(&points, 10.0);
        assert_eq!(x, 3.0);
        assert_eq!(y, 72.0);
    }

    #[test]
    fn test_chart_tuples() {
        assert_eq!(chart_tuples(&[point(2, 9.0)]), vec![(2.0, 9.0)]);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}

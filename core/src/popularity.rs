/// Added to the min–max denominator so a constant corpus stays finite.
pub const EPSILON: f64 = 1e-9;

/// Raw blend of rating and log-compressed enrollment.
pub fn raw_popularity(rating: f64, students_enrolled: f64) -> f64 {
    0.7 * rating + 0.3 * students_enrolled.ln_1p()
}

/// Min–max normalize raw scores into [0, 1].
///
/// Works on halved values so `max - min` cannot overflow for ratings near `f64::MAX`.
pub fn normalize(raw: &[f64]) -> Vec<f64> {
    let raw: Vec<f64> = raw.iter().map(|p| if p.is_finite() { p / 2.0 } else { 0.0 }).collect();
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let denom = max - min + EPSILON / 2.0;
    raw.iter()
        .map(|p| {
            let v = (p - min) / denom;
            if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_unit_interval() {
        let pop = normalize(&[1.0, 3.0, 2.0]);
        assert_eq!(pop[0], 0.0);
        assert!((pop[1] - 1.0).abs() < 1e-6);
        assert!(pop[2] > 0.0 && pop[2] < 1.0);
    }

    #[test]
    fn constant_input_stays_finite() {
        let pop = normalize(&[2.5, 2.5, 2.5]);
        assert!(pop.iter().all(|p| p.is_finite() && *p == pop[0]));
    }

    #[test]
    fn extreme_values_stay_in_unit_interval() {
        let pop = normalize(&[0.7 * 1.7e308, -0.7 * 1.7e308, 2.8, f64::NAN]);
        assert!(pop.iter().all(|p| p.is_finite() && (0.0..=1.0).contains(p)));
        assert!((pop[0] - 1.0).abs() < 1e-9);
        assert_eq!(pop[1], 0.0);
        assert!((pop[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_input() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn enrollment_is_log_compressed() {
        let huge = raw_popularity(0.0, 1e9);
        assert!(huge < raw_popularity(5.0, 0.0) * 2.0);
    }
}

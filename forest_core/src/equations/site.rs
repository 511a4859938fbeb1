//! # Site Index Curves
//!
//! Dominant height and site index are linked through the growth curve
//!
//! ```text
//! f(age) = (1 - e^(-0.14·age))^(1/0.67)
//! ```
//!
//! anchored at a reference age of 10 years:
//!
//! ```text
//! Hd = SI · f(age) / f(10)
//! SI = Hd · f(10) / f(age)
//! ```
//!
//! The pair are exact inverses at any fixed age, and `Hd(SI, 10) = SI`.
//!
//! ## Domain
//!
//! `age > 0`. At age 0 the curve is 0 and the site-index inverse divides
//! by zero; negative ages produce NaN. The raw functions follow IEEE
//! arithmetic there. Use the `try_*` variants to get an
//! [`MetricsError::UndefinedDomain`] instead.

use once_cell::sync::Lazy;

use crate::errors::{MetricsError, MetricsResult};

/// Reference age for the site index (years)
pub const REFERENCE_AGE_YEARS: f64 = 10.0;

/// Growth-rate parameter of the site curve
pub const GROWTH_RATE: f64 = 0.14;

/// Shape parameter of the site curve (the curve is raised to 1/SHAPE)
pub const GROWTH_SHAPE: f64 = 0.67;

/// Growth curve value at the reference age, f(10).
static REFERENCE_GROWTH: Lazy<f64> = Lazy::new(|| growth_curve(REFERENCE_AGE_YEARS));

/// Growth curve f(age) = (1 - e^(-0.14·age))^(1/0.67).
pub fn growth_curve(age_years: f64) -> f64 {
    (1.0 - (-GROWTH_RATE * age_years).exp()).powf(1.0 / GROWTH_SHAPE)
}

/// Dominant height (m) reached at `age_years` on a site of the given index.
pub fn dominant_height_from_site_index(site_index_m: f64, age_years: f64) -> f64 {
    (site_index_m * growth_curve(age_years)) / *REFERENCE_GROWTH
}

/// Site index (m at age 10) of a stand with the given dominant height.
pub fn site_index_from_dominant_height(dominant_height_m: f64, age_years: f64) -> f64 {
    (dominant_height_m * *REFERENCE_GROWTH) / growth_curve(age_years)
}

fn check_age(function: &str, age_years: f64) -> MetricsResult<()> {
    if !age_years.is_finite() || age_years <= 0.0 {
        return Err(MetricsError::undefined_domain(
            function,
            "age_years",
            age_years.to_string(),
        ));
    }
    Ok(())
}

/// [`dominant_height_from_site_index`] with the age domain checked.
pub fn try_dominant_height_from_site_index(site_index_m: f64, age_years: f64) -> MetricsResult<f64> {
    check_age("dominant_height_from_site_index", age_years)?;
    Ok(dominant_height_from_site_index(site_index_m, age_years))
}

/// [`site_index_from_dominant_height`] with the age domain checked.
///
/// ```rust
/// use forest_core::equations::try_site_index_from_dominant_height;
///
/// assert!(try_site_index_from_dominant_height(18.0, 0.0).is_err());
/// let si = try_site_index_from_dominant_height(18.0, 10.0).unwrap();
/// assert!((si - 18.0).abs() < 1e-9);
/// ```
pub fn try_site_index_from_dominant_height(dominant_height_m: f64, age_years: f64) -> MetricsResult<f64> {
    check_age("site_index_from_dominant_height", age_years)?;
    Ok(site_index_from_dominant_height(dominant_height_m, age_years))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn test_identity_at_reference_age() {
        for si in [8.0, 15.5, 22.0, 31.0] {
            assert_abs_diff_eq!(dominant_height_from_site_index(si, REFERENCE_AGE_YEARS), si, epsilon = 1e-9);
            assert_abs_diff_eq!(site_index_from_dominant_height(si, REFERENCE_AGE_YEARS), si, epsilon = 1e-9);
        }
    }

    #[rstest]
    #[case(22.0, 3.0)]
    #[case(22.0, 7.5)]
    #[case(18.0, 15.0)]
    #[case(30.0, 25.0)]
    #[case(12.0, 0.5)]
    fn test_round_trip(#[case] si: f64, #[case] age: f64) {
        let hd = dominant_height_from_site_index(si, age);
        assert_abs_diff_eq!(site_index_from_dominant_height(hd, age), si, epsilon = 1e-6);
    }

    #[test]
    fn test_younger_stands_are_shorter() {
        let si = 20.0;
        assert!(dominant_height_from_site_index(si, 5.0) < si);
        assert!(dominant_height_from_site_index(si, 20.0) > si);
    }

    #[test]
    fn test_growth_curve_at_zero() {
        assert_eq!(growth_curve(0.0), 0.0);
    }

    #[test]
    fn test_checked_variants_reject_non_positive_age() {
        for age in [0.0, -1.0, f64::NAN] {
            let err = try_site_index_from_dominant_height(18.0, age).unwrap_err();
            assert_eq!(err.error_code(), "UNDEFINED_DOMAIN");
            assert!(try_dominant_height_from_site_index(18.0, age).is_err());
        }
    }

    #[test]
    fn test_checked_variants_match_raw() {
        let raw = dominant_height_from_site_index(20.0, 6.0);
        assert_eq!(try_dominant_height_from_site_index(20.0, 6.0).unwrap(), raw);
    }
}

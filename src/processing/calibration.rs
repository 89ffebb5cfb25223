//! Mass to time-of-flight conversion under the parabolic calibration model

use ndarray::{Array1, ArrayView1};

use crate::error::{MbtError, Result};

/// Default time resolution of the tof digitizer
pub const DEFAULT_TIME_RES: f64 = 500e-6;

/// Convert m/z values to time of flight values, `(gain * sqrt(mass) + offset) / time_res`
///
/// Negative (or NaN) masses are rejected, and so is a time resolution that is not a finite
/// positive number.
pub fn mass2tof(
    masses: ArrayView1<f64>,
    mass_offset: f64,
    mass_gain: f64,
    time_res: f64,
) -> Result<Array1<f64>> {
    if !(time_res.is_finite() && time_res > 0.0) {
        return Err(MbtError::InvalidTimeResolution(time_res));
    }
    if let Some(&bad) = masses.iter().find(|m| !(**m >= 0.0)) {
        return Err(MbtError::NegativeMass(bad));
    }
    Ok(masses.mapv(|mass| (mass_gain * mass.sqrt() + mass_offset) / time_res))
}

/// Convert mass integration bounds into integer tof bounds `(upper, lower)`.
///
/// Upper bounds are rounded up and lower bounds down, so the tof window always contains the
/// requested mass window. A rounded bound that is not finite or falls outside the u16 range
/// fails with [`MbtError::TofOutOfRange`].
pub fn compute_tof_bounds(
    higher: ArrayView1<f64>,
    lower: ArrayView1<f64>,
    mass_offset: f64,
    mass_gain: f64,
    time_res: f64,
) -> Result<(Array1<u16>, Array1<u16>)> {
    let upper_tof = to_tof_bins(
        mass2tof(higher, mass_offset, mass_gain, time_res)?.mapv(f64::ceil),
    )?;
    let lower_tof = to_tof_bins(
        mass2tof(lower, mass_offset, mass_gain, time_res)?.mapv(f64::floor),
    )?;

    for (index, (&lower, &upper)) in lower_tof.iter().zip(upper_tof.iter()).enumerate() {
        if lower > upper {
            return Err(MbtError::InvalidWindow { index, lower, upper });
        }
    }

    Ok((upper_tof, lower_tof))
}

fn to_tof_bins(tofs: Array1<f64>) -> Result<Array1<u16>> {
    if let Some((index, &tof)) = tofs
        .iter()
        .enumerate()
        .find(|(_, t)| !(**t >= 0.0 && **t <= f64::from(u16::MAX)))
    {
        return Err(MbtError::TofOutOfRange { index, tof });
    }
    Ok(tofs.mapv(|t| t as u16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_mass2tof_parabolic_model() {
        let tof = mass2tof(array![4.0, 9.0].view(), 1.0, 2.0, 0.5).unwrap();
        assert_eq!(tof, array![10.0, 14.0]);
    }

    #[test]
    fn test_negative_mass_is_rejected() {
        let err = mass2tof(array![4.0, -1.0].view(), 0.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, MbtError::NegativeMass(m) if m == -1.0));
    }

    #[test]
    fn test_bounds_round_outward() {
        let (upper, lower) =
            compute_tof_bounds(array![9.5].view(), array![3.9].view(), 0.0, 1.0, 1.0).unwrap();
        assert_eq!(upper, array![4]);
        assert_eq!(lower, array![1]);
    }

    #[test]
    fn test_sma_window_at_default_resolution() {
        let (upper, lower) = compute_tof_bounds(
            array![89.0].view(),
            array![88.7].view(),
            0.0,
            0.1,
            DEFAULT_TIME_RES,
        )
        .unwrap();
        assert_eq!(upper, array![1887]);
        assert_eq!(lower, array![1883]);
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let err = compute_tof_bounds(array![4.0].view(), array![9.0].view(), 0.0, 1.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, MbtError::InvalidWindow { index: 0, .. }));
    }

    #[test]
    fn test_degenerate_time_resolution_is_rejected() {
        for time_res in [0.0, -500e-6, f64::NAN, f64::INFINITY] {
            let err =
                compute_tof_bounds(array![89.0].view(), array![88.7].view(), 0.0, 0.1, time_res)
                    .unwrap_err();
            assert!(matches!(err, MbtError::InvalidTimeResolution(_)));
        }
    }

    #[test]
    fn test_window_beyond_tof_range_is_rejected() {
        // gain 100 puts mass 89 near tof 1.9e6
        let err = compute_tof_bounds(
            array![89.0].view(),
            array![88.7].view(),
            0.0,
            100.0,
            DEFAULT_TIME_RES,
        )
        .unwrap_err();
        assert!(matches!(err, MbtError::TofOutOfRange { index: 0, tof } if tof > 65535.0));

        // a negative offset pushes the lower bound below zero
        let err = compute_tof_bounds(array![1.0].view(), array![0.0].view(), -1.0, 1.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, MbtError::TofOutOfRange { index: 0, tof } if tof < 0.0));
    }

    proptest! {
        #[test]
        fn prop_mass2tof_is_monotonic(
            a in 0.0f64..2000.0,
            b in 0.0f64..2000.0,
            gain in 0.001f64..10.0,
            offset in -10.0f64..10.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let tof = mass2tof(array![lo, hi].view(), offset, gain, DEFAULT_TIME_RES).unwrap();
            prop_assert!(tof[0] <= tof[1]);
        }

        #[test]
        fn prop_lower_tof_never_exceeds_upper(
            mass in 1.0f64..250.0,
            low in -1.0f64..0.0,
            high in 0.0f64..1.0,
            gain in 0.01f64..0.2,
        ) {
            let (upper, lower) = compute_tof_bounds(
                array![mass + high].view(),
                array![mass + low].view(),
                0.0,
                gain,
                DEFAULT_TIME_RES,
            ).unwrap();
            prop_assert!(lower[0] <= upper[0]);
        }
    }
}

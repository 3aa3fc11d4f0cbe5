//! Slip vector decomposition and rake-frame rotation.

use lib_types::units::{Degrees, Meters};

/// Slip magnitudes at or below this are treated as no slip.
pub const ZERO_SLIP_TOLERANCE: f64 = 1e-8;

/// Rotate a (strike-slip, dip-slip) pair by `beta` into another rake frame.
///
/// `ss' = cos β·ss + sin β·ds`, `ds' = −sin β·ss + cos β·ds`.
pub fn rotate_slip(strike_slip: Meters, dip_slip: Meters, beta: Degrees) -> (Meters, Meters) {
    let (sin_b, cos_b) = beta.to_radians().sin_cos();
    let ss = cos_b * strike_slip.0 + sin_b * dip_slip.0;
    let ds = -sin_b * strike_slip.0 + cos_b * dip_slip.0;
    (Meters(ss), Meters(ds))
}

/// Rake angle of a slip vector in `[0, 360)` degrees, counter-clockwise
/// from the strike direction.
pub fn rake_degrees(strike_slip: Meters, dip_slip: Meters) -> Degrees {
    let rake = dip_slip.0.atan2(strike_slip.0).to_degrees();
    if rake < 0.0 {
        Degrees(rake + 360.0)
    } else {
        Degrees(rake)
    }
}

#[inline]
pub fn slip_magnitude(strike_slip: Meters, dip_slip: Meters) -> Meters {
    Meters(strike_slip.0.hypot(dip_slip.0))
}

#[inline]
pub fn is_zero_slip(strike_slip: Meters, dip_slip: Meters) -> bool {
    slip_magnitude(strike_slip, dip_slip).0 <= ZERO_SLIP_TOLERANCE
}

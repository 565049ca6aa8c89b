use num::{complex::Complex64, BigRational, ToPrimitive};

/// A point in the plane, stored as a complex number: `re` is x, `im` is y.
///
/// Rotation and scaling read naturally as complex multiplication,
/// which is how the curve templates are expressed.
pub type Point = Complex64;

/// An ordered sequence of points; insertion order is traversal order.
pub type Polyline = Vec<Point>;

/// A numeric type that can be converted from a BigRational.
///
/// This is provided as a distinct trait because we can't expect `From<BigRational>`
/// on foreign types.
pub trait FromRational {
    fn from_bigrational(r: &BigRational) -> Result<Self, String>
    where
        Self: Sized;
}

impl FromRational for f64 {
    fn from_bigrational(r: &BigRational) -> Result<Self, String> {
        match r.to_f64() {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(format!("failed conversion from {}", r)),
        }
    }
}

/// Squares the given number.
/// This takes fewer operations than a generic multiply.
#[inline]
pub(crate) fn square(z: Point) -> Point {
    // (a+bi)^2 = (a^2-b^2) + 2abi
    Point::new(z.re * z.re - z.im * z.im, 2.0 * (z.re * z.im))
}

/// True if both components are finite.
pub(crate) fn is_finite_point(p: &Point) -> bool {
    p.re.is_finite() && p.im.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::BigInt;

    #[test]
    fn rational_to_f64() {
        let r = BigRational::new(BigInt::from(-3), BigInt::from(2));
        assert_eq!(f64::from_bigrational(&r), Ok(-1.5));
    }

    #[test]
    fn rational_out_of_range() {
        // 10^400 does not fit in an f64.
        let huge = BigRational::from_integer(BigInt::from(10).pow(400));
        assert!(f64::from_bigrational(&huge).is_err());
    }

    #[test]
    fn square_matches_multiply() {
        let z = Point::new(2.0, 3.0);
        assert_eq!(square(z), Point::new(-5.0, 12.0));
        assert_eq!(square(z), z * z);
    }

    #[test]
    fn finite_points() {
        assert!(is_finite_point(&Point::new(1.0, -2.0)));
        assert!(!is_finite_point(&Point::new(f64::NAN, 0.0)));
        assert!(!is_finite_point(&Point::new(0.0, f64::INFINITY)));
    }
}

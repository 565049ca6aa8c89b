use std::ops::Range;

use crate::{invalid, Result};

/// A rectangle in the complex plane: a range of real parts and a range of imaginary parts.
///
/// Both ranges must be finite with `start < end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub re: Range<f64>,
    pub im: Range<f64>,
}

impl Domain {
    pub fn new(re: Range<f64>, im: Range<f64>) -> Result<Self> {
        let domain = Domain { re, im };
        domain.validate()?;
        Ok(domain)
    }

    /// The classic Mandelbrot view, `[-2, 1] x [-1.5, 1.5]`.
    pub fn mandelbrot() -> Self {
        Domain {
            re: -2.0..1.0,
            im: -1.5..1.5,
        }
    }

    /// A square view holding any filled Julia set, `[-2, 2] x [-2, 2]`.
    pub fn julia() -> Self {
        Domain {
            re: -2.0..2.0,
            im: -2.0..2.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.re.end - self.re.start
    }

    pub fn height(&self) -> f64 {
        self.im.end - self.im.start
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, r) in [("real", &self.re), ("imaginary", &self.im)] {
            if !(r.start.is_finite() && r.end.is_finite()) {
                return invalid(format!("{} range {:?} is not finite", name, r));
            }
            if r.start >= r.end {
                return invalid(format!("{} range {:?} is empty", name, r));
            }
        }
        Ok(())
    }
}

/// The `i`th of `steps` samples spread evenly over `r`, both ends included.
/// A single sample sits at `r.start`.
#[inline]
pub(crate) fn sample_at(r: &Range<f64>, i: usize, steps: usize) -> f64 {
    if steps < 2 {
        return r.start;
    }
    r.start + (r.end - r.start) * (i as f64) / ((steps - 1) as f64)
}

/// All `steps` samples over `r`.
pub(crate) fn make_range(r: &Range<f64>, steps: usize) -> Vec<f64> {
    (0..steps).map(|i| sample_at(r, i, steps)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_reversed_ranges() {
        assert!(Domain::new(0.0..0.0, -1.0..1.0).is_err());
        assert!(Domain::new(-1.0..1.0, 1.0..-1.0).is_err());
        assert!(Domain::new(f64::NEG_INFINITY..0.0, -1.0..1.0).is_err());
        assert!(Domain::new(-1.0..1.0, 0.0..f64::NAN).is_err());
        assert!(Domain::new(-2.5..1.0, -1.0..1.0).is_ok());
    }

    #[test]
    fn presets_are_valid() {
        assert!(Domain::mandelbrot().validate().is_ok());
        assert!(Domain::julia().validate().is_ok());
        assert_eq!(Domain::mandelbrot().width(), 3.0);
        assert_eq!(Domain::julia().height(), 4.0);
    }

    #[test]
    fn samples_include_both_ends() {
        let xs = make_range(&(-2.0..1.0), 4);
        assert_eq!(xs, vec![-2.0, -1.0, 0.0, 1.0]);
        assert_eq!(make_range(&(-2.0..1.0), 1), vec![-2.0]);
        assert!(make_range(&(0.0..1.0), 0).is_empty());
    }
}

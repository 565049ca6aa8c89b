//! Self-similar curve subdivision.
//!
//! Each segment of a polyline is replaced by a fixed template of points built from
//! the segment vector; the same replacement is applied to the result `depth` times.
//!
//! Junction convention: every segment contributes its start point and the template's
//! interior points, never its end point. The final point of the input is appended once,
//! at the very end. Both [`Strategy`] variants follow it, so they agree point for point.

use num::complex::Complex64;

use crate::{invalid, numeric::is_finite_point, Point, Polyline, Result};

/// Upper bound on the number of points a single curve may produce.
pub const MAX_CURVE_POINTS: usize = 1 << 24;

/// e^{i*pi/3}, i.e. cos(pi/3) + i*sin(pi/3).
const SIXTY_DEGREES: Complex64 = Complex64::new(0.5, 0.866_025_403_784_438_6);

/// A quarter turn counter-clockwise.
const RIGHT_ANGLE: Complex64 = Complex64::new(0.0, 1.0);

/// The curve family, which fixes the replacement template.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Generator {
    /// Four sub-segments of length 1/3 with a triangular notch on the left.
    Koch,
    /// Six sub-segments of length 1/4 with a square tooth on the left.
    Minkowski,
}

/// How the subdivision walks the curve.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Rewrite the whole sequence one level at a time.
    #[default]
    Level,
    /// Expand each sub-segment all the way down before moving on,
    /// using an explicit worklist of (start, end, remaining depth).
    Segment,
}

impl Generator {
    /// Number of points one segment contributes at each level:
    /// its start point plus the template's interior points.
    pub fn points_per_segment(&self) -> usize {
        match self {
            Generator::Koch => 4,
            Generator::Minkowski => 6,
        }
    }

    /// Number of points produced from `segments` input segments at `depth`,
    /// or None if it does not fit in a usize.
    pub fn point_count(&self, segments: usize, depth: u32) -> Option<usize> {
        self.points_per_segment()
            .checked_pow(depth)?
            .checked_mul(segments)?
            .checked_add(1)
    }

    /// Subdivide `endpoints` to `depth` levels, level by level.
    pub fn generate(&self, endpoints: &[Point], depth: u32) -> Result<Polyline> {
        self.generate_with(endpoints, depth, Strategy::Level)
    }

    /// Subdivide `endpoints` to `depth` levels with the given strategy.
    pub fn generate_with(
        &self,
        endpoints: &[Point],
        depth: u32,
        strategy: Strategy,
    ) -> Result<Polyline> {
        if endpoints.len() < 2 {
            return invalid(format!(
                "curve needs at least 2 endpoints, got {}",
                endpoints.len()
            ));
        }
        if let Some(p) = endpoints.iter().find(|p| !is_finite_point(p)) {
            return invalid(format!("curve endpoint {} is not finite", p));
        }
        if depth == 0 {
            return Ok(endpoints.to_vec());
        }
        let expected = match self.point_count(endpoints.len() - 1, depth) {
            Some(n) if n <= MAX_CURVE_POINTS => n,
            _ => {
                return invalid(format!(
                    "{:?} curve at depth {} exceeds {} points",
                    self, depth, MAX_CURVE_POINTS
                ))
            }
        };

        let points = match strategy {
            Strategy::Level => self.by_level(endpoints, depth),
            Strategy::Segment => self.by_segment(endpoints, depth, expected),
        };
        debug_assert_eq!(points.len(), expected);
        tracing::debug!(generator = ?self, ?strategy, depth, points = points.len(), "curve generated");
        Ok(points)
    }

    /// Push the start of `a -> b` and the template interior onto `out`.
    #[inline]
    fn template(&self, a: Point, b: Point, out: &mut Vec<Point>) {
        match self {
            Generator::Koch => {
                let d = (b - a) / 3.0;
                let p2 = a + d;
                out.extend_from_slice(&[a, p2, p2 + d * SIXTY_DEGREES, b - d]);
            }
            Generator::Minkowski => {
                let d = (b - a) / 4.0;
                let up = d * RIGHT_ANGLE;
                let p2 = a + d;
                let p3 = p2 + up;
                let p4 = p3 + d;
                let p5 = p4 - up;
                out.extend_from_slice(&[a, p2, p3, p4, p5, p5 + d]);
            }
        }
    }

    fn by_level(&self, endpoints: &[Point], depth: u32) -> Polyline {
        let mut current = endpoints.to_vec();
        for _ in 0..depth {
            let mut next =
                Vec::with_capacity((current.len() - 1) * self.points_per_segment() + 1);
            for pair in current.windows(2) {
                self.template(pair[0], pair[1], &mut next);
            }
            next.extend(current.last().copied());
            current = next;
        }
        current
    }

    fn by_segment(&self, endpoints: &[Point], depth: u32, expected: usize) -> Polyline {
        let mut points = Vec::with_capacity(expected);
        // LIFO: push in reverse so the first segment comes off first.
        let mut work: Vec<(Point, Point, u32)> = endpoints
            .windows(2)
            .rev()
            .map(|pair| (pair[0], pair[1], depth))
            .collect();
        let mut scratch = Vec::with_capacity(self.points_per_segment() + 1);

        while let Some((a, b, remaining)) = work.pop() {
            if remaining == 0 {
                points.push(a);
                continue;
            }
            scratch.clear();
            self.template(a, b, &mut scratch);
            scratch.push(b);
            for pair in scratch.windows(2).rev() {
                work.push((pair[0], pair[1], remaining - 1));
            }
        }
        points.extend(endpoints.last().copied());
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]
    }

    fn assert_close(got: &[Point], want: &[Point]) {
        assert_eq!(got.len(), want.len());
        for (i, (g, w)) in got.iter().zip(want).enumerate() {
            assert!((g - w).norm() < 1e-12, "point {}: got {} want {}", i, g, w);
        }
    }

    #[test]
    fn depth_zero_is_identity() {
        let input = vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(-1.0, 3.0),
        ];
        for gen in [Generator::Koch, Generator::Minkowski] {
            for strategy in [Strategy::Level, Strategy::Segment] {
                assert_eq!(gen.generate_with(&input, 0, strategy).unwrap(), input);
            }
        }
    }

    #[test]
    fn koch_first_level() {
        let got = Generator::Koch.generate(&unit(), 1).unwrap();
        let h = 3f64.sqrt() / 6.0;
        assert_close(
            &got,
            &[
                Point::new(0.0, 0.0),
                Point::new(1.0 / 3.0, 0.0),
                Point::new(0.5, h),
                Point::new(2.0 / 3.0, 0.0),
                Point::new(1.0, 0.0),
            ],
        );
    }

    #[test]
    fn minkowski_first_level() {
        let got = Generator::Minkowski.generate(&unit(), 1).unwrap();
        assert_close(
            &got,
            &[
                Point::new(0.0, 0.0),
                Point::new(0.25, 0.0),
                Point::new(0.25, 0.25),
                Point::new(0.5, 0.25),
                Point::new(0.5, 0.0),
                Point::new(0.75, 0.0),
                Point::new(1.0, 0.0),
            ],
        );
    }

    #[test]
    fn point_counts() {
        let triangle = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.5, -0.8),
            Point::new(0.0, 0.0),
        ];
        for depth in 0..5 {
            let koch = Generator::Koch.generate(&triangle, depth).unwrap();
            assert_eq!(koch.len(), 4usize.pow(depth) * 3 + 1);
            let mink = Generator::Minkowski.generate(&unit(), depth).unwrap();
            assert_eq!(mink.len(), 6usize.pow(depth) + 1);
        }
    }

    #[test]
    fn endpoints_preserved_and_no_duplicates() {
        let input = vec![Point::new(-1.0, 2.0), Point::new(3.0, 0.5)];
        for gen in [Generator::Koch, Generator::Minkowski] {
            for depth in 1..5 {
                let points = gen.generate(&input, depth).unwrap();
                assert_eq!(points.first(), input.first());
                assert_eq!(points.last(), input.last());
                for pair in points.windows(2) {
                    assert_ne!(pair[0], pair[1], "{:?} depth {}", gen, depth);
                }
            }
        }
    }

    #[test]
    fn strategies_agree() {
        let input = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
        ];
        for gen in [Generator::Koch, Generator::Minkowski] {
            for depth in 0..5 {
                let level = gen.generate_with(&input, depth, Strategy::Level).unwrap();
                let segment = gen.generate_with(&input, depth, Strategy::Segment).unwrap();
                assert_close(&level, &segment);
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let a = Generator::Koch.generate(&unit(), 4).unwrap();
        let b = Generator::Koch.generate(&unit(), 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_too_few_points() {
        let one = vec![Point::new(0.0, 0.0)];
        assert!(matches!(
            Generator::Koch.generate(&one, 1),
            Err(crate::Error::InvalidInput(_))
        ));
        assert!(matches!(
            Generator::Minkowski.generate(&[], 0),
            Err(crate::Error::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_non_finite_points() {
        let input = vec![Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0)];
        assert!(Generator::Koch.generate(&input, 1).is_err());
    }

    #[test]
    fn rejects_runaway_depth() {
        assert!(matches!(
            Generator::Koch.generate(&unit(), 40),
            Err(crate::Error::InvalidInput(_))
        ));
        assert_eq!(Generator::Minkowski.point_count(1, 100), None);
    }

    #[test]
    fn depth_zero_ignores_point_limit() {
        let long: Vec<Point> = (0..=MAX_CURVE_POINTS)
            .map(|i| Point::new(i as f64, 0.0))
            .collect();
        for strategy in [Strategy::Level, Strategy::Segment] {
            let got = Generator::Koch.generate_with(&long, 0, strategy).unwrap();
            assert_eq!(got.len(), MAX_CURVE_POINTS + 1);
            assert_eq!(got.last(), long.last());
        }
        // One level on the same input is over the limit.
        assert!(Generator::Koch.generate(&long, 1).is_err());
    }
}

//! Iterated function systems, sampled with the chaos game.
//!
//! A running point starts at the origin; at every step one transform is picked at random,
//! with probability proportional to its weight, and applied to the point.
//! After a burn-in the points lie (to floating-point accuracy) on the attractor.
//!
//! Randomness always comes from a generator the caller owns or seeds,
//! so a run is reproducible from its seed.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::{invalid, Point, Result};

/// `(x, y) -> (a*x + b*y + e, c*x + d*y + f)`, chosen with relative weight `weight`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
    pub weight: f64,
}

impl AffineTransform {
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64, weight: f64) -> Self {
        Self {
            a,
            b,
            c,
            d,
            e,
            f,
            weight,
        }
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.re + self.b * p.im + self.e,
            self.c * p.re + self.d * p.im + self.f,
        )
    }

    fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f, self.weight]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// A validated set of weighted transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Ifs {
    transforms: Vec<AffineTransform>,
    // Cumulative normalized weights of the transforms with positive weight;
    // the last bound is exactly 1.
    bounds: Vec<f64>,
    // Index into `transforms` for each bound.
    selectable: Vec<usize>,
}

impl Ifs {
    /// Validate the transforms and build the selection partition.
    ///
    /// Weights need not sum to 1. Transforms with weight 0 are kept but never selected.
    pub fn new(transforms: Vec<AffineTransform>) -> Result<Self> {
        if transforms.is_empty() {
            return invalid("IFS needs at least one transform");
        }
        for (i, t) in transforms.iter().enumerate() {
            if !t.is_finite() {
                return invalid(format!("transform {} has a non-finite coefficient", i));
            }
            if t.weight < 0.0 {
                return invalid(format!("transform {} has negative weight {}", i, t.weight));
            }
        }
        let total: f64 = transforms.iter().map(|t| t.weight).sum();
        if !(total > 0.0 && total.is_finite()) {
            return invalid(format!("transform weights must sum to a positive value, got {}", total));
        }

        Ok(Self::build(transforms))
    }

    fn build(transforms: Vec<AffineTransform>) -> Self {
        let total: f64 = transforms.iter().map(|t| t.weight).sum();
        let mut bounds = Vec::with_capacity(transforms.len());
        let mut selectable = Vec::with_capacity(transforms.len());
        let mut acc = 0.0;
        for (i, t) in transforms.iter().enumerate() {
            if t.weight > 0.0 {
                acc += t.weight;
                bounds.push(acc / total);
                selectable.push(i);
            }
        }
        // Rounding must not leave a gap below 1.
        if let Some(last) = bounds.last_mut() {
            *last = 1.0;
        }

        Ifs {
            transforms,
            bounds,
            selectable,
        }
    }

    /// The Barnsley fern.
    pub fn barnsley_fern() -> Self {
        Self::build(vec![
            AffineTransform::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0, 0.01),
            AffineTransform::new(0.85, 0.04, -0.04, 0.85, 0.0, 1.6, 0.85),
            AffineTransform::new(0.2, -0.26, 0.23, 0.22, 0.0, 1.6, 0.07),
            AffineTransform::new(-0.15, 0.28, 0.26, 0.24, 0.0, 0.44, 0.07),
        ])
    }

    /// A symmetric branching tree.
    pub fn probability_tree() -> Self {
        Self::build(vec![
            AffineTransform::new(0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.1),
            AffineTransform::new(0.42, -0.42, 0.42, 0.42, 0.0, 1.0, 0.3),
            AffineTransform::new(0.42, 0.42, -0.42, 0.42, 0.0, 1.0, 0.3),
            AffineTransform::new(0.1, 0.0, 0.0, 0.1, 0.0, 1.0, 0.3),
        ])
    }

    pub fn transforms(&self) -> &[AffineTransform] {
        &self.transforms
    }

    /// Index of the transform selected by a uniform draw `u` in `[0, 1)`:
    /// the first, in list order, whose cumulative bound is at least `u`.
    pub fn select(&self, u: f64) -> usize {
        let i = self.bounds.partition_point(|&bound| bound < u);
        self.selectable[i.min(self.selectable.len() - 1)]
    }

    /// Run the chaos game with a caller-supplied generator.
    ///
    /// Runs `burn_in + total_points` steps from the origin and returns the last
    /// `total_points` points in generation order.
    pub fn sample_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        total_points: usize,
        burn_in: usize,
    ) -> Result<Vec<Point>> {
        if total_points == 0 {
            return invalid("total_points must be positive");
        }
        let steps = match burn_in.checked_add(total_points) {
            Some(n) => n,
            None => return invalid("burn_in + total_points overflows"),
        };

        let mut points = Vec::with_capacity(total_points);
        let mut current = Point::new(0.0, 0.0);
        for step in 0..steps {
            let u: f64 = rng.gen();
            current = self.transforms[self.select(u)].apply(current);
            if step >= burn_in {
                points.push(current);
            }
        }
        tracing::debug!(points = points.len(), burn_in, "chaos game sampled");
        Ok(points)
    }

    /// Run the chaos game, seeded from `seed` or from entropy if None.
    pub fn sample(
        &self,
        total_points: usize,
        burn_in: usize,
        seed: Option<u64>,
    ) -> Result<Vec<Point>> {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        self.sample_with(&mut rng, total_points, burn_in)
    }

    /// Run one independent chain per seed, in parallel.
    /// Results are returned in the order of `seeds`.
    pub fn sample_runs(
        &self,
        seeds: &[u64],
        total_points: usize,
        burn_in: usize,
    ) -> Result<Vec<Vec<Point>>> {
        seeds
            .par_iter()
            .map(|&seed| self.sample(total_points, burn_in, Some(seed)))
            .collect()
    }
}

//! Escape-time fields for the Mandelbrot and Julia sets.
//!
//! Every cell of the grid maps to a point of a [`Domain`] and is iterated
//! under `z -> z^2 + c` until the orbit leaves the disc of radius 2
//! or the iteration cap is reached.
//!
//! Grid layout: row-major, `height` rows of `width` cells. Column `col` samples the
//! real range and row `row` the imaginary range, both ends included;
//! row 0 is the *lowest* imaginary value. Renderers that draw row 0 at the top
//! should flip vertically.

use rayon::prelude::*;

use crate::{invalid, numeric::is_finite_point, numeric::square, Point, Result, Size};

mod domain;
pub use domain::Domain;
use domain::{make_range, sample_at};

/// Julia parameters with well-known shapes.
pub const JULIA_PRESETS: [Point; 3] = [
    Point::new(-0.8, 0.156),
    Point::new(-0.4, 0.6),
    Point::new(0.285, 0.01),
];

const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

/// The recurrence evaluated at every cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Recurrence {
    /// `z_0 = 0`, and the cell's point is `c`.
    Mandelbrot,
    /// The cell's point is `z_0`, and `c` is fixed for the whole field.
    Julia { c: Point },
}

/// Where and how finely to sample, and how long to iterate.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldParams {
    pub domain: Domain,
    pub size: Size,
    pub max_iterations: u32,
}

impl FieldParams {
    fn validate(&self) -> Result<usize> {
        self.domain.validate()?;
        if self.size.width == 0 || self.size.height == 0 {
            return invalid(format!(
                "resolution must be positive, got {}x{}",
                self.size.width, self.size.height
            ));
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be positive");
        }
        match self.size.width.checked_mul(self.size.height) {
            Some(cells) => Ok(cells),
            None => invalid(format!(
                "resolution {}x{} is too large",
                self.size.width, self.size.height
            )),
        }
    }
}

/// Escape counts for a grid of points, together with the mapping that produced them.
#[derive(Clone, Debug, PartialEq)]
pub struct EscapeField {
    size: Size,
    domain: Domain,
    max_iterations: u32,
    counts: Vec<u32>,
}

impl EscapeField {
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// All counts, row-major.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.size.height || col >= self.size.width {
            return None;
        }
        Some(self.counts[row * self.size.width + col])
    }

    /// Rows in order of increasing imaginary part.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.counts.chunks(self.size.width)
    }

    /// The point of the complex plane sampled by cell `(row, col)`.
    pub fn point(&self, row: usize, col: usize) -> Point {
        Point::new(
            sample_at(&self.domain.re, col, self.size.width),
            sample_at(&self.domain.im, row, self.size.height),
        )
    }
}

/// Iterate `z -> z^2 + c` from `z0` and count the steps taken before the orbit escapes.
///
/// The step whose result escapes is not counted, so a value in `[0, max_iterations)`
/// means the orbit escaped and `max_iterations` means it never did.
/// A `z0` that is already outside gives 0. Overflow and NaN count as escaping.
#[inline]
pub fn escape_count(z0: Point, c: Point, max_iterations: u32) -> u32 {
    if escaped(z0) {
        return 0;
    }
    let mut z = z0;
    for i in 0..max_iterations {
        z = square(z) + c;
        if escaped(z) {
            return i;
        }
    }
    max_iterations
}

#[inline]
fn escaped(z: Point) -> bool {
    // The escape condition is that the distance from 0 + 0i is more than two.
    // Comparing d^2 against 2^2 skips the square root;
    // NaN fails the comparison, so it escapes too.
    !(z.norm_sqr() <= ESCAPE_RADIUS_SQUARED)
}

/// Evaluate the escape-time field for `recurrence` over `params`,
/// using any parallelism available in the current rayon pool.
pub fn compute_field(params: &FieldParams, recurrence: Recurrence) -> Result<EscapeField> {
    let cells = params.validate()?;
    if let Recurrence::Julia { c } = recurrence {
        if !is_finite_point(&c) {
            return invalid(format!("julia parameter {} is not finite", c));
        }
    }

    let span = tracing::info_span!(
        "escape-field",
        ?recurrence,
        width = params.size.width,
        height = params.size.height
    );
    let _guard = span.enter();

    // Create the X and Y ranges up-front:
    let xs = make_range(&params.domain.re, params.size.width);
    let ys = make_range(&params.domain.im, params.size.height);
    let mut counts = vec![0u32; cells];
    let limit = params.max_iterations;

    match recurrence {
        Recurrence::Mandelbrot => fill_rows(&mut counts, &xs, &ys, |p| {
            escape_count(Point::new(0.0, 0.0), p, limit)
        }),
        Recurrence::Julia { c } => fill_rows(&mut counts, &xs, &ys, |p| escape_count(p, c, limit)),
    }
    tracing::debug!(cells, "escape-field computed");

    Ok(EscapeField {
        size: params.size,
        domain: params.domain.clone(),
        max_iterations: limit,
        counts,
    })
}

fn fill_rows<F>(counts: &mut [u32], xs: &[f64], ys: &[f64], kernel: F)
where
    F: Fn(Point) -> u32 + Sync,
{
    counts
        .par_chunks_mut(xs.len())
        .zip(ys.par_iter())
        .for_each(|(row_out, &y)| {
            xs.iter().zip(row_out).for_each(|(&x, out)| {
                *out = kernel(Point::new(x, y));
            })
        });
}

//! L-systems: context-free string rewriting, and a 2D turtle that turns the
//! rewritten string into a path.
//!
//! Turtle commands:
//! - `F`, `0`, `1`: move forward one step, drawing
//! - `+`: turn counter-clockwise (y up) by the turn angle
//! - `-`: turn clockwise by the turn angle
//! - `[`: save position and heading
//! - `]`: restore the most recently saved position and heading
//!
//! Anything else is ignored by the turtle, so grammar-only symbols pass through.

use std::collections::HashMap;

use crate::{invalid, numeric::is_finite_point, Error, Point, Polyline, Result};

/// Production rules: symbol to replacement. Symbols without a rule are terminal.
pub type Rules = HashMap<char, String>;

/// Apply `rules` to `axiom` `iterations` times.
///
/// Every symbol of a pass is replaced independently of its neighbours, so the result
/// does not depend on the order in which symbols are visited.
/// Length can grow exponentially; see [`LSystem::checked_expand`] for a bounded variant.
pub fn rewrite(axiom: &str, rules: &Rules, iterations: u32) -> String {
    let mut current = axiom.to_owned();
    for _ in 0..iterations {
        current = rewrite_once(&current, rules);
    }
    current
}

fn rewrite_once(input: &str, rules: &Rules) -> String {
    let mut next = String::with_capacity(input.len() * 2);
    for c in input.chars() {
        match rules.get(&c) {
            Some(replacement) => next.push_str(replacement),
            None => next.push(c),
        }
    }
    next
}

/// Number of symbols in `input` after one rewriting pass.
fn rewritten_len(input: &str, rules: &Rules) -> usize {
    input
        .chars()
        .map(|c| rules.get(&c).map_or(1, |r| r.chars().count()))
        .sum()
}

/// An L-system definition: axiom, rules and how many times to apply them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LSystem {
    pub axiom: String,
    pub rules: Rules,
    pub iterations: u32,
}

impl LSystem {
    /// Creates an L-system with no rules and no iterations.
    pub fn new(axiom: &str) -> Self {
        Self {
            axiom: axiom.to_owned(),
            rules: Rules::new(),
            iterations: 0,
        }
    }

    /// Adds (or replaces) the rule for `symbol`.
    pub fn with_rule(mut self, symbol: char, replacement: &str) -> Self {
        self.rules.insert(symbol, replacement.to_owned());
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Koch curve grammar: `F -> F+F--F+F`, drawn with 60 degree turns.
    pub fn koch_curve() -> Self {
        LSystem::new("F").with_rule('F', "F+F--F+F")
    }

    /// Binary tree grammar: `1 -> 11`, `0 -> 1[+0]-0`, drawn with 45 degree turns.
    ///
    /// The textbook form `0 -> 1[0]0` carries no turns, so every branch would
    /// retrace the trunk; the turns here make the branches fan out.
    pub fn binary_tree() -> Self {
        LSystem::new("0")
            .with_rule('1', "11")
            .with_rule('0', "1[+0]-0")
    }

    /// The rewritten string.
    pub fn expand(&self) -> String {
        rewrite(&self.axiom, &self.rules, self.iterations)
    }

    /// The rewritten string, failing instead of growing past `max_len` symbols.
    pub fn checked_expand(&self, max_len: usize) -> Result<String> {
        let axiom_len = self.axiom.chars().count();
        if axiom_len > max_len {
            return invalid(format!(
                "axiom is {} symbols, limit is {}",
                axiom_len, max_len
            ));
        }
        let mut current = self.axiom.clone();
        for pass in 0..self.iterations {
            let len = rewritten_len(&current, &self.rules);
            if len > max_len {
                return invalid(format!(
                    "rewriting pass {} would produce {} symbols, limit is {}",
                    pass + 1,
                    len,
                    max_len
                ));
            }
            current = rewrite_once(&current, &self.rules);
        }
        tracing::debug!(iterations = self.iterations, bytes = current.len(), "l-system expanded");
        Ok(current)
    }
}

/// Well-known grammars together with the turtle that draws them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Preset {
    /// `F -> F+F--F+F` at 60 degrees.
    KochCurve,
    /// `1 -> 11`, `0 -> 1[+0]-0` at 45 degrees, growing upwards.
    BinaryTree,
}

impl Preset {
    pub fn lsystem(&self, iterations: u32) -> LSystem {
        match self {
            Preset::KochCurve => LSystem::koch_curve(),
            Preset::BinaryTree => LSystem::binary_tree(),
        }
        .with_iterations(iterations)
    }

    pub fn turtle(&self, step: f64) -> Turtle {
        match self {
            Preset::KochCurve => Turtle::new(60.0, step),
            Preset::BinaryTree => Turtle::new(45.0, step).with_heading(90.0),
        }
    }
}

/// Position and heading (degrees, counter-clockwise from +x) of the turtle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleState {
    pub position: Point,
    pub heading: f64,
}

/// Interpreter settings: turn angle and step length, plus the starting pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turtle {
    /// Degrees turned by `+` and `-`.
    pub turn_angle: f64,
    /// Distance moved by a draw command.
    pub step: f64,
    pub start: Point,
    /// Starting heading in degrees; 0 points along +x, 90 along +y.
    pub heading: f64,
}

impl Default for Turtle {
    fn default() -> Self {
        Self::new(90.0, 1.0)
    }
}

/// The path drawn by a [`Turtle`].
///
/// `points` holds every stroke back to back; `stroke_starts` gives the index where each
/// contiguous stroke begins. A stroke is broken only by `]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TurtlePath {
    pub points: Polyline,
    pub stroke_starts: Vec<usize>,
    /// Turtle state after the last command.
    pub end: TurtleState,
}

impl TurtlePath {
    /// True if nothing was drawn.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The contiguous strokes, in drawing order. Each has at least 2 points.
    pub fn strokes(&self) -> impl Iterator<Item = &[Point]> + '_ {
        self.stroke_starts.iter().enumerate().map(move |(i, &start)| {
            let end = self
                .stroke_starts
                .get(i + 1)
                .copied()
                .unwrap_or(self.points.len());
            &self.points[start..end]
        })
    }
}

impl Turtle {
    /// A turtle at the origin heading along +x.
    pub fn new(turn_angle: f64, step: f64) -> Self {
        Self {
            turn_angle,
            step,
            start: Point::new(0.0, 0.0),
            heading: 0.0,
        }
    }

    pub fn with_start(mut self, start: Point) -> Self {
        self.start = start;
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = heading;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return invalid(format!("step length must be positive, got {}", self.step));
        }
        if !self.turn_angle.is_finite() || !self.heading.is_finite() {
            return invalid("turn angle and heading must be finite");
        }
        if !is_finite_point(&self.start) {
            return invalid(format!("start position {} is not finite", self.start));
        }
        Ok(())
    }

    /// Run `commands` through the turtle in a single left-to-right scan.
    ///
    /// Brackets left open at the end are not an error; their saved states are dropped.
    pub fn interpret(&self, commands: &str) -> Result<TurtlePath> {
        self.validate()?;

        let mut state = TurtleState {
            position: self.start,
            heading: self.heading,
        };
        let mut stack: Vec<TurtleState> = Vec::new();
        let mut points = Vec::new();
        let mut stroke_starts = Vec::new();
        // True while the last point pushed is the turtle's position on an open stroke.
        let mut drawing = false;

        for (offset, c) in commands.char_indices() {
            match c {
                'F' | '0' | '1' => {
                    let next =
                        state.position + Point::from_polar(self.step, state.heading.to_radians());
                    if !drawing {
                        stroke_starts.push(points.len());
                        points.push(state.position);
                        drawing = true;
                    }
                    points.push(next);
                    state.position = next;
                }
                '+' => state.heading += self.turn_angle,
                '-' => state.heading -= self.turn_angle,
                '[' => stack.push(state),
                ']' => {
                    state = stack.pop().ok_or(Error::UnbalancedBracket { offset })?;
                    drawing = false;
                }
                _ => {}
            }
        }

        tracing::debug!(
            points = points.len(),
            strokes = stroke_starts.len(),
            unclosed = stack.len(),
            "turtle path interpreted"
        );
        Ok(TurtlePath {
            points,
            stroke_starts,
            end: state,
        })
    }
}

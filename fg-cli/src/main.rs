//! Command-line driver for the fractal generators.
//!
//! Each subcommand runs one generator and prints its numeric output to stdout:
//! points as `x y` lines, fields as one line of counts per row.
//! Plotting is left to whatever consumes the output.
//!
//! Logging goes to stderr and is filtered by `RUST_LOG` (default `warn`).

use std::{
    error::Error,
    io::{self, BufWriter, Write},
};

use clap::{Parser, Subcommand, ValueEnum};
use fg_core::{
    curve::{Generator, Strategy},
    escape::{self, Domain, FieldParams, Recurrence, JULIA_PRESETS},
    ifs::Ifs,
    lsystem::{LSystem, Preset, Turtle},
    FromRational, Point, Size,
};
use num::BigRational;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "fractal-gen",
    about = "Generate fractal point sets and escape-time fields as plain numbers"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Koch or Minkowski curve by recursive subdivision.
    Curve {
        #[arg(value_enum)]
        kind: CurveKind,
        #[arg(long, default_value_t = 3)]
        depth: u32,
        #[arg(long, value_enum, default_value_t = StrategyArg::Level)]
        strategy: StrategyArg,
        /// Start of the initial segment, as `x,y`.
        #[arg(long, default_value = "0,0", value_parser = parse_point, allow_hyphen_values = true)]
        from: Point,
        /// End of the initial segment, as `x,y`.
        #[arg(long, default_value = "1,0", value_parser = parse_point, allow_hyphen_values = true)]
        to: Point,
    },
    /// L-system rewriting followed by turtle interpretation.
    Lsystem {
        #[arg(long, value_enum)]
        preset: Option<PresetArg>,
        /// Axiom; required without a preset.
        #[arg(long)]
        axiom: Option<String>,
        /// Production rule as `S=replacement`; repeatable.
        #[arg(long = "rule", value_parser = parse_rule)]
        rules: Vec<(char, String)>,
        #[arg(long, default_value_t = 3)]
        iterations: u32,
        /// Turn angle in degrees.
        #[arg(long, allow_negative_numbers = true)]
        angle: Option<f64>,
        #[arg(long, default_value_t = 10.0)]
        step: f64,
        /// Starting heading in degrees; 0 is along +x.
        #[arg(long, allow_negative_numbers = true)]
        heading: Option<f64>,
        /// Refuse to rewrite past this many symbols.
        #[arg(long, default_value_t = 1 << 24)]
        max_len: usize,
    },
    /// Iterated function system sampled with the chaos game.
    Ifs {
        #[arg(value_enum)]
        kind: IfsKind,
        #[arg(long, default_value_t = 100_000)]
        points: usize,
        #[arg(long, default_value_t = 100)]
        burn_in: usize,
        /// Seed for a reproducible run; random if omitted.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Mandelbrot or Julia escape-time field.
    Field {
        #[arg(value_enum)]
        kind: FieldKind,
        /// Index of the built-in Julia parameter to start from.
        #[arg(
            long,
            default_value_t = 0,
            value_parser = clap::value_parser!(u8).range(0..JULIA_PRESETS.len() as i64)
        )]
        preset: u8,
        /// Real part of the Julia parameter; overrides the preset.
        #[arg(long, allow_negative_numbers = true)]
        c_re: Option<f64>,
        /// Imaginary part of the Julia parameter; overrides the preset.
        #[arg(long, allow_negative_numbers = true)]
        c_im: Option<f64>,
        #[arg(long, default_value_t = 800)]
        width: usize,
        #[arg(long, default_value_t = 800)]
        height: usize,
        #[arg(long, default_value_t = 100)]
        iterations: u32,
        /// Domain as `re_start re_end im_start im_end`, exact rationals like `-3/2`.
        #[arg(allow_hyphen_values = true)]
        bounds: Vec<BigRational>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CurveKind {
    Koch,
    Minkowski,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Level,
    Segment,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PresetArg {
    Koch,
    Tree,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum IfsKind {
    Fern,
    Tree,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FieldKind {
    Mandelbrot,
    Julia,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got {:?}", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate {:?}: {}", v, e))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}

fn parse_rule(s: &str) -> Result<(char, String), String> {
    let (symbol, replacement) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `S=replacement`, got {:?}", s))?;
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok((c, replacement.to_owned())),
        _ => Err(format!("rule symbol must be one character, got {:?}", symbol)),
    }
}

fn parse_domain(bounds: &[BigRational], default: Domain) -> Result<Domain, Box<dyn Error>> {
    match bounds {
        [] => Ok(default),
        [re_start, re_end, im_start, im_end] => {
            let f = |r: &BigRational| f64::from_bigrational(r);
            Ok(Domain::new(
                f(re_start)?..f(re_end)?,
                f(im_start)?..f(im_end)?,
            )?)
        }
        _ => Err(format!("expected 0 or 4 domain bounds, got {}", bounds.len()).into()),
    }
}

fn write_points<'a>(
    out: &mut impl Write,
    points: impl IntoIterator<Item = &'a Point>,
) -> io::Result<()> {
    for p in points {
        writeln!(out, "{} {}", p.re, p.im)?;
    }
    Ok(())
}

fn run(command: Command, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Curve {
            kind,
            depth,
            strategy,
            from,
            to,
        } => {
            let generator = match kind {
                CurveKind::Koch => Generator::Koch,
                CurveKind::Minkowski => Generator::Minkowski,
            };
            let strategy = match strategy {
                StrategyArg::Level => Strategy::Level,
                StrategyArg::Segment => Strategy::Segment,
            };
            tracing::info!(?generator, depth, "generating curve");
            let points = generator.generate_with(&[from, to], depth, strategy)?;
            write_points(out, &points)?;
        }
        Command::Lsystem {
            preset,
            axiom,
            rules,
            iterations,
            angle,
            step,
            heading,
            max_len,
        } => {
            let preset = preset.map(|p| match p {
                PresetArg::Koch => Preset::KochCurve,
                PresetArg::Tree => Preset::BinaryTree,
            });
            let (mut lsystem, mut turtle) = match (preset, axiom.as_deref()) {
                (Some(p), _) => (p.lsystem(iterations), p.turtle(step)),
                (None, Some(a)) => (
                    LSystem::new(a).with_iterations(iterations),
                    Turtle::new(90.0, step),
                ),
                (None, None) => return Err("either --preset or --axiom is required".into()),
            };
            if let Some(a) = axiom {
                lsystem.axiom = a;
            }
            for (symbol, replacement) in rules {
                lsystem = lsystem.with_rule(symbol, &replacement);
            }
            if let Some(angle) = angle {
                turtle.turn_angle = angle;
            }
            if let Some(heading) = heading {
                turtle.heading = heading;
            }
            tracing::info!(axiom = %lsystem.axiom, iterations, "expanding l-system");
            let commands = lsystem.checked_expand(max_len)?;
            let path = turtle.interpret(&commands)?;
            for (i, stroke) in path.strokes().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                write_points(out, stroke)?;
            }
        }
        Command::Ifs {
            kind,
            points,
            burn_in,
            seed,
        } => {
            let ifs = match kind {
                IfsKind::Fern => Ifs::barnsley_fern(),
                IfsKind::Tree => Ifs::probability_tree(),
            };
            tracing::info!(?kind, points, burn_in, ?seed, "running chaos game");
            let samples = ifs.sample(points, burn_in, seed)?;
            write_points(out, &samples)?;
        }
        Command::Field {
            kind,
            preset,
            c_re,
            c_im,
            width,
            height,
            iterations,
            bounds,
        } => {
            let (recurrence, default_domain) = match kind {
                FieldKind::Mandelbrot => (Recurrence::Mandelbrot, Domain::mandelbrot()),
                FieldKind::Julia => {
                    let preset = JULIA_PRESETS[usize::from(preset)];
                    let c = Point::new(c_re.unwrap_or(preset.re), c_im.unwrap_or(preset.im));
                    (Recurrence::Julia { c }, Domain::julia())
                }
            };
            let params = FieldParams {
                domain: parse_domain(&bounds, default_domain)?,
                size: Size::new(width, height),
                max_iterations: iterations,
            };
            tracing::info!(?recurrence, ?params, "computing escape-time field");
            let field = escape::compute_field(&params, recurrence)?;
            for row in field.rows() {
                let line: Vec<String> = row.iter().map(u32::to_string).collect();
                writeln!(out, "{}", line.join(" "))?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if let Err(err) = run(args.command, &mut out) {
        tracing::error!("generation failed: {}", err);
        return Err(err);
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> Result<String, Box<dyn Error>> {
        let args = Args::try_parse_from(std::iter::once("fractal-gen").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(args.command, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn parses_points_and_rules() {
        assert_eq!(parse_point("-1.5, 2"), Ok(Point::new(-1.5, 2.0)));
        assert!(parse_point("1").is_err());
        assert_eq!(parse_rule("F=F+F"), Ok(('F', "F+F".to_owned())));
        assert_eq!(parse_rule("0="), Ok(('0', String::new())));
        assert!(parse_rule("FF=F").is_err());
        assert!(parse_rule("F").is_err());
    }

    #[test]
    fn curve_output() {
        let out = run_args(&["curve", "koch", "--depth", "1"]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "0 0");
        assert_eq!(lines[4], "1 0");

        let out = run_args(&[
            "curve", "minkowski", "--depth", "2", "--strategy", "segment", "--from", "-1,0",
        ])
        .unwrap();
        assert_eq!(out.lines().count(), 37);
    }

    #[test]
    fn lsystem_output() {
        let out = run_args(&["lsystem", "--preset", "koch", "--iterations", "1"]).unwrap();
        assert_eq!(out.lines().count(), 5);

        // Two strokes separated by a blank line.
        let out = run_args(&[
            "lsystem", "--axiom", "F[+F]F", "--iterations", "0", "--step", "1",
        ])
        .unwrap();
        assert_eq!(out.lines().filter(|l| l.is_empty()).count(), 1);
    }

    #[test]
    fn lsystem_errors() {
        assert!(run_args(&["lsystem", "--iterations", "2"]).is_err());
        let err = run_args(&["lsystem", "--axiom", "F]", "--iterations", "0"]).unwrap_err();
        assert!(err.to_string().contains("unbalanced"), "{}", err);
        let err = run_args(&[
            "lsystem", "--preset", "koch", "--iterations", "8", "--max-len", "1000",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("invalid input"), "{}", err);
    }

    #[test]
    fn ifs_output_is_seeded() {
        let args = ["ifs", "fern", "--points", "20", "--burn-in", "5", "--seed", "9"];
        let a = run_args(&args).unwrap();
        assert_eq!(a.lines().count(), 20);
        assert_eq!(a, run_args(&args).unwrap());
        assert!(run_args(&["ifs", "tree", "--points", "0"]).is_err());
    }

    #[test]
    fn field_output() {
        let out = run_args(&[
            "field", "mandelbrot", "--width", "3", "--height", "2", "--iterations", "5",
        ])
        .unwrap();
        let rows: Vec<Vec<u32>> = out
            .lines()
            .map(|l| l.split(' ').map(|v| v.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 3 && r.iter().all(|&n| n <= 5)));
    }

    #[test]
    fn field_with_rational_bounds() {
        let out = run_args(&[
            "field", "julia", "--c-re", "-0.4", "--c-im", "0.6", "--width", "4", "--height", "4",
            "-3/2", "3/2", "-1", "1",
        ])
        .unwrap();
        assert_eq!(out.lines().count(), 4);

        assert!(run_args(&["field", "mandelbrot", "--width", "2", "1", "2"]).is_err());
        assert!(run_args(&["field", "mandelbrot", "1", "-1", "0", "1"]).is_err());
        assert!(run_args(&["field", "mandelbrot", "--iterations", "0"]).is_err());
    }

    #[test]
    fn field_julia_presets() {
        let size = ["--width", "24", "--height", "16", "--iterations", "60"];
        let field = |extra: &[&str]| {
            let mut args = vec!["field", "julia"];
            args.extend_from_slice(extra);
            args.extend_from_slice(&size);
            run_args(&args)
        };
        assert_eq!(field(&[]).unwrap(), field(&["--preset", "0"]).unwrap());
        assert_eq!(
            field(&["--preset", "2"]).unwrap(),
            field(&["--c-re", "0.285", "--c-im", "0.01"]).unwrap()
        );
        // An explicit part overrides the preset's.
        assert_eq!(
            field(&["--preset", "1", "--c-re", "-0.8"]).unwrap(),
            field(&["--c-re", "-0.8", "--c-im", "0.6"]).unwrap()
        );
        assert!(field(&["--preset", "3"]).is_err());
    }
}

// Schwarzschild Geodesic Trace CLI
//
// Traces one or more geodesic scenarios and writes the sampled worldlines
// as JSON (optionally gzipped) for downstream plotting and analysis.

use clap::Parser;
use flate2::write::GzEncoder;
use flate2::Compression;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use schwarzschild_geodesic::*;

/// CLI arguments for the geodesic tracer
#[derive(Parser, Debug)]
#[command(name = "trace")]
#[command(about = "Trace geodesics through Schwarzschild spacetime", long_about = None)]
struct Args {
    /// Scenario preset: "circular", "infall", "flat-null", "precession",
    /// "near-horizon", "all", or "custom" (custom reads the
    /// initial-condition flags below)
    #[arg(short, long, default_value = "circular")]
    scenario: String,

    /// Central mass in geometric units (custom scenario)
    #[arg(short, long, default_value_t = 1.0)]
    mass: f64,

    /// Starting areal radius (custom scenario)
    #[arg(short, long, default_value_t = 10.0)]
    radius: f64,

    /// Initial radial velocity dr/ds (custom scenario)
    #[arg(long, default_value_t = 0.0)]
    v_r: f64,

    /// Initial polar velocity dθ/ds (custom scenario)
    #[arg(long, default_value_t = 0.0)]
    v_theta: f64,

    /// Initial azimuthal velocity dφ/ds (custom scenario)
    #[arg(long, default_value_t = 0.0)]
    v_phi: f64,

    /// Interval norm: "timelike" or "null" (custom scenario)
    #[arg(short, long, default_value = "timelike")]
    norm: String,

    /// Proper-time span to integrate over
    #[arg(long, default_value_t = 60.0)]
    span: f64,

    /// Number of output samples across the span
    #[arg(long, default_value_t = 100)]
    samples: usize,

    /// Absolute error tolerance for the adaptive stepper
    #[arg(long, default_value_t = 1e-10)]
    atol: f64,

    /// Relative error tolerance for the adaptive stepper
    #[arg(long, default_value_t = 1e-10)]
    rtol: f64,

    /// Output path for the trajectory JSON
    #[arg(short, long, default_value = "trajectories.json")]
    output: PathBuf,

    /// Gzip compress the output (appends .gz to the output path)
    #[arg(long, default_value_t = false)]
    gzip: bool,
}

/// Initial conditions for one traced body
struct Scenario {
    name: &'static str,
    mass: f64,
    radius: f64,
    spatial: [f64; 3],
    norm: IntervalNorm,
    span: f64,
}

/// Expand a preset name into scenarios
///
/// Presets chosen to cover the qualitatively distinct orbit families:
/// - circular: r = 6M circular orbit, one full revolution
/// - infall: radial free fall from rest, ends at the horizon
/// - flat-null: M = 0 light ray, a straight line in disguise
/// - precession: eccentric bound orbit showing perihelion advance
/// - near-horizon: orbit launched just outside r_s, stresses the
///   adaptive stepper where the metric steepens
fn parse_scenarios(args: &Args) -> Result<Vec<Scenario>, String> {
    let presets = |name: &str| -> Option<Scenario> {
        // Circular orbit at r = 6M: v^φ = Ω v^t with Ω = sqrt(M/r³),
        // v^t = 1/sqrt(1 - 3M/r) = sqrt(2)
        let circular = Scenario {
            name: "circular",
            mass: 1.0,
            radius: 6.0,
            spatial: [0.0, 0.0, (1.0 / 216.0f64).sqrt() * 2.0f64.sqrt()],
            norm: IntervalNorm::Timelike,
            span: 2.0 * std::f64::consts::PI * 108.0f64.sqrt(),
        };
        match name {
            "circular" => Some(circular),
            "infall" => Some(Scenario {
                name: "infall",
                mass: 1.0,
                radius: 10.0,
                spatial: [0.0, 0.0, 0.0],
                norm: IntervalNorm::Timelike,
                span: 60.0,
            }),
            "flat-null" => Some(Scenario {
                name: "flat-null",
                mass: 0.0,
                radius: 3.0,
                spatial: [0.0, 0.0, 3.0f64.sqrt() / 9.0],
                norm: IntervalNorm::Null,
                span: 20.0,
            }),
            "precession" => Some(Scenario {
                name: "precession",
                mass: 1.0,
                radius: 20.0,
                spatial: [0.0, 0.0, 0.011],
                norm: IntervalNorm::Timelike,
                span: 2000.0,
            }),
            "near-horizon" => Some(Scenario {
                name: "near-horizon",
                mass: 0.5,
                radius: 1.5,
                spatial: [0.0, 0.0, 0.1],
                norm: IntervalNorm::Timelike,
                span: 60.0,
            }),
            _ => None,
        }
    };

    match args.scenario.as_str() {
        "all" => Ok(["circular", "infall", "flat-null", "precession", "near-horizon"]
            .iter()
            .filter_map(|n| presets(n))
            .collect()),
        "custom" => {
            let norm = match args.norm.as_str() {
                "timelike" => IntervalNorm::Timelike,
                "null" => IntervalNorm::Null,
                other => {
                    return Err(format!(
                        "Invalid norm: '{}'. Must be one of: timelike, null",
                        other
                    ))
                }
            };
            Ok(vec![Scenario {
                name: "custom",
                mass: args.mass,
                radius: args.radius,
                spatial: [args.v_r, args.v_theta, args.v_phi],
                norm,
                span: args.span,
            }])
        }
        name => presets(name).map(|s| vec![s]).ok_or_else(|| {
            format!(
                "Invalid scenario: '{}'. Must be one of: circular, infall, flat-null, precession, near-horizon, all, custom",
                name
            )
        }),
    }
}

/// Outcome of one traced body, including early terminations
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum TraceOutcome {
    Completed { body: Body },
    Partial { body: Body, reached: f64, reason: String },
    Failed { name: String, error: String },
}

/// Top-level output record with build provenance
#[derive(Debug, Serialize)]
struct RunManifest {
    generated: &'static str,
    git_sha: &'static str,
    rustc: &'static str,
    samples: usize,
    results: Vec<TraceOutcome>,
}

fn write_output(path: &PathBuf, json: &str, gzip: bool) -> std::io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    if gzip {
        let mut gz_path = path.clone();
        gz_path.set_extension("json.gz");
        let file = fs::File::create(&gz_path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(json.as_bytes())?;
        encoder.finish()?;
        Ok(gz_path)
    } else {
        fs::write(path, json)?;
        Ok(path.clone())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let scenarios = parse_scenarios(&args)?;

    println!("\nSchwarzschild Geodesic Tracer");
    println!("=======================================");
    println!("  Scenario: {}", args.scenario);
    println!("  Bodies: {}", scenarios.len());
    println!("  Samples per body: {}", args.samples);
    println!("  Tolerances: atol {:.1e}, rtol {:.1e}", args.atol, args.rtol);
    println!("  Build: {} ({})", env!("BUILD_GIT_SHA"), env!("BUILD_TIMESTAMP"));
    println!("=======================================\n");

    let pb = ProgressBar::new(scenarios.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} bodies {msg}")?
            .progress_chars("=> "),
    );

    // One derived connection per distinct mass, shared across bodies
    let mut cache = SpacetimeCache::new();
    let config = IntegratorConfig {
        atol: args.atol,
        rtol: args.rtol,
        ..IntegratorConfig::default()
    };

    let mut results = Vec::with_capacity(scenarios.len());

    for scenario in &scenarios {
        pb.set_message(scenario.name.to_string());

        let spacetime = cache.get_or_derive(scenario.mass).clone();
        let x0 = [0.0, scenario.radius, std::f64::consts::FRAC_PI_2, 0.0];

        let outcome = match normalize_velocity(&spacetime, &x0, scenario.spatial, scenario.norm)
        {
            Ok(v0) => {
                let start = [
                    x0[0], x0[1], x0[2], x0[3], v0[0], v0[1], v0[2], v0[3],
                ];
                let integrator = TrajectoryIntegrator::with_config(spacetime.clone(), config);
                match integrator.integrate(start, scenario.span, args.samples) {
                    Ok(trajectory) => {
                        let mut stats = ValidationStats::new(scenario.norm);
                        stats.update_trajectory(spacetime.metric(), &trajectory)?;
                        println!("  {} ok: {}", scenario.name, stats.report());

                        TraceOutcome::Completed {
                            body: Body::new(
                                scenario.name,
                                scenario.mass,
                                scenario.norm,
                                trajectory,
                            ),
                        }
                    }
                    Err(GeodesicError::Integration(failure)) => {
                        println!(
                            "  {} stopped at s = {:.4}: {} ({} samples kept)",
                            scenario.name,
                            failure.reached,
                            failure.reason,
                            failure.partial.len()
                        );
                        TraceOutcome::Partial {
                            body: Body::new(
                                scenario.name,
                                scenario.mass,
                                scenario.norm,
                                failure.partial,
                            ),
                            reached: failure.reached,
                            reason: failure.reason.to_string(),
                        }
                    }
                    Err(other) => TraceOutcome::Failed {
                        name: scenario.name.to_string(),
                        error: other.to_string(),
                    },
                }
            }
            Err(err) => TraceOutcome::Failed {
                name: scenario.name.to_string(),
                error: err.to_string(),
            },
        };

        results.push(outcome);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    let manifest = RunManifest {
        generated: env!("BUILD_TIMESTAMP"),
        git_sha: env!("BUILD_GIT_SHA"),
        rustc: env!("BUILD_RUSTC_VERSION"),
        samples: args.samples,
        results,
    };

    let json = serde_json::to_string_pretty(&manifest)?;
    let written = write_output(&args.output, &json, args.gzip)?;
    println!(
        "\nWrote {} ({:.1} KB)",
        written.display(),
        fs::metadata(&written)?.len() as f64 / 1_000.0
    );

    Ok(())
}

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate buddhaplot;
extern crate clap;
extern crate env_logger;
extern crate image;
extern crate num;
extern crate num_cpus;

use buddhaplot::gradient::PathColoring;
use buddhaplot::orbit::Mode;
use buddhaplot::plot::plot_channel;
use buddhaplot::{plot, Canvas, ComplexPlane, Curve, FractalConfig, Kernel, Plane, Renderer, Sampling, ToneMap};
use clap::{App, Arg, ArgMatches};
use env_logger::Builder;
use failure::Error;
use image::ColorType;
use log::LevelFilter;
use num::Complex;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_name<T>(s: &str, parse: fn(&str) -> Option<T>, err: &str) -> Result<(), String> {
    match parse(s) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const SAMPLES: &str = "samples";
const GRID: &str = "grid";
const SEED: &str = "seed";
const MODE: &str = "mode";
const KERNEL: &str = "kernel";
const BAILOUT: &str = "bailout";
const THRESHOLD: &str = "threshold";
const ZOOM: &str = "zoom";
const OFFSET: &str = "offset";
const COEFFICIENT: &str = "coefficient";
const TRAP: &str = "trap";
const PLANE: &str = "plane";
const PEDAGOGICAL: &str = "pedagogical";
const CURVE: &str = "curve";
const FACTOR: &str = "factor";
const EXPOSURE: &str = "exposure";
const IMPORTANCE: &str = "importance";
const VERBOSITY: &str = "verbosity";

fn kernel_from_name(name: &str) -> Option<Kernel> {
    match name {
        "quadratic" => Some(Kernel::Quadratic),
        "power" => Some(Kernel::Power),
        _ => None,
    }
}

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("buddha")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Buddhabrot-family orbit density renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the format follows the extension"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x800")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .default_value("-2.0,-1.5")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the region parameters are sampled from"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .default_value("1.0,1.5")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the region parameters are sampled from"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of worker threads"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("2000")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        10_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 10000000",
                    )
                })
                .help("Iteration cap per orbit"),
        )
        .arg(
            Arg::with_name(SAMPLES)
                .long(SAMPLES)
                .short("n")
                .takes_value(true)
                .default_value("1000000")
                .validator(|s| {
                    validate_range::<u64>(
                        &s,
                        1,
                        std::u64::MAX,
                        "Could not parse sample count",
                        "Sample count must be at least 1",
                    )
                })
                .help("Number of random parameters to trace"),
        )
        .arg(
            Arg::with_name(GRID)
                .long(GRID)
                .short("g")
                .takes_value(true)
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse grid size"))
                .help("Sample the centres of a COLUMNSxROWS grid instead of --samples random points"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .default_value("0")
                .validator(|s| {
                    validate_range::<u64>(&s, 0, std::u64::MAX, "Could not parse seed", "")
                })
                .help("Seed for the random sampler"),
        )
        .arg(
            Arg::with_name(MODE)
                .long(MODE)
                .short("m")
                .takes_value(true)
                .default_value("escaped")
                .validator(|s| validate_name(&s, Mode::from_name, "Unknown mode"))
                .help("Which orbits are registered, and how: escaped, converged, primitive, path, fieldlines or orbittrap"),
        )
        .arg(
            Arg::with_name(KERNEL)
                .long(KERNEL)
                .takes_value(true)
                .default_value("quadratic")
                .validator(|s| validate_name(&s, kernel_from_name, "Unknown kernel"))
                .help("The map to iterate: quadratic or power"),
        )
        .arg(
            Arg::with_name(BAILOUT)
                .long(BAILOUT)
                .short("b")
                .takes_value(true)
                .default_value("4.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse bailout",
                        "Bailout must be positive",
                    )
                })
                .help("Squared magnitude past which an orbit has escaped"),
        )
        .arg(
            Arg::with_name(THRESHOLD)
                .long(THRESHOLD)
                .takes_value(true)
                .default_value("0")
                .validator(|s| {
                    validate_range::<usize>(&s, 0, std::usize::MAX, "Could not parse threshold", "")
                })
                .help("Orbits shorter than this are not registered"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("1.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse zoom",
                        "Zoom must be positive",
                    )
                })
                .help("Magnification of the view"),
        )
        .arg(
            Arg::with_name(OFFSET)
                .long(OFFSET)
                .takes_value(true)
                .default_value("0.4,0.0")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse offset"))
                .help("Added to every plotted value before it is scaled"),
        )
        .arg(
            Arg::with_name(COEFFICIENT)
                .long(COEFFICIENT)
                .takes_value(true)
                .default_value("1.0,0.0")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse coefficient"))
                .help("Multiplies both terms of the quadratic map"),
        )
        .arg(
            Arg::with_name(TRAP)
                .long(TRAP)
                .takes_value(true)
                .default_value("0.0,0.0")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse trap point"))
                .help("The point orbittrap measures distances to"),
        )
        .arg(
            Arg::with_name(PLANE)
                .long(PLANE)
                .short("p")
                .takes_value(true)
                .default_value("zrzi")
                .validator(|s| validate_name(&s, Plane::from_name, "Unknown plane"))
                .help("Coordinates plotted: zrzi, zrcr, zrci, zicr, zici or crci"),
        )
        .arg(
            Arg::with_name(PEDAGOGICAL)
                .long(PEDAGOGICAL)
                .help("Colour paths by length with a small fixed palette"),
        )
        .arg(
            Arg::with_name(CURVE)
                .long(CURVE)
                .short("c")
                .takes_value(true)
                .default_value("exp")
                .validator(|s| validate_name(&s, Curve::from_name, "Unknown curve"))
                .help("Tone mapping curve: linear, log, sqrt or exp"),
        )
        .arg(
            Arg::with_name(FACTOR)
                .long(FACTOR)
                .short("f")
                .takes_value(true)
                .default_value("1.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse factor",
                        "Factor must be positive",
                    )
                })
                .help("Passed to the tone mapping curve"),
        )
        .arg(
            Arg::with_name(EXPOSURE)
                .long(EXPOSURE)
                .short("e")
                .takes_value(true)
                .default_value("1.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse exposure",
                        "Exposure must be positive",
                    )
                })
                .help("What each channel's maximum maps to before clipping"),
        )
        .arg(
            Arg::with_name(IMPORTANCE)
                .long(IMPORTANCE)
                .takes_value(true)
                .help("Also write the importance map to this file"),
        )
        .arg(
            Arg::with_name(VERBOSITY)
                .long(VERBOSITY)
                .short("v")
                .takes_value(true)
                .default_value("error")
                .validator(|s| match LevelFilter::from_str(&s) {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Unknown verbosity level".to_string()),
                })
                .help("Set verbosity level for output (trace, debug, info, warn, default: error)"),
        )
        .get_matches()
}

// The validators have already run; these only fail when a value has
// no default and was not given.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| format_err!("Could not read --{}", name))
}

fn pair<T: FromStr>(matches: &ArgMatches, name: &str, separator: char) -> Result<(T, T), Error> {
    matches
        .value_of(name)
        .and_then(|s| parse_pair(s, separator))
        .ok_or_else(|| format_err!("Could not read --{}", name))
}

fn complex(matches: &ArgMatches, name: &str) -> Result<Complex<f64>, Error> {
    matches
        .value_of(name)
        .and_then(parse_complex)
        .ok_or_else(|| format_err!("Could not read --{}", name))
}

fn named<T>(matches: &ArgMatches, name: &str, parse: fn(&str) -> Option<T>) -> Result<T, Error> {
    matches
        .value_of(name)
        .and_then(parse)
        .ok_or_else(|| format_err!("Could not read --{}", name))
}

fn config(matches: &ArgMatches) -> Result<FractalConfig, Error> {
    let (width, height) = pair::<u16>(matches, SIZE, 'x')?;
    let mut config = FractalConfig::new(width as usize, height as usize, value(matches, ITERATIONS)?)?
        .with_view(value(matches, ZOOM)?, complex(matches, OFFSET)?)?;
    config.bailout = value(matches, BAILOUT)?;
    config.threshold = value(matches, THRESHOLD)?;
    config.coefficient = complex(matches, COEFFICIENT)?;
    config.trap = complex(matches, TRAP)?;
    config.kernel = named(matches, KERNEL, kernel_from_name)?;
    config.plane = named(matches, PLANE, Plane::from_name)?;
    config.importance = matches.is_present(IMPORTANCE);
    if matches.is_present(PEDAGOGICAL) {
        config.path_coloring = PathColoring::pedagogical();
    }
    Ok(config)
}

fn sampling(matches: &ArgMatches) -> Result<Sampling, Error> {
    if matches.is_present(GRID) {
        let (columns, rows) = pair(matches, GRID, 'x')?;
        Ok(Sampling::Grid { columns, rows })
    } else {
        Ok(Sampling::Random {
            samples: value(matches, SAMPLES)?,
            seed: value(matches, SEED)?,
        })
    }
}

fn write_image(outfile: &str, canvas: &Canvas) -> Result<(), Error> {
    image::save_buffer(
        outfile,
        canvas.as_bytes(),
        canvas.width() as u32,
        canvas.height() as u32,
        ColorType::RGBA(8),
    )?;
    info!("wrote {}", outfile);
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let config = config(matches)?;
    let region = ComplexPlane::new(complex(matches, LEFTLOWER)?, complex(matches, RIGHTUPPER)?)?;
    let mode = named(matches, MODE, Mode::from_name)?;
    let threads: usize = value(matches, THREADS)?;
    let tone = ToneMap {
        curve: named(matches, CURVE, Curve::from_name)?,
        factor: value(matches, FACTOR)?,
        exposure: value(matches, EXPOSURE)?,
    };

    let renderer = Renderer::new(config, mode, region, sampling(matches)?, threads)?;
    let (histogram, stats) = renderer.render()?;
    if stats.registered == 0 {
        warn!("no orbits were registered; the image will be empty");
    }

    let canvas = plot(&histogram, &tone, threads)?;
    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| format_err!("No output file given"))?;
    write_image(output, &canvas)?;

    if let (Some(path), Some(importance)) = (matches.value_of(IMPORTANCE), histogram.importance.as_ref()) {
        write_image(path, &plot_channel(importance, tone.exposure))?;
    }
    Ok(())
}

fn main() {
    let matches = args();

    let level = matches
        .value_of(VERBOSITY)
        .and_then(|s| LevelFilter::from_str(s).ok())
        .unwrap_or(LevelFilter::Error);
    let mut builder = Builder::from_default_env();
    builder.filter_level(level).init();

    info!("'{}' version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}

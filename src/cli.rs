use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::filters::{self, BoxBlur, GaussianBlur, MotionBlur};

pub const USAGE: &str = "\
usage: rusty-retouch <input> <output> [options] [operations]

options:
  --threads <n>        worker threads (default: RETOUCH_THREADS or all cores)
  --scale <f>          resample factor applied when saving (default 1.0)

operations, applied in order:
  --blur <sigma>       gaussian blur
  --box-blur <radius>  box blur
  --motion-blur <len>  horizontal motion streak over len pixels
  --brightness <beta>  add beta to every color sample
  --contrast <alpha>   multiply every color sample by alpha
  --grayscale
  --sepia
  --vignette <amount>  darken corners, amount in [0, 1]
  --flip               mirror horizontally
  --crop-square        keep the largest centered square
  --resize <f>         resample the working image by factor f
  --undo               revert the previous operation";

#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Blur(f32),
    BoxBlur(usize),
    MotionBlur(usize),
    Brightness(f32),
    Contrast(f32),
    Grayscale,
    Sepia,
    Vignette(f32),
    Flip,
    CropSquare,
    Resize(f64),
    Undo,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CliOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub threads: Option<usize>,
    pub scale: f64,
    pub operations: Vec<Operation>,
}

/// Parse arguments (without the program name). `Ok(None)` means help was requested.
pub fn parse_args<I>(args: I) -> Result<Option<CliOptions>>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut positional = Vec::new();
    let mut threads = None;
    let mut scale = 1.0;
    let mut operations = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--threads" => threads = Some(value(&mut args, &arg)?),
            "--scale" => scale = value(&mut args, &arg)?,
            "--blur" => operations.push(Operation::Blur(value(&mut args, &arg)?)),
            "--box-blur" => operations.push(Operation::BoxBlur(value(&mut args, &arg)?)),
            "--motion-blur" => operations.push(Operation::MotionBlur(value(&mut args, &arg)?)),
            "--brightness" => operations.push(Operation::Brightness(value(&mut args, &arg)?)),
            "--contrast" => operations.push(Operation::Contrast(value(&mut args, &arg)?)),
            "--vignette" => operations.push(Operation::Vignette(value(&mut args, &arg)?)),
            "--grayscale" => operations.push(Operation::Grayscale),
            "--sepia" => operations.push(Operation::Sepia),
            "--flip" => operations.push(Operation::Flip),
            "--crop-square" => operations.push(Operation::CropSquare),
            "--resize" => operations.push(Operation::Resize(value(&mut args, &arg)?)),
            "--undo" => operations.push(Operation::Undo),
            flag if flag.starts_with("--") => {
                return Err(EngineError::config(format!("unknown option {flag}")));
            }
            path => positional.push(PathBuf::from(path)),
        }
    }

    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (Some(input), Some(output), None) => Ok(Some(CliOptions {
            input,
            output,
            threads,
            scale,
            operations,
        })),
        _ => Err(EngineError::config("expected exactly an input and an output path")),
    }
}

fn value<T: std::str::FromStr>(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<T> {
    let raw = args
        .next()
        .ok_or_else(|| EngineError::config(format!("{flag} needs a value")))?;
    raw.parse()
        .map_err(|_| EngineError::config(format!("invalid value {raw:?} for {flag}")))
}

/// Load, edit and save one image.
pub fn run(options: &CliOptions) -> Result<()> {
    let mut config = EngineConfig::from_env();
    if let Some(threads) = options.threads {
        config = config.with_worker_threads(threads);
    }
    let engine = Engine::new(&config)?;

    let bytes = std::fs::read(&options.input)?;
    let mut canvas = engine.open(&bytes)?;
    log::info!("loaded {}: {}", options.input.display(), canvas.analysis()?);

    for op in &options.operations {
        log::debug!("applying {op:?}");
        match *op {
            Operation::Blur(sigma) => canvas.apply_filter(&engine, &GaussianBlur::new(sigma)?)?,
            Operation::BoxBlur(radius) => canvas.apply_filter(&engine, &BoxBlur::new(radius)?)?,
            Operation::MotionBlur(length) => {
                canvas.apply_filter(&engine, &MotionBlur::new(length, 0.0)?)?
            }
            Operation::Brightness(beta) => canvas.apply_point(&engine, |s, buf| {
                filters::brightness_contrast(s, buf, 1.0, beta)
            })?,
            Operation::Contrast(alpha) => canvas.apply_point(&engine, |s, buf| {
                filters::brightness_contrast(s, buf, alpha, 0.0)
            })?,
            Operation::Grayscale => canvas.apply_point(&engine, filters::grayscale)?,
            Operation::Sepia => canvas.apply_point(&engine, filters::sepia)?,
            Operation::Vignette(amount) => {
                canvas.apply_point(&engine, |s, buf| filters::vignette(s, buf, amount))?
            }
            Operation::Flip => canvas.apply_point(&engine, filters::flip_horizontal)?,
            Operation::CropSquare => canvas.commit_edit(filters::crop_center_square)?,
            Operation::Resize(factor) => canvas.commit_edit(|buf| filters::scale(buf, factor))?,
            Operation::Undo => {
                if !canvas.undo() {
                    log::warn!("nothing to undo");
                }
            }
        }
    }

    canvas.save(&options.output, options.scale)?;
    log::info!("result: {}", canvas.analysis()?);
    drop(canvas);
    engine.shutdown();
    Ok(())
}

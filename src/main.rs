use anyhow::{bail, Result};
use clap::Parser;
use daxpy::{
    allocator::Allocator,
    driver::{self, DriverConfig, Mode},
    kernel::Dispatch,
    scalar::ScalarType,
};
use std::{
    io::{self, Write},
    process::ExitCode,
};

/// Computes a * X + Y over X = Y = [1, 2, ..., N] and prints the vectors
/// before and after.
#[derive(Parser, Debug)]
#[command(name = "daxpy")]
struct Cli {
    /// Number of elements.
    #[arg(short = 'n', long = "len", default_value_t = 5)]
    len: usize,
    /// The scalar a.
    #[arg(short = 'a', long = "alpha", default_value_t = 2., allow_negative_numbers = true)]
    alpha: f64,
    #[arg(long = "mode", value_enum, default_value_t = Mode::InPlace)]
    mode: Mode,
    /// Element type, f32 or f64.
    #[arg(long = "scalar", default_value = "f64")]
    scalar: ScalarType,
    /// Split the index range across the rayon pool.
    #[arg(long = "parallel")]
    parallel: bool,
    /// Items per parallel chunk.
    #[arg(
        long = "chunk-size",
        default_value_t = Dispatch::DEFAULT_CHUNK_SIZE,
        requires = "parallel"
    )]
    chunk_size: usize,
    /// Maximum bytes the vectors may occupy.
    #[arg(long = "memory-limit")]
    memory_limit: Option<usize>,
    /// Refuse the allocation request with this zero based index.
    #[arg(long = "fail-allocation", hide = true)]
    fail_allocation: Option<usize>,
}

impl Cli {
    fn config(&self) -> DriverConfig {
        let dispatch = if self.parallel {
            Dispatch::Parallel {
                chunk_size: self.chunk_size,
            }
        } else {
            Dispatch::Serial
        };
        DriverConfig {
            len: self.len,
            alpha: self.alpha,
            mode: self.mode,
            dispatch,
        }
    }
    fn allocator(&self) -> Allocator {
        let mut builder = Allocator::builder();
        if let Some(limit) = self.memory_limit {
            builder = builder.limit(limit);
        }
        if let Some(index) = self.fail_allocation {
            builder = builder.fail_at(index);
        }
        builder.build()
    }
}

fn try_main(cli: Cli) -> Result<()> {
    let config = cli.config();
    let allocator = cli.allocator();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.scalar {
        ScalarType::F32 => {
            driver::run::<f32, _>(&config, &allocator, &mut out)?;
        }
        ScalarType::F64 => {
            driver::run::<f64, _>(&config, &allocator, &mut out)?;
        }
        scalar_type => bail!("unsupported scalar type {scalar_type}"),
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("{cli:?}");
    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

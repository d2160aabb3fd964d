use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use shiftflow::Package;
use shiftflow_std::{BarrelShifterConfig, BarrelShifterGenerator, Mode};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Elaborates barrel shifters and writes them as Verilog.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// log2 of the data width; may be given several times
    #[arg(short, long, default_values_t = [5])]
    power: Vec<usize>,

    /// Shift mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Lsr)]
    mode: ModeArg,

    /// Output directory
    #[arg(short, long, default_value = "build")]
    out: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Logical shift right
    Lsr,
    /// Arithmetic shift right
    Asr,
    /// Rotate right
    Ror,
    /// One module per mode
    All,
}

impl ModeArg {
    fn modes(self) -> Vec<Mode> {
        match self {
            ModeArg::Lsr => vec![Mode::LogicalShift],
            ModeArg::Asr => vec![Mode::ArithmeticShift],
            ModeArg::Ror => vec![Mode::Rotate],
            ModeArg::All => vec![Mode::LogicalShift, Mode::ArithmeticShift, Mode::Rotate],
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut package = Package::default();
    for &power in &cli.power {
        for mode in cli.mode.modes() {
            let config = BarrelShifterConfig { power, mode };
            let (module, _) = BarrelShifterGenerator::new(config)
                .generate()
                .with_context(|| format!("failed to generate barrel shifter with power {} in mode {}", power, mode))?;
            package.add(module);
        }
    }

    package.gen_vir(&cli.out).with_context(|| format!("failed to write Verilog to {}", cli.out.display()))?;
    info!(modules = package.modules.len(), out = %cli.out.display(), "done");
    Ok(())
}

use clap::Parser;

use vidflow::common::cpuinfo;
use vidflow::common::msr::DevMsr;
use vidflow::pstate::{apply, report, PstateBounds};
use vidflow::{RequestTable, Result};

#[derive(Parser, Debug)]
#[command(name = "vidflow")]
#[command(about = "P-state voltage (VID) and clock divisor control for AMD Family 14h CPUs")]
struct Args {
    #[arg(short, long, help = "Display the current P-state for all cpu cores")]
    current: bool,

    #[arg(short, long, help = "Read and display all valid P-state configurations")]
    read: bool,

    #[arg(
        short = 'p',
        long = "pstate",
        value_name = "N:VID[,DIV]",
        help = "Set VID (and, if supplied, divisor) for P-state N on all cores (repeatable)",
        action = clap::ArgAction::Append
    )]
    pstates: Vec<String>,

    #[arg(
        short,
        long,
        help = "Enable verbose logging (shows all MSR read/write operations)"
    )]
    verbose: bool,
}

fn run(args: &Args) -> Result<()> {
    // Requests are parsed and cross-checked before any hardware is touched;
    // a malformed or duplicate request exits here.
    let mut requests = RequestTable::new();
    for spec in &args.pstates {
        requests.add_spec(spec)?;
    }

    let cpu = cpuinfo::probe()?;
    tracing::info!(
        "Detected supported CPU: family 14h model {}, {} cores",
        cpu.model,
        cpu.cores
    );

    DevMsr::check_available()?;
    let io = DevMsr::new();

    let bounds = PstateBounds::resolve(&io)?;
    tracing::debug!("Usable P-states: {}-{}", bounds.min, bounds.max);

    if args.read {
        report::dump_pstates(&io, bounds)?;
    }

    if !requests.is_empty() {
        apply::apply_requests(&io, bounds, cpu.cores, &requests)?;
    }

    if args.current {
        report::current_states(&io, cpu.cores)?;
    }

    Ok(())
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();

    // Setup logging based on verbose flag
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(log_level).init();

    match run(&args) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}

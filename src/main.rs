//! Run the boolean filter on two cubes (or two legacy VTK files) and write
//! one of its outputs.

use clap::{Parser, ValueEnum};
use meshbool::boolean::{BooleanFilter, OperMode};
use meshbool::float_types::Real;
use meshbool::io::{PolyDataWriter, read_vtk_file};
use meshbool::pipeline::Stage;
use meshbool::sources::CubeSource;
use nalgebra::Vector3;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Vtk,
    Stl,
}

#[derive(Parser)]
#[command(name = "meshbool")]
#[command(about = "Boolean operations and contact lines between polygonal surfaces")]
struct Args {
    /// First surface as legacy VTK; a unit cube when omitted
    #[arg(long)]
    input_a: Option<PathBuf>,

    /// Second surface as legacy VTK; a unit cube when omitted
    #[arg(long)]
    input_b: Option<PathBuf>,

    /// Translation applied to the second cube
    #[arg(long, value_delimiter = ',', num_args = 3, default_value = "0,0,0")]
    offset: Vec<Real>,

    /// none, union, intersection, difference or difference2
    #[arg(long, default_value_t = OperMode::Union)]
    operation: OperMode,

    /// Output port to write: 0 for the result, 1 for the contact lines
    #[arg(long, default_value_t = 1)]
    port: usize,

    #[arg(short, long, default_value = "test.vtk")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Vtk)]
    format: Format,

    /// Enable debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let fallback = if verbose { "meshbool=debug,info" } else { "meshbool=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();
}

fn input_stage(path: Option<&PathBuf>, offset: Vector3<Real>) -> Result<Stage, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => Stage::from_data(read_vtk_file(path)?),
        None => Stage::new(CubeSource::default().translated(offset)),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logger(args.verbose);

    let offset = match args.offset.as_slice() {
        [x, y, z] => Vector3::new(*x, *y, *z),
        other => return Err(format!("--offset needs 3 values, got {}", other.len()).into()),
    };

    let a = input_stage(args.input_a.as_ref(), Vector3::zeros())?;
    let b = input_stage(args.input_b.as_ref(), offset)?;

    let boolean = Stage::new(BooleanFilter::new(args.operation));
    boolean.set_input_connection(0, a.output_port(0))?;
    boolean.set_input_connection(1, b.output_port(0))?;

    match args.format {
        Format::Vtk => {
            let writer = Stage::new(PolyDataWriter::new(&args.output));
            writer.set_input_connection(0, boolean.output_port(args.port))?;
            writer.update()?;
        },
        Format::Stl => {
            let pd = boolean.update_and_output(args.port)?;
            if pd.cells.iter().all(|c| !c.kind.is_polygonal()) {
                tracing::warn!(port = args.port, "output has no polygons, the STL file will be empty");
            }
            std::fs::write(&args.output, meshbool::io::to_stl_binary(&pd)?)?;
        },
    }

    tracing::info!(output = %args.output.display(), operation = %args.operation, "done");
    Ok(())
}

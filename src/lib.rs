//! Contact lines and **boolean operations** (*union*, *intersection*, *difference*)
//! between two polygonal surfaces, driven through a small demand-driven pipeline
//! of sources, filters and writers connected by ports.
//!
//! ```no_run
//! use meshbool::boolean::BooleanFilter;
//! use meshbool::io::PolyDataWriter;
//! use meshbool::pipeline::Stage;
//! use meshbool::sources::CubeSource;
//!
//! # fn main() -> Result<(), meshbool::errors::FilterError> {
//! let cube_a = Stage::new(CubeSource::default());
//! let cube_b = Stage::new(CubeSource::default());
//!
//! let boolean = Stage::new(BooleanFilter::default());
//! boolean.set_input_connection(0, cube_a.output_port(0))?;
//! boolean.set_input_connection(1, cube_b.output_port(0))?;
//!
//! let writer = Stage::new(PolyDataWriter::new("test.vtk"));
//! writer.set_input_connection(0, boolean.output_port(1))?;
//! writer.update()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//! #### Default
//! - **stl-io**: `.stl` export through `stl_io`
//! - **cli**: the `meshbool` command line tool
//!
//! #### Optional
//! - **parallel**: use rayon inside the BSP set operations

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod aabb;
pub mod boolean;
pub mod contact;
pub mod errors;
pub mod float_types;
pub mod io;
pub mod locator;
pub mod mesh;
pub mod pipeline;
pub mod polydata;
pub mod sources;
pub mod vispoly;

pub use boolean::{BooleanFilter, OperMode};
pub use contact::ContactFilter;
pub use polydata::{Cell, CellType, IdArray, NOT_SET, PolyData};

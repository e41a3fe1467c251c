//! Reading and writing `PolyData`.

use crate::errors::FilterError;
use crate::pipeline::Algorithm;
use crate::polydata::PolyData;
use std::path::PathBuf;

mod vtk;

#[cfg(feature = "stl-io")]
mod stl;

pub use vtk::{read_vtk, read_vtk_file, write_vtk, write_vtk_file};

#[cfg(feature = "stl-io")]
pub use stl::{to_stl_ascii, to_stl_binary};

/// Generic I/O and format errors.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("std::io::Error: {0}")]
    StdIo(#[from] std::io::Error),

    #[error("could not parse float: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error("could not parse integer: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("input is malformed: {0}")]
    MalformedInput(String),

    #[error("feature is not implemented: {0}")]
    Unimplemented(String),
}

/// Pipeline sink writing its single input as legacy VTK.
#[derive(Debug, Clone)]
pub struct PolyDataWriter {
    pub file_name: PathBuf,
}

impl PolyDataWriter {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl Algorithm for PolyDataWriter {
    fn name(&self) -> &str {
        "PolyDataWriter"
    }

    fn number_of_input_ports(&self) -> usize {
        1
    }

    fn number_of_output_ports(&self) -> usize {
        0
    }

    fn request_data(&mut self, inputs: &[&PolyData]) -> Result<Vec<PolyData>, FilterError> {
        write_vtk_file(inputs[0], &self.file_name)?;
        tracing::info!(
            file = %self.file_name.display(),
            points = inputs[0].number_of_points(),
            cells = inputs[0].number_of_cells(),
            "wrote polydata"
        );
        Ok(Vec::new())
    }
}

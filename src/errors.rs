//! Filter and pipeline errors

use crate::io::IoError;
use std::fmt::Display;

/// Which of the two filter inputs an error or a piece of geometry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "first"),
            Side::B => write!(f, "second"),
        }
    }
}

/// All the ways a pipeline update can fail.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("{0} input does not contain any supported cells")]
    NoSupportedCells(Side),

    #[error("{0} input has non-manifold edges which are involved in the intersection")]
    NonManifold(Side),

    #[error("{stage}: input port {port} is not connected")]
    UnconnectedInput { stage: String, port: usize },

    #[error("{stage}: input port {port} is out of range ({count} input ports)")]
    InvalidInputPort {
        stage: String,
        port: usize,
        count: usize,
    },

    #[error("{stage}: output port {port} is out of range ({count} output ports)")]
    InvalidOutputPort {
        stage: String,
        port: usize,
        count: usize,
    },

    #[error("{stage} produced {got} outputs, expected {expected}")]
    OutputCount {
        stage: String,
        expected: usize,
        got: usize,
    },

    #[error("{0}: pipeline contains a cycle")]
    Cycle(String),

    #[error("{0}: no outputs, the stage has not executed successfully")]
    NoOutput(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Io(#[from] IoError),
}

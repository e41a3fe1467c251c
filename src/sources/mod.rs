//! Primitive sources feeding a pipeline.

mod cube;

pub use cube::CubeSource;

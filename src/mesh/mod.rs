//! Facets and BSP trees used for the set operations of the boolean filter.

pub mod bsp;
pub mod plane;
pub mod polygon;
pub mod vertex;

pub use bsp::Node;
pub use plane::Plane;
pub use polygon::Polygon;
pub use vertex::Vertex;

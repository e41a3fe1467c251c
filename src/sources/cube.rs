use crate::errors::FilterError;
use crate::float_types::Real;
use crate::pipeline::Algorithm;
use crate::polydata::{CellType, PolyData};
use nalgebra::{Point3, Vector3};

/// Axis-aligned box made of six quads sharing eight points.
///
/// Faces are wound counter-clockwise when seen from outside, so the surface
/// is closed, manifold and has positive volume.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeSource {
    pub x_length: Real,
    pub y_length: Real,
    pub z_length: Real,
    pub center: Point3<Real>,
}

impl Default for CubeSource {
    fn default() -> Self {
        Self {
            x_length: 1.0,
            y_length: 1.0,
            z_length: 1.0,
            center: Point3::origin(),
        }
    }
}

impl CubeSource {
    pub const fn new(x_length: Real, y_length: Real, z_length: Real, center: Point3<Real>) -> Self {
        Self {
            x_length,
            y_length,
            z_length,
            center,
        }
    }

    /// Same box moved by `offset`.
    pub fn translated(mut self, offset: Vector3<Real>) -> Self {
        self.center += offset;
        self
    }

    pub fn polydata(&self) -> Result<PolyData, FilterError> {
        let lengths = [self.x_length, self.y_length, self.z_length];
        if lengths.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
            return Err(FilterError::InvalidParameter(format!(
                "cube lengths must be positive, got {lengths:?}"
            )));
        }

        let h = Vector3::new(self.x_length, self.y_length, self.z_length) * 0.5;
        let c = self.center;

        // Point i has x = +h when bit 0 is set, y when bit 1, z when bit 2.
        let mut pd = PolyData::new();
        for i in 0..8 {
            let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
            let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
            let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
            pd.add_point(Point3::new(c.x + sx * h.x, c.y + sy * h.y, c.z + sz * h.z));
        }

        let faces: [[usize; 4]; 6] = [
            [0, 4, 6, 2], // -x
            [1, 3, 7, 5], // +x
            [0, 1, 5, 4], // -y
            [2, 6, 7, 3], // +y
            [0, 2, 3, 1], // -z
            [4, 5, 7, 6], // +z
        ];
        for f in faces {
            pd.insert_cell(CellType::Quad, f.to_vec());
        }
        Ok(pd)
    }
}

impl Algorithm for CubeSource {
    fn name(&self) -> &str {
        "CubeSource"
    }

    fn number_of_input_ports(&self) -> usize {
        0
    }

    fn number_of_output_ports(&self) -> usize {
        1
    }

    fn request_data(&mut self, _inputs: &[&PolyData]) -> Result<Vec<PolyData>, FilterError> {
        Ok(vec![self.polydata()?])
    }
}

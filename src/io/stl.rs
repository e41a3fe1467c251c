use super::IoError;
use crate::float_types::Real;
use crate::polydata::{PolyData, newell_normal};
use nalgebra::{Point3, Vector3};
use std::io::Cursor;

/// Fan triangles of every polygonal cell with the facet normal.
fn visit_triangles<F>(pd: &PolyData, mut visit: F)
where
    F: FnMut(Vector3<Real>, [Point3<Real>; 3]),
{
    for cell in pd.cells.iter().filter(|c| c.kind.is_polygonal()) {
        let Some((&first, rest)) = cell.ids.split_first() else {
            continue;
        };
        let normal = newell_normal(cell.ids.iter().map(|&i| pd.points[i]));
        for w in rest.windows(2) {
            visit(normal, [pd.points[first], pd.points[w[0]], pd.points[w[1]]]);
        }
    }
}

/// Export the polygonal cells of `pd` as an **ASCII STL** solid named `name`.
///
/// ```rust
/// # use meshbool::sources::CubeSource;
/// let cube = CubeSource::default().polydata().unwrap();
/// let text = meshbool::io::to_stl_ascii(&cube, "cube");
/// assert_eq!(text.matches("facet normal").count(), 12);
/// ```
pub fn to_stl_ascii(pd: &PolyData, name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("solid {name}\n"));

    visit_triangles(pd, |n, tri| {
        out.push_str(&format!("  facet normal {:.6} {:.6} {:.6}\n", n.x, n.y, n.z));
        out.push_str("    outer loop\n");
        for p in &tri {
            out.push_str(&format!("      vertex {:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    });

    out.push_str(&format!("endsolid {name}\n"));
    out
}

/// Export the polygonal cells of `pd` as **binary STL** bytes.
pub fn to_stl_binary(pd: &PolyData) -> Result<Vec<u8>, IoError> {
    use stl_io::{Normal, Triangle, Vertex, write_stl};

    let mut triangles = Vec::<Triangle>::new();

    visit_triangles(pd, |n, tri| {
        #[allow(clippy::unnecessary_cast)]
        {
            triangles.push(Triangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: tri.map(|p| Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
            });
        }
    });

    let mut cursor = Cursor::new(Vec::new());
    write_stl(&mut cursor, triangles.iter())?;
    Ok(cursor.into_inner())
}

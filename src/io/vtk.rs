//! Legacy VTK ASCII polydata.
//!
//! Cells are stored per section (`VERTICES`, `LINES`, `POLYGONS`,
//! `TRIANGLE_STRIPS`), so the writer emits them grouped in that order and
//! reorders cell data to match. Cell and point data are written as `FIELD`
//! arrays of `vtkIdType`.

use super::IoError;
use crate::polydata::{CellType, IdArray, PolyData};
use nalgebra::Point3;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

const SECTIONS: [&str; 4] = ["VERTICES", "LINES", "POLYGONS", "TRIANGLE_STRIPS"];

const fn section_of(kind: CellType) -> usize {
    match kind {
        CellType::Vertex | CellType::PolyVertex => 0,
        CellType::Line | CellType::PolyLine => 1,
        CellType::Triangle | CellType::Quad | CellType::Polygon => 2,
        CellType::TriangleStrip => 3,
    }
}

fn kind_in_section(section: usize, num_ids: usize) -> CellType {
    match section {
        0 if num_ids == 1 => CellType::Vertex,
        0 => CellType::PolyVertex,
        1 if num_ids == 2 => CellType::Line,
        1 => CellType::PolyLine,
        2 => CellType::for_polygon(num_ids),
        _ => CellType::TriangleStrip,
    }
}

fn write_field(out: &mut String, arrays: &[IdArray]) {
    let _ = writeln!(out, "FIELD FieldData {}", arrays.len());
    for arr in arrays {
        let _ = writeln!(out, "{} {} {} vtkIdType", arr.name, arr.components, arr.len());
        for tuple in arr.values.chunks(arr.components) {
            let line: Vec<String> = tuple.iter().map(i64::to_string).collect();
            let _ = writeln!(out, "{}", line.join(" "));
        }
    }
}

/// The whole file as a string.
pub fn to_vtk_string(pd: &PolyData) -> String {
    let mut out = String::new();
    out.push_str("# vtk DataFile Version 3.0\n");
    out.push_str("vtk output\n");
    out.push_str("ASCII\n");
    out.push_str("DATASET POLYDATA\n");

    let _ = writeln!(out, "POINTS {} double", pd.number_of_points());
    for p in &pd.points {
        let _ = writeln!(out, "{} {} {}", p.x, p.y, p.z);
    }

    let mut order = Vec::with_capacity(pd.number_of_cells());
    for (section, keyword) in SECTIONS.iter().enumerate() {
        let cells: Vec<usize> = (0..pd.number_of_cells())
            .filter(|&c| section_of(pd.cell_type(c)) == section)
            .collect();
        if cells.is_empty() {
            continue;
        }

        let size: usize = cells.iter().map(|&c| pd.cell_points(c).len() + 1).sum();
        let _ = writeln!(out, "{keyword} {} {size}", cells.len());
        for &c in &cells {
            let ids = pd.cell_points(c);
            let _ = write!(out, "{}", ids.len());
            for id in ids {
                let _ = write!(out, " {id}");
            }
            out.push('\n');
        }
        order.extend(cells);
    }

    let cell_data: Vec<IdArray> = pd
        .cell_data
        .iter()
        .filter(|a| a.len() == pd.number_of_cells())
        .map(|a| a.reordered(&order))
        .collect();
    if !cell_data.is_empty() {
        let _ = writeln!(out, "CELL_DATA {}", pd.number_of_cells());
        write_field(&mut out, &cell_data);
    }

    let point_data: Vec<IdArray> = pd
        .point_data
        .iter()
        .filter(|a| a.len() == pd.number_of_points())
        .cloned()
        .collect();
    if !point_data.is_empty() {
        let _ = writeln!(out, "POINT_DATA {}", pd.number_of_points());
        write_field(&mut out, &point_data);
    }

    out
}

pub fn write_vtk<W: Write>(pd: &PolyData, writer: &mut W) -> Result<(), IoError> {
    writer.write_all(to_vtk_string(pd).as_bytes())?;
    Ok(())
}

pub fn write_vtk_file<P: AsRef<Path>>(pd: &PolyData, path: P) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_vtk(pd, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Whitespace separated tokens after the two header lines.
struct Tokens<'a> {
    inner: std::str::SplitAsciiWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn next_str(&mut self, what: &str) -> Result<&'a str, IoError> {
        self.inner
            .next()
            .ok_or_else(|| IoError::MalformedInput(format!("unexpected end of file, expected {what}")))
    }

    fn next_parsed<T>(&mut self, what: &str) -> Result<T, IoError>
    where
        T: FromStr,
        IoError: From<T::Err>,
    {
        Ok(self.next_str(what)?.parse::<T>()?)
    }

    fn expect(&mut self, keyword: &str) -> Result<(), IoError> {
        let token = self.next_str(keyword)?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(IoError::MalformedInput(format!("expected {keyword}, found {token}")))
        }
    }
}

fn read_field(tokens: &mut Tokens, expected_tuples: usize) -> Result<Vec<IdArray>, IoError> {
    tokens.expect("FIELD")?;
    let _field_name = tokens.next_str("field name")?;
    let count: usize = tokens.next_parsed("number of arrays")?;

    let mut arrays = Vec::new();
    for _ in 0..count {
        let name = tokens.next_str("array name")?;
        let components: usize = tokens.next_parsed("number of components")?;
        let tuples: usize = tokens.next_parsed("number of tuples")?;
        let data_type = tokens.next_str("data type")?;

        if tuples != expected_tuples {
            return Err(IoError::MalformedInput(format!(
                "array {name} has {tuples} tuples, expected {expected_tuples}"
            )));
        }

        let total = components
            .checked_mul(tuples)
            .filter(|_| components > 0)
            .ok_or_else(|| IoError::MalformedInput(format!("array {name} has {components} x {tuples} values")))?;

        // grow with the values actually present
        let mut values = Vec::new();
        for _ in 0..total {
            let v = match data_type {
                "float" | "double" => tokens.next_parsed::<f64>("array value")? as i64,
                _ => tokens.next_parsed::<i64>("array value")?,
            };
            values.push(v);
        }
        arrays.push(IdArray::from_values(name, components, values));
    }
    Ok(arrays)
}

/// Parse a legacy ASCII polydata file.
pub fn from_vtk_str(text: &str) -> Result<PolyData, IoError> {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or_default();
    if !header.starts_with("# vtk DataFile") {
        return Err(IoError::MalformedInput("missing vtk header".to_string()));
    }
    let _title = lines.next();

    let rest = match text.match_indices('\n').nth(1) {
        Some((pos, _)) => &text[pos + 1..],
        None => "",
    };
    let mut tokens = Tokens {
        inner: rest.split_ascii_whitespace(),
    };

    let format = tokens.next_str("file format")?;
    if !format.eq_ignore_ascii_case("ASCII") {
        return Err(IoError::Unimplemented(format!("{format} legacy vtk files")));
    }
    tokens.expect("DATASET")?;
    let dataset = tokens.next_str("dataset type")?;
    if !dataset.eq_ignore_ascii_case("POLYDATA") {
        return Err(IoError::Unimplemented(format!("{dataset} datasets")));
    }

    let mut pd = PolyData::new();
    // file order is section order, cell data follows it
    let mut sections: [Vec<(CellType, Vec<usize>)>; 4] = Default::default();
    let mut cell_data = Vec::new();

    while let Some(keyword) = tokens.inner.next() {
        let keyword = keyword.to_ascii_uppercase();
        match keyword.as_str() {
            "POINTS" => {
                let n: usize = tokens.next_parsed("number of points")?;
                let _data_type = tokens.next_str("point data type")?;
                for _ in 0..n {
                    let x = tokens.next_parsed("x")?;
                    let y = tokens.next_parsed("y")?;
                    let z = tokens.next_parsed("z")?;
                    pd.points.push(Point3::new(x, y, z));
                }
            },
            "VERTICES" | "LINES" | "POLYGONS" | "TRIANGLE_STRIPS" => {
                let section = SECTIONS
                    .iter()
                    .position(|s| *s == keyword)
                    .unwrap_or_default();
                let n: usize = tokens.next_parsed("number of cells")?;
                let _size: usize = tokens.next_parsed("cell list size")?;
                for _ in 0..n {
                    let k: usize = tokens.next_parsed("cell size")?;
                    let mut ids = Vec::new();
                    for _ in 0..k {
                        ids.push(tokens.next_parsed::<usize>("point id")?);
                    }
                    sections[section].push((kind_in_section(section, k), ids));
                }
            },
            "CELL_DATA" => {
                let n: usize = tokens.next_parsed("number of cells")?;
                cell_data = read_field(&mut tokens, n)?;
            },
            "POINT_DATA" => {
                let n: usize = tokens.next_parsed("number of points")?;
                pd.point_data = read_field(&mut tokens, n)?;
            },
            other => {
                return Err(IoError::Unimplemented(format!("vtk keyword {other}")));
            },
        }
    }

    for (kind, ids) in sections.into_iter().flatten() {
        if let Some(bad) = ids.iter().find(|&&i| i >= pd.number_of_points()) {
            return Err(IoError::MalformedInput(format!(
                "cell refers to point {bad}, file has {} points",
                pd.number_of_points()
            )));
        }
        pd.insert_cell(kind, ids);
    }

    for arr in cell_data {
        if arr.len() != pd.number_of_cells() {
            return Err(IoError::MalformedInput(format!(
                "cell array {} has {} tuples for {} cells",
                arr.name,
                arr.len(),
                pd.number_of_cells()
            )));
        }
        pd.set_cell_array(arr);
    }

    Ok(pd)
}

pub fn read_vtk<R: Read>(reader: R) -> Result<PolyData, IoError> {
    let mut text = String::new();
    BufReader::new(reader).read_to_string(&mut text)?;
    from_vtk_str(&text)
}

pub fn read_vtk_file<P: AsRef<Path>>(path: P) -> Result<PolyData, IoError> {
    read_vtk(File::open(path)?)
}

impl PolyData {
    pub fn to_vtk(&self) -> String {
        to_vtk_string(self)
    }

    pub fn from_vtk(text: &str) -> Result<Self, IoError> {
        from_vtk_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polydata::NOT_SET;

    #[test]
    fn mixed_cells_are_grouped_by_section() {
        let mut pd = PolyData::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.5]] {
            pd.add_point(Point3::from(p));
        }
        pd.insert_cell(CellType::Quad, vec![0, 1, 2, 3]);
        pd.insert_cell(CellType::Line, vec![0, 2]);
        pd.insert_cell(CellType::Triangle, vec![0, 1, 2]);
        pd.set_cell_array(IdArray::from_values("ids", 1, vec![10, 11, 12]));

        let text = pd.to_vtk();
        assert!(text.contains("POINTS 4 double"));
        assert!(text.contains("LINES 1 3\n2 0 2\n"));
        assert!(text.contains("POLYGONS 2 9\n4 0 1 2 3\n3 0 1 2\n"));
        assert!(text.contains("CELL_DATA 3\nFIELD FieldData 1\nids 1 3 vtkIdType\n11\n10\n12\n"));

        let back = PolyData::from_vtk(&text).unwrap();
        assert_eq!(back.points, pd.points);
        let kinds: Vec<_> = back.cells.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [CellType::Line, CellType::Quad, CellType::Triangle]);
        assert_eq!(back.cell_array("ids").unwrap().values, [11, 10, 12]);
    }

    #[test]
    fn two_component_arrays() {
        let mut pd = PolyData::new();
        pd.add_point(Point3::new(0.1, 0.2, 0.3));
        pd.add_point(Point3::new(-1.5, 2.25, 1e-7));
        pd.insert_cell(CellType::Line, vec![0, 1]);
        pd.set_cell_array(IdArray::from_values("sourcesA", 2, vec![NOT_SET, 3]));

        let back = PolyData::from_vtk(&pd.to_vtk()).unwrap();
        assert_eq!(back, pd);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            PolyData::from_vtk("hello"),
            Err(IoError::MalformedInput(_))
        ));
        assert!(matches!(
            PolyData::from_vtk("# vtk DataFile Version 3.0\nt\nBINARY\nDATASET POLYDATA\n"),
            Err(IoError::Unimplemented(_))
        ));
        assert!(matches!(
            PolyData::from_vtk("# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 1 double\n0 0 0\nLINES 1 3\n2 0 5\n"),
            Err(IoError::MalformedInput(_))
        ));
        assert!(matches!(
            PolyData::from_vtk("# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 2 double\n0 0 x\n"),
            Err(IoError::ParseFloat(_))
        ));
    }

    const HEADER: &str = "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\n";

    #[test]
    fn huge_point_count_is_an_error() {
        let text = format!("{HEADER}POINTS {} double\n0 0 0\n", usize::MAX);
        assert!(matches!(
            PolyData::from_vtk(&text),
            Err(IoError::MalformedInput(_))
        ));
    }

    #[test]
    fn huge_cell_size_is_an_error() {
        let text = format!("{HEADER}POINTS 1 double\n0 0 0\nVERTICES 1 2\n{} 0\n", usize::MAX);
        assert!(matches!(
            PolyData::from_vtk(&text),
            Err(IoError::MalformedInput(_))
        ));
    }

    #[test]
    fn overflowing_array_size_is_an_error() {
        let text = format!(
            "{HEADER}POINTS 1 double\n0 0 0\nPOINT_DATA 1\nFIELD FieldData 1\nids {} 1 vtkIdType\n7\n",
            usize::MAX
        );
        let err = PolyData::from_vtk(&text).unwrap_err();
        assert!(matches!(err, IoError::MalformedInput(_)), "{err}");

        // components times tuples overflows
        let text = format!(
            "{HEADER}POINTS 2 double\n0 0 0\n1 1 1\nPOINT_DATA 2\nFIELD FieldData 1\nids {} 2 vtkIdType\n7\n",
            usize::MAX / 2 + 1
        );
        let err = PolyData::from_vtk(&text).unwrap_err();
        assert!(matches!(err, IoError::MalformedInput(_)), "{err}");

        let text = format!("{HEADER}POINTS 1 double\n0 0 0\nPOINT_DATA 1\nFIELD FieldData {}\n", usize::MAX);
        assert!(matches!(
            PolyData::from_vtk(&text),
            Err(IoError::MalformedInput(_))
        ));
    }
}

mod support;

use meshbool::boolean::{BooleanFilter, ORIG_CELL_IDS_A, ORIG_CELL_IDS_B, OperMode};
use meshbool::errors::{FilterError, Side};
use meshbool::float_types::Real;
use meshbool::pipeline::Stage;
use meshbool::polydata::NOT_SET;
use support::{approx_eq, cube_pair, patch};

fn volume(op: OperMode, offset: [Real; 3]) -> Real {
    let (a, b) = cube_pair(offset);
    BooleanFilter::new(op).execute(&a, &b).unwrap().result.volume()
}

#[test]
fn volumes_of_unevenly_offset_cubes() {
    let offset = [0.25, 0.3, 0.35];
    let overlap = 0.75 * 0.7 * 0.65;

    assert!(approx_eq(volume(OperMode::Union, offset), 2.0 - overlap, 1e-9));
    assert!(approx_eq(volume(OperMode::Intersection, offset), overlap, 1e-9));
    assert!(approx_eq(volume(OperMode::Difference, offset), 1.0 - overlap, 1e-9));
    assert!(approx_eq(volume(OperMode::Difference2, offset), 1.0 - overlap, 1e-9));
}

#[test]
fn disjoint_cubes() {
    let offset = [2.0, 0.0, 0.0];
    assert!(approx_eq(volume(OperMode::Union, offset), 2.0, 1e-9));
    assert!(approx_eq(volume(OperMode::Intersection, offset), 0.0, 1e-9));
    assert!(approx_eq(volume(OperMode::Difference, offset), 1.0, 1e-9));

    let (a, b) = cube_pair(offset);
    let out = BooleanFilter::default().execute(&a, &b).unwrap();
    assert_eq!(out.lines.number_of_cells(), 0);
}

#[test]
fn intersection_cells_come_from_both_inputs() {
    let (a, b) = cube_pair([0.5, 0.5, 0.5]);
    let out = BooleanFilter::new(OperMode::Intersection).execute(&a, &b).unwrap();

    let ids_a = out.result.cell_array(ORIG_CELL_IDS_A).unwrap();
    let ids_b = out.result.cell_array(ORIG_CELL_IDS_B).unwrap();
    assert!(ids_a.values.iter().any(|&v| v != NOT_SET));
    assert!(ids_b.values.iter().any(|&v| v != NOT_SET));
    assert!(out.result.cells.iter().all(|c| c.kind.is_polygonal()));
}

#[test]
fn operation_can_change_between_updates() {
    let (a, b) = cube_pair([0.5, 0.5, 0.5]);
    let mut filter = BooleanFilter::default();
    let union = filter.execute(&a, &b).unwrap().result.volume();
    filter.set_operation(OperMode::Intersection);
    let inter = filter.execute(&a, &b).unwrap().result.volume();
    assert!(approx_eq(union, 1.875, 1e-9));
    assert!(approx_eq(inter, 0.125, 1e-9));
}

#[test]
fn pipeline_exposes_result_and_lines() {
    let (a, b) = cube_pair([0.5, 0.5, 0.5]);
    let boolean = Stage::new(BooleanFilter::new(OperMode::Difference));
    boolean
        .set_input_connection(0, Stage::from_data(a).output_port(0))
        .unwrap();
    boolean
        .set_input_connection(1, Stage::from_data(b).output_port(0))
        .unwrap();

    let result = boolean.update_and_output(0).unwrap();
    let lines = boolean.output(1).unwrap();
    assert!(approx_eq(result.volume(), 0.875, 1e-9));
    assert!(lines.number_of_cells() > 0);
}

#[test]
fn non_manifold_second_input_is_rejected() {
    let (a, _) = cube_pair([0.0; 3]);

    // three quads hinged on an edge that runs through the cube
    let mut fan = patch(&[[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]]);
    fan.add_point([1.0, 1.0, 0.0].into());
    fan.add_point([-1.0, 1.0, 0.0].into());
    fan.add_point([1.0, 0.0, -1.0].into());
    fan.add_point([-1.0, 0.0, -1.0].into());
    fan.insert_cell(meshbool::CellType::Quad, vec![1, 0, 5, 4]);
    fan.insert_cell(meshbool::CellType::Quad, vec![0, 1, 6, 7]);
    assert!(!fan.is_manifold());

    assert!(matches!(
        BooleanFilter::default().execute(&a, &fan),
        Err(FilterError::NonManifold(Side::B))
    ));
}

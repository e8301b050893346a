mod common;

use approx::assert_abs_diff_eq;
use num::Complex;
use std::{collections::HashSet, sync::Arc};
use zoomics::{
    error::MapperError,
    geometry::{Dim3, Point3},
    grid::{cubic::CubicLattice, field::Domain, Grid, GridArena},
    io::Verbosity,
    mapper::{ParticleMapper, ParticleRef},
};

#[test]
fn index_and_coordinates_round_trip() {
    for size in [1, 2, 3, 8] {
        let lattice = CubicLattice::new(size, 1.0, Point3::<f64>::origin());
        for index in 0..lattice.n_cells() {
            let (x, y, z) = lattice.coordinates(index).to_tuple();
            assert_eq!(lattice.index(x as isize, y as isize, z as isize), index);
        }
    }
}

#[test]
fn index_wraps_into_lattice() {
    let lattice = CubicLattice::new(5, 1.0, Point3::<f64>::origin());
    for x in -12..12_isize {
        for y in [-7_isize, -5, 0, 4, 9] {
            for z in [-1_isize, 2, 5, 11] {
                let index = lattice.index(x, y, z);
                assert!(index < lattice.n_cells());
                assert_eq!(
                    index,
                    lattice.index(x.rem_euclid(5), y.rem_euclid(5), z.rem_euclid(5))
                );
            }
        }
    }
}

#[test]
fn unwrapped_index_rejects_negative_coordinate() {
    let lattice = CubicLattice::new(4, 1.0, Point3::<f64>::origin());
    assert!(matches!(
        lattice.index_no_wrap(-1, 0, 0),
        Err(MapperError::OutOfRange(_))
    ));
}

#[test]
fn field_domain_switches_are_idempotent() {
    let transformer = Arc::new(common::CountingTransformer::default());
    let grid = Grid::new(
        CubicLattice::new(4, 1.0, Point3::origin()),
        transformer.clone(),
    );
    grid.field_real()[[0, 0, 3]] = Complex::new(2.0, 0.0);

    grid.field_fourier();
    grid.field_fourier();
    assert_eq!(transformer.count(), 1);
    assert_eq!(grid.domain(), Domain::Fourier);

    grid.field_real();
    grid.field_fourier();
    let values = grid.field_real();
    assert_eq!(transformer.count(), 4);
    assert_abs_diff_eq!(values[[0, 0, 3]].re, 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(values.sum().re, 2.0, epsilon = 1e-12);
}

#[test]
fn two_level_mapper_orders_coarse_before_fine() {
    let grids = common::two_grids();
    let mapper =
        ParticleMapper::two_level(&grids.arena, grids.coarse, grids.fine, vec![5, 20], 8).unwrap();
    assert_eq!(mapper.size(), 78);

    let particles: Vec<_> = mapper.particles().collect();
    let expected_coarse: Vec<_> = (0..64)
        .filter(|i| ![5, 20].contains(i))
        .map(|i| ParticleRef::new(grids.coarse_grid, i))
        .collect();
    assert_eq!(particles[..62], expected_coarse[..]);

    let fine_lattice = grids.arena[grids.fine_grid].lattice();
    let coarse_lattice = grids.arena[grids.coarse_grid].lattice();
    let refining = |coarse_index: usize| {
        let mut ids =
            fine_lattice.ids_in_cube(&coarse_lattice.centroid(coarse_index), 1.0);
        ids.sort_unstable();
        ids
    };
    let expected_fine: Vec<_> = refining(5)
        .into_iter()
        .chain(refining(20))
        .map(|i| ParticleRef::new(grids.fine_grid, i))
        .collect();
    assert_eq!(particles[62..], expected_fine[..]);

    let unique: HashSet<_> = particles[62..].iter().collect();
    assert_eq!(unique.len(), 16);
}

#[test]
fn zoom_constraints_split_into_levels() {
    let grids = common::two_grids();
    let mapper =
        ParticleMapper::two_level(&grids.arena, grids.coarse, grids.fine, vec![5, 20], 8).unwrap();
    let fine_part: Vec<_> = mapper.particles().skip(62).map(|p| p.index).collect();

    // Every fine particle refining coarse cell 20 plus one refining 5
    let ids: Vec<usize> = (70..78).chain([62]).collect();
    mapper.interpret_particle_list(&grids.arena, ids).unwrap();

    assert_eq!(
        grids.arena[grids.coarse_grid].particle_indices(),
        vec![20, 5]
    );
    let expected_fine: Vec<_> = fine_part[8..]
        .iter()
        .copied()
        .chain([fine_part[0]])
        .collect();
    assert_eq!(
        grids.arena[grids.fine_grid].particle_indices(),
        expected_fine
    );
}

#[test]
fn low_resolution_constraint_is_rejected() {
    let grids = common::two_grids();
    let mapper =
        ParticleMapper::two_level(&grids.arena, grids.coarse, grids.fine, vec![5, 20], 8).unwrap();
    assert_eq!(
        mapper.interpret_particle_list(&grids.arena, vec![61]),
        Err(MapperError::ConstraintInLowRes {
            id: 61,
            first_fine: 62
        })
    );
    assert!(grids.arena[grids.coarse_grid].particle_indices().is_empty());
}

#[test]
fn gas_range_comes_from_gas_mapper() {
    let grids = common::two_grids();
    let mapper = ParticleMapper::add_gas(grids.coarse, grids.fine).unwrap();
    assert_eq!(mapper.size(), mapper.size_gas() + mapper.size_dm());

    let gas: Vec<_> = mapper.gas_particles().collect();
    assert_eq!(gas.len(), 64);
    assert!(gas.iter().all(|p| p.grid == grids.coarse_grid));

    let dm: Vec<_> = mapper.dm_particles().collect();
    assert_eq!(dm.len(), 512);
    assert!(dm.iter().all(|p| p.grid == grids.fine_grid));
}

#[test]
fn sub_mapper_of_two_level_mapper_is_a_window() {
    let grids = common::two_grids();
    let mapper =
        ParticleMapper::two_level(&grids.arena, grids.coarse, grids.fine, vec![5, 20], 8).unwrap();
    let all: Vec<_> = mapper.particles().collect();
    let window = ParticleMapper::sub(mapper, 60, 70).unwrap();
    let windowed: Vec<_> = window.particles().collect();
    assert_eq!(windowed, all[60..70]);

    window
        .interpret_particle_list(&grids.arena, vec![2, 3])
        .unwrap();
    assert_eq!(grids.arena[grids.coarse_grid].particle_indices(), vec![5]);
}

#[test]
fn nested_two_level_mappers_refine_by_grid_cell() {
    let mut arena = GridArena::new();
    let coarse_grid = common::add_grid(&mut arena, 4, 1.0);
    let mid_grid = common::add_grid(&mut arena, 8, 0.5);
    let fine_grid = common::add_grid(&mut arena, 16, 0.25);
    let coarse = ParticleMapper::one_level(&arena, coarse_grid).unwrap();
    let mid_leaf = ParticleMapper::one_level(&arena, mid_grid).unwrap();
    let fine_leaf = ParticleMapper::one_level(&arena, fine_grid).unwrap();

    let mid = ParticleMapper::two_level(&arena, mid_leaf, fine_leaf, vec![0], 8).unwrap();
    let top = ParticleMapper::two_level(&arena, coarse, mid, vec![21], 8).unwrap();

    let mid_cells: Vec<_> = top
        .particles()
        .filter(|particle| particle.grid == mid_grid)
        .map(|particle| particle.index)
        .collect();
    assert_eq!(mid_cells, vec![146, 147, 154, 155, 210, 211, 218, 219]);

    let coarse_lattice = arena[coarse_grid].lattice();
    let mid_lattice = arena[mid_grid].lattice();
    let mut refining = mid_lattice.ids_in_cube(&coarse_lattice.centroid(21), 1.0);
    refining.sort_unstable();
    assert_eq!(mid_cells, refining);
}

def_hierarchy_test!(
HIERARCHY[hierarchy = common::central_zoom_config(false)]
fn built_hierarchy_refines_central_cells {
    let mapper = hierarchy.mapper();
    assert_eq!(mapper.size(), 64 + 7 * 8);
    assert_eq!(mapper.size_gas(), 0);

    let centroids = hierarchy.cell_centroids(Verbosity::Quiet);
    let sequence: Vec<_> = mapper.particles().collect();
    for (centroid, particle) in centroids.iter().zip(&sequence) {
        let lattice = hierarchy.arena()[particle.grid].lattice();
        let expected = lattice.centroid(particle.index);
        for dim in Dim3::slice() {
            assert_abs_diff_eq!(centroid[dim], expected[dim], epsilon = 1e-12);
        }
    }
});

def_hierarchy_test!(
HIERARCHY[hierarchy = common::central_zoom_config(true)]
fn built_hierarchy_with_gas_accepts_only_dark_matter_constraints {
    let mapper = hierarchy.mapper();
    assert_eq!(mapper.size_gas(), 120);
    assert!(matches!(
        hierarchy.constrain_particles(vec![0]),
        Err(MapperError::Unsupported(_))
    ));
    hierarchy.constrain_particles(vec![120 + 56]).unwrap();
    let fine_grid = hierarchy.fine_grid().unwrap();
    assert_eq!(hierarchy.arena()[fine_grid].n_particles(), 1);
});

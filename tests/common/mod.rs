#![allow(dead_code)]

use ndarray::Array3;
use num::Complex;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use zoomics::{
    fourier::{FourierTransformer, SeparableTransformer, TransformDirection},
    geometry::Point3,
    grid::{cubic::CubicLattice, Grid, GridArena, GridHandle},
    io::Verbosity,
    mapper::ParticleMapper,
    setup::{HierarchyConfig, MappedHierarchy, ZoomConfig},
};

/// Defines a test running the given body on a hierarchy built from the
/// given configuration.
#[macro_export]
macro_rules! def_hierarchy_test {
    (
        HIERARCHY[$hierarchy:ident = $config:expr]
        fn $name:ident $test_body:block
    ) => {
        #[test]
        fn $name() {
            let $hierarchy = common::build_hierarchy(&$config);
            $test_body
        }
    };
}

/// Transformer counting how many transforms it has performed.
#[derive(Default)]
pub struct CountingTransformer {
    count: AtomicUsize,
}

impl CountingTransformer {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl FourierTransformer<f64> for CountingTransformer {
    fn transform(&self, values: &mut Array3<Complex<f64>>, direction: TransformDirection) {
        self.count.fetch_add(1, Ordering::SeqCst);
        SeparableTransformer.transform(values, direction);
    }
}

pub fn default_transformer() -> Arc<dyn FourierTransformer<f64>> {
    Arc::new(SeparableTransformer)
}

/// Adds a grid with the given size and cell extent, with its lower corner
/// at the origin.
pub fn add_grid(arena: &mut GridArena<f64>, size: usize, cell_extent: f64) -> GridHandle {
    arena.add(Grid::new(
        CubicLattice::new(size, cell_extent, Point3::origin()),
        default_transformer(),
    ))
}

/// A 4³ coarse grid and an 8³ fine grid covering the same unit-spaced box,
/// with one-level mappers over both.
pub struct TwoGrids {
    pub arena: GridArena<f64>,
    pub coarse_grid: GridHandle,
    pub fine_grid: GridHandle,
    pub coarse: Arc<ParticleMapper<f64>>,
    pub fine: Arc<ParticleMapper<f64>>,
}

pub fn two_grids() -> TwoGrids {
    let mut arena = GridArena::new();
    let coarse_grid = add_grid(&mut arena, 4, 1.0);
    let fine_grid = add_grid(&mut arena, 8, 0.5);
    let coarse = ParticleMapper::one_level(&arena, coarse_grid).unwrap();
    let fine = ParticleMapper::one_level(&arena, fine_grid).unwrap();
    TwoGrids {
        arena,
        coarse_grid,
        fine_grid,
        coarse,
        fine,
    }
}

/// Configuration refining the central 2³ coarse cells of a 4³ base grid.
pub fn central_zoom_config(with_gas: bool) -> HierarchyConfig {
    HierarchyConfig {
        base_size: 4,
        box_length: 4.0,
        zoom: Some(ZoomConfig {
            center: Point3::new(2.0, 2.0, 2.0),
            width: 2.0,
            refinement: 2,
            fine_size: 8,
        }),
        with_gas,
    }
}

pub fn build_hierarchy(config: &HierarchyConfig) -> MappedHierarchy<f64> {
    MappedHierarchy::build(config, default_transformer(), Verbosity::Quiet).unwrap()
}

//! Construction of grid hierarchies and their particle mappers.

use crate::{
    error::{MapperError, Result},
    fourier::FourierTransformer,
    geometry::{Dim3, Point3},
    grid::{cubic::CubicLattice, Grid, GridArena, GridHandle},
    io::Verbosity,
    mapper::ParticleMapper,
    num::{self as bnum, BFloat},
};
use std::sync::Arc;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Configuration parameters for a refined region of the base grid.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ZoomConfig {
    /// Centre of the cube selecting the coarse cells to refine.
    pub center: Point3<f64>,
    /// Width of the cube selecting the coarse cells to refine.
    pub width: f64,
    /// Number of fine cells per coarse cell along each axis.
    pub refinement: usize,
    /// Number of cells along each axis of the fine grid.
    pub fine_size: usize,
}

impl ZoomConfig {
    pub const DEFAULT_CENTER_COORDINATE: f64 = 50.0;
    pub const DEFAULT_WIDTH: f64 = 25.0;
    pub const DEFAULT_REFINEMENT: usize = 2;
    pub const DEFAULT_FINE_SIZE: usize = 32;

    /// Checks that the configuration parameters are acceptable.
    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(MapperError::InvalidConfig(format!(
                "Zoom width must be positive, got {}",
                self.width
            )));
        }
        if !self.center.is_finite() {
            return Err(MapperError::InvalidConfig(format!(
                "Zoom centre must be finite, got {}",
                self.center
            )));
        }
        if self.refinement == 0 {
            return Err(MapperError::InvalidConfig(
                "Refinement factor must be at least one".to_string(),
            ));
        }
        if self.fine_size == 0 {
            return Err(MapperError::InvalidConfig(
                "Fine grid size must be at least one".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            center: Point3::new(
                Self::DEFAULT_CENTER_COORDINATE,
                Self::DEFAULT_CENTER_COORDINATE,
                Self::DEFAULT_CENTER_COORDINATE,
            ),
            width: Self::DEFAULT_WIDTH,
            refinement: Self::DEFAULT_REFINEMENT,
            fine_size: Self::DEFAULT_FINE_SIZE,
        }
    }
}

/// Configuration parameters for a grid hierarchy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct HierarchyConfig {
    /// Number of cells along each axis of the base grid.
    pub base_size: usize,
    /// Side length of the periodic box covered by the base grid.
    pub box_length: f64,
    /// Refined region, if any.
    pub zoom: Option<ZoomConfig>,
    /// Whether to list a gas copy of every particle ahead of the dark matter.
    pub with_gas: bool,
}

impl HierarchyConfig {
    pub const DEFAULT_BASE_SIZE: usize = 32;
    pub const DEFAULT_BOX_LENGTH: f64 = 100.0;
    pub const DEFAULT_WITH_GAS: bool = false;

    /// Checks that the configuration parameters are acceptable.
    pub fn validate(&self) -> Result<()> {
        if self.base_size == 0 {
            return Err(MapperError::InvalidConfig(
                "Base grid size must be at least one".to_string(),
            ));
        }
        if !(self.box_length.is_finite() && self.box_length > 0.0) {
            return Err(MapperError::InvalidConfig(format!(
                "Box length must be positive, got {}",
                self.box_length
            )));
        }
        match &self.zoom {
            Some(zoom) => zoom.validate(),
            None => Ok(()),
        }
    }
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            base_size: Self::DEFAULT_BASE_SIZE,
            box_length: Self::DEFAULT_BOX_LENGTH,
            zoom: None,
            with_gas: Self::DEFAULT_WITH_GAS,
        }
    }
}

/// The grids of a hierarchy together with the mapper spanning them.
#[derive(Debug)]
pub struct MappedHierarchy<F: BFloat> {
    arena: GridArena<F>,
    mapper: Arc<ParticleMapper<F>>,
    coarse_grid: GridHandle,
    fine_grid: Option<GridHandle>,
}

impl<F: BFloat> MappedHierarchy<F> {
    /// Builds the grids and mapper tree described by the given configuration.
    ///
    /// The base grid spans the whole box with its lower corner at the origin.
    /// With a zoom region, the coarse cells whose centres lie inside the zoom
    /// cube are refined onto a fine grid aligned with the coarse cells and
    /// centred on the refined region. The refined region must not cross the
    /// periodic boundary of the base grid.
    pub fn build(
        config: &HierarchyConfig,
        transformer: Arc<dyn FourierTransformer<F>>,
        verbosity: Verbosity,
    ) -> Result<Self> {
        config.validate()?;

        let base_size = config.base_size;
        let coarse_extent = config.box_length / base_size as f64;
        let coarse_lattice = CubicLattice::new(
            base_size,
            bnum::from_f64(coarse_extent),
            Point3::origin(),
        );

        let mut arena = GridArena::new();
        let coarse_grid = arena.add(Grid::new(coarse_lattice, transformer.clone()));
        let coarse = ParticleMapper::one_level(&arena, coarse_grid)?;

        if verbosity.print_messages() {
            println!(
                "Base grid: {}^3 cells with extent {}",
                base_size, coarse_extent
            );
        }

        let (mapper, fine_grid) = match &config.zoom {
            Some(zoom) => {
                let (fine_lattice, zoom_particles) =
                    Self::refine(arena[coarse_grid].lattice(), zoom)?;
                if verbosity.print_messages() {
                    println!(
                        "Refining {} coarse cells onto {}^3 fine grid with origin {}",
                        zoom_particles.len(),
                        fine_lattice.size(),
                        fine_lattice.origin()
                    );
                }
                let fine_grid = arena.add(Grid::new(fine_lattice, transformer));
                let fine = ParticleMapper::one_level(&arena, fine_grid)?;
                let mapper = ParticleMapper::two_level(
                    &arena,
                    coarse,
                    fine,
                    zoom_particles,
                    zoom.refinement.pow(3),
                )?;
                (mapper, Some(fine_grid))
            }
            None => (coarse, None),
        };

        let mapper = if config.with_gas {
            ParticleMapper::add_gas(mapper.clone(), mapper)?
        } else {
            mapper
        };

        if verbosity.print_messages() {
            println!(
                "Mapper holds {} particles ({} gas, {} dark matter)",
                mapper.size(),
                mapper.size_gas(),
                mapper.size_dm()
            );
        }

        Ok(Self {
            arena,
            mapper,
            coarse_grid,
            fine_grid,
        })
    }

    /// Determines the fine lattice and the coarse cells to refine for the
    /// given zoom region.
    fn refine(
        coarse_lattice: &CubicLattice<F>,
        zoom: &ZoomConfig,
    ) -> Result<(CubicLattice<F>, Vec<usize>)> {
        let center = zoom.center.converted::<F>();
        let width = bnum::from_f64::<F>(zoom.width);

        let bounds = coarse_lattice
            .cube_coordinate_bounds(&center, width)
            .ok_or_else(|| {
                MapperError::InvalidRegion(format!(
                    "Zoom region around {} cannot be located on the base grid",
                    zoom.center
                ))
            })?;

        let base_size = coarse_lattice.size() as isize;
        for dim in Dim3::slice() {
            let (lower, upper) = bounds[dim];
            if upper < lower {
                return Err(MapperError::InvalidRegion(format!(
                    "Zoom region of width {} around {} contains no coarse cells",
                    zoom.width, zoom.center
                )));
            }
            if lower < 0 || upper >= base_size {
                return Err(MapperError::InvalidRegion(format!(
                    "Zoom region spans {}-coordinates [{}, {}], crossing the periodic boundary",
                    dim, lower, upper
                )));
            }
        }

        let fine_size = zoom.fine_size;
        let refinement = zoom.refinement;
        let fine_extent = coarse_lattice.cell_extent() / bnum::from_usize(refinement);
        let mut fine_origin = Point3::origin();
        for dim in Dim3::slice() {
            let (lower, upper) = bounds[dim];
            let n_refined = (upper - lower + 1) as usize * refinement;
            if n_refined > fine_size {
                return Err(MapperError::InvalidRegion(format!(
                    "Zoom region needs {} fine cells along {}, but the fine grid has {}",
                    n_refined, dim, fine_size
                )));
            }
            let padding = (fine_size - n_refined) / 2;
            fine_origin[dim] = coarse_lattice.origin()[dim]
                + bnum::from_isize::<F>(lower) * coarse_lattice.cell_extent()
                - bnum::from_usize::<F>(padding) * fine_extent;
        }

        let fine_lattice = CubicLattice::new(fine_size, fine_extent, fine_origin);
        let zoom_particles = coarse_lattice.ids_in_cube(&center, width);
        Ok((fine_lattice, zoom_particles))
    }

    /// Returns the arena owning all grids of the hierarchy.
    pub fn arena(&self) -> &GridArena<F> {
        &self.arena
    }

    /// Returns the mapper spanning the hierarchy.
    pub fn mapper(&self) -> &Arc<ParticleMapper<F>> {
        &self.mapper
    }

    /// Returns the handle of the base grid.
    pub fn coarse_grid(&self) -> GridHandle {
        self.coarse_grid
    }

    /// Returns the handle of the fine grid, if the hierarchy is refined.
    pub fn fine_grid(&self) -> Option<GridHandle> {
        self.fine_grid
    }

    /// Computes the cell centre of every particle in mapper order.
    pub fn cell_centroids(&self, verbosity: Verbosity) -> Vec<Point3<F>> {
        let arena = &self.arena;
        self.mapper.par_map_particles(verbosity, |particle| {
            arena[particle.grid].lattice().centroid(particle.index)
        })
    }

    /// Imposes the given particle ids on the grids of the hierarchy.
    pub fn constrain_particles(&self, ids: Vec<usize>) -> Result<()> {
        self.mapper.interpret_particle_list(&self.arena, ids)
    }
}

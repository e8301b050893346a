//! Mapper covering every cell of a single grid.

use super::{ParticleListPlan, ParticleRef};
use crate::{
    error::{MapperError, Result},
    grid::{GridArena, GridHandle},
    num::BFloat,
};

/// Mapper whose particle `i` is cell `i` of its grid.
#[derive(Clone, Debug)]
pub struct OneLevelParticleMapper {
    grid: GridHandle,
    n_cells: usize,
}

impl OneLevelParticleMapper {
    /// Creates a new mapper for the grid with the given handle.
    pub fn new<F: BFloat>(arena: &GridArena<F>, grid: GridHandle) -> Result<Self> {
        let n_cells = arena.try_get(grid)?.n_cells();
        Ok(Self { grid, n_cells })
    }

    /// Returns the handle of the grid.
    pub fn grid(&self) -> GridHandle {
        self.grid
    }

    /// Returns the number of particles, which equals the number of grid cells.
    pub fn size(&self) -> usize {
        self.n_cells
    }

    pub(crate) fn dereference(&self, position: usize) -> ParticleRef {
        ParticleRef::new(self.grid, position)
    }

    pub(crate) fn plan_particle_list(&self, ids: Vec<usize>) -> Result<ParticleListPlan> {
        if let Some(&id) = ids.iter().find(|&&id| id >= self.n_cells) {
            return Err(MapperError::OutOfRange(format!(
                "Particle {} does not exist on {} with {} cells",
                id, self.grid, self.n_cells
            )));
        }
        Ok(vec![(self.grid, ids)])
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        fourier::SeparableTransformer,
        geometry::Point3,
        grid::{cubic::CubicLattice, Grid},
        mapper::ParticleMapper,
    };
    use std::sync::Arc;

    #[test]
    fn one_level_mapper_is_identity() {
        let mut arena = GridArena::new();
        let grid = arena.add(Grid::new(
            CubicLattice::new(3, 1.0, Point3::<f64>::origin()),
            Arc::new(SeparableTransformer),
        ));
        let mapper = ParticleMapper::one_level(&arena, grid).unwrap();
        assert_eq!(mapper.size(), 27);
        assert!(mapper.supports_reverse_iterator());
        for (position, particle) in mapper.particles().enumerate() {
            assert_eq!(particle, ParticleRef::new(grid, position));
        }

        let mut cursor = mapper.begin();
        cursor.advance_by(20);
        cursor.retreat_by(7).unwrap();
        assert_eq!(cursor.particle(), Some(ParticleRef::new(grid, 13)));
    }

    #[test]
    fn interpreting_replaces_particle_list() {
        let mut arena = GridArena::new();
        let grid = arena.add(Grid::new(
            CubicLattice::new(2, 1.0, Point3::<f64>::origin()),
            Arc::new(SeparableTransformer),
        ));
        let mapper = ParticleMapper::one_level(&arena, grid).unwrap();
        mapper.interpret_particle_list(&arena, vec![6, 2, 2]).unwrap();
        assert_eq!(arena[grid].particle_indices(), vec![6, 2, 2]);
        assert!(matches!(
            mapper.plan_particle_list(vec![8]),
            Err(MapperError::OutOfRange(_))
        ));
    }

    #[test]
    fn missing_grid_is_rejected() {
        let arena = GridArena::<f64>::new();
        let mut other = GridArena::<f64>::new();
        let handle = other.add(Grid::new(
            CubicLattice::new(2, 1.0, Point3::origin()),
            Arc::new(SeparableTransformer),
        ));
        assert!(OneLevelParticleMapper::new(&arena, handle).is_err());
    }
}

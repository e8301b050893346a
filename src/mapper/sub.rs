//! Mapper exposing a contiguous window of another mapper.

use super::{cursor::CursorState, MapperIterator, ParticleListPlan, ParticleMapper};
use crate::{
    error::{MapperError, Result},
    num::BFloat,
};
use std::sync::Arc;

/// Mapper whose particle `i` is particle `start + i` of the underlying mapper.
#[derive(Debug)]
pub struct SubMapper<F: BFloat> {
    underlying: Arc<ParticleMapper<F>>,
    start: usize,
    finish: usize,
}

impl<F: BFloat> SubMapper<F> {
    /// Creates a new mapper over positions `[start, finish)` of the underlying mapper.
    pub fn new(underlying: Arc<ParticleMapper<F>>, start: usize, finish: usize) -> Result<Self> {
        if start > finish || finish > underlying.size() {
            return Err(MapperError::OutOfRange(format!(
                "Window [{}, {}) is not contained in {} mapper with {} particles",
                start,
                finish,
                underlying.kind(),
                underlying.size()
            )));
        }
        if underlying.size_gas() != 0 {
            return Err(MapperError::Consistency(
                "Sub-mappers cannot be built from mappers containing gas".to_string(),
            ));
        }
        Ok(Self {
            underlying,
            start,
            finish,
        })
    }

    /// Returns the mapper the window is taken from.
    pub fn underlying(&self) -> &Arc<ParticleMapper<F>> {
        &self.underlying
    }

    /// Returns the first underlying position in the window.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the underlying position just past the window.
    pub fn finish(&self) -> usize {
        self.finish
    }

    pub fn size(&self) -> usize {
        self.finish - self.start
    }

    pub(crate) fn begin<'a>(&'a self, mapper: &'a ParticleMapper<F>) -> MapperIterator<'a, F> {
        let mut underlying = self.underlying.begin();
        underlying.advance_by(self.start);
        MapperIterator::new(mapper, 0, CursorState::Sub(Box::new(underlying)))
    }

    pub(crate) fn advance(&self, iterator: &mut MapperIterator<'_, F>) {
        self.advance_by(iterator, 1);
    }

    pub(crate) fn advance_by(&self, iterator: &mut MapperIterator<'_, F>, n: usize) {
        iterator.position += n;
        if let CursorState::Sub(underlying) = &mut iterator.state {
            underlying.advance_by(n);
        }
    }

    pub(crate) fn plan_particle_list(&self, ids: Vec<usize>) -> Result<ParticleListPlan> {
        let shifted = ids
            .into_iter()
            .map(|id| {
                id.checked_add(self.start)
                    .filter(|&shifted| shifted < self.finish)
                    .ok_or_else(|| {
                        MapperError::OutOfRange(format!(
                            "Particle {} does not exist on sub-mapper with {} particles",
                            id,
                            self.size()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        self.underlying.plan_particle_list(shifted)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        fourier::{FourierTransformer, SeparableTransformer},
        geometry::Point3,
        grid::{cubic::CubicLattice, Grid, GridArena, GridHandle},
    };

    fn leaf(size: usize) -> (GridArena<f64>, GridHandle, Arc<ParticleMapper<f64>>) {
        let transformer: Arc<dyn FourierTransformer<f64>> = Arc::new(SeparableTransformer);
        let mut arena = GridArena::new();
        let grid = arena.add(Grid::new(
            CubicLattice::new(size, 1.0, Point3::origin()),
            transformer,
        ));
        let mapper = ParticleMapper::one_level(&arena, grid).unwrap();
        (arena, grid, mapper)
    }

    #[test]
    fn window_is_shifted_view_of_underlying() {
        let (_arena, _, underlying) = leaf(3);
        let mapper = ParticleMapper::sub(underlying, 5, 12).unwrap();
        assert_eq!(mapper.size(), 7);
        let indices: Vec<_> = mapper.particles().map(|p| p.index).collect();
        assert_eq!(indices, (5..12).collect::<Vec<_>>());

        let mut cursor = mapper.begin();
        cursor.advance_by(4);
        assert_eq!(cursor.particle().map(|p| p.index), Some(9));
        assert!(matches!(
            cursor.retreat_by(1),
            Err(MapperError::Unsupported(_))
        ));
    }

    #[test]
    fn windows_compose() {
        let (_arena, _, underlying) = leaf(3);
        let outer = ParticleMapper::sub(underlying, 2, 20).unwrap();
        let inner = ParticleMapper::sub(outer, 3, 6).unwrap();
        let indices: Vec<_> = inner.particles().map(|p| p.index).collect();
        assert_eq!(indices, vec![5, 6, 7]);
    }

    #[test]
    fn empty_window_has_no_particles() {
        let (_arena, _, underlying) = leaf(2);
        let mapper = ParticleMapper::sub(underlying, 8, 8).unwrap();
        assert_eq!(mapper.size(), 0);
        assert!(mapper.begin() == mapper.end());
        assert_eq!(mapper.particles().count(), 0);
    }

    #[test]
    fn invalid_windows_are_rejected() {
        let (_arena, _, underlying) = leaf(2);
        assert!(matches!(
            SubMapper::new(underlying.clone(), 0, 9),
            Err(MapperError::OutOfRange(_))
        ));
        assert!(matches!(
            SubMapper::new(underlying.clone(), 4, 3),
            Err(MapperError::OutOfRange(_))
        ));
        let with_gas = ParticleMapper::add_gas(underlying.clone(), underlying).unwrap();
        assert!(matches!(
            SubMapper::new(with_gas, 0, 1),
            Err(MapperError::Consistency(_))
        ));
    }

    #[test]
    fn constraints_are_shifted_and_bounded() {
        let (arena, grid, underlying) = leaf(2);
        let mapper = ParticleMapper::sub(underlying, 2, 6).unwrap();
        mapper.interpret_particle_list(&arena, vec![0, 3]).unwrap();
        assert_eq!(arena[grid].particle_indices(), vec![2, 5]);

        assert!(matches!(
            mapper.interpret_particle_list(&arena, vec![1, 4]),
            Err(MapperError::OutOfRange(_))
        ));
        assert_eq!(arena[grid].particle_indices(), vec![2, 5]);
    }

    #[test]
    fn huge_constraint_ids_are_out_of_range() {
        let (arena, grid, underlying) = leaf(2);
        let mapper = ParticleMapper::sub(underlying, 2, 6).unwrap();
        assert!(matches!(
            mapper.plan_particle_list(vec![usize::MAX]),
            Err(MapperError::OutOfRange(_))
        ));
        assert!(matches!(
            mapper.interpret_particle_list(&arena, vec![1, usize::MAX - 1]),
            Err(MapperError::OutOfRange(_))
        ));
        assert!(arena[grid].particle_indices().is_empty());
    }
}

//! Grids holding the field and particle selection of one resolution level.

pub mod cubic;
pub mod field;

use crate::{
    error::{MapperError, Result},
    fourier::FourierTransformer,
    num::BFloat,
};
use cubic::CubicLattice;
use field::{Domain, FieldBuffer};
use ndarray::prelude::*;
use num::Complex;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard, RwLock};
use std::{fmt, ops::Index, sync::Arc};

/// A cubic grid with a dual-domain complex field and a list of selected cells.
///
/// All access to the field goes through [`Grid::field_real`] or
/// [`Grid::field_fourier`], which hold the grid's field lock for as long as
/// the returned guard lives. A domain switch and the subsequent access thus
/// form one exclusive section, so concurrent requests for the same grid are
/// serialized and never transform twice.
pub struct Grid<F: BFloat> {
    lattice: CubicLattice<F>,
    field: Mutex<FieldBuffer<F>>,
    particles: RwLock<Vec<usize>>,
    transformer: Arc<dyn FourierTransformer<F>>,
}

impl<F: BFloat> Grid<F> {
    /// Creates a new grid on the given lattice with a zeroed real-space field.
    pub fn new(lattice: CubicLattice<F>, transformer: Arc<dyn FourierTransformer<F>>) -> Self {
        let field = FieldBuffer::new(lattice.size());
        Self {
            lattice,
            field: Mutex::new(field),
            particles: RwLock::new(Vec::new()),
            transformer,
        }
    }

    /// Returns a reference to the lattice describing the grid geometry.
    pub fn lattice(&self) -> &CubicLattice<F> {
        &self.lattice
    }

    /// Returns the number of cells along each axis.
    pub fn size(&self) -> usize {
        self.lattice.size()
    }

    /// Returns the total number of cells.
    pub fn n_cells(&self) -> usize {
        self.lattice.n_cells()
    }

    /// Returns the domain the field is currently stored in.
    pub fn domain(&self) -> Domain {
        self.field.lock().domain()
    }

    /// Brings the field into the given domain and returns exclusive access to it.
    pub fn field_in(&self, domain: Domain) -> MappedMutexGuard<'_, Array3<Complex<F>>> {
        let transformer = self.transformer.as_ref();
        MutexGuard::map(self.field.lock(), |buffer| {
            buffer.ensure_domain(domain, transformer)
        })
    }

    /// Returns exclusive access to the real-space field, transforming it if needed.
    pub fn field_real(&self) -> MappedMutexGuard<'_, Array3<Complex<F>>> {
        self.field_in(Domain::Real)
    }

    /// Returns exclusive access to the Fourier-space field, transforming it if needed.
    pub fn field_fourier(&self) -> MappedMutexGuard<'_, Array3<Complex<F>>> {
        self.field_in(Domain::Fourier)
    }

    /// Computes the real-space field values without changing the stored domain.
    pub fn field_real_values(&self) -> Array3<F> {
        self.field.lock().real_values(self.transformer.as_ref())
    }

    /// Returns a copy of the indices of the currently selected cells.
    pub fn particle_indices(&self) -> Vec<usize> {
        self.particles.read().clone()
    }

    /// Returns the number of currently selected cells.
    pub fn n_particles(&self) -> usize {
        self.particles.read().len()
    }

    /// Evaluates the given closure on the indices of the currently selected cells.
    pub fn with_particle_indices<R, C>(&self, inspect: C) -> R
    where
        C: FnOnce(&[usize]) -> R,
    {
        inspect(&self.particles.read())
    }

    /// Replaces the selected cells with the given indices.
    pub fn replace_particle_indices(&self, indices: Vec<usize>) {
        *self.particles.write() = indices;
    }
}

impl<F: BFloat> fmt::Debug for Grid<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("lattice", &self.lattice)
            .field("domain", &self.domain())
            .field("n_particles", &self.n_particles())
            .finish()
    }
}

/// Non-owning reference to a grid in a [`GridArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridHandle(usize);

impl GridHandle {
    /// Returns the position of the grid in its arena.
    pub fn number(self) -> usize {
        self.0
    }
}

impl fmt::Display for GridHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid {}", self.0)
    }
}

/// Registry owning all grids of a setup.
///
/// Mappers refer to grids only through [`GridHandle`]s and reach them
/// through the arena, which outlives every mapper built on it.
#[derive(Debug)]
pub struct GridArena<F: BFloat> {
    grids: Vec<Grid<F>>,
}

impl<F: BFloat> GridArena<F> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self { grids: Vec::new() }
    }

    /// Moves the given grid into the arena and returns its handle.
    pub fn add(&mut self, grid: Grid<F>) -> GridHandle {
        self.grids.push(grid);
        GridHandle(self.grids.len() - 1)
    }

    /// Returns the number of grids in the arena.
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// Whether the arena holds no grids.
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Returns the grid with the given handle, if it exists.
    pub fn get(&self, handle: GridHandle) -> Option<&Grid<F>> {
        self.grids.get(handle.0)
    }

    /// Returns the grid with the given handle, or an error if it does not exist.
    pub fn try_get(&self, handle: GridHandle) -> Result<&Grid<F>> {
        self.get(handle).ok_or_else(|| {
            MapperError::OutOfRange(format!(
                "No {} in arena holding {} grids",
                handle,
                self.grids.len()
            ))
        })
    }

    /// Returns an iterator over the handles of all grids.
    pub fn handles(&self) -> impl Iterator<Item = GridHandle> {
        (0..self.grids.len()).map(GridHandle)
    }
}

impl<F: BFloat> Default for GridArena<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: BFloat> Index<GridHandle> for GridArena<F> {
    type Output = Grid<F>;
    fn index(&self, handle: GridHandle) -> &Self::Output {
        &self.grids[handle.0]
    }
}

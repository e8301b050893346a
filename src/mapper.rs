//! Mapping of ordered particle sequences onto cells of one or more grids.
//!
//! A particle mapper represents a virtual, ordered sequence of particles in
//! which every element resolves to a cell of some grid. Mappers compose into
//! a tree: a [`OneLevelParticleMapper`] covers all cells of a single grid,
//! while the composite mappers refine, restrict or concatenate the
//! sequences of their children. The tree is immutable after construction;
//! grids are referenced through [`GridHandle`]s and owned by a
//! [`GridArena`].

pub mod add_gas;
pub mod cursor;
pub mod one_level;
pub mod sub;
pub mod two_level;

pub use add_gas::AddGasMapper;
pub use cursor::{MapperIterator, Particles};
pub use one_level::OneLevelParticleMapper;
pub use sub::SubMapper;
pub use two_level::TwoLevelParticleMapper;

use crate::{
    error::{MapperError, Result},
    grid::{GridArena, GridHandle},
    io::Verbosity,
    num::BFloat,
};
use cursor::CursorState;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use std::sync::Arc;

/// A particle resolved to a cell of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParticleRef {
    /// Grid holding the cell.
    pub grid: GridHandle,
    /// Index of the cell within the grid.
    pub index: usize,
}

impl ParticleRef {
    /// Creates a new particle reference.
    pub fn new(grid: GridHandle, index: usize) -> Self {
        Self { grid, index }
    }
}

/// Grid-local cell index lists obtained by resolving a list of particle ids.
pub type ParticleListPlan = Vec<(GridHandle, Vec<usize>)>;

/// A node in a tree of particle mappers.
#[derive(Debug)]
pub enum ParticleMapper<F: BFloat> {
    OneLevel(OneLevelParticleMapper),
    TwoLevel(TwoLevelParticleMapper<F>),
    Sub(SubMapper<F>),
    AddGas(AddGasMapper<F>),
}

impl<F: BFloat> ParticleMapper<F> {
    /// Creates a shared mapper covering all cells of the given grid.
    pub fn one_level(arena: &GridArena<F>, grid: GridHandle) -> Result<Arc<Self>> {
        Ok(Arc::new(OneLevelParticleMapper::new(arena, grid)?.into()))
    }

    /// Creates a shared mapper replacing the given coarse particles with
    /// their refinements on the fine mapper's grid.
    pub fn two_level(
        arena: &GridArena<F>,
        coarse: Arc<Self>,
        fine: Arc<Self>,
        zoom_particles: Vec<usize>,
        n_fine_per_coarse: usize,
    ) -> Result<Arc<Self>> {
        Ok(Arc::new(
            TwoLevelParticleMapper::new(arena, coarse, fine, zoom_particles, n_fine_per_coarse)?
                .into(),
        ))
    }

    /// Creates a shared mapper exposing positions `[start, finish)` of the given mapper.
    pub fn sub(underlying: Arc<Self>, start: usize, finish: usize) -> Result<Arc<Self>> {
        Ok(Arc::new(SubMapper::new(underlying, start, finish)?.into()))
    }

    /// Creates a shared mapper listing all gas particles followed by all
    /// dark matter particles.
    pub fn add_gas(gas: Arc<Self>, dm: Arc<Self>) -> Result<Arc<Self>> {
        Ok(Arc::new(AddGasMapper::new(gas, dm)?.into()))
    }

    /// Returns a short name for the kind of mapper.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OneLevel(_) => "one-level",
            Self::TwoLevel(_) => "two-level",
            Self::Sub(_) => "sub",
            Self::AddGas(_) => "add-gas",
        }
    }

    /// Returns the number of particles in the sequence.
    pub fn size(&self) -> usize {
        match self {
            Self::OneLevel(mapper) => mapper.size(),
            Self::TwoLevel(mapper) => mapper.size(),
            Self::Sub(mapper) => mapper.size(),
            Self::AddGas(mapper) => mapper.size(),
        }
    }

    /// Returns the number of gas particles in the sequence.
    pub fn size_gas(&self) -> usize {
        match self {
            Self::AddGas(mapper) => mapper.size_gas(),
            _ => 0,
        }
    }

    /// Returns the number of dark matter particles in the sequence.
    pub fn size_dm(&self) -> usize {
        match self {
            Self::AddGas(mapper) => mapper.size_dm(),
            _ => self.size(),
        }
    }

    /// Whether iterators over this mapper can be moved backwards.
    pub fn supports_reverse_iterator(&self) -> bool {
        matches!(self, Self::OneLevel(_))
    }

    /// Returns the handle of the coarsest grid the mapper refers to.
    pub fn coarsest_grid(&self) -> Result<GridHandle> {
        match self {
            Self::OneLevel(mapper) => Ok(mapper.grid()),
            Self::TwoLevel(mapper) => mapper.coarse().coarsest_grid(),
            Self::Sub(mapper) => mapper.underlying().coarsest_grid(),
            Self::AddGas(_) => Err(MapperError::Unsupported(
                "An add-gas mapper has no single coarsest grid".to_string(),
            )),
        }
    }

    /// Creates an iterator pointing to the first particle.
    pub fn begin(&self) -> MapperIterator<'_, F> {
        match self {
            Self::OneLevel(_) => MapperIterator::new(self, 0, CursorState::Leaf),
            Self::TwoLevel(mapper) => mapper.begin(self),
            Self::Sub(mapper) => mapper.begin(self),
            Self::AddGas(mapper) => mapper.begin(self),
        }
    }

    /// Creates an iterator pointing just past the last particle.
    pub fn end(&self) -> MapperIterator<'_, F> {
        let state = match self {
            Self::OneLevel(_) => CursorState::Leaf,
            _ => CursorState::Detached,
        };
        MapperIterator::new(self, self.size(), state)
    }

    /// Creates an iterator pointing to the first gas particle.
    pub fn begin_gas(&self) -> MapperIterator<'_, F> {
        match self {
            Self::AddGas(mapper) => mapper.gas().begin(),
            _ => self.end(),
        }
    }

    /// Creates an iterator pointing just past the last gas particle.
    pub fn end_gas(&self) -> MapperIterator<'_, F> {
        match self {
            Self::AddGas(mapper) => mapper.gas().end(),
            _ => self.end(),
        }
    }

    /// Creates an iterator pointing to the first dark matter particle.
    pub fn begin_dm(&self) -> MapperIterator<'_, F> {
        match self {
            Self::AddGas(mapper) => mapper.dm().begin(),
            _ => self.begin(),
        }
    }

    /// Creates an iterator pointing just past the last dark matter particle.
    pub fn end_dm(&self) -> MapperIterator<'_, F> {
        match self {
            Self::AddGas(mapper) => mapper.dm().end(),
            _ => self.end(),
        }
    }

    /// Returns an iterator over all particles in order.
    pub fn particles(&self) -> Particles<'_, F> {
        Particles::new(self.begin(), self.end())
    }

    /// Returns an iterator over the gas particles in order.
    pub fn gas_particles(&self) -> Particles<'_, F> {
        Particles::new(self.begin_gas(), self.end_gas())
    }

    /// Returns an iterator over the dark matter particles in order.
    pub fn dm_particles(&self) -> Particles<'_, F> {
        Particles::new(self.begin_dm(), self.end_dm())
    }

    /// Resolves the given particle ids, numbered in this mapper's own
    /// sequence, into cell index lists for the grids they live on.
    ///
    /// Every id is validated before anything is returned.
    pub fn plan_particle_list(&self, ids: Vec<usize>) -> Result<ParticleListPlan> {
        match self {
            Self::OneLevel(mapper) => mapper.plan_particle_list(ids),
            Self::TwoLevel(mapper) => mapper.plan_particle_list(ids),
            Self::Sub(mapper) => mapper.plan_particle_list(ids),
            Self::AddGas(mapper) => mapper.plan_particle_list(ids),
        }
    }

    /// Imposes the given particle ids on the grids of the mapper, replacing
    /// their lists of selected cells.
    ///
    /// Nothing is written unless the whole list resolves successfully.
    pub fn interpret_particle_list(&self, arena: &GridArena<F>, ids: Vec<usize>) -> Result<()> {
        let plan = self.plan_particle_list(ids)?;
        for (grid, _) in &plan {
            arena.try_get(*grid)?;
        }
        for (grid, indices) in plan {
            arena[grid].replace_particle_indices(indices);
        }
        Ok(())
    }

    /// Evaluates the given closure for every particle in parallel and returns
    /// the results in sequence order.
    ///
    /// The sequence itself is traversed on the calling thread; only the
    /// per-particle evaluations run concurrently.
    pub fn par_map_particles<T, C>(&self, verbosity: Verbosity, compute: C) -> Vec<T>
    where
        T: Send,
        C: Fn(ParticleRef) -> T + Sync + Send,
    {
        let particles: Vec<ParticleRef> = self.particles().collect();
        let n_particles = particles.len();
        particles
            .into_par_iter()
            .progress_with(verbosity.create_progress_bar(n_particles))
            .map(compute)
            .collect()
    }
}

impl<F: BFloat> From<OneLevelParticleMapper> for ParticleMapper<F> {
    fn from(mapper: OneLevelParticleMapper) -> Self {
        Self::OneLevel(mapper)
    }
}

impl<F: BFloat> From<TwoLevelParticleMapper<F>> for ParticleMapper<F> {
    fn from(mapper: TwoLevelParticleMapper<F>) -> Self {
        Self::TwoLevel(mapper)
    }
}

impl<F: BFloat> From<SubMapper<F>> for ParticleMapper<F> {
    fn from(mapper: SubMapper<F>) -> Self {
        Self::Sub(mapper)
    }
}

impl<F: BFloat> From<AddGasMapper<F>> for ParticleMapper<F> {
    fn from(mapper: AddGasMapper<F>) -> Self {
        Self::AddGas(mapper)
    }
}

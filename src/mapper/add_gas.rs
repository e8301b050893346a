//! Mapper listing gas particles ahead of dark matter particles.

use super::{cursor::CursorState, MapperIterator, ParticleListPlan, ParticleMapper, ParticleRef};
use crate::{
    error::{MapperError, Result},
    num::BFloat,
};
use std::sync::Arc;

/// Mapper concatenating a gas mapper and a dark matter mapper.
///
/// Positions below the number of gas particles belong to the gas mapper,
/// the rest to the dark matter mapper. The two children may share the same
/// underlying mapper.
#[derive(Debug)]
pub struct AddGasMapper<F: BFloat> {
    gas: Arc<ParticleMapper<F>>,
    dm: Arc<ParticleMapper<F>>,
    n_gas: usize,
    n_dm: usize,
}

impl<F: BFloat> AddGasMapper<F> {
    /// Creates a new mapper from the given gas and dark matter mappers.
    pub fn new(gas: Arc<ParticleMapper<F>>, dm: Arc<ParticleMapper<F>>) -> Result<Self> {
        if gas.size_gas() != 0 || dm.size_gas() != 0 {
            return Err(MapperError::Consistency(
                "Gas cannot be added to mappers already containing gas".to_string(),
            ));
        }
        let n_gas = gas.size();
        let n_dm = dm.size();
        Ok(Self {
            gas,
            dm,
            n_gas,
            n_dm,
        })
    }

    /// Returns the mapper providing the gas particles.
    pub fn gas(&self) -> &Arc<ParticleMapper<F>> {
        &self.gas
    }

    /// Returns the mapper providing the dark matter particles.
    pub fn dm(&self) -> &Arc<ParticleMapper<F>> {
        &self.dm
    }

    pub fn size(&self) -> usize {
        self.n_gas + self.n_dm
    }

    pub fn size_gas(&self) -> usize {
        self.n_gas
    }

    pub fn size_dm(&self) -> usize {
        self.n_dm
    }

    pub(crate) fn begin<'a>(&'a self, mapper: &'a ParticleMapper<F>) -> MapperIterator<'a, F> {
        MapperIterator::new(
            mapper,
            0,
            CursorState::AddGas {
                gas: Box::new(self.gas.begin()),
                dm: Box::new(self.dm.begin()),
            },
        )
    }

    pub(crate) fn advance(&self, iterator: &mut MapperIterator<'_, F>) {
        if let CursorState::AddGas { gas, dm } = &mut iterator.state {
            if iterator.position >= self.n_gas {
                dm.advance();
            } else {
                gas.advance();
            }
        }
        iterator.position += 1;
    }

    pub(crate) fn advance_by(&self, iterator: &mut MapperIterator<'_, F>, n: usize) {
        let n_gas_steps = self.n_gas.saturating_sub(iterator.position).min(n);
        if let CursorState::AddGas { gas, dm } = &mut iterator.state {
            gas.advance_by(n_gas_steps);
            dm.advance_by(n - n_gas_steps);
        }
        iterator.position += n;
    }

    pub(crate) fn dereference(
        &self,
        position: usize,
        gas: &MapperIterator<'_, F>,
        dm: &MapperIterator<'_, F>,
    ) -> Option<ParticleRef> {
        if position < self.n_gas {
            gas.particle()
        } else {
            dm.particle()
        }
    }

    pub(crate) fn plan_particle_list(&self, ids: Vec<usize>) -> Result<ParticleListPlan> {
        let n_particles = self.size();
        if let Some(&id) = ids.iter().find(|&&id| id >= n_particles) {
            return Err(MapperError::OutOfRange(format!(
                "Particle {} does not exist on add-gas mapper with {} particles",
                id, n_particles
            )));
        }
        if ids.iter().any(|&id| id < self.n_gas) {
            return Err(MapperError::Unsupported(
                "Currently supporting only dark matter constraints".to_string(),
            ));
        }
        self.dm
            .plan_particle_list(ids.into_iter().map(|id| id - self.n_gas).collect())
    }
}

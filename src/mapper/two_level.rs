//! Mapper replacing selected coarse particles with refined fine particles.

use super::{cursor::CursorState, MapperIterator, ParticleListPlan, ParticleMapper, ParticleRef};
use crate::{
    error::{MapperError, Result},
    grid::{cubic::CubicLattice, GridArena, GridHandle},
    num::BFloat,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, OnceLock},
};

/// A fine particle together with the zoom particle it refines.
#[derive(Clone, Copy, Debug, PartialEq)]
struct FineParticle {
    /// Position of the particle in the fine mapper's sequence.
    position: usize,
    /// Position of the refined particle in the list of zoom particles.
    zoom_slot: usize,
}

/// Cursor state of a [`TwoLevelParticleMapper`].
#[derive(Clone, Debug)]
pub(crate) struct TwoLevelCursor<'a, F: BFloat> {
    coarse: Box<MapperIterator<'a, F>>,
    fine: Box<MapperIterator<'a, F>>,
    /// Slot in the zoom particle list of the next coarse particle to skip.
    next_zoom: usize,
}

/// Mapper combining a coarse and a fine mapper, where a set of "zoom"
/// particles of the coarse mapper is replaced by the fine particles whose
/// cell centres lie inside the corresponding coarse cells.
///
/// The sequence first lists all coarse particles that are not zoomed, in
/// coarse order, followed by the fine particles refining each zoom particle
/// in ascending order of the zoom particles. Within the refinement of a
/// single zoom particle, fine particles appear in ascending fine order. If
/// the fine mapper cannot iterate backwards, the complete fine part is
/// instead sorted in ascending fine order so that it can be traversed by
/// moving forward only.
///
/// Either mapper may itself be composite. Refinement always happens between
/// the coarsest grids of the two mappers, so every zoom particle must lie on
/// the coarsest grid of the coarse mapper, and every refining cell must be
/// present in the fine mapper.
#[derive(Debug)]
pub struct TwoLevelParticleMapper<F: BFloat> {
    coarse: Arc<ParticleMapper<F>>,
    fine: Arc<ParticleMapper<F>>,
    coarse_lattice: CubicLattice<F>,
    fine_lattice: CubicLattice<F>,
    zoom_particles: Vec<usize>,
    /// Coarse grid cell of each zoom particle.
    zoom_cells: Vec<usize>,
    /// Fine mapper position of each fine grid cell, unless the fine mapper
    /// is a single grid and positions equal cells.
    fine_cell_positions: Option<HashMap<usize, usize>>,
    n_fine_per_coarse: usize,
    n_particles: usize,
    first_fine_particle: usize,
    fine_particles: OnceLock<Vec<FineParticle>>,
}

impl<F: BFloat> TwoLevelParticleMapper<F> {
    /// Creates a new two-level mapper.
    ///
    /// The zoom particles are positions in the coarse mapper's sequence and
    /// are sorted and deduplicated. Every zoom particle must be refined by
    /// exactly `n_fine_per_coarse` cells of the fine grid.
    pub fn new(
        arena: &GridArena<F>,
        coarse: Arc<ParticleMapper<F>>,
        fine: Arc<ParticleMapper<F>>,
        mut zoom_particles: Vec<usize>,
        n_fine_per_coarse: usize,
    ) -> Result<Self> {
        if coarse.size_gas() != 0 || fine.size_gas() != 0 {
            return Err(MapperError::Consistency(
                "Two-level mappers cannot be built from mappers containing gas".to_string(),
            ));
        }
        if n_fine_per_coarse == 0 {
            return Err(MapperError::Consistency(
                "Number of fine particles per coarse particle must be at least one".to_string(),
            ));
        }

        let coarse_grid = coarse.coarsest_grid()?;
        let fine_grid = fine.coarsest_grid()?;
        let coarse_lattice = arena.try_get(coarse_grid)?.lattice().clone();
        let fine_lattice = arena.try_get(fine_grid)?.lattice().clone();

        zoom_particles.sort_unstable();
        zoom_particles.dedup();

        let n_coarse = coarse.size();
        if let Some(&last) = zoom_particles.last() {
            if last >= n_coarse {
                return Err(MapperError::OutOfRange(format!(
                    "Zoom particle {} does not exist on coarse mapper with {} particles",
                    last, n_coarse
                )));
            }
        }

        let zoom_cells = find_zoom_cells(&coarse, coarse_grid, &zoom_particles)?;

        let fine_cell_positions = match fine.as_ref() {
            ParticleMapper::OneLevel(_) => None,
            _ => Some(find_cell_positions(&fine, fine_grid)),
        };

        for (&zoom_particle, &zoom_cell) in zoom_particles.iter().zip(&zoom_cells) {
            let refining_cells = fine_lattice.ids_in_cube(
                &coarse_lattice.centroid(zoom_cell),
                coarse_lattice.cell_extent(),
            );
            if refining_cells.len() != n_fine_per_coarse {
                return Err(MapperError::Consistency(format!(
                    "Zoom particle {} is refined by {} fine particles, expected {}",
                    zoom_particle,
                    refining_cells.len(),
                    n_fine_per_coarse
                )));
            }
            if let Some(positions) = &fine_cell_positions {
                if let Some(missing) = refining_cells
                    .iter()
                    .find(|&cell| !positions.contains_key(cell))
                {
                    return Err(MapperError::Consistency(format!(
                        "Fine cell {} refining zoom particle {} is not part of the {} mapper",
                        missing,
                        zoom_particle,
                        fine.kind()
                    )));
                }
            }
        }

        let n_zoomed = zoom_particles.len();
        Ok(Self {
            coarse,
            fine,
            coarse_lattice,
            fine_lattice,
            zoom_particles,
            zoom_cells,
            fine_cell_positions,
            n_fine_per_coarse,
            n_particles: n_coarse + (n_fine_per_coarse - 1) * n_zoomed,
            first_fine_particle: n_coarse - n_zoomed,
            fine_particles: OnceLock::new(),
        })
    }

    /// Returns the total number of particles.
    pub fn size(&self) -> usize {
        self.n_particles
    }

    /// Returns the mapper providing the coarse particles.
    pub fn coarse(&self) -> &Arc<ParticleMapper<F>> {
        &self.coarse
    }

    /// Returns the mapper providing the fine particles.
    pub fn fine(&self) -> &Arc<ParticleMapper<F>> {
        &self.fine
    }

    /// Returns the sorted coarse positions replaced by fine particles.
    pub fn zoom_particles(&self) -> &[usize] {
        &self.zoom_particles
    }

    /// Returns the coarse grid cells of the zoom particles.
    pub fn zoom_cells(&self) -> &[usize] {
        &self.zoom_cells
    }

    /// Returns the number of fine particles replacing each zoom particle.
    pub fn n_fine_per_coarse(&self) -> usize {
        self.n_fine_per_coarse
    }

    /// Returns the position of the first fine particle in the sequence.
    pub fn first_fine_particle(&self) -> usize {
        self.first_fine_particle
    }

    /// Finds the fine grid cells whose centres lie inside the given coarse
    /// grid cell.
    pub fn refining_cells(&self, coarse_cell: usize) -> Vec<usize> {
        self.fine_lattice.ids_in_cube(
            &self.coarse_lattice.centroid(coarse_cell),
            self.coarse_lattice.cell_extent(),
        )
    }

    /// Returns the fine mapper positions for the fine part of the sequence,
    /// computing them on first use.
    pub fn fine_positions(&self) -> Vec<usize> {
        self.fine_particles()
            .iter()
            .map(|particle| particle.position)
            .collect()
    }

    fn fine_particles(&self) -> &[FineParticle] {
        self.fine_particles
            .get_or_init(|| self.compute_fine_particles())
    }

    fn fine_position(&self, fine_cell: usize) -> Option<usize> {
        match &self.fine_cell_positions {
            Some(positions) => positions.get(&fine_cell).copied(),
            None => Some(fine_cell),
        }
    }

    fn compute_fine_particles(&self) -> Vec<FineParticle> {
        let mut fine_particles =
            Vec::with_capacity(self.zoom_cells.len() * self.n_fine_per_coarse);
        for (zoom_slot, &zoom_cell) in self.zoom_cells.iter().enumerate() {
            // Every refining cell has a position, as checked on construction
            let mut cluster: Vec<_> = self
                .refining_cells(zoom_cell)
                .into_iter()
                .filter_map(|fine_cell| self.fine_position(fine_cell))
                .collect();
            cluster.sort_unstable();
            fine_particles.extend(
                cluster
                    .into_iter()
                    .map(|position| FineParticle { position, zoom_slot }),
            );
        }
        if !self.fine.supports_reverse_iterator() {
            fine_particles.sort_by_key(|particle| particle.position);
        }
        fine_particles
    }

    pub(crate) fn begin<'a>(&'a self, mapper: &'a ParticleMapper<F>) -> MapperIterator<'a, F> {
        let mut cursor = TwoLevelCursor {
            coarse: Box::new(self.coarse.begin()),
            fine: Box::new(self.fine.begin()),
            next_zoom: 0,
        };
        if self.first_fine_particle > 0 {
            self.skip_zoomed(&mut cursor);
        } else if let Some(first) = self.fine_particles().first() {
            cursor.fine.seek(first.position);
        }
        MapperIterator::new(mapper, 0, CursorState::TwoLevel(cursor))
    }

    /// Moves the coarse cursor past any zoom particles at its position.
    fn skip_zoomed(&self, cursor: &mut TwoLevelCursor<'_, F>) {
        while let Some(&zoom_particle) = self.zoom_particles.get(cursor.next_zoom) {
            if cursor.coarse.position() != zoom_particle {
                break;
            }
            cursor.coarse.advance();
            cursor.next_zoom += 1;
        }
    }

    /// Moves the fine cursor to the fine particle at the iterator's position.
    fn seek_fine(&self, iterator: &mut MapperIterator<'_, F>) {
        let position = iterator.position;
        if let CursorState::TwoLevel(cursor) = &mut iterator.state {
            if let Some(particle) = self
                .fine_particles()
                .get(position - self.first_fine_particle)
            {
                cursor.fine.seek(particle.position);
            }
        }
    }

    pub(crate) fn advance(&self, iterator: &mut MapperIterator<'_, F>) {
        iterator.position += 1;
        if iterator.position >= self.first_fine_particle {
            self.seek_fine(iterator);
        } else if let CursorState::TwoLevel(cursor) = &mut iterator.state {
            cursor.coarse.advance();
            self.skip_zoomed(cursor);
        }
    }

    pub(crate) fn advance_by(&self, iterator: &mut MapperIterator<'_, F>, n: usize) {
        let mut remaining = n;
        while remaining > 0 && iterator.position < self.first_fine_particle {
            self.advance(iterator);
            remaining -= 1;
        }
        if remaining > 0 {
            iterator.position += remaining;
            self.seek_fine(iterator);
        }
    }

    pub(crate) fn dereference(
        &self,
        position: usize,
        cursor: &TwoLevelCursor<'_, F>,
    ) -> Option<ParticleRef> {
        if position >= self.first_fine_particle {
            cursor.fine.particle()
        } else {
            cursor.coarse.particle()
        }
    }

    pub(crate) fn plan_particle_list(&self, ids: Vec<usize>) -> Result<ParticleListPlan> {
        let fine_particles = self.fine_particles();

        let mut coarse_ids = Vec::new();
        let mut included_coarse_ids = HashSet::new();
        let mut fine_ids = Vec::with_capacity(ids.len());

        for id in ids {
            if id >= self.n_particles {
                return Err(MapperError::OutOfRange(format!(
                    "Particle {} does not exist on two-level mapper with {} particles",
                    id, self.n_particles
                )));
            }
            if id < self.first_fine_particle {
                return Err(MapperError::ConstraintInLowRes {
                    id,
                    first_fine: self.first_fine_particle,
                });
            }
            let fine_particle = fine_particles[id - self.first_fine_particle];
            let coarse_id = self.zoom_particles[fine_particle.zoom_slot];
            if included_coarse_ids.insert(coarse_id) {
                coarse_ids.push(coarse_id);
            }
            fine_ids.push(fine_particle.position);
        }

        let mut plan = self.coarse.plan_particle_list(coarse_ids)?;
        plan.extend(self.fine.plan_particle_list(fine_ids)?);
        Ok(plan)
    }
}

/// Finds the grid cells of the given sorted positions of the coarse mapper,
/// which must all lie on its coarsest grid.
fn find_zoom_cells<F: BFloat>(
    coarse: &ParticleMapper<F>,
    coarse_grid: GridHandle,
    zoom_particles: &[usize],
) -> Result<Vec<usize>> {
    let mut cursor = coarse.begin();
    zoom_particles
        .iter()
        .map(|&zoom_particle| {
            let steps = zoom_particle - cursor.position();
            cursor.advance_by(steps);
            match cursor.particle() {
                Some(particle) if particle.grid == coarse_grid => Ok(particle.index),
                _ => Err(MapperError::Consistency(format!(
                    "Zoom particle {} does not lie on the coarsest grid of the {} mapper",
                    zoom_particle,
                    coarse.kind()
                ))),
            }
        })
        .collect()
}

/// Maps each cell of the given grid to its position in the mapper's sequence.
fn find_cell_positions<F: BFloat>(
    mapper: &ParticleMapper<F>,
    grid: GridHandle,
) -> HashMap<usize, usize> {
    mapper
        .particles()
        .enumerate()
        .filter(|(_, particle)| particle.grid == grid)
        .map(|(position, particle)| (particle.index, position))
        .collect()
}

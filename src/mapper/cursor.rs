//! Cursors traversing the particle sequence of a mapper.

use super::{two_level::TwoLevelCursor, ParticleMapper, ParticleRef};
use crate::{
    error::{MapperError, Result},
    num::BFloat,
};
use std::{iter::FusedIterator, ptr};

/// Variant-specific state of a [`MapperIterator`].
#[derive(Clone, Debug)]
pub(crate) enum CursorState<'a, F: BFloat> {
    /// Past-the-end cursor of a composite mapper, carrying no child cursors.
    Detached,
    /// Cursor over a single grid, fully described by its position.
    Leaf,
    TwoLevel(TwoLevelCursor<'a, F>),
    Sub(Box<MapperIterator<'a, F>>),
    AddGas {
        gas: Box<MapperIterator<'a, F>>,
        dm: Box<MapperIterator<'a, F>>,
    },
}

/// Position in the particle sequence of a mapper.
///
/// A cursor owns the cursors of the child mappers it is composed from.
/// Two cursors compare equal when they belong to the same mapper and are
/// at the same position.
#[derive(Clone, Debug)]
pub struct MapperIterator<'a, F: BFloat> {
    mapper: &'a ParticleMapper<F>,
    pub(crate) position: usize,
    pub(crate) state: CursorState<'a, F>,
}

impl<'a, F: BFloat> MapperIterator<'a, F> {
    pub(crate) fn new(
        mapper: &'a ParticleMapper<F>,
        position: usize,
        state: CursorState<'a, F>,
    ) -> Self {
        Self {
            mapper,
            position,
            state,
        }
    }

    /// Returns the mapper the cursor belongs to.
    pub fn mapper(&self) -> &'a ParticleMapper<F> {
        self.mapper
    }

    /// Returns the position of the cursor in the particle sequence.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the cursor is at or past the end of the sequence.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.mapper.size()
    }

    /// Moves the cursor to the next particle.
    pub fn advance(&mut self) {
        if let CursorState::Detached = self.state {
            self.position += 1;
            return;
        }
        let mapper = self.mapper;
        match mapper {
            ParticleMapper::OneLevel(_) => self.position += 1,
            ParticleMapper::TwoLevel(mapper) => mapper.advance(self),
            ParticleMapper::Sub(mapper) => mapper.advance(self),
            ParticleMapper::AddGas(mapper) => mapper.advance(self),
        }
    }

    /// Moves the cursor forward by the given number of particles.
    pub fn advance_by(&mut self, n: usize) {
        if let CursorState::Detached = self.state {
            self.position += n;
            return;
        }
        let mapper = self.mapper;
        match mapper {
            ParticleMapper::OneLevel(_) => self.position += n,
            ParticleMapper::TwoLevel(mapper) => mapper.advance_by(self, n),
            ParticleMapper::Sub(mapper) => mapper.advance_by(self, n),
            ParticleMapper::AddGas(mapper) => mapper.advance_by(self, n),
        }
    }

    /// Moves the cursor backward by the given number of particles.
    ///
    /// Only cursors over mappers supporting reverse iteration can move
    /// backwards. On failure the cursor is left unchanged.
    pub fn retreat_by(&mut self, n: usize) -> Result<()> {
        if !self.mapper.supports_reverse_iterator() {
            return Err(MapperError::Unsupported(format!(
                "Attempting to reverse in a {} mapper, which does not support random access",
                self.mapper.kind()
            )));
        }
        if n > self.position {
            return Err(MapperError::OutOfRange(format!(
                "Cannot move back {} particles from position {}",
                n, self.position
            )));
        }
        self.position -= n;
        Ok(())
    }

    /// Moves the cursor to the given position, moving backwards directly
    /// when supported and restarting from the beginning otherwise.
    pub(crate) fn seek(&mut self, target: usize) {
        if target >= self.position {
            self.advance_by(target - self.position);
        } else if self.retreat_by(self.position - target).is_err() {
            let mapper = self.mapper;
            *self = mapper.begin();
            self.advance_by(target);
        }
    }

    /// Resolves the particle the cursor points to, or returns `None` if the
    /// cursor is at or past the end of the sequence.
    pub fn particle(&self) -> Option<ParticleRef> {
        if self.is_exhausted() {
            return None;
        }
        match (self.mapper, &self.state) {
            (ParticleMapper::OneLevel(mapper), CursorState::Leaf) => {
                Some(mapper.dereference(self.position))
            }
            (ParticleMapper::TwoLevel(mapper), CursorState::TwoLevel(cursor)) => {
                mapper.dereference(self.position, cursor)
            }
            (ParticleMapper::Sub(_), CursorState::Sub(underlying)) => underlying.particle(),
            (ParticleMapper::AddGas(mapper), CursorState::AddGas { gas, dm }) => {
                mapper.dereference(self.position, gas, dm)
            }
            _ => None,
        }
    }
}

impl<'a, F: BFloat> PartialEq for MapperIterator<'a, F> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.mapper, other.mapper) && self.position == other.position
    }
}

/// Iterator over the particles between two cursors of the same mapper.
#[derive(Clone, Debug)]
pub struct Particles<'a, F: BFloat> {
    current: MapperIterator<'a, F>,
    end: usize,
}

impl<'a, F: BFloat> Particles<'a, F> {
    /// Creates an iterator yielding the particles from `begin` up to, but
    /// not including, `end`.
    pub fn new(begin: MapperIterator<'a, F>, end: MapperIterator<'a, F>) -> Self {
        debug_assert!(
            ptr::eq(begin.mapper, end.mapper),
            "Iterator range must belong to a single mapper"
        );
        Self {
            end: end.position,
            current: begin,
        }
    }
}

impl<'a, F: BFloat> Iterator for Particles<'a, F> {
    type Item = ParticleRef;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.position >= self.end {
            return None;
        }
        let particle = self.current.particle();
        self.current.advance();
        particle
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.current.position);
        (remaining, Some(remaining))
    }
}

impl<'a, F: BFloat> ExactSizeIterator for Particles<'a, F> {}

impl<'a, F: BFloat> FusedIterator for Particles<'a, F> {}

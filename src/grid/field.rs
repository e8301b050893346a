//! Field buffers that switch lazily between real and Fourier space.

use crate::{
    fourier::{FourierTransformer, TransformDirection},
    num::BFloat,
};
use ndarray::prelude::*;
use num::Complex;
use std::fmt;

/// Whether field values are real-space or Fourier-space samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    Real,
    Fourier,
}

impl Domain {
    /// Returns the direction of the transform leading into this domain.
    pub fn transform_direction(self) -> TransformDirection {
        match self {
            Self::Real => TransformDirection::Inverse,
            Self::Fourier => TransformDirection::Forward,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Real => "real",
                Self::Fourier => "Fourier",
            }
        )
    }
}

/// An N³ complex field together with the domain its values are currently in.
///
/// Values are kept in standard layout, so the flat position of cell
/// `(x, y, z)` is `x*N² + y*N + z` like the lattice cell index.
///
/// The domain only changes through [`FieldBuffer::ensure_domain`], which
/// performs exactly one transform when the requested domain differs from
/// the current one and none otherwise.
#[derive(Clone, Debug)]
pub struct FieldBuffer<F: BFloat> {
    values: Array3<Complex<F>>,
    domain: Domain,
}

impl<F: BFloat> FieldBuffer<F> {
    /// Creates a zeroed real-space field with N³ values.
    pub fn new(size: usize) -> Self {
        Self {
            values: Array3::from_elem((size, size, size), Complex::new(F::zero(), F::zero())),
            domain: Domain::Real,
        }
    }

    /// Returns the domain the values are currently in.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Returns the number of values along each axis.
    pub fn size(&self) -> usize {
        self.values.len_of(Axis(0))
    }

    /// Returns the number of values, which is always N³.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the buffer holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Brings the values into the given domain and returns them.
    pub fn ensure_domain(
        &mut self,
        domain: Domain,
        transformer: &dyn FourierTransformer<F>,
    ) -> &mut Array3<Complex<F>> {
        if self.domain != domain {
            transformer.transform(&mut self.values, domain.transform_direction());
            self.domain = domain;
        }
        &mut self.values
    }

    /// Computes the real-space values without changing the stored domain.
    pub fn real_values(&self, transformer: &dyn FourierTransformer<F>) -> Array3<F> {
        match self.domain {
            Domain::Real => self.values.mapv(|value| value.re),
            Domain::Fourier => transformer.inverse_to_real(&self.values),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::fourier::SeparableTransformer;
    use approx::assert_abs_diff_eq;

    #[test]
    fn new_buffer_is_real_and_sized() {
        let buffer = FieldBuffer::<f32>::new(3);
        assert_eq!(buffer.len(), 27);
        assert_eq!(buffer.size(), 3);
        assert_eq!(buffer.domain(), Domain::Real);
    }

    #[test]
    fn ensuring_current_domain_leaves_values_alone() {
        let mut buffer = FieldBuffer::<f64>::new(2);
        buffer.ensure_domain(Domain::Real, &SeparableTransformer)[[0, 1, 1]] =
            Complex::new(2.0, 0.0);
        let values = buffer.ensure_domain(Domain::Real, &SeparableTransformer);
        assert_eq!(values[[0, 1, 1]], Complex::new(2.0, 0.0));
        assert_eq!(values.as_slice().map(|flat| flat[3]), Some(values[[0, 1, 1]]));
    }

    #[test]
    fn real_values_of_fourier_buffer_match_inverse() {
        let mut buffer = FieldBuffer::<f64>::new(2);
        buffer.ensure_domain(Domain::Real, &SeparableTransformer)[[0, 0, 0]] =
            Complex::new(1.0, 0.0);
        buffer.ensure_domain(Domain::Fourier, &SeparableTransformer);
        let real = buffer.real_values(&SeparableTransformer);
        assert_eq!(buffer.domain(), Domain::Fourier);
        assert_abs_diff_eq!(real[[0, 0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(real[[1, 0, 1]], 0.0, epsilon = 1e-12);
    }
}

//! Discrete Fourier transforms of cubic fields.

use crate::num::{self as bnum, BFloat};
use ndarray::{prelude::*, Zip};
use num::Complex;

/// Direction of a Fourier transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformDirection {
    /// Real space to Fourier space, using the exp(-2πi jk/N) kernel.
    Forward,
    /// Fourier space to real space, using the exp(+2πi jk/N) kernel.
    Inverse,
}

impl TransformDirection {
    fn kernel_sign<F: BFloat>(self) -> F {
        match self {
            Self::Forward => -F::one(),
            Self::Inverse => F::one(),
        }
    }
}

/// Defines the properties of a service performing 3D transforms of
/// N³ complex fields.
///
/// Each application divides the result by N^1.5, so that a forward
/// transform followed by an inverse one reproduces the input.
pub trait FourierTransformer<F: BFloat>: Send + Sync {
    /// Transforms the given field in place.
    fn transform(&self, values: &mut Array3<Complex<F>>, direction: TransformDirection);

    /// Computes the real part of the inverse transform of the given field,
    /// leaving the input untouched.
    fn inverse_to_real(&self, values: &Array3<Complex<F>>) -> Array3<F> {
        let mut buffer = values.clone();
        self.transform(&mut buffer, TransformDirection::Inverse);
        buffer.mapv(|value| value.re)
    }
}

/// Transformer applying one-dimensional transforms along each axis in turn.
///
/// Power-of-two lane lengths use an iterative radix-2 transform, other
/// lengths fall back to a direct summation.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeparableTransformer;

impl<F: BFloat> FourierTransformer<F> for SeparableTransformer {
    fn transform(&self, values: &mut Array3<Complex<F>>, direction: TransformDirection) {
        let (nx, ny, nz) = values.dim();
        assert!(
            nx == ny && ny == nz,
            "Field of shape {}x{}x{} is not cubic",
            nx,
            ny,
            nz
        );
        if values.is_empty() {
            return;
        }

        let sign = direction.kernel_sign::<F>();
        for axis in 0..3 {
            Zip::from(values.lanes_mut(Axis(axis)))
                .par_for_each(|lane| transform_lane(lane, sign));
        }

        let norm = bnum::from_usize::<F>(values.len()).sqrt();
        values.par_mapv_inplace(|value| value / norm);
    }
}

fn transform_lane<F: BFloat>(lane: ArrayViewMut1<Complex<F>>, sign: F) {
    let n = lane.len();
    if n <= 1 {
        return;
    }
    if n.is_power_of_two() {
        radix2_transform(lane, sign);
    } else {
        direct_transform(lane, sign);
    }
}

fn twiddle<F: BFloat>(sign: F, numerator: usize, denominator: usize) -> Complex<F> {
    let angle = sign * (F::PI() + F::PI()) * bnum::from_usize::<F>(numerator)
        / bnum::from_usize::<F>(denominator);
    Complex::new(angle.cos(), angle.sin())
}

fn direct_transform<F: BFloat>(mut lane: ArrayViewMut1<Complex<F>>, sign: F) {
    let n = lane.len();
    let input = lane.to_owned();
    for (k, output) in lane.iter_mut().enumerate() {
        *output = input
            .iter()
            .enumerate()
            .fold(Complex::new(F::zero(), F::zero()), |sum, (j, &value)| {
                sum + value * twiddle(sign, (j * k) % n, n)
            });
    }
}

fn radix2_transform<F: BFloat>(mut lane: ArrayViewMut1<Complex<F>>, sign: F) {
    let n = lane.len();
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            lane.swap(i, j);
        }
    }

    let mut length = 2;
    while length <= n {
        let half = length / 2;
        for start in (0..n).step_by(length) {
            for k in 0..half {
                let w = twiddle(sign, k, length);
                let even = lane[start + k];
                let odd = lane[start + k + half] * w;
                lane[start + k] = even + odd;
                lane[start + k + half] = even - odd;
            }
        }
        length <<= 1;
    }
}

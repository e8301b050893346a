//! Index arithmetic on cubic lattices with periodic boundaries.

use crate::{
    error::{MapperError, Result},
    geometry::{
        Dim3::{self, X, Y, Z},
        Idx3, In3D, Point3,
    },
    io::Verbosity,
    num::{self as bnum, BFloat},
};
use ndarray::{prelude::*, Zip};

/// A cubic lattice of N³ cells with uniform spacing.
///
/// Cells are numbered in row-major order, so the cell with coordinates
/// `(x, y, z)` has index `x*N² + y*N + z`. The lattice is periodic: all
/// wrapping operations map coordinates back into `[0, N)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CubicLattice<F: BFloat> {
    size: usize,
    size2: usize,
    size3: usize,
    cell_extent: F,
    origin: Point3<F>,
}

impl<F: BFloat> CubicLattice<F> {
    /// Creates a new lattice with the given number of cells along each axis,
    /// cell extent and position of the lower corner.
    pub fn new(size: usize, cell_extent: F, origin: Point3<F>) -> Self {
        assert_ne!(size, 0, "Cannot create lattice with size zero.");
        assert!(
            cell_extent > F::zero(),
            "Cell extent must be larger than zero."
        );
        Self {
            size,
            size2: size * size,
            size3: size * size * size,
            cell_extent,
            origin,
        }
    }

    /// Returns the number of cells along each axis.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of cells in a slab of constant x.
    pub fn size2(&self) -> usize {
        self.size2
    }

    /// Returns the total number of cells.
    pub fn n_cells(&self) -> usize {
        self.size3
    }

    /// Returns the extent of a cell along each axis.
    pub fn cell_extent(&self) -> F {
        self.cell_extent
    }

    /// Returns the position of the lower corner of the lattice.
    pub fn origin(&self) -> &Point3<F> {
        &self.origin
    }

    /// Returns the extent of the whole lattice along each axis.
    pub fn extent(&self) -> F {
        self.cell_extent * bnum::from_usize(self.size)
    }

    /// Maps the given coordinate into `[0, N)`.
    pub fn wrap(&self, coordinate: isize) -> usize {
        coordinate.rem_euclid(self.size as isize) as usize
    }

    /// Maps all components of the given coordinates into `[0, N)`.
    pub fn wrap_coordinates(&self, coordinates: &mut Idx3<isize>) {
        for dim in Dim3::slice() {
            coordinates[dim] = self.wrap(coordinates[dim]) as isize;
        }
    }

    /// Computes the index of the cell with the given coordinates, wrapping
    /// coordinates outside the lattice.
    pub fn index(&self, x: isize, y: isize, z: isize) -> usize {
        (self.wrap(x) * self.size + self.wrap(y)) * self.size + self.wrap(z)
    }

    /// Computes the index of the cell with the given coordinates, failing
    /// if any coordinate is outside `[0, N)`.
    pub fn index_no_wrap(&self, x: isize, y: isize, z: isize) -> Result<usize> {
        let size = self.size as isize;
        let inside = |c: isize| (0..size).contains(&c);
        if inside(x) && inside(y) && inside(z) {
            Ok((x as usize * self.size + y as usize) * self.size + z as usize)
        } else {
            Err(MapperError::OutOfRange(format!(
                "Coordinates ({}, {}, {}) lie outside lattice of size {}",
                x, y, z, self.size
            )))
        }
    }

    /// Computes the index of the cell with the given coordinates, wrapping
    /// coordinates outside the lattice.
    pub fn index_of(&self, coordinates: &Idx3<isize>) -> usize {
        self.index(coordinates[X], coordinates[Y], coordinates[Z])
    }

    /// Computes the coordinates of the cell with the given index.
    pub fn coordinates(&self, index: usize) -> Idx3<usize> {
        debug_assert!(
            index < self.size3,
            "Index {} out of range for lattice with {} cells",
            index,
            self.size3
        );
        Idx3::new(
            index / self.size2,
            (index % self.size2) / self.size,
            index % self.size,
        )
    }

    /// Computes the wave number coordinates of the cell with the given index,
    /// using the centred convention where components above N/2 become negative.
    pub fn k_coordinates(&self, index: usize) -> Idx3<isize> {
        let coordinates = self.coordinates(index);
        let half = self.size / 2;
        Idx3::with_each_component(|dim| {
            let c = coordinates[dim];
            if c > half {
                c as isize - self.size as isize
            } else {
                c as isize
            }
        })
    }

    /// Computes the magnitude of the wave number coordinates of the cell with the given index.
    pub fn abs_k_coordinate(&self, index: usize) -> F {
        bnum::from_isize::<F>(self.k_coordinates(index).squared_length()).sqrt()
    }

    /// Computes the physical position of the centre of the cell with the given index.
    pub fn centroid(&self, index: usize) -> Point3<F> {
        let coordinates = self.coordinates(index);
        let half_extent = self.cell_extent / (F::one() + F::one());
        Point3::with_each_component(|dim| {
            self.origin[dim]
                + bnum::from_usize::<F>(coordinates[dim]) * self.cell_extent
                + half_extent
        })
    }

    /// Computes the index of the cell reached by taking the given step from
    /// the cell with the given index, wrapping around the lattice.
    pub fn next_index(&self, index: usize, step: &Idx3<isize>) -> usize {
        let coordinates = self.coordinates(index);
        self.index(
            coordinates[X] as isize + step[X],
            coordinates[Y] as isize + step[Y],
            coordinates[Z] as isize + step[Z],
        )
    }

    /// Computes the index of the cell reached by taking the given step from
    /// the cell with the given index, failing if the step leaves the lattice.
    pub fn next_index_no_wrap(&self, index: usize, step: &Idx3<isize>) -> Result<usize> {
        let coordinates = self.coordinates(index);
        self.index_no_wrap(
            coordinates[X] as isize + step[X],
            coordinates[Y] as isize + step[Y],
            coordinates[Z] as isize + step[Z],
        )
    }

    /// Computes the inclusive, unwrapped coordinate bounds of the cells whose
    /// centres lie inside the cube with the given centre and width.
    ///
    /// An axis with no such cells has an upper bound below its lower bound.
    /// Returns `None` if the bounds are not representable.
    pub fn cube_coordinate_bounds(
        &self,
        center: &Point3<F>,
        width: F,
    ) -> Option<In3D<(isize, isize)>> {
        let two = F::one() + F::one();
        let half_width = width / two;
        let half_extent = self.cell_extent / two;
        let mut bounds = In3D::same((0, -1));
        for dim in Dim3::slice() {
            let offset = center[dim] - self.origin[dim];
            let lower =
                bnum::floor_to_isize((offset - half_width + half_extent) / self.cell_extent)?;
            let upper =
                bnum::floor_to_isize((offset + half_width - half_extent) / self.cell_extent)?;
            bounds[dim] = (lower, upper);
        }
        Some(bounds)
    }

    /// Finds the indices of all cells whose centres lie inside the cube with
    /// the given centre and width.
    ///
    /// Cells are enumerated in row-major order of the unwrapped coordinates,
    /// with each coordinate wrapped into the lattice.
    pub fn ids_in_cube(&self, center: &Point3<F>, width: F) -> Vec<usize> {
        let bounds = match self.cube_coordinate_bounds(center, width) {
            Some(bounds) => bounds,
            None => return Vec::new(),
        };
        let (x_range, y_range, z_range) = (bounds[X], bounds[Y], bounds[Z]);

        let mut ids = Vec::with_capacity(self.count_in_cube(center, width));
        for x in x_range.0..=x_range.1 {
            for y in y_range.0..=y_range.1 {
                for z in z_range.0..=z_range.1 {
                    ids.push(self.index(x, y, z));
                }
            }
        }
        ids
    }

    /// Counts the cells whose centres lie inside the cube with the given
    /// centre and width, without enumerating them.
    pub fn count_in_cube(&self, center: &Point3<F>, width: F) -> usize {
        self.cube_coordinate_bounds(center, width)
            .map(|bounds| {
                bounds
                    .into_iter()
                    .map(|&(lower, upper)| (upper - lower + 1).max(0) as usize)
                    .product()
            })
            .unwrap_or(0)
    }

    /// Adds the cell centre positions to the given per-cell displacements and
    /// wraps the results periodically into `[0, box_length)`.
    ///
    /// A negative box length means the extent of the lattice. Returns the
    /// mean of the resulting positions.
    pub fn add_cell_positions(
        &self,
        displacements: &mut In3D<Array3<F>>,
        box_length: F,
        verbosity: Verbosity,
    ) -> Point3<F> {
        let box_length = if box_length < F::zero() {
            self.extent()
        } else {
            box_length
        };
        let half_extent = self.cell_extent / (F::one() + F::one());

        for dim in Dim3::slice() {
            let component = &mut displacements[dim];
            assert_eq!(
                component.dim(),
                (self.size, self.size, self.size),
                "Shape of {}-displacements does not match lattice",
                dim
            );
            let origin = self.origin[dim];
            Zip::indexed(component).par_for_each(|(i, j, k), position| {
                let coordinate = match dim {
                    X => i,
                    Y => j,
                    Z => k,
                };
                let unwrapped = *position
                    + bnum::from_usize::<F>(coordinate) * self.cell_extent
                    + half_extent
                    + origin;
                let wrapped = unwrapped % box_length;
                *position = if wrapped < F::zero() {
                    wrapped + box_length
                } else {
                    wrapped
                };
            });
        }

        let n_cells = bnum::from_usize::<F>(self.size3);
        let mean = Point3::with_each_component(|dim| displacements[dim].sum() / n_cells);

        if verbosity.print_messages() {
            println!(
                "Box/2 = {}, mean position = {}",
                box_length / (F::one() + F::one()),
                &mean
            );
        }
        mean
    }
}

//! The `zoomics` crate maps ordered particle sequences onto the cells of
//! nested cubic grids for cosmological zoom initial conditions.
pub mod error;
pub mod fourier;
pub mod geometry;
pub mod grid;
pub mod io;
pub mod mapper;
pub mod num;
pub mod setup;

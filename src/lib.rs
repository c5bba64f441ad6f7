mod container;
mod element;
mod error;
mod open;
mod summary;
mod table;
mod walk;

pub mod format;
pub mod json;
mod report;
pub mod schema;

#[cfg(feature = "hdf5")]
pub mod h5;


pub use container::*;
pub use element::*;
pub use error::*;
pub use open::*;
pub use summary::*;
pub use table::*;
pub use walk::*;

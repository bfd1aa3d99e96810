//! Turning a raw `.par` file into temperature-scaled, offset-padded energy
//! tables: parsing (`raw`), the dense N-dimensional table representation
//! table offsetting builds on (`table`), and temperature scaling (`scale`).

mod raw;
mod scale;
mod table;

pub use raw::*;
pub use scale::*;
pub use table::Table;

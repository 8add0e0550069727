mod cell;
pub use self::cell::{UnitCell, CellShape};

mod structure;
pub use self::structure::Structure;

mod environment;
pub use self::environment::{LocalEnvironment, Neighbor};

#[cfg(test)]
pub(crate) mod test_utils;

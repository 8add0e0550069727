mod single_bond;
pub use self::single_bond::{SingleBond, SingleBondCalculator, SingleBondParameters};

mod lammps;
pub use self::lammps::{LammpsNeighbors, neighbors_from_lammps, NEIGHMASK};

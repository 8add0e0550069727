use crate::{Error, Vector3D};
use crate::systems::Neighbor;

use super::{SingleBond, SingleBondCalculator};

/// LAMMPS stores special bonds flags in the two highest bits of neighbor
/// indexes, this mask removes them.
pub const NEIGHMASK: i32 = 0x1FFF_FFFF;

/// Borrowed view of a LAMMPS full neighbor list, following the layout of the
/// arrays LAMMPS gives to pair styles.
#[derive(Debug, Clone, Copy)]
pub struct LammpsNeighbors<'a> {
    /// Positions of all local and ghost atoms (`atom->x`)
    pub positions: &'a [[f64; 3]],
    /// Types of all local and ghost atoms, starting at 1 (`atom->type`)
    pub types: &'a [i32],
    /// Number of neighbors of each local atom (`list->numneigh`)
    pub numneigh: &'a [i32],
    /// Indexes of the neighbors of each local atom, possibly including
    /// special bonds flags (`list->firstneigh`)
    pub firstneigh: &'a [&'a [i32]],
}

/// Get the neighbors of the local atom `atom` within `cutoff` (included) from
/// a LAMMPS neighbor list.
///
/// The vector to each neighbor is computed from the positions of the ghost
/// atoms, so the cell shift of all neighbors is zero. LAMMPS types are
/// converted to species by subtracting 1.
pub fn neighbors_from_lammps(list: &LammpsNeighbors<'_>, atom: usize, cutoff: f64) -> Result<Vec<Neighbor>, Error> {
    if atom >= list.numneigh.len() || atom >= list.firstneigh.len() || atom >= list.positions.len() {
        return Err(Error::InvalidParameter(format!(
            "atom {} is not part of the LAMMPS neighbor list", atom
        )));
    }

    if list.types.len() != list.positions.len() {
        return Err(Error::ShapeMismatch(format!(
            "got {} LAMMPS types but {} positions", list.types.len(), list.positions.len()
        )));
    }

    let count = list.numneigh[atom];
    let candidates = list.firstneigh[atom];
    if count < 0 || count as usize > candidates.len() {
        return Err(Error::ShapeMismatch(format!(
            "atom {} should have {} neighbors, but only {} were given",
            atom, count, candidates.len()
        )));
    }

    let center = Vector3D::from(list.positions[atom]);
    let cutoff2 = cutoff * cutoff;

    let mut neighbors = Vec::new();
    for &raw in &candidates[..count as usize] {
        let other = (raw & NEIGHMASK) as usize;
        if other >= list.positions.len() {
            return Err(Error::InvalidParameter(format!(
                "neighbor {} of atom {} is outside of the LAMMPS atoms", other, atom
            )));
        }

        let vector = Vector3D::from(list.positions[other]) - center;
        let distance2 = vector.norm2();
        if distance2 > cutoff2 {
            continue;
        }

        neighbors.push(Neighbor {
            atom: other,
            species: list.types[other] - 1,
            vector: vector,
            distance: distance2.sqrt(),
            cell_shift: [0, 0, 0],
        });
    }

    return Ok(neighbors);
}

impl SingleBondCalculator {
    /// Compute the single-bond descriptor of the local atom `atom` from a
    /// LAMMPS neighbor list. The neighbor atoms in the output are LAMMPS
    /// indexes, including ghost atoms.
    pub fn from_lammps(&self, list: &LammpsNeighbors<'_>, atom: usize) -> Result<SingleBond, Error> {
        let neighbors = neighbors_from_lammps(list, atom, self.parameters().cutoff)?;
        return self.single_bond_sum_neighbors(atom, &neighbors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::SingleBondParameters;
    use crate::systems::LocalEnvironment;
    use crate::systems::test_utils::test_structure;

    fn calculator() -> SingleBondCalculator {
        SingleBondCalculator::new(SingleBondParameters {
            cutoff: 3.0,
            max_radial: 5,
            max_angular: 3,
            n_species: 5,
            radial_basis: "chebyshev".into(),
            radial_hyperparameters: vec![0.0, 5.0],
            cutoff_function: "cosine".into(),
            cutoff_hyperparameters: vec![],
        }).unwrap()
    }

    #[test]
    fn neighbors() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 4.0],
        ];
        let types = [1, 2, 3, 1];
        let numneigh = [3];
        // the first neighbor has special bond flags set
        let neighbors_0 = [1 | (1 << 30), 2, 3, 2];
        let firstneigh = [&neighbors_0[..]];

        let list = LammpsNeighbors {
            positions: &positions,
            types: &types,
            numneigh: &numneigh,
            firstneigh: &firstneigh,
        };

        let neighbors = neighbors_from_lammps(&list, 0, 2.0).unwrap();
        assert_eq!(neighbors.len(), 2);

        assert_eq!(neighbors[0].atom, 1);
        assert_eq!(neighbors[0].species, 1);
        assert_eq!(neighbors[0].vector, Vector3D::new(1.0, 0.0, 0.0));

        // neighbors exactly at the cutoff are included
        assert_eq!(neighbors[1].atom, 2);
        assert_eq!(neighbors[1].species, 2);
        assert_eq!(neighbors[1].distance, 2.0);

        assert!(neighbors_from_lammps(&list, 1, 2.0).is_err());

        let numneigh = [5];
        let list = LammpsNeighbors { numneigh: &numneigh, ..list };
        assert!(matches!(neighbors_from_lammps(&list, 0, 2.0), Err(Error::ShapeMismatch(_))));

        let numneigh = [1];
        let bad = [12];
        let firstneigh = [&bad[..]];
        let list = LammpsNeighbors { numneigh: &numneigh, firstneigh: &firstneigh, ..list };
        assert!(matches!(neighbors_from_lammps(&list, 0, 2.0), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn same_as_environment() {
        let calculator = calculator();
        let structure = test_structure("triclinic");

        for center in 0..structure.size() {
            let environment = LocalEnvironment::new(&structure, center, 5.0).unwrap();

            // put the central atom at the origin and every neighbor at the
            // end of its vector, as LAMMPS ghost atoms
            let mut positions: Vec<[f64; 3]> = vec![[0.0; 3]];
            let mut types = vec![environment.species() + 1];
            let mut neighbors = Vec::new();
            for neighbor in environment.neighbors() {
                neighbors.push(positions.len() as i32 | (1 << 30));
                positions.push(neighbor.vector.into());
                types.push(neighbor.species + 1);
            }
            let numneigh = [neighbors.len() as i32];
            let firstneigh = [&neighbors[..]];

            let list = LammpsNeighbors {
                positions: &positions,
                types: &types,
                numneigh: &numneigh,
                firstneigh: &firstneigh,
            };

            let lammps = calculator.from_lammps(&list, 0).unwrap();

            let environment = LocalEnvironment::new(&structure, center, 3.0).unwrap();
            let expected = calculator.single_bond_sum_env(&environment).unwrap();

            assert_eq!(lammps.values, expected.values);
            assert_eq!(lammps.force_gradients, expected.force_gradients);
            assert_eq!(lammps.stress_gradients, expected.stress_gradients);
            assert_eq!(lammps.n_neighbors(), environment.len());
        }
    }
}

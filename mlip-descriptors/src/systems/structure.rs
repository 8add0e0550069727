use ndarray::{ArrayView1, ArrayView2};

use crate::{Error, Matrix3, Vector3D};
use super::{UnitCell, LocalEnvironment};

/// A periodic structure: a unit cell, the species of all atoms and their
/// Cartesian positions.
///
/// The positions wrapped inside the unit cell are computed when the structure
/// is created, and updated every time the positions or the cell change.
#[derive(Debug, Clone)]
pub struct Structure {
    cell: UnitCell,
    species: Vec<i32>,
    positions: Vec<Vector3D>,
    wrapped_positions: Vec<Vector3D>,
}

impl Structure {
    /// Create a new structure with the given `cell`, atomic `species` and
    /// Cartesian `positions`.
    pub fn new(cell: UnitCell, species: Vec<i32>, positions: Vec<Vector3D>) -> Result<Structure, Error> {
        if species.len() != positions.len() {
            return Err(Error::ShapeMismatch(format!(
                "got {} species but {} positions", species.len(), positions.len()
            )));
        }

        let wrapped_positions = wrap_positions(&cell, &positions);
        return Ok(Structure {
            cell,
            species,
            positions,
            wrapped_positions,
        });
    }

    /// Create a new structure from dense arrays: a `3 x 3` cell matrix
    /// containing the lattice vectors as rows, the species of all atoms and
    /// a `n_atoms x 3` array of positions.
    ///
    /// A cell matrix containing only zeros describes a structure without
    /// periodic boundary conditions.
    pub fn from_arrays(
        cell: ArrayView2<f64>,
        species: ArrayView1<i32>,
        positions: ArrayView2<f64>
    ) -> Result<Structure, Error> {
        if cell.shape() != [3, 3] {
            return Err(Error::ShapeMismatch(format!(
                "expected a 3x3 cell matrix, got a {:?} array", cell.shape()
            )));
        }

        if positions.ncols() != 3 {
            return Err(Error::ShapeMismatch(format!(
                "expected positions with 3 columns, got {} columns", positions.ncols()
            )));
        }

        let cell = if cell.iter().all(|&v| v == 0.0) {
            UnitCell::infinite()
        } else {
            let matrix = Matrix3::new([
                [cell[[0, 0]], cell[[0, 1]], cell[[0, 2]]],
                [cell[[1, 0]], cell[[1, 1]], cell[[1, 2]]],
                [cell[[2, 0]], cell[[2, 1]], cell[[2, 2]]],
            ]);
            UnitCell::try_from(matrix)?
        };

        let positions = positions.rows()
            .into_iter()
            .map(|row| Vector3D::new(row[0], row[1], row[2]))
            .collect();

        return Structure::new(cell, species.to_vec(), positions);
    }

    /// Get the unit cell of this structure
    pub fn cell(&self) -> &UnitCell {
        &self.cell
    }

    /// Get the species of all atoms in this structure
    pub fn species(&self) -> &[i32] {
        &self.species
    }

    /// Get the Cartesian positions of all atoms, as given by the user
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Get the positions of all atoms wrapped inside the unit cell. The
    /// fractional coordinates of the wrapped positions are in `[0, 1)`.
    pub fn wrapped_positions(&self) -> &[Vector3D] {
        &self.wrapped_positions
    }

    /// Get the number of atoms in this structure
    pub fn size(&self) -> usize {
        self.species.len()
    }

    /// Replace the positions of all atoms
    pub fn set_positions(&mut self, positions: Vec<Vector3D>) -> Result<(), Error> {
        if positions.len() != self.species.len() {
            return Err(Error::ShapeMismatch(format!(
                "this structure contains {} atoms, got {} positions",
                self.species.len(), positions.len()
            )));
        }

        self.wrapped_positions = wrap_positions(&self.cell, &positions);
        self.positions = positions;
        return Ok(());
    }

    /// Replace the unit cell, keeping the same Cartesian positions
    pub fn set_cell(&mut self, cell: UnitCell) {
        self.wrapped_positions = wrap_positions(&cell, &self.positions);
        self.cell = cell;
    }

    /// Get the local environments of all atoms in this structure, including
    /// all neighbors within `cutoff`.
    pub fn local_environments(&self, cutoff: f64) -> Result<Vec<LocalEnvironment>, Error> {
        (0..self.size())
            .map(|center| LocalEnvironment::new(self, center, cutoff))
            .collect()
    }
}

fn wrap_positions(cell: &UnitCell, positions: &[Vector3D]) -> Vec<Vector3D> {
    positions.iter()
        .map(|&position| {
            let mut wrapped = position;
            cell.wrap_vector(&mut wrapped);
            wrapped
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_ulps_eq;
    use ndarray::{array, Array2};

    use super::*;
    use crate::systems::test_utils::test_structure;

    /// Check that `a - b` is a lattice translation
    fn assert_lattice_translation(cell: &UnitCell, a: Vector3D, b: Vector3D) {
        let fractional = cell.fractional(a - b);
        for k in 0..3 {
            assert!(
                f64::abs(fractional[k] - f64::round(fractional[k])) < 1e-10,
                "{:?} and {:?} are not periodic images", a, b
            );
        }
    }

    #[test]
    fn shape_mismatch() {
        let error = Structure::new(
            UnitCell::cubic(3.0).unwrap(),
            vec![0, 1],
            vec![Vector3D::zero()],
        ).unwrap_err();
        assert_eq!(error.to_string(), "shape mismatch: got 2 species but 1 positions");

        let mut structure = test_structure("water");
        assert!(structure.set_positions(vec![Vector3D::zero(); 4]).is_err());
    }

    #[test]
    fn wrapped_positions() {
        let structure = test_structure("triclinic");
        assert_eq!(structure.size(), 5);

        let cell = structure.cell();
        for (&position, &wrapped) in structure.positions().iter().zip(structure.wrapped_positions()) {
            assert_lattice_translation(cell, position, wrapped);

            let fractional = cell.fractional(wrapped);
            for k in 0..3 {
                assert!(fractional[k] > -1e-12 && fractional[k] < 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn infinite_cell() {
        let structure = Structure::new(
            UnitCell::infinite(),
            vec![0, 0],
            vec![Vector3D::new(-12.0, 3.0, 25.0), Vector3D::new(1.0, 2.0, 3.0)],
        ).unwrap();

        assert_eq!(structure.positions(), structure.wrapped_positions());
    }

    #[test]
    fn update_positions_and_cell() {
        let mut structure = test_structure("methane");

        let mut positions = structure.positions().to_vec();
        positions[1] += Vector3D::new(7.0, -3.0, 0.0);
        structure.set_positions(positions.clone()).unwrap();
        assert_eq!(structure.positions()[1], positions[1]);
        assert_lattice_translation(structure.cell(), positions[1], structure.wrapped_positions()[1]);

        structure.set_cell(UnitCell::cubic(2.5).unwrap());
        for &wrapped in structure.wrapped_positions() {
            for k in 0..3 {
                assert!(wrapped[k] >= 0.0 && wrapped[k] < 2.5 + 1e-12);
            }
        }
        assert_eq!(structure.positions(), &positions[..]);
    }

    #[test]
    fn from_arrays() {
        let cell = array![
            [4.0, 0.5, 0.8],
            [-1.2, 3.9, 0.73],
            [-0.8, 0.1, 4.1],
        ];
        let positions = array![
            [1.2, 0.7, 2.3],
            [3.1, 2.5, 8.9],
        ];
        let species = array![1, 3];

        let structure = Structure::from_arrays(cell.view(), species.view(), positions.view()).unwrap();
        assert_eq!(structure.size(), 2);
        assert_eq!(structure.species(), &[1, 3]);
        assert_eq!(structure.positions()[1], Vector3D::new(3.1, 2.5, 8.9));
        assert_ulps_eq!(structure.cell().volume(), 68.236, epsilon = 1e-12);

        let structure = Structure::from_arrays(
            Array2::<f64>::zeros((3, 3)).view(), species.view(), positions.view()
        ).unwrap();
        assert!(structure.cell().is_infinite());

        // wrong shapes
        let error = Structure::from_arrays(
            Array2::<f64>::zeros((2, 3)).view(), species.view(), positions.view()
        ).unwrap_err();
        assert!(matches!(error, Error::ShapeMismatch(_)));

        let error = Structure::from_arrays(
            cell.view(), species.view(), Array2::<f64>::zeros((2, 4)).view()
        ).unwrap_err();
        assert!(matches!(error, Error::ShapeMismatch(_)));

        let error = Structure::from_arrays(
            cell.view(), array![1, 2, 3].view(), positions.view()
        ).unwrap_err();
        assert!(matches!(error, Error::ShapeMismatch(_)));

        // singular cell
        let error = Structure::from_arrays(
            array![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]].view(),
            species.view(),
            positions.view(),
        ).unwrap_err();
        assert!(matches!(error, Error::SingularCell(_)));
    }
}

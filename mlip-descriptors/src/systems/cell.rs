//! The `UnitCell` type represents the enclosing box of a structure, with
//! some type of periodic condition.
use crate::{Error, Matrix3, Vector3D};

/// Smallest accepted ratio between the cell volume and the product of the
/// lattice vector lengths, i.e. the volume of a cell with unit length vectors
/// and the same angles
const MIN_NORMALIZED_VOLUME: f64 = 1e-8;

/// Largest number of lattice translations to search along one cell vector
const MAX_SEARCH_EXTENT: f64 = 100.0;

/// The shape of a cell determine how we will be able to compute the periodic
/// boundaries condition.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub enum CellShape {
    /// Infinite unit cell, with no boundaries
    Infinite,
    /// Orthorhombic unit cell, with cuboid shape
    Orthorhombic,
    /// Triclinic unit cell, with arbitrary parallelepiped shape
    Triclinic,
}

/// An `UnitCell` defines the physical boundaries of a structure.
///
/// The cell matrix contains the lattice vectors as rows. Fractional
/// coordinates `f` and Cartesian coordinates `x` are related by `x = Hᵀ f`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct UnitCell {
    /// Unit cell matrix
    matrix: Matrix3,
    /// Transpose of the unit cell matrix, cached from matrix
    transpose: Matrix3,
    /// Inverse of the transpose of the unit cell matrix, cached from matrix
    inverse: Matrix3,
    /// Unit cell shape
    shape: CellShape,
}

impl TryFrom<Matrix3> for UnitCell {
    type Error = Error;

    fn try_from(matrix: Matrix3) -> Result<UnitCell, Error> {
        UnitCell::new(matrix)
    }
}

impl UnitCell {
    /// Create a periodic unit cell from a matrix containing the lattice
    /// vectors as rows.
    ///
    /// This fails if the lattice vectors are (close to) linearly dependent:
    /// `|det(H)| <= 1e-8 |a| |b| |c|`. The test does not depend on the length
    /// unit, so very small cells are accepted.
    pub fn new(matrix: Matrix3) -> Result<UnitCell, Error> {
        let determinant = matrix.determinant();
        let lengths: f64 = (0..3).map(|i| Vector3D::from(matrix[i]).norm()).product();
        if !(determinant.abs() > MIN_NORMALIZED_VOLUME * lengths) {
            return Err(Error::SingularCell(determinant));
        }

        let is_close_0 = |value| f64::abs(value) < 1e-6;
        let is_diagonal = |matrix: Matrix3| {
            is_close_0(matrix[0][1]) && is_close_0(matrix[0][2]) &&
            is_close_0(matrix[1][0]) && is_close_0(matrix[1][2]) &&
            is_close_0(matrix[2][0]) && is_close_0(matrix[2][1])
        };

        let shape = if is_diagonal(matrix) {
            CellShape::Orthorhombic
        } else {
            CellShape::Triclinic
        };

        return Ok(UnitCell {
            matrix: matrix,
            transpose: matrix.transposed(),
            inverse: matrix.transposed().inverse(),
            shape: shape
        });
    }

    /// Create an infinite unit cell, for structures without periodic boundary
    /// conditions
    pub fn infinite() -> UnitCell {
        UnitCell {
            matrix: Matrix3::zero(),
            transpose: Matrix3::zero(),
            inverse: Matrix3::zero(),
            shape: CellShape::Infinite,
        }
    }

    /// Create an orthorhombic unit cell, with side lengths `a, b, c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<UnitCell, Error> {
        if !(a > 0.0 && b > 0.0 && c > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "cell lengths must be positive, got {}, {}, {}", a, b, c
            )));
        }

        return UnitCell::new(Matrix3::new([
            [a, 0.0, 0.0],
            [0.0, b, 0.0],
            [0.0, 0.0, c]
        ]));
    }

    /// Create a cubic unit cell, with side lengths `length, length, length`.
    pub fn cubic(length: f64) -> Result<UnitCell, Error> {
        UnitCell::orthorhombic(length, length, length)
    }

    /// Get the cell shape
    pub fn shape(&self) -> CellShape {
        self.shape
    }

    /// Check if this unit cell is infinite, *i.e.* if it does not have
    /// periodic boundary conditions.
    pub fn is_infinite(&self) -> bool {
        self.shape() == CellShape::Infinite
    }

    /// Get the matricial representation of the unit cell
    pub fn matrix(&self) -> Matrix3 {
        self.matrix
    }

    /// Get the volume of the cell
    pub fn volume(&self) -> f64 {
        match self.shape {
            CellShape::Infinite => 0.0,
            CellShape::Orthorhombic | CellShape::Triclinic => {
                // mixed product of the three cell vectors
                f64::abs(self.a_vector() * (self.b_vector() ^ self.c_vector()))
            }
        }
    }

    /// Get the distances between faces of the unit cell
    pub fn distances_between_faces(&self) -> Vector3D {
        if self.shape == CellShape::Infinite {
            return Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        }

        let (a, b, c) = (self.a_vector(), self.b_vector(), self.c_vector());
        // Plans normal vectors
        let na = (b ^ c).normalized();
        let nb = (c ^ a).normalized();
        let nc = (a ^ b).normalized();

        Vector3D::new(f64::abs(na * a), f64::abs(nb * b), f64::abs(nc * c))
    }

    /// Get the number of lattice translations to consider along each cell
    /// vector (in both directions) to find all periodic images within
    /// `cutoff` of a point, when all points have fractional coordinates in
    /// `[0, 1)`.
    ///
    /// The fractional coordinate along axis `k` of a vector of length `r` is
    /// at most `r / d_k` (with `d_k` the distance between the corresponding
    /// faces), and the difference between two wrapped points is less than 1.
    ///
    /// This fails if `cutoff` is more than 100 times larger than one of the
    /// distances between faces.
    pub fn search_extent(&self, cutoff: f64) -> Result<[i32; 3], Error> {
        if self.is_infinite() {
            return Ok([0, 0, 0]);
        }

        let distances = self.distances_between_faces();
        let mut extent = [0; 3];
        for k in 0..3 {
            let ratio = cutoff / distances[k];
            if !(ratio <= MAX_SEARCH_EXTENT) {
                return Err(Error::InvalidParameter(format!(
                    "cutoff {} is too large for this cell: it is {} times the \
                    distance between faces along cell vector {}, the maximum is {}",
                    cutoff, ratio, k, MAX_SEARCH_EXTENT
                )));
            }
            extent[k] = f64::ceil(ratio) as i32 + 1;
        }

        return Ok(extent);
    }

    /// Get the first vector of the cell
    fn a_vector(&self) -> Vector3D {
        self.matrix[0].into()
    }

    /// Get the second vector of the cell
    fn b_vector(&self) -> Vector3D {
        self.matrix[1].into()
    }

    /// Get the third vector of the cell
    fn c_vector(&self) -> Vector3D {
        self.matrix[2].into()
    }
}

/// Geometric operations using periodic boundary conditions
impl UnitCell {
    /// Wrap a vector in the unit cell, obeying the periodic boundary
    /// conditions. The fractional coordinates of the wrapped vector are all
    /// in `[0, 1)`; for a cubic cell of side length `L`, this produce a vector
    /// with all components in `[0, L)`.
    pub fn wrap_vector(&self, vector: &mut Vector3D) {
        match self.shape {
            CellShape::Infinite => (),
            CellShape::Orthorhombic | CellShape::Triclinic => {
                let mut fractional = self.fractional(*vector);
                for k in 0..3 {
                    fractional[k] -= f64::floor(fractional[k]);
                    // small negative values round up to 1
                    if fractional[k] >= 1.0 {
                        fractional[k] = 0.0;
                    }
                }
                *vector = self.cartesian(fractional);
            }
        }
    }

    /// Get the fractional representation of the `vector` in this cell
    pub fn fractional(&self, vector: Vector3D) -> Vector3D {
        // this needs to use the inverse of the transpose of the matrix, since
        // we only have code to multiply a vector by a matrix on the left
        return self.inverse * vector;
    }

    /// Get the Cartesian representation of the `fractional` vector in this
    /// cell
    pub fn cartesian(&self, fractional: Vector3D) -> Vector3D {
        return self.transpose * fractional;
    }

    /// Get the Cartesian vector corresponding to a translation by `shift`
    /// lattice vectors
    pub fn shift_vector(&self, shift: [i32; 3]) -> Vector3D {
        let shift = Vector3D::new(shift[0] as f64, shift[1] as f64, shift[2] as f64);
        return self.transpose * shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_ulps_eq, assert_relative_eq};

    #[test]
    fn invalid_cells() {
        assert!(UnitCell::cubic(-4.0).is_err());
        assert!(UnitCell::orthorhombic(3.0, 0.0, 5.0).is_err());

        let singular = Matrix3::new([
            [1.0, 2.0, 3.0],
            [2.0, 4.0, 6.0],
            [0.0, 0.0, 1.0],
        ]);
        let error = UnitCell::new(singular).unwrap_err();
        assert!(matches!(error, Error::SingularCell(_)));
        assert!(UnitCell::try_from(Matrix3::zero()).is_err());

        let flat = Matrix3::new([
            [1e-3, 0.0, 0.0],
            [0.0, 1e-3, 0.0],
            [1e-3, 1e-3, 1e-14],
        ]);
        assert!(matches!(UnitCell::new(flat), Err(Error::SingularCell(_))));
    }

    #[test]
    fn small_cells() {
        let cell = UnitCell::cubic(1e-3).unwrap();
        assert_relative_eq!(cell.volume(), 1e-9, max_relative = 1e-12);

        let cell = UnitCell::new(Matrix3::new([
            [4.0e-3, 0.5e-3, 0.8e-3],
            [-1.2e-3, 3.9e-3, 0.73e-3],
            [-0.8e-3, 0.1e-3, 4.1e-3],
        ])).unwrap();
        assert_eq!(cell.shape(), CellShape::Triclinic);
    }

    #[test]
    fn infinite() {
        let cell = UnitCell::infinite();
        assert_eq!(cell.shape(), CellShape::Infinite);
        assert!(cell.is_infinite());
        assert_eq!(cell.volume(), 0.0);
        assert_eq!(cell.search_extent(3.0).unwrap(), [0, 0, 0]);
        assert_eq!(cell.search_extent(1e12).unwrap(), [0, 0, 0]);

        let mut v = Vector3D::new(1.0, 1.5, 6.0);
        cell.wrap_vector(&mut v);
        assert_eq!(v, Vector3D::new(1.0, 1.5, 6.0));
    }

    #[test]
    fn orthorhombic() {
        let cell = UnitCell::orthorhombic(3.0, 4.0, 5.0).unwrap();
        assert_eq!(cell.shape(), CellShape::Orthorhombic);
        assert!(!cell.is_infinite());
        assert_eq!(cell.volume(), 3.0 * 4.0 * 5.0);
        assert_eq!(cell.distances_between_faces(), Vector3D::new(3.0, 4.0, 5.0));
        assert_eq!(cell.search_extent(4.5).unwrap(), [3, 3, 2]);
        assert_eq!(cell.search_extent(300.0).unwrap(), [101, 76, 61]);
    }

    #[test]
    fn search_extent_limits() {
        let cell = UnitCell::cubic(3.0).unwrap();
        for cutoff in [300.1, 1e12, f64::INFINITY, f64::NAN] {
            let error = cell.search_extent(cutoff).unwrap_err();
            assert!(matches!(error, Error::InvalidParameter(_)), "cutoff = {}", cutoff);
        }
    }

    #[test]
    fn triclinic() {
        let cell = UnitCell::new(Matrix3::new([
            [4.0, 0.5, 0.8],
            [-1.2, 3.9, 0.73],
            [-0.8, 0.1, 4.1],
        ])).unwrap();

        assert_eq!(cell.shape(), CellShape::Triclinic);
        assert_relative_eq!(cell.volume(), 68.236, max_relative = 1e-12);

        // the distance between faces is the volume divided by the area of
        // the face
        let distances = cell.distances_between_faces();
        let matrix = cell.matrix();
        let b = Vector3D::from(matrix[1]);
        let c = Vector3D::from(matrix[2]);
        assert_relative_eq!(distances[0], cell.volume() / (b ^ c).norm(), max_relative = 1e-12);
    }

    #[test]
    fn wrap_vector() {
        // Cubic unit cell
        let cell = UnitCell::cubic(10.0).unwrap();
        let mut v = Vector3D::new(9.0, 18.0, -6.0);
        cell.wrap_vector(&mut v);
        assert_ulps_eq!(v, Vector3D::new(9.0, 8.0, 4.0), epsilon = 1e-12);

        // Orthorhombic unit cell
        let cell = UnitCell::orthorhombic(3.0, 4.0, 5.0).unwrap();
        let mut v = Vector3D::new(1.0, 1.5, 6.0);
        cell.wrap_vector(&mut v);
        let res = Vector3D::new(1.0, 1.5, 1.0);
        assert_ulps_eq!(v, res, epsilon = 1e-12);

        // Triclinic unit cell
        let cell = UnitCell::new(Matrix3::new([
            [4.0, 0.5, 0.8],
            [-1.2, 3.9, 0.73],
            [-0.8, 0.1, 4.1],
        ])).unwrap();
        let mut v = Vector3D::new(3.1, 2.5, 8.9);
        cell.wrap_vector(&mut v);
        let fractional = cell.fractional(v);
        for k in 0..3 {
            assert!(fractional[k] >= -1e-12 && fractional[k] < 1.0 + 1e-12);
        }

        // tiny negative fractional coordinates end up at 0, not 1
        let cell = UnitCell::cubic(3.0).unwrap();
        let mut v = Vector3D::new(-1e-17, 1.0, 1.0);
        cell.wrap_vector(&mut v);
        let fractional = cell.fractional(v);
        for k in 0..3 {
            assert!(fractional[k] >= 0.0 && fractional[k] < 1.0, "{:?}", fractional);
        }
        assert_eq!(v[0], 0.0);
    }

    #[test]
    fn fractional_cartesian() {
        let cell = UnitCell::cubic(5.0).unwrap();

        assert_ulps_eq!(
            cell.fractional(Vector3D::new(0.0, 10.0, 4.0)),
            Vector3D::new(0.0, 2.0, 0.8),
            epsilon = 1e-14
        );
        assert_ulps_eq!(
            cell.cartesian(Vector3D::new(0.0, 2.0, 0.8)),
            Vector3D::new(0.0, 10.0, 4.0),
            epsilon = 1e-14
        );

        let cell = UnitCell::new(Matrix3::new([
            [5.0, 0.0, 0.0],
            [1.3, 5.8, 0.0],
            [2.1, 0.4, 2.9],
        ])).unwrap();
        let tests = vec![
            Vector3D::new(0.0, 10.0, 4.0),
            Vector3D::new(-5.0, 12.0, 4.9),
        ];

        for test in tests {
            let transformed = cell.cartesian(cell.fractional(test));
            assert_ulps_eq!(test, transformed, epsilon = 1e-14);
        }
    }

    #[test]
    fn shift_vector() {
        let cell = UnitCell::new(Matrix3::new([
            [5.0, 0.0, 0.0],
            [1.5, 6.0, 0.0],
            [0.5, 0.5, 3.0],
        ])).unwrap();

        assert_eq!(cell.shift_vector([0, 0, 0]), Vector3D::zero());
        assert_eq!(cell.shift_vector([1, 0, 0]), Vector3D::new(5.0, 0.0, 0.0));
        assert_eq!(cell.shift_vector([0, -1, 2]), Vector3D::new(-0.5, -5.0, 6.0));
    }
}

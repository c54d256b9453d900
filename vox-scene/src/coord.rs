//! Coordinate systems, the rotation encoding of transform frames, and accumulated placements.

use core::{fmt, ops};

use euclid::{Point3D, Size3D, Vector3D};

/// Unit-of-measure identifier used with [`euclid`] for coordinates as they are stored in the
/// file: Z is up, and model and scene coordinates share the same axes.
#[allow(clippy::exhaustive_enums)]
#[derive(Debug)]
pub enum FileSpace {}

/// Unit-of-measure identifier used with [`euclid`] for coordinates delivered to a
/// [`VolumeSink`](crate::VolumeSink), after the [`AxisConvention`] has been applied.
#[allow(clippy::exhaustive_enums)]
#[derive(Debug)]
pub enum OutputSpace {}

// -------------------------------------------------------------------------------------------------

/// Which axis of the output coordinate system points up.
///
/// The file itself is Z-up. Many consumers are Y-up, and converting between the two is a matter
/// of exchanging the second and third components of every coordinate, extent, and matrix.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
#[non_exhaustive]
pub enum AxisConvention {
    /// Keep the file's axes.
    ZUp,
    /// Exchange Y and Z.
    #[default]
    YUp,
}

impl AxisConvention {
    /// Whether this convention exchanges the second and third axes.
    pub fn swaps_axes(self) -> bool {
        match self {
            AxisConvention::ZUp => false,
            AxisConvention::YUp => true,
        }
    }

    /// Reorders three components according to this convention.
    pub fn remap<T>(self, [x, y, z]: [T; 3]) -> [T; 3] {
        if self.swaps_axes() { [x, z, y] } else { [x, y, z] }
    }

    #[allow(missing_docs)]
    pub fn remap_vector<T>(self, v: Vector3D<T, FileSpace>) -> Vector3D<T, OutputSpace> {
        let [x, y, z] = self.remap([v.x, v.y, v.z]);
        Vector3D::new(x, y, z)
    }

    #[allow(missing_docs)]
    pub fn remap_point<T>(self, p: Point3D<T, FileSpace>) -> Point3D<T, OutputSpace> {
        let [x, y, z] = self.remap([p.x, p.y, p.z]);
        Point3D::new(x, y, z)
    }

    #[allow(missing_docs)]
    pub fn remap_size<T>(self, s: Size3D<T, FileSpace>) -> Size3D<T, OutputSpace> {
        let [w, h, d] = self.remap([s.width, s.height, s.depth]);
        Size3D::new(w, h, d)
    }

    /// Expresses an orientation in output coordinates.
    ///
    /// This is conjugation by the axis permutation, so it is applied to both the columns'
    /// order and each column's components.
    pub fn remap_orientation(self, o: Orientation) -> [Vector3D<i32, OutputSpace>; 3] {
        self.remap([o.x, o.y, o.z])
            .map(|column| self.remap_vector(column))
    }
}

// -------------------------------------------------------------------------------------------------

/// A 3×3 integer matrix, stored as columns, whose entries are all 0 or ±1.
///
/// Every orientation constructed by this library is a rotation or reflection that maps each
/// axis onto an axis, so products of orientations never leave that set.
#[expect(clippy::exhaustive_structs)]
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Orientation {
    /// First column
    pub x: Vector3D<i32, FileSpace>,
    /// Second column
    pub y: Vector3D<i32, FileSpace>,
    /// Third column
    pub z: Vector3D<i32, FileSpace>,
}

impl Orientation {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        x: Vector3D::new(1, 0, 0),
        y: Vector3D::new(0, 1, 0),
        z: Vector3D::new(0, 0, 1),
    };

    /// Constructs the matrix from its rows.
    pub fn from_rows(rows: [[i32; 3]; 3]) -> Self {
        let column = |c: usize| Vector3D::new(rows[0][c], rows[1][c], rows[2][c]);
        Self {
            x: column(0),
            y: column(1),
            z: column(2),
        }
    }

    /// Returns the matrix's rows.
    pub fn to_rows(self) -> [[i32; 3]; 3] {
        [
            [self.x.x, self.y.x, self.z.x],
            [self.x.y, self.y.y, self.z.y],
            [self.x.z, self.y.z, self.z.z],
        ]
    }

    /// Multiplies a vector by this matrix.
    pub fn transform_vector(self, v: Vector3D<i32, FileSpace>) -> Vector3D<i64, FileSpace> {
        let (x, y, z) = (self.x.to_i64(), self.y.to_i64(), self.z.to_i64());
        x * i64::from(v.x) + y * i64::from(v.y) + z * i64::from(v.z)
    }

    /// Computes the determinant, which is ±1 for every valid orientation.
    pub fn determinant(self) -> i32 {
        self.x.dot(self.y.cross(self.z))
    }
}

impl ops::Mul for Orientation {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let column = |v: Vector3D<i32, FileSpace>| self.x * v.x + self.y * v.y + self.z * v.z;
        Self {
            x: column(rhs.x),
            y: column(rhs.y),
            z: column(rhs.z),
        }
    }
}

impl fmt::Debug for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Orientation").field(&self.to_rows()).finish()
    }
}

// -------------------------------------------------------------------------------------------------

/// The `_r` attribute of a transform frame: a rotation packed into one byte.
///
/// * Bits 0–1 are the column index of the non-zero entry in the first row.
/// * Bits 2–3 are the column index of the non-zero entry in the second row.
///   The third row's column is whichever index the first two did not use.
/// * Bits 4, 5, and 6 are set if the non-zero entry of the first, second, or third row
///   (respectively) is −1 rather than +1.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct Rotation(pub u8);

impl Rotation {
    /// The encoding of the identity matrix, used when a frame has no `_r` attribute.
    pub const IDENTITY: Self = Self(0b0000_0100);

    /// Decodes the matrix, or returns [`None`] if the byte does not describe a permutation.
    ///
    /// ```
    /// use vox_scene::{Orientation, Rotation};
    ///
    /// assert_eq!(Rotation::IDENTITY.to_orientation(), Some(Orientation::IDENTITY));
    /// assert_eq!(Rotation(0b0000_0000).to_orientation(), None);
    /// ```
    pub fn to_orientation(self) -> Option<Orientation> {
        let first = usize::from(self.0 & 0b11);
        let second = usize::from((self.0 >> 2) & 0b11);
        if first == 3 || second == 3 || first == second {
            return None;
        }
        let third = 3 - first - second;

        let sign = |row: u8| if self.0 & (0b1_0000 << row) != 0 { -1 } else { 1 };
        let mut rows = [[0; 3]; 3];
        rows[0][first] = sign(0);
        rows[1][second] = sign(1);
        rows[2][third] = sign(2);
        Some(Orientation::from_rows(rows))
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Debug for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rotation({:#010b})", self.0)
    }
}

// -------------------------------------------------------------------------------------------------

/// Position and orientation accumulated while walking down the scene graph.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct Placement {
    #[allow(missing_docs)]
    pub orientation: Orientation,
    /// Translation in voxels. Wider than the file's `i32`s so that long chains of transforms
    /// cannot overflow.
    pub translation: Vector3D<i64, FileSpace>,
}

impl Placement {
    /// No rotation and no translation.
    pub const IDENTITY: Self = Self {
        orientation: Orientation::IDENTITY,
        translation: Vector3D::new(0, 0, 0),
    };

    /// Applies a child transform, expressed in this placement's coordinate system, on top of
    /// this placement.
    pub fn then(self, rotation: Orientation, translation: Vector3D<i32, FileSpace>) -> Self {
        let offset = self.orientation.transform_vector(translation);
        Self {
            orientation: self.orientation * rotation,
            translation: Vector3D::new(
                self.translation.x.saturating_add(offset.x),
                self.translation.y.saturating_add(offset.y),
                self.translation.z.saturating_add(offset.z),
            ),
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}

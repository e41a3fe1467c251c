use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Aabb {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// Smallest box holding every point, `None` for an empty iterator.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<Real>>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::new(*first, *first);
        for p in iter {
            aabb.mins = aabb.mins.inf(p);
            aabb.maxs = aabb.maxs.sup(p);
        }
        Some(aabb)
    }

    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.maxs.x >= other.mins.x
            && self.mins.x <= other.maxs.x
            && self.maxs.y >= other.mins.y
            && self.mins.y <= other.maxs.y
            && self.maxs.z >= other.mins.z
            && self.mins.z <= other.maxs.z
    }

    #[inline]
    pub fn contains_point(&self, p: &Point3<Real>) -> bool {
        p.x >= self.mins.x
            && p.x <= self.maxs.x
            && p.y >= self.mins.y
            && p.y <= self.maxs.y
            && p.z >= self.mins.z
            && p.z <= self.maxs.z
    }

    #[inline]
    pub fn merged(&self, other: &Self) -> Self {
        Self::new(self.mins.inf(&other.mins), self.maxs.sup(&other.maxs))
    }

    /// Grow the box by `margin` on every side.
    #[inline]
    pub fn loosened(&self, margin: Real) -> Self {
        let m = Vector3::repeat(margin);
        Self::new(self.mins - m, self.maxs + m)
    }

    #[inline]
    pub fn center(&self) -> Point3<Real> {
        nalgebra::center(&self.mins, &self.maxs)
    }

    #[inline]
    pub fn extents(&self) -> Vector3<Real> {
        self.maxs - self.mins
    }

    /// Index (0 = x, 1 = y, 2 = z) of the longest side.
    pub fn longest_axis(&self) -> usize {
        self.extents().imax()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_and_overlap() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, -1.0, 0.5),
            Point3::new(1.0, 3.0, -0.5),
        ];
        let aabb = Aabb::from_points(&pts).unwrap();
        assert_eq!(aabb.mins, Point3::new(0.0, -1.0, -0.5));
        assert_eq!(aabb.maxs, Point3::new(2.0, 3.0, 0.5));
        assert_eq!(aabb.longest_axis(), 1);

        let touching = Aabb::new(Point3::new(2.0, 3.0, 0.5), Point3::new(4.0, 4.0, 4.0));
        assert!(aabb.intersects(&touching));

        let apart = Aabb::new(Point3::new(2.1, 3.0, 0.5), Point3::new(4.0, 4.0, 4.0));
        assert!(!aabb.intersects(&apart));
        assert!(aabb.loosened(0.2).intersects(&apart));
    }

    #[test]
    fn empty_iterator_has_no_box() {
        let pts: [Point3<Real>; 0] = [];
        assert!(Aabb::from_points(&pts).is_none());
    }
}

//! Small geometric primitives used by the mesh and element code.
use nalgebra::{distance, Point2, RealField, Scalar, Vector2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSegment2d<T: Scalar> {
    from: Point2<T>,
    to: Point2<T>,
}

impl<T: Scalar> LineSegment2d<T> {
    pub fn new(from: Point2<T>, to: Point2<T>) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> &Point2<T> {
        &self.from
    }

    pub fn to(&self) -> &Point2<T> {
        &self.to
    }
}

impl<T: RealField> LineSegment2d<T> {
    pub fn length(&self) -> T {
        distance(&self.from, &self.to)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisAlignedBoundingBox2d<T: Scalar> {
    min: Vector2<T>,
    max: Vector2<T>,
}

impl<T: RealField> AxisAlignedBoundingBox2d<T> {
    /// # Panics
    ///
    /// Panics if `min` is not component-wise smaller than or equal to `max`.
    pub fn new(min: Vector2<T>, max: Vector2<T>) -> Self {
        assert!(min.iter().zip(max.iter()).all(|(a, b)| a <= b), "min must not exceed max");
        Self { min, max }
    }

    pub fn min(&self) -> &Vector2<T> {
        &self.min
    }

    pub fn max(&self) -> &Vector2<T> {
        &self.max
    }

    pub fn enclose(&self, other: &Self) -> Self {
        Self {
            min: self.min.zip_map(&other.min, |a, b| a.min(b)),
            max: self.max.zip_map(&other.max, |a, b| a.max(b)),
        }
    }

    /// Returns `None` if there are no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2<T>>) -> Option<Self> {
        let mut points = points.into_iter();
        points.next().map(|first_point| {
            points.fold(Self::from(first_point.clone()), |aabb, point| {
                aabb.enclose(&Self::from(point.clone()))
            })
        })
    }

    /// Whether the point lies strictly inside the box (points on the boundary are outside).
    pub fn contains_point(&self, point: &Point2<T>) -> bool {
        (0..2).all(|i| point[i] > self.min[i] && point[i] < self.max[i])
    }
}

impl<T: Scalar> From<Point2<T>> for AxisAlignedBoundingBox2d<T> {
    fn from(point: Point2<T>) -> Self {
        Self {
            min: point.coords.clone(),
            max: point.coords,
        }
    }
}

use nalgebra::{Point3, Unit, Vector3};
use serde::{Deserialize, Serialize};

const PARALLEL_TOLERANCE: f64 = 1e-12;

/// A closed volume in detector coordinates (meters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Shape {
    Sphere {
        center: [f64; 3],
        radius: f64,
    },
    /// Axis-aligned box.
    Box {
        center: [f64; 3],
        half_extents: [f64; 3],
    },
}

impl Shape {
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        match self {
            Shape::Sphere { center, radius } => {
                (point - Point3::from(*center)).norm_squared() <= radius * radius
            }
            Shape::Box {
                center,
                half_extents,
            } => (0..3).all(|i| (point[i] - center[i]).abs() <= half_extents[i]),
        }
    }

    /// Line parameters `(t_enter, t_exit)` where the line `origin + t * direction` crosses
    /// the surface. Either value may be negative.
    pub fn intersections(
        &self,
        origin: &Point3<f64>,
        direction: &Unit<Vector3<f64>>,
    ) -> Option<(f64, f64)> {
        match self {
            Shape::Sphere { center, radius } => {
                let oc = origin - Point3::from(*center);
                let b = direction.dot(&oc);
                let c = oc.norm_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let root = disc.sqrt();
                Some((-b - root, -b + root))
            }
            Shape::Box {
                center,
                half_extents,
            } => {
                let mut t_min = f64::NEG_INFINITY;
                let mut t_max = f64::INFINITY;
                for i in 0..3 {
                    let lo = center[i] - half_extents[i];
                    let hi = center[i] + half_extents[i];
                    if direction[i].abs() < PARALLEL_TOLERANCE {
                        if origin[i] < lo || origin[i] > hi {
                            return None;
                        }
                        continue;
                    }
                    let t1 = (lo - origin[i]) / direction[i];
                    let t2 = (hi - origin[i]) / direction[i];
                    t_min = t_min.max(t1.min(t2));
                    t_max = t_max.min(t1.max(t2));
                }
                (t_min <= t_max).then_some((t_min, t_max))
            }
        }
    }

    /// Distance from `origin` along `direction` to where the line leaves the volume, zero if
    /// `origin` lies outside.
    pub fn exit_distance(&self, origin: &Point3<f64>, direction: &Unit<Vector3<f64>>) -> f64 {
        if !self.contains(origin) {
            return 0.0;
        }
        self.intersections(origin, direction)
            .map_or(0.0, |(_, t_exit)| t_exit.max(0.0))
    }
}

/// A finite segment `start + t * direction`, `t` in `[0, length]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    start: Point3<f64>,
    direction: Unit<Vector3<f64>>,
    length: f64,
}

impl Path {
    pub fn new(start: Point3<f64>, direction: Unit<Vector3<f64>>, length: f64) -> Self {
        Self {
            start,
            direction,
            length: length.max(0.0),
        }
    }

    pub fn start(&self) -> Point3<f64> {
        self.start
    }

    pub fn end(&self) -> Point3<f64> {
        self.point_at(self.length)
    }

    pub fn direction(&self) -> &Unit<Vector3<f64>> {
        &self.direction
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn point_at(&self, distance: f64) -> Point3<f64> {
        self.start + self.direction.as_ref() * distance
    }

    /// Moves the start upstream by `distance`, keeping the end fixed.
    pub fn extend_from_start(&mut self, distance: f64) {
        if distance > 0.0 {
            self.start -= self.direction.as_ref() * distance;
            self.length += distance;
        }
    }

    /// Restricts the segment to its overlap with `shape`. Returns `false` (and collapses the
    /// path to zero length) when there is no overlap.
    pub fn clip_to(&mut self, shape: &Shape) -> bool {
        let Some((t_enter, t_exit)) = shape.intersections(&self.start, &self.direction) else {
            self.length = 0.0;
            return false;
        };
        let lo = t_enter.max(0.0);
        let hi = t_exit.min(self.length);
        if hi <= lo {
            self.length = 0.0;
            return false;
        }
        self.start = self.point_at(lo);
        self.length = hi - lo;
        true
    }

    /// Distance of `point` from the start if it lies on the segment within `tolerance`.
    pub fn distance_along(&self, point: &Point3<f64>, tolerance: f64) -> Option<f64> {
        let offset = point - self.start;
        let along = self.direction.dot(&offset);
        let perpendicular = (offset - self.direction.as_ref() * along).norm();
        let on_segment = along >= -tolerance && along <= self.length + tolerance;
        (perpendicular <= tolerance && on_segment).then(|| along.clamp(0.0, self.length))
    }
}

//! Ray tracks: ordered entry/exit segments through CSG objects.
//!
//! A [`Track`] records one ray traversal. Objects append classified
//! intersection points; [`Track::build_links`] then sorts, de-duplicates
//! and pairs them into [`Link`] segments ordered by distance from the
//! track start.

use csgray_math::{Point3, Vec3, TOLERANCE};

/// Whether a classified intersection point enters or leaves the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackDirection {
    /// The ray crosses from outside to inside at this point.
    Entering,
    /// The ray crosses from inside to outside at this point.
    Leaving,
}

/// A raw classified intersection point awaiting link building.
#[derive(Debug, Clone, Copy)]
pub struct IntersectionPoint {
    /// Crossing direction at this point.
    pub direction: TrackDirection,
    /// Position of the crossing.
    pub point: Point3,
    /// Distance from the track start along the direction.
    pub distance: f64,
    /// Name of the object that produced this crossing.
    pub object: i32,
}

/// One traversed segment: where the ray entered and left an object.
#[derive(Debug, Clone, Copy)]
pub struct Link {
    /// Entry point of the segment.
    pub entry: Point3,
    /// Exit point of the segment.
    pub exit: Point3,
    /// Distance from the track start to the segment exit.
    pub dist_from_start: f64,
    /// Length of the segment inside the object.
    pub dist_inside: f64,
    /// Name of the object traversed.
    pub object: i32,
}

/// An ordered ray traversal through one or more objects.
#[derive(Debug, Clone)]
pub struct Track {
    start: Point3,
    direction: Vec3,
    points: Vec<IntersectionPoint>,
    links: Vec<Link>,
}

impl Track {
    /// Create a track from a start point and a direction.
    ///
    /// The direction is normalized; a zero direction is replaced by +X
    /// rather than producing NaNs.
    pub fn new(start: Point3, direction: Vec3) -> Self {
        let direction = if direction.norm() < TOLERANCE {
            Vec3::x()
        } else {
            direction.normalize()
        };
        Self {
            start,
            direction,
            points: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Start point of the track.
    pub fn start(&self) -> &Point3 {
        &self.start
    }

    /// Unit direction of the track.
    pub fn direction(&self) -> &Vec3 {
        &self.direction
    }

    /// Append a classified crossing point. Distance along the track is
    /// derived from the point position.
    pub fn add_point(&mut self, direction: TrackDirection, point: Point3, object: i32) {
        let distance = (point - self.start).dot(&self.direction);
        self.points.push(IntersectionPoint {
            direction,
            point,
            distance,
            object,
        });
    }

    /// Build ordered links from the accumulated crossing points and
    /// clear the point buffer. Returns the number of links added.
    ///
    /// Points are sorted by distance from the start; coincident points
    /// (closer than tolerance) with the same direction are merged, and
    /// entering/leaving pairs closer than tolerance collapse to nothing.
    pub fn build_links(&mut self) -> usize {
        let before = self.links.len();
        self.points.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Merge coincident same-direction duplicates
        let mut pruned: Vec<IntersectionPoint> = Vec::with_capacity(self.points.len());
        for p in self.points.drain(..) {
            if let Some(last) = pruned.last() {
                if (p.distance - last.distance).abs() < TOLERANCE && p.direction == last.direction
                {
                    continue;
                }
            }
            pruned.push(p);
        }

        let mut entry: Option<IntersectionPoint> = None;
        for p in pruned {
            match p.direction {
                TrackDirection::Entering => {
                    if entry.is_none() {
                        entry = Some(p);
                    }
                }
                TrackDirection::Leaving => {
                    if let Some(e) = entry.take() {
                        let span = p.distance - e.distance;
                        if span > TOLERANCE {
                            self.links.push(Link {
                                entry: e.point,
                                exit: p.point,
                                dist_from_start: p.distance,
                                dist_inside: span,
                                object: p.object,
                            });
                        }
                    }
                }
            }
        }
        // Links from an earlier build may sit further down the track
        // than the ones just added
        self.links.sort_by(|a, b| {
            a.dist_from_start
                .partial_cmp(&b.dist_from_start)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.links.len() - before
    }

    /// The ordered links of this track.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of links built so far.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True if no links have been built.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Total path length inside objects, summed over all links.
    pub fn total_distance_inside(&self) -> f64 {
        self.links.iter().map(|l| l.dist_inside).sum()
    }
}

use std::collections::VecDeque;

use super::geo::Point3;

/// Capacity-bounded FIFO of scene points describing a recent path.
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    points: VecDeque<Point3>,
    capacity: usize,
}

impl TrailBuffer {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a point, returning the evicted oldest point once at capacity.
    pub fn push(&mut self, point: Point3) -> Option<Point3> {
        let evicted = if self.points.len() == self.capacity {
            self.points.pop_front()
        } else {
            None
        };
        self.points.push_back(point);
        evicted
    }

    pub fn to_vec(&self) -> Vec<Point3> {
        self.points.iter().copied().collect()
    }
}

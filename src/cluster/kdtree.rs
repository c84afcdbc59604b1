//! 2-d tree over projected pixel positions
//!
//! This code is heavily based on <https://godoc.org/code.google.com/p/eaburns/kdtree>
//!
//! Original code is under New BSD License.
//! Author: Ethan Burns <burns.ethan@gmail.com>

use super::point::PixelPoint;

/// KD-Tree for radius queries in screen space
///
/// Points are separated from nodes. Nodes hold only indices into `points`.
pub struct KDTree {
    points: Vec<PixelPoint>,
    root: Option<Box<KDTreeNode>>,
}

/// A node in the K-D tree
struct KDTreeNode {
    /// Index of the point associated with this node
    point_id: usize,
    /// Indices of points equal to this node's point
    equal_ids: Vec<usize>,

    split: usize,
    left: Option<Box<KDTreeNode>>,
    right: Option<Box<KDTreeNode>>,
}

impl KDTree {
    /// Builds a balanced tree over `points`
    pub fn new(points: Vec<PixelPoint>) -> Self {
        let root = if points.is_empty() {
            None
        } else {
            build_tree(0, &pre_sort(&points))
        };
        Self { points, root }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Finds all points within `dist` (inclusive) of `pt`
    ///
    /// Found indices are appended to `nodes`, which can be re-used across
    /// calls to avoid allocation. Order is unspecified.
    pub fn in_range(&self, pt: &PixelPoint, dist: f64, mut nodes: Vec<usize>) -> Vec<usize> {
        if dist < 0.0 {
            return nodes;
        }
        self.in_range_recursive(self.root.as_deref(), pt, dist * dist, &mut nodes);
        nodes
    }

    fn in_range_recursive(
        &self,
        t: Option<&KDTreeNode>,
        pt: &PixelPoint,
        r2: f64,
        nodes: &mut Vec<usize>,
    ) {
        let t = match t {
            None => return,
            Some(t) => t,
        };

        let diff = pt.0[t.split] - self.points[t.point_id].0[t.split];

        let (this_side, other_side) = if diff < 0.0 {
            (t.left.as_deref(), t.right.as_deref())
        } else {
            (t.right.as_deref(), t.left.as_deref())
        };

        self.in_range_recursive(this_side, pt, r2, nodes);
        // The splitting line is within range, so the far side may hold hits too.
        if diff * diff <= r2 {
            if self.points[t.point_id].sq_dist(pt) <= r2 {
                nodes.push(t.point_id);
                nodes.extend_from_slice(&t.equal_ids);
            }
            self.in_range_recursive(other_side, pt, r2, nodes);
        }
    }

    /// Returns the height of the K-D tree
    pub fn height(&self) -> usize {
        self.root.as_ref().map_or(0, |r| r.height())
    }
}

impl KDTreeNode {
    fn height(&self) -> usize {
        let ht = self.left.as_ref().map_or(0, |l| l.height());
        let rht = self.right.as_ref().map_or(0, |r| r.height());
        ht.max(rht) + 1
    }
}

/// Builds a tree node by finding the median point and recursively building left and right subtrees
fn build_tree(depth: usize, nodes: &PreSorted<'_>) -> Option<Box<KDTreeNode>> {
    let split = depth % 2;
    match nodes.cur[split].len() {
        0 => None,
        1 => Some(Box::new(KDTreeNode {
            point_id: nodes.cur[split][0],
            equal_ids: Vec::new(),
            split,
            left: None,
            right: None,
        })),
        _ => {
            let (med, equal, left, right) = nodes.split_med(split);
            Some(Box::new(KDTreeNode {
                point_id: med,
                equal_ids: equal,
                split,
                left: build_tree(depth + 1, &left),
                right: build_tree(depth + 1, &right),
            }))
        }
    }
}

/// Holds point indices pre-sorted on each dimension
struct PreSorted<'a> {
    points: &'a [PixelPoint],
    /// Currently sorted set of point IDs by dimension
    cur: [Vec<usize>; 2],
}

/// Pre-sorts point indices on each dimension
fn pre_sort(points: &[PixelPoint]) -> PreSorted<'_> {
    let mut cur = [Vec::new(), Vec::new()];
    for (i, dim) in cur.iter_mut().enumerate() {
        *dim = (0..points.len()).collect();
        dim.sort_by(|&a, &b| {
            points[a].0[i]
                .total_cmp(&points[b].0[i])
                .then_with(|| points[a].0[1 - i].total_cmp(&points[b].0[1 - i]))
        });
    }
    PreSorted { points, cur }
}

impl<'a> PreSorted<'a> {
    /// Returns the median node on the split dimension and two PreSorted structs
    /// that contain the nodes (still sorted on each dimension) that are less than
    /// and greater than or equal to the median node value on the given splitting dimension.
    fn split_med(&self, dim: usize) -> (usize, Vec<usize>, PreSorted<'a>, PreSorted<'a>) {
        let sorted = &self.cur[dim];
        let mut m = sorted.len() / 2;
        while m > 0 && self.points[sorted[m - 1]].0[dim] == self.points[sorted[m]].0[dim] {
            m -= 1;
        }
        let mut mh = m;
        while mh < sorted.len() - 1 && self.points[sorted[mh + 1]] == self.points[sorted[m]] {
            mh += 1;
        }
        let med = sorted[m];
        let equal = sorted[m + 1..=mh].to_vec();
        let pivot = self.points[med].0[dim];

        let mut left = PreSorted {
            points: self.points,
            cur: [Vec::new(), Vec::new()],
        };
        left.cur[dim] = sorted[..m].to_vec();

        let mut right = PreSorted {
            points: self.points,
            cur: [Vec::new(), Vec::new()],
        };
        right.cur[dim] = sorted[mh + 1..].to_vec();

        let other = 1 - dim;
        left.cur[other] = Vec::with_capacity(self.cur[other].len());
        right.cur[other] = Vec::with_capacity(self.cur[other].len());

        for &n in &self.cur[other] {
            if n == med || equal.contains(&n) {
                continue;
            }
            if self.points[n].0[dim] < pivot {
                left.cur[other].push(n);
            } else {
                right.cur[other].push(n);
            }
        }

        (med, equal, left, right)
    }
}

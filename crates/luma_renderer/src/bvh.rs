//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A flat binary tree over primitive bounding boxes. Construction uses a
//! median split along a randomly chosen axis; traversal is iterative with a
//! fixed-capacity stack, so neither side recurses.

use crate::{HitRecord, Hittable, Primitive, Sampler};
use arrayvec::ArrayVec;
use luma_math::{Aabb, Ray};

/// Capacity of the traversal stack.
pub const TRAVERSAL_STACK_SIZE: usize = 64;

/// BVH node, addressed by index into [`Bvh::nodes`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Internal node with two children.
    Internal { left: u32, right: u32, bbox: Aabb },
    /// Leaf covering `indices[first..=last]`.
    Leaf { first: u32, last: u32, bbox: Aabb },
}

impl BvhNode {
    pub fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Internal { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Shape summary of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
}

/// BVH over a primitive slice.
///
/// The tree stores indices only; it must be traversed against the same
/// primitive slice it was built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    /// Permutation of primitive indices; leaves reference ranges of it
    indices: Vec<u32>,
    depth: usize,
}

impl Bvh {
    /// Build a BVH over `primitives`.
    ///
    /// Split axes are drawn from a sampler seeded with `seed`, so the same
    /// input and seed always give the same tree.
    pub fn build(primitives: &[Primitive], seed: u32) -> Self {
        let n = primitives.len();
        if n == 0 {
            return Self::default();
        }

        let boxes: Vec<Aabb> = primitives.iter().map(|p| p.bounding_box()).collect();
        let mut indices: Vec<u32> = (0..n as u32).collect();
        let mut sampler = Sampler::new(seed);

        // A full binary tree over n leaves-or-pairs never exceeds 2n - 1 nodes
        let mut nodes: Vec<BvhNode> = Vec::with_capacity(2 * n - 1);
        nodes.push(BvhNode::Leaf {
            first: 0,
            last: 0,
            bbox: Aabb::EMPTY,
        });

        struct Task {
            node: usize,
            start: usize,
            end: usize, // exclusive
            depth: usize,
        }

        let mut stack = vec![Task {
            node: 0,
            start: 0,
            end: n,
            depth: 1,
        }];
        let mut max_depth = 0;

        while let Some(task) = stack.pop() {
            let Task {
                node,
                start,
                end,
                depth,
            } = task;
            max_depth = max_depth.max(depth);

            let bbox = indices[start..end]
                .iter()
                .fold(Aabb::EMPTY, |acc, &i| Aabb::surrounding(&acc, &boxes[i as usize]));

            // One or two primitives always make a leaf
            if end - start <= 2 {
                nodes[node] = BvhNode::Leaf {
                    first: start as u32,
                    last: (end - 1) as u32,
                    bbox,
                };
                continue;
            }

            let axis = sampler.int_range(0, 2) as usize;
            indices[start..end].sort_by(|&a, &b| {
                let a_min = boxes[a as usize].axis_interval(axis).min;
                let b_min = boxes[b as usize].axis_interval(axis).min;
                a_min.total_cmp(&b_min)
            });
            let mid = start + (end - start) / 2;

            let left = nodes.len();
            let right = left + 1;
            nodes.push(BvhNode::Leaf {
                first: 0,
                last: 0,
                bbox: Aabb::EMPTY,
            });
            nodes.push(BvhNode::Leaf {
                first: 0,
                last: 0,
                bbox: Aabb::EMPTY,
            });
            nodes[node] = BvhNode::Internal {
                left: left as u32,
                right: right as u32,
                bbox,
            };

            // Right first so the left subtree is built first
            stack.push(Task {
                node: right,
                start: mid,
                end,
                depth: depth + 1,
            });
            stack.push(Task {
                node: left,
                start,
                end: mid,
                depth: depth + 1,
            });
        }

        let bvh = Self {
            nodes,
            indices,
            depth: max_depth,
        };
        let stats = bvh.stats();
        log::debug!(
            "Built BVH over {} primitives: {} nodes, {} leaves, depth {}",
            n,
            stats.nodes,
            stats.leaves,
            stats.depth
        );
        bvh
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Primitive indices covered by a leaf, in tree order.
    pub fn leaf_indices(&self, first: u32, last: u32) -> &[u32] {
        let end = (last as usize + 1).min(self.indices.len());
        let start = (first as usize).min(end);
        &self.indices[start..end]
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bounding box of the whole tree.
    pub fn bounding_box(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |n| *n.bbox())
    }

    pub fn stats(&self) -> BvhStats {
        BvhStats {
            nodes: self.nodes.len(),
            leaves: self
                .nodes
                .iter()
                .filter(|n| matches!(n, BvhNode::Leaf { .. }))
                .count(),
            depth: self.depth,
        }
    }

    /// Closest hit against `primitives` inside `ray.interval`.
    ///
    /// If the traversal stack fills up, the children that do not fit are
    /// skipped and the best hit found so far is returned.
    pub fn hit<'a>(&self, primitives: &'a [Primitive], ray: &Ray) -> Option<HitRecord<'a>> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut ray = *ray;
        let mut closest = None;
        let mut stack: ArrayVec<u32, TRAVERSAL_STACK_SIZE> = ArrayVec::new();
        stack.push(0);

        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index as usize) else {
                continue;
            };
            if !node.bbox().hit(&ray, ray.interval) {
                continue;
            }

            match *node {
                BvhNode::Leaf { first, last, .. } => {
                    for &i in self.leaf_indices(first, last) {
                        let Some(primitive) = primitives.get(i as usize) else {
                            continue;
                        };
                        if let Some(rec) = primitive.hit(&ray) {
                            ray.shrink_to(rec.t);
                            closest = Some(rec);
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    // Overflow: stop descending this branch
                    if stack.try_push(right).is_err() || stack.try_push(left).is_err() {
                        continue;
                    }
                }
            }
        }

        closest
    }
}

//! Full-binary bounding volume hierarchy over collider AABBs: loose
//! leaves, incremental insertion by surface-area cost, and a periodic
//! median-split rebuild.

mod node;

use crate::collide::ColliderId;
use crate::fixed::FixedNum;
use crate::geom::{Aabb, Vec2};
use node::Node;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Below this many leaves, a full rebuild isn't worth the cost; the
/// incrementally-grown tree is kept as-is.
const MIN_LEAVES_TO_REBUILD: usize = 7;

fn cost(a: Aabb, b: Aabb, c: Aabb) -> FixedNum {
    b.area() + a.union(c).area()
}

/// Tie-break for equal-cost insertion candidates: L1 distance between
/// box centers (doubled, since it compares `min+max` sums rather than
/// halved centers — irrelevant to the comparison, only the relative
/// ordering matters).
fn cost_tiebreak(a: Aabb, b: Aabb) -> FixedNum {
    (a.min.x + a.max.x - b.min.x - b.max.x).abs() + (a.min.y + a.max.y - b.min.y - b.max.y).abs()
}

/// A full-binary BVH: every internal node has exactly two children.
/// Leaves store a loose box (the true bounds expanded by `edge_coef *
/// diameter`) so that small position changes don't force a tree edit;
/// [`BvhTree::update_collider`] only touches the tree when a collider
/// actually escapes its loose box.
pub struct BvhTree {
    nodes: Vec<Node>,
    root: Option<usize>,
    free_list: Option<usize>,
    /// Ordered so rebuilds and iteration are deterministic across
    /// platforms, unlike the reference source's hash map.
    collider_map: BTreeMap<ColliderId, usize>,
    changed_count: u32,
    edge_coef: FixedNum,
    /// Reused across [`BvhTree::query_box`] calls so a hot broadphase
    /// loop doesn't allocate a fresh traversal stack every query.
    query_stack: RefCell<Vec<usize>>,
    /// Reused across [`BvhTree::query_ray`] calls, same reasoning.
    ray_stack: RefCell<Vec<(usize, FixedNum)>>,
}

impl BvhTree {
    /// Builds an empty tree. `edge_coef` controls how much a leaf's
    /// loose box is padded beyond the collider's true bounds.
    pub fn new(edge_coef: FixedNum) -> Self {
        BvhTree {
            nodes: Vec::new(),
            root: None,
            free_list: None,
            collider_map: BTreeMap::new(),
            changed_count: 0,
            edge_coef,
            query_stack: RefCell::new(Vec::new()),
            ray_stack: RefCell::new(Vec::new()),
        }
    }

    /// Number of leaves currently tracked.
    pub fn leaf_count(&self) -> usize {
        self.collider_map.len()
    }

    /// Total node count (leaves plus internal nodes).
    pub fn node_count(&self) -> usize {
        match self.root {
            Some(root) => self.node_count_from(root),
            None => 0,
        }
    }

    fn node_count_from(&self, idx: usize) -> usize {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            1
        } else {
            1 + self.node_count_from(node.left.unwrap()) + self.node_count_from(node.right.unwrap())
        }
    }

    /// Tree depth (1 for a single leaf, 0 if empty).
    pub fn depth(&self) -> usize {
        match self.root {
            Some(root) => self.depth_from(root),
            None => 0,
        }
    }

    fn depth_from(&self, idx: usize) -> usize {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            1
        } else {
            1 + self.depth_from(node.left.unwrap()).max(self.depth_from(node.right.unwrap()))
        }
    }

    /// Number of structural edits (insertions/removals) since the last
    /// [`BvhTree::rebuild`]; the world uses this to decide when a
    /// rebuild is due.
    pub fn changed_count(&self) -> u32 {
        self.changed_count
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list {
            self.free_list = self.nodes[idx].left;
            self.nodes[idx] = Node::default();
            idx
        } else {
            self.nodes.push(Node::default());
            self.nodes.len() - 1
        }
    }

    fn release_node(&mut self, idx: usize) {
        self.nodes[idx].collider = None;
        self.nodes[idx].right = None;
        self.nodes[idx].parent = None;
        self.nodes[idx].left = self.free_list;
        self.free_list = Some(idx);
    }

    fn set_as_node(&mut self, idx: usize, left: usize, right: usize) {
        let bb = self.nodes[left].bb.union(self.nodes[right].bb);
        self.nodes[idx] = Node {
            bb,
            parent: None,
            left: Some(left),
            right: Some(right),
            collider: None,
        };
        self.nodes[left].parent = Some(idx);
        self.nodes[right].parent = Some(idx);
    }

    fn create_leaf(&mut self, collider: ColliderId, true_bounds: Aabb) -> usize {
        let mut bb = true_bounds;
        let diameter = bb.diameter();
        bb.expand(diameter.x * self.edge_coef, diameter.y * self.edge_coef);

        let idx = self.alloc_node();
        self.nodes[idx] = Node {
            bb,
            parent: None,
            left: None,
            right: None,
            collider: Some(collider),
        };
        self.collider_map.insert(collider, idx);
        idx
    }

    fn update_bb_bottom_up(&mut self, mut idx: Option<usize>) {
        while let Some(i) = idx {
            let (left, right) = (self.nodes[i].left.unwrap(), self.nodes[i].right.unwrap());
            self.nodes[i].bb = self.nodes[left].bb.union(self.nodes[right].bb);
            idx = self.nodes[i].parent;
        }
    }

    /// Inserts a collider, descending by minimum surface-area cost and
    /// splicing a new internal node in at the chosen leaf's old slot.
    pub fn add_collider(&mut self, collider: ColliderId, bounds: Aabb) {
        if self.collider_map.contains_key(&collider) {
            log::error!("collider {:?} already added to the BVH", collider.0);
            return;
        }

        self.changed_count += 1;

        let root = match self.root {
            None => {
                self.root = Some(self.create_leaf(collider, bounds));
                return;
            }
            Some(r) => r,
        };

        let mut node_idx = root;
        while !self.nodes[node_idx].is_leaf() {
            let left = self.nodes[node_idx].left.unwrap();
            let right = self.nodes[node_idx].right.unwrap();
            let mut left_cost = cost(self.nodes[left].bb, self.nodes[right].bb, bounds);
            let mut right_cost = cost(self.nodes[right].bb, self.nodes[left].bb, bounds);
            if left_cost == right_cost {
                left_cost = cost_tiebreak(self.nodes[left].bb, bounds);
                right_cost = cost_tiebreak(self.nodes[right].bb, bounds);
            }
            node_idx = if left_cost < right_cost { left } else { right };
        }

        let parent = self.nodes[node_idx].parent;
        let old = node_idx;
        let leaf = self.create_leaf(collider, bounds);

        let new_node = self.alloc_node();
        self.set_as_node(new_node, old, leaf);

        match parent {
            None => self.root = Some(new_node),
            Some(p) => {
                self.nodes[new_node].parent = Some(p);
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = Some(new_node);
                } else {
                    self.nodes[p].right = Some(new_node);
                }
            }
        }

        self.update_bb_bottom_up(parent);
    }

    /// Removes a collider, promoting its sibling into the vacated
    /// parent slot to keep the tree full-binary.
    pub fn remove_collider(&mut self, collider: ColliderId) -> bool {
        let Some(node_idx) = self.collider_map.remove(&collider) else {
            return false;
        };
        self.changed_count += 1;

        if Some(node_idx) == self.root {
            self.release_node(node_idx);
            self.root = None;
            return true;
        }

        let parent = self.nodes[node_idx].parent.expect("non-root leaf always has a parent");
        let neighbor = if self.nodes[parent].left == Some(node_idx) {
            self.nodes[parent].right.unwrap()
        } else {
            self.nodes[parent].left.unwrap()
        };

        if Some(parent) == self.root {
            self.root = Some(neighbor);
            self.nodes[neighbor].parent = None;
        } else {
            let grandparent = self.nodes[parent].parent.unwrap();
            if self.nodes[grandparent].left == Some(parent) {
                self.nodes[grandparent].left = Some(neighbor);
            } else {
                self.nodes[grandparent].right = Some(neighbor);
            }
            self.nodes[neighbor].parent = Some(grandparent);
            self.update_bb_bottom_up(Some(grandparent));
        }

        self.release_node(parent);
        self.release_node(node_idx);
        true
    }

    /// Refits a collider's leaf if `true_bounds` has escaped its loose
    /// box; otherwise a no-op, which is the common case for a slowly
    /// moving or resting body.
    pub fn update_collider(&mut self, collider: ColliderId, true_bounds: Aabb) {
        let Some(&node_idx) = self.collider_map.get(&collider) else {
            return;
        };
        if self.nodes[node_idx].bb.contains(true_bounds) {
            return;
        }
        self.remove_collider(collider);
        self.add_collider(collider, true_bounds);
    }

    /// Drops the whole tree.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.free_list = None;
        self.collider_map.clear();
        self.changed_count = 0;
    }

    /// Rebuilds the tree from scratch via top-down median splits,
    /// alternating the split axis, producing a much better-balanced
    /// tree than the incrementally-grown one. Below
    /// [`MIN_LEAVES_TO_REBUILD`] leaves this is a no-op — not worth it.
    pub fn rebuild(&mut self) {
        self.changed_count = 0;
        if self.leaf_count() < MIN_LEAVES_TO_REBUILD {
            return;
        }

        let mut leaves: Vec<usize> = self.collider_map.values().copied().collect();

        if let Some(root) = self.root.take() {
            self.release_non_leaf_nodes(root);
        }

        let new_root = self.rebuild_range(&mut leaves, 0);
        self.root = Some(new_root);
    }

    fn release_non_leaf_nodes(&mut self, idx: usize) {
        if self.nodes[idx].is_leaf() {
            return;
        }
        let (left, right) = (self.nodes[idx].left.unwrap(), self.nodes[idx].right.unwrap());
        self.release_non_leaf_nodes(left);
        self.release_non_leaf_nodes(right);
        self.release_node(idx);
    }

    fn rebuild_range(&mut self, indices: &mut [usize], axis: usize) -> usize {
        let n = indices.len();
        if n == 1 {
            return indices[0];
        }
        if n == 2 {
            let idx = self.alloc_node();
            self.set_as_node(idx, indices[0], indices[1]);
            return idx;
        }

        indices.sort_by(|&a, &b| {
            self.nodes[a].bb.center().axis(axis).cmp(&self.nodes[b].bb.center().axis(axis))
        });
        let next_axis = (axis + 1) % 2;

        // Half-open split [0, half), biased one element toward the left
        // half on odd counts, matching the reference source exactly.
        let half = n / 2 + 1;
        let (left_slice, right_slice) = indices.split_at_mut(half);
        let left = self.rebuild_range(left_slice, next_axis);
        let right = self.rebuild_range(right_slice, next_axis);

        let idx = self.alloc_node();
        self.set_as_node(idx, left, right);
        idx
    }

    /// Visits every leaf whose loose box overlaps `bounds`, in no
    /// particular order, until `visit` returns `true` (stop) or the
    /// tree is exhausted. Unlike the reference source, this only
    /// checks the loose box — callers already have the collider handy
    /// for the narrow-phase test and can cheaply re-check true bounds
    /// themselves before committing to a candidate pair.
    pub fn query_box(&self, bounds: Aabb, mut visit: impl FnMut(ColliderId) -> bool) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        let mut stack = self.query_stack.borrow_mut();
        stack.clear();
        stack.push(root);

        let mut found = false;
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if !node.bb.intersects(bounds) {
                continue;
            }
            if node.is_leaf() {
                if visit(node.collider.unwrap()) {
                    found = true;
                    break;
                }
            } else {
                stack.push(node.left.unwrap());
                stack.push(node.right.unwrap());
            }
        }
        stack.clear();
        found
    }

    /// Best-first ray traversal: at each internal node, visits whichever
    /// child's loose box the ray enters first, pruning any candidate
    /// whose entry distance already exceeds the best hit found so far.
    /// `visit` is called once per candidate leaf and must return the
    /// true hit distance (or [`FixedNum::MAX`] on a miss), mirroring
    /// the reference source's incrementally-tightening `minDistance`.
    pub fn query_ray(&self, start: Vec2, end: Vec2, mut visit: impl FnMut(ColliderId) -> FixedNum) {
        let Some(root) = self.root else {
            return;
        };

        let mut min_distance = FixedNum::ONE;
        let mut stack = self.ray_stack.borrow_mut();
        stack.clear();
        stack.push((root, FixedNum::ZERO));

        while let Some((idx, entry)) = stack.pop() {
            if entry > min_distance {
                continue;
            }

            let node = &self.nodes[idx];
            if node.is_leaf() {
                let hit = visit(node.collider.unwrap());
                min_distance = min_distance.min(hit);
                continue;
            }

            let left = node.left.unwrap();
            let right = node.right.unwrap();
            let d_left = self.nodes[left].bb.ray_distance(start, end);
            let d_right = self.nodes[right].bb.ray_distance(start, end);

            // Push the farther candidate first so the nearer one pops
            // (and is explored) first.
            if d_left < d_right {
                if d_right < min_distance {
                    stack.push((right, d_right));
                }
                if d_left < min_distance {
                    stack.push((left, d_left));
                }
            } else {
                if d_left < min_distance {
                    stack.push((left, d_left));
                }
                if d_right < min_distance {
                    stack.push((right, d_right));
                }
            }
        }
    }
}

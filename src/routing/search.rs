use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::grid::SparseGrid;
use super::types::Dir;

/// Lexicographic path cost: bends first, scaled distance second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cost {
    pub bends: u32,
    pub distance: u64,
}

impl Cost {
    pub const ZERO: Cost = Cost { bends: 0, distance: 0 };

    pub fn with_extra_bend(self, turned: bool) -> Cost {
        Cost {
            bends: self.bends.saturating_add(u32::from(turned)),
            distance: self.distance,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct SearchEntry {
    cost: Cost,
    node: usize,
    dir: Dir,
}

// BinaryHeap is a max-heap; reverse so the cheapest state pops first and
// equal costs resolve by node then direction.
impl Ord for SearchEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
            .then_with(|| other.dir.cmp(&self.dir))
    }
}

impl PartialOrd for SearchEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn state_index(node: usize, dir: Dir) -> usize {
    node * 4 + dir.index()
}

/// Settled costs over `(node, incoming direction)` states.
#[derive(Debug)]
pub struct SearchTree {
    best: Vec<Option<Cost>>,
    prev: Vec<Option<usize>>,
}

impl SearchTree {
    pub fn cost(&self, node: usize, dir: Dir) -> Option<Cost> {
        self.best.get(state_index(node, dir)).copied().flatten()
    }

    /// Node ids from the start to `node`, entered while moving `dir`.
    pub fn path_to(&self, node: usize, dir: Dir) -> Vec<usize> {
        let mut nodes = Vec::new();
        let mut cursor = Some(state_index(node, dir));
        while let Some(state) = cursor {
            nodes.push(state / 4);
            cursor = self.prev[state];
        }
        nodes.reverse();
        nodes
    }
}

/// Dijkstra over direction-aware states. Turning costs one bend and
/// reversing is not allowed.
pub fn explore(grid: &SparseGrid, start: usize, start_dir: Dir) -> SearchTree {
    let states = grid.node_count() * 4;
    let mut best: Vec<Option<Cost>> = vec![None; states];
    let mut prev: Vec<Option<usize>> = vec![None; states];
    let mut heap = BinaryHeap::new();

    best[state_index(start, start_dir)] = Some(Cost::ZERO);
    heap.push(SearchEntry {
        cost: Cost::ZERO,
        node: start,
        dir: start_dir,
    });

    while let Some(SearchEntry { cost, node, dir }) = heap.pop() {
        let state = state_index(node, dir);
        if best[state] != Some(cost) {
            continue;
        }
        for next_dir in Dir::ALL {
            if next_dir == dir.opposite() {
                continue;
            }
            let Some((next, step)) = grid.neighbor(node, next_dir) else {
                continue;
            };
            let next_cost = Cost {
                bends: cost.bends.saturating_add(u32::from(next_dir != dir)),
                distance: cost.distance.saturating_add(step),
            };
            let next_state = state_index(next, next_dir);
            if best[next_state].is_some_and(|known| known <= next_cost) {
                continue;
            }
            best[next_state] = Some(next_cost);
            prev[next_state] = Some(state);
            heap.push(SearchEntry {
                cost: next_cost,
                node: next,
                dir: next_dir,
            });
        }
    }

    SearchTree { best, prev }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};

    #[test]
    fn entries_pop_in_lexicographic_order() {
        let mut heap = BinaryHeap::new();
        for (bends, distance) in [(1, 10), (0, 500), (0, 20), (2, 0)] {
            heap.push(SearchEntry {
                cost: Cost { bends, distance },
                node: 0,
                dir: Dir::Right,
            });
        }
        let order: Vec<(u32, u64)> = std::iter::from_fn(|| heap.pop())
            .map(|e| (e.cost.bends, e.cost.distance))
            .collect();
        assert_eq!(order, vec![(0, 20), (0, 500), (1, 10), (2, 0)]);
    }

    #[test]
    fn fewer_bends_beat_shorter_distance() {
        // Two ways around a blocker: the search must report the one-bend
        // state at the goal even though distances differ.
        let stubs = [Point::new(0.0, 0.0), Point::new(100.0, 100.0)];
        let grid = SparseGrid::build(stubs, &[Rect::new(40.0, 40.0, 20.0, 20.0)], &[], 0.0, 10.0, 1);
        let start = grid.node_at(stubs[0]).expect("start node");
        let goal = grid.node_at(stubs[1]).expect("goal node");
        let tree = explore(&grid, start, Dir::Right);
        let down = tree.cost(goal, Dir::Down).expect("reach goal moving down");
        assert_eq!(down.bends, 1);
        let path = tree.path_to(goal, Dir::Down);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
    }
}

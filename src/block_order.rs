/*!
Computes a single linear order over all blocks that agrees with the left-to-right block sequence of every lane.
This is a topological sort of the "immediately precedes on some lane" graph.
Blocks with no mutual precedence come out in the order they are first encountered when scanning lanes in registration order.
*/

use itertools::Itertools;
use log::debug;
use priority_queue::PriorityQueue;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::cmp::Reverse;

use crate::errors::PinchConError;
use crate::pinch_graph::{BlockIndex, PinchGraph};

/// A fixed total order over the blocks of a finalized graph
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockOrder {
    /// Blocks in order
    order: Vec<BlockIndex>,
    /// Block => position in `order`
    ranks: HashMap<BlockIndex, usize>
}

impl BlockOrder {
    /// Builds the precedence graph and sorts it.
    /// # Arguments
    /// * `graph` - the alignment graph after all pinches are applied
    /// # Errors
    /// * if the precedence graph has a cycle
    pub fn compute(graph: &PinchGraph) -> Result<BlockOrder, Box<dyn std::error::Error>> {
        // first-encounter rank is our deterministic tie-breaker
        let mut first_seen: HashMap<BlockIndex, usize> = Default::default();
        let mut successors: HashMap<BlockIndex, Vec<BlockIndex>> = Default::default();
        let mut in_degree: HashMap<BlockIndex, usize> = Default::default();
        let mut edges: HashSet<(BlockIndex, BlockIndex)> = Default::default();

        for lane_id in graph.lane_ids() {
            let segments = graph.lane_segments(lane_id)?;
            for segment in segments.iter() {
                let next_rank = first_seen.len();
                first_seen.entry(segment.block).or_insert(next_rank);
            }
            for (prev, next) in segments.iter().tuple_windows() {
                if edges.insert((prev.block, next.block)) {
                    successors.entry(prev.block).or_default().push(next.block);
                    *in_degree.entry(next.block).or_default() += 1;
                }
            }
        }

        let mut pqueue: PriorityQueue<BlockIndex, Reverse<usize>> = PriorityQueue::new();
        for (&block, &rank) in first_seen.iter() {
            if !in_degree.contains_key(&block) {
                pqueue.push(block, Reverse(rank));
            }
        }

        let mut order: Vec<BlockIndex> = Vec::with_capacity(first_seen.len());
        while let Some((block, _rank)) = pqueue.pop() {
            order.push(block);
            for next in successors.get(&block).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        pqueue.push(*next, Reverse(first_seen[next]));
                    }
                }
            }
        }

        let total = graph.total_block_count();
        if order.len() != total {
            return Err(PinchConError::InconsistentAlignment { ordered: order.len(), total }.into());
        }
        debug!("Ordered {} blocks across {} precedence edges", total, edges.len());

        let ranks = order.iter()
            .enumerate()
            .map(|(rank, &block)| (block, rank))
            .collect();
        Ok(BlockOrder {
            order,
            ranks
        })
    }

    /// The blocks, in order
    pub fn blocks(&self) -> &[BlockIndex] {
        &self.order
    }

    /// Position of a block in the order
    pub fn rank(&self, block: BlockIndex) -> Option<usize> {
        self.ranks.get(&block).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

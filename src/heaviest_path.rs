/*!
Finds the maximum-weight chain of blocks through a fixed block order, restricted to a set of candidate lanes.

Each block `b` weighs `|lanes(b) ∩ candidates| * length(b)`.
A block may extend a path ending at an earlier block `a` only if the two share at least one candidate lane,
and the extension pays `gap_penalty` for every block ranked strictly between them, chosen or not:
```text
best[b] = weight(b) + max(0, max_a(best[a] - gap_penalty * (rank(b) - rank(a) - 1)))
```
Because the penalty is linear in rank, `best[a] + gap_penalty * rank(a)` is tracked per lane and every block
only looks at the lanes it touches, rather than at every earlier block.
Ties always go to the block that is earliest in the order.
*/

use log::trace;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::block_order::BlockOrder;
use crate::pinch_graph::{BlockIndex, PinchGraph};
use crate::sequence_registry::LaneId;

/// A chosen chain of blocks and its score
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaviestPath {
    /// Blocks in order
    pub blocks: Vec<BlockIndex>,
    /// Total weight minus gap penalties
    pub score: i64
}

/// Best predecessor candidate seen so far on one lane
#[derive(Clone, Copy, Debug)]
struct LaneTail {
    /// `best[block] + gap_penalty * rank`
    value: i64,
    rank: usize,
    block: BlockIndex
}

/// Runs the forward dynamic program over `order`.
/// Returns an empty path with score 0 if no block touches a candidate lane.
/// # Arguments
/// * `graph` - the finalized alignment graph
/// * `order` - the block order computed from `graph`
/// * `gap_penalty` - cost per skipped block between two chosen blocks
/// * `candidate_lanes` - only these lanes contribute weight
pub fn find_heaviest_path(graph: &PinchGraph, order: &BlockOrder, gap_penalty: i64, candidate_lanes: &HashSet<LaneId>) -> HeaviestPath {
    let mut lane_tails: HashMap<LaneId, LaneTail> = Default::default();
    let mut predecessors: HashMap<BlockIndex, BlockIndex> = Default::default();
    let mut best_end: Option<(i64, BlockIndex)> = None;

    for (rank, &block) in order.blocks().iter().enumerate() {
        let lanes: Vec<LaneId> = graph.block_lanes(block)
            .filter(|lane| candidate_lanes.contains(lane))
            .collect();
        if lanes.is_empty() {
            continue;
        }
        let weight = (lanes.len() * graph.block_length(block)) as i64;

        // strongest predecessor over the shared lanes, earliest rank on ties
        let mut predecessor: Option<LaneTail> = None;
        for lane in lanes.iter() {
            if let Some(tail) = lane_tails.get(lane) {
                let better = match predecessor {
                    None => true,
                    Some(p) => tail.value > p.value || (tail.value == p.value && tail.rank < p.rank)
                };
                if better {
                    predecessor = Some(*tail);
                }
            }
        }

        let mut best = weight;
        if let Some(p) = predecessor {
            let carried = p.value - gap_penalty * (rank as i64 - 1);
            if carried > 0 {
                best += carried;
                predecessors.insert(block, p.block);
            }
        }
        trace!("block {block} rank {rank}: weight {weight}, best {best}");

        let value = best + gap_penalty * rank as i64;
        for lane in lanes.into_iter() {
            let tail = lane_tails.entry(lane).or_insert(LaneTail { value, rank, block });
            if value > tail.value {
                *tail = LaneTail { value, rank, block };
            }
        }

        if best_end.map_or(true, |(score, _b)| best > score) {
            best_end = Some((best, block));
        }
    }

    let Some((score, end_block)) = best_end else {
        return HeaviestPath::default();
    };

    let mut blocks = vec![end_block];
    let mut current = end_block;
    while let Some(&previous) = predecessors.get(&current) {
        blocks.push(previous);
        current = previous;
    }
    blocks.reverse();

    HeaviestPath {
        blocks,
        score
    }
}

/*!
The alignment graph: one lane per input sequence, each lane partitioned into segments, and segments grouped into blocks of mutually aligned positions.
Pinches split segments at window boundaries and merge the blocks of the aligned sub-segments.

Lanes, segments, and blocks are arena entries referenced by index.
A block absorbed by a merge is left in the arena with no segments and is skipped by all block iteration.

# Example usage
```rust
use pinch_con::pinch::{Pinch, Strand};
use pinch_con::pinch_graph::PinchGraph;

let mut graph = PinchGraph::new();
graph.add_lane(1, 4).unwrap();
graph.add_lane(2, 4).unwrap();
graph.add_lane(3, 4).unwrap();
graph.apply_pinch(&Pinch::new(1, 0, 2, 0, 4, Strand::Forward)).unwrap();
graph.apply_pinch(&Pinch::new(2, 0, 3, 0, 4, Strand::Forward)).unwrap();

// lanes 1 and 3 were never pinched directly, but they share a block now
assert_eq!(graph.total_block_count(), 1);
let block = graph.blocks().next().unwrap();
assert_eq!(graph.block_degree(block), 3);
assert_eq!(graph.block_length(block), 4);
```
*/

use log::{debug, trace};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use simple_error::bail;
use std::collections::BTreeMap;

use crate::errors::PinchConError;
use crate::pinch::{Pinch, Strand};
use crate::sequence_registry::LaneId;

/// Index of a block in the graph arena
pub type BlockIndex = usize;
type SegmentIndex = usize;

/// A read-only view of one segment
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SegmentView {
    /// The lane this segment lives on
    pub lane: LaneId,
    /// Inclusive start on the lane
    pub start: usize,
    /// Exclusive end on the lane
    pub end: usize,
    /// The block containing this segment
    pub block: BlockIndex
}

impl SegmentView {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug)]
struct Segment {
    /// Index into the lane arena
    lane: usize,
    start: usize,
    end: usize,
    block: BlockIndex
}

impl Segment {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Clone, Debug)]
struct Lane {
    id: LaneId,
    length: usize,
    /// Segment start position => segment index, always a partition of [0, length)
    segments: BTreeMap<usize, SegmentIndex>
}

#[derive(Clone, Debug, Default)]
struct Block {
    /// Member segments, at most one per lane; empty once absorbed by a merge
    segments: Vec<SegmentIndex>
}

/// The merged alignment graph
#[derive(Clone, Debug, Default)]
pub struct PinchGraph {
    lanes: Vec<Lane>,
    lane_lookup: HashMap<LaneId, usize>,
    segments: Vec<Segment>,
    blocks: Vec<Block>,
    /// Number of blocks that still have segments
    live_blocks: usize
}

impl PinchGraph {
    pub fn new() -> PinchGraph {
        Default::default()
    }

    /// Registers a new lane as a single segment in its own block.
    /// Zero-length lanes are registered but own no segment.
    /// # Arguments
    /// * `lane_id` - the unique lane id
    /// * `length` - the length of the lane's sequence
    /// # Errors
    /// * if `lane_id` is already registered
    pub fn add_lane(&mut self, lane_id: LaneId, length: usize) -> Result<(), Box<dyn std::error::Error>> {
        if self.lane_lookup.contains_key(&lane_id) {
            return Err(PinchConError::DuplicateLane(lane_id).into());
        }

        let lane_index = self.lanes.len();
        let mut lane = Lane {
            id: lane_id,
            length,
            segments: Default::default()
        };
        if length > 0 {
            let segment_index = self.segments.len();
            let block_index = self.blocks.len();
            self.segments.push(Segment { lane: lane_index, start: 0, end: length, block: block_index });
            self.blocks.push(Block { segments: vec![segment_index] });
            self.live_blocks += 1;
            lane.segments.insert(0, segment_index);
        }
        self.lanes.push(lane);
        self.lane_lookup.insert(lane_id, lane_index);
        Ok(())
    }

    /// Applies every pinch from a stream, returns how many were not ignored by policy.
    /// # Errors
    /// * if any pinch references an unknown lane or runs out of bounds
    pub fn apply_pinches<I: IntoIterator<Item = Pinch>>(&mut self, pinches: I) -> Result<usize, Box<dyn std::error::Error>> {
        let mut applied = 0;
        let mut ignored = 0;
        for pinch in pinches {
            if self.apply_pinch(&pinch)? {
                applied += 1;
            } else {
                ignored += 1;
            }
        }
        debug!("Applied {applied} pinches, ignored {ignored}; graph has {} blocks", self.live_blocks);
        Ok(applied)
    }

    /// Merges the two windows of a pinch into shared blocks.
    /// Self-pinches, reverse-strand pinches, and empty pinches are ignored and return false.
    /// Any sub-merge that would put two segments of one lane into a block is silently dropped.
    /// # Arguments
    /// * `pinch` - the pairwise match to apply
    /// # Errors
    /// * if either lane is unknown
    /// * if either window runs past the end of its lane
    pub fn apply_pinch(&mut self, pinch: &Pinch) -> Result<bool, Box<dyn std::error::Error>> {
        // both windows are checked even when the pinch is then ignored
        let lane_a = self.checked_window(pinch.lane_a, pinch.start_a, pinch.length)?;
        let lane_b = self.checked_window(pinch.lane_b, pinch.start_b, pinch.length)?;

        if pinch.lane_a == pinch.lane_b {
            trace!("Ignoring self-pinch on lane {}", pinch.lane_a);
            return Ok(false);
        }
        if pinch.strand == Strand::Reverse {
            trace!("Ignoring reverse-strand pinch between {} and {}", pinch.lane_a, pinch.lane_b);
            return Ok(false);
        }
        if pinch.length == 0 {
            return Ok(false);
        }

        self.ensure_boundary(lane_a, pinch.start_a);
        self.ensure_boundary(lane_a, pinch.start_a + pinch.length);
        self.ensure_boundary(lane_b, pinch.start_b);
        self.ensure_boundary(lane_b, pinch.start_b + pinch.length);

        // walk both windows in lock-step, each step covers one pair of equal-length segments
        let mut offset = 0;
        while offset < pinch.length {
            let segment_a = self.segment_at(lane_a, pinch.start_a + offset);
            let segment_b = self.segment_at(lane_b, pinch.start_b + offset);
            let len_a = self.segments[segment_a].len();
            let len_b = self.segments[segment_b].len();
            let step = len_a.min(len_b);

            if len_a > step {
                self.split_block(segment_a, step);
            }
            if len_b > step {
                self.split_block(segment_b, step);
            }

            let block_a = self.segments[segment_a].block;
            let block_b = self.segments[segment_b].block;
            self.merge_blocks(block_a, block_b);
            offset += step;
        }
        Ok(true)
    }

    /// Resolves a lane and confirms a window fits on it, returning the lane arena index.
    fn checked_window(&self, lane_id: LaneId, start: usize, length: usize) -> Result<usize, Box<dyn std::error::Error>> {
        let lane_index = self.lane_index(lane_id)?;
        let lane_length = self.lanes[lane_index].length;
        if start.checked_add(length).map_or(true, |end| end > lane_length) {
            return Err(PinchConError::PinchOutOfBounds { lane: lane_id, start, length, lane_length }.into());
        }
        Ok(lane_index)
    }

    fn lane_index(&self, lane_id: LaneId) -> Result<usize, PinchConError> {
        self.lane_lookup.get(&lane_id)
            .copied()
            .ok_or(PinchConError::UnknownLane(lane_id))
    }

    /// Returns the segment covering `position`, which must be inside the lane.
    fn segment_at(&self, lane_index: usize, position: usize) -> SegmentIndex {
        let (_start, &segment) = self.lanes[lane_index].segments
            .range(..=position)
            .next_back()
            .unwrap_or_else(|| panic!("lane partition has no segment at {position}"));
        segment
    }

    /// Makes sure some segment on the lane starts exactly at `position`.
    fn ensure_boundary(&mut self, lane_index: usize, position: usize) {
        if position == 0 || position >= self.lanes[lane_index].length {
            return;
        }
        let segment = self.segment_at(lane_index, position);
        let start = self.segments[segment].start;
        if start != position {
            self.split_block(segment, position - start);
        }
    }

    /// Splits every segment in the block of `segment` at the same relative offset.
    /// The left halves keep the original block, the right halves form a new one.
    fn split_block(&mut self, segment: SegmentIndex, offset: usize) {
        let block = self.segments[segment].block;
        let new_block = self.blocks.len();
        let members = self.blocks[block].segments.clone();
        let mut right_members = Vec::with_capacity(members.len());

        for member in members {
            let left = &mut self.segments[member];
            assert!(offset > 0 && offset < left.len());
            let split_point = left.start + offset;
            let right = Segment {
                lane: left.lane,
                start: split_point,
                end: left.end,
                block: new_block
            };
            left.end = split_point;

            let right_index = self.segments.len();
            self.lanes[right.lane].segments.insert(split_point, right_index);
            self.segments.push(right);
            right_members.push(right_index);
        }

        self.blocks.push(Block { segments: right_members });
        self.live_blocks += 1;
    }

    /// Unions two blocks into the lower-indexed one.
    /// Returns false if the blocks share a lane, in which case nothing changes.
    fn merge_blocks(&mut self, block_a: BlockIndex, block_b: BlockIndex) -> bool {
        if block_a == block_b {
            return true;
        }

        let lanes_a: HashSet<usize> = self.blocks[block_a].segments.iter()
            .map(|&s| self.segments[s].lane)
            .collect();
        if self.blocks[block_b].segments.iter().any(|&s| lanes_a.contains(&self.segments[s].lane)) {
            trace!("Rejected merge of blocks {block_a} and {block_b}: shared lane");
            return false;
        }

        let (keep, absorb) = if block_a < block_b { (block_a, block_b) } else { (block_b, block_a) };
        let moved = std::mem::take(&mut self.blocks[absorb].segments);
        for &s in moved.iter() {
            self.segments[s].block = keep;
        }
        self.blocks[keep].segments.extend(moved);
        self.live_blocks -= 1;
        true
    }

    fn view(&self, segment: SegmentIndex) -> SegmentView {
        let s = &self.segments[segment];
        SegmentView {
            lane: self.lanes[s.lane].id,
            start: s.start,
            end: s.end,
            block: s.block
        }
    }

    /// Number of distinct blocks currently in the graph
    pub fn total_block_count(&self) -> usize {
        self.live_blocks
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Lane ids in registration order
    pub fn lane_ids(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.lanes.iter().map(|l| l.id)
    }

    pub fn lane_length(&self, lane_id: LaneId) -> Option<usize> {
        self.lane_lookup.get(&lane_id).map(|&i| self.lanes[i].length)
    }

    /// The segments of a lane, left to right.
    /// # Errors
    /// * if the lane is not registered
    pub fn lane_segments(&self, lane_id: LaneId) -> Result<Vec<SegmentView>, Box<dyn std::error::Error>> {
        let lane_index = self.lane_index(lane_id)?;
        Ok(self.lanes[lane_index].segments.values()
            .map(|&s| self.view(s))
            .collect())
    }

    /// All live blocks, in a fixed enumeration order (arena order)
    pub fn blocks(&self) -> impl Iterator<Item = BlockIndex> + '_ {
        self.blocks.iter()
            .enumerate()
            .filter(|(_i, b)| !b.segments.is_empty())
            .map(|(i, _b)| i)
    }

    /// Common length of every segment in the block
    pub fn block_length(&self, block: BlockIndex) -> usize {
        self.blocks[block].segments.first()
            .map_or(0, |&s| self.segments[s].len())
    }

    /// Number of lanes represented in the block
    pub fn block_degree(&self, block: BlockIndex) -> usize {
        self.blocks[block].segments.len()
    }

    /// The segments in the block, sorted by lane id
    pub fn block_segments(&self, block: BlockIndex) -> Vec<SegmentView> {
        let mut views: Vec<SegmentView> = self.blocks[block].segments.iter()
            .map(|&s| self.view(s))
            .collect();
        views.sort_by_key(|v| v.lane);
        views
    }

    /// Iterates the lane ids with a segment in the block
    pub fn block_lanes(&self, block: BlockIndex) -> impl Iterator<Item = LaneId> + '_ {
        self.blocks[block].segments.iter()
            .map(|&s| self.lanes[self.segments[s].lane].id)
    }

    /// The set of lane ids with a segment in the block
    pub fn lanes_of_block(&self, block: BlockIndex) -> HashSet<LaneId> {
        self.block_lanes(block).collect()
    }

    /// Verifies the structural invariants: each lane is partitioned by its segments,
    /// segments in a block share one length, and no block holds two segments of a lane.
    /// # Errors
    /// * describing the first violation found
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        for lane in self.lanes.iter() {
            let mut expected_start = 0;
            for (&start, &segment) in lane.segments.iter() {
                let s = &self.segments[segment];
                if start != expected_start || s.start != start || s.end <= s.start {
                    bail!("Lane {} is not partitioned at position {}", lane.id, expected_start);
                }
                if !self.blocks[s.block].segments.contains(&segment) {
                    bail!("Segment {}..{} on lane {} is missing from its block", s.start, s.end, lane.id);
                }
                expected_start = s.end;
            }
            if expected_start != lane.length {
                bail!("Lane {} segments end at {} instead of {}", lane.id, expected_start, lane.length);
            }
        }

        let mut live = 0;
        for (block_index, block) in self.blocks.iter().enumerate() {
            if block.segments.is_empty() {
                continue;
            }
            live += 1;
            let length = self.block_length(block_index);
            let mut seen_lanes: HashSet<usize> = Default::default();
            for &segment in block.segments.iter() {
                let s = &self.segments[segment];
                if s.len() != length {
                    bail!("Block {} has segments of unequal length", block_index);
                }
                if !seen_lanes.insert(s.lane) {
                    bail!("Block {block_index} has two segments on lane {}", self.lanes[s.lane].id);
                }
            }
        }
        if live != self.live_blocks {
            bail!("Live block count {} does not match tracked count {}", live, self.live_blocks);
        }
        Ok(())
    }
}

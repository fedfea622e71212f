/*!
Owns the raw sequence text for every lane, keyed by the integer lane id.
Everything else in the crate refers to sequence text through this registry rather than copying it.
*/

use rustc_hash::FxHashMap as HashMap;

use crate::errors::PinchConError;
use crate::pinch_graph::PinchGraph;

/// Integer identifier of one input sequence (a lane in the alignment graph)
pub type LaneId = i64;

/// Maps lane ids to their sequences, remembering registration order
#[derive(Debug, Default)]
pub struct SequenceRegistry {
    /// The sequence text for each lane
    sequences: HashMap<LaneId, Vec<u8>>,
    /// Lane ids in the order they were added
    order: Vec<LaneId>
}

impl SequenceRegistry {
    /// Creates an empty registry
    pub fn new() -> SequenceRegistry {
        Default::default()
    }

    /// Builds a registry from named records, where each name must parse as an integer id.
    /// # Arguments
    /// * `records` - the (name, sequence) pairs, typically from a FASTA reader
    /// # Errors
    /// * if a name is not an integer
    /// * if two records share an id
    pub fn from_named_records<N, S, I>(records: I) -> Result<SequenceRegistry, Box<dyn std::error::Error>>
    where
        N: AsRef<str>,
        S: Into<Vec<u8>>,
        I: IntoIterator<Item = (N, S)>
    {
        let mut registry = SequenceRegistry::new();
        for (name, sequence) in records {
            let name = name.as_ref().trim();
            let lane_id: LaneId = name.parse()
                .map_err(|_| PinchConError::InvalidLaneName(name.to_string()))?;
            registry.add_sequence(lane_id, sequence)?;
        }
        Ok(registry)
    }

    /// Registers a new sequence.
    /// # Arguments
    /// * `lane_id` - the unique id for this sequence
    /// * `sequence` - the raw sequence text
    /// # Errors
    /// * if `lane_id` is already registered
    pub fn add_sequence<S: Into<Vec<u8>>>(&mut self, lane_id: LaneId, sequence: S) -> Result<(), Box<dyn std::error::Error>> {
        if self.sequences.contains_key(&lane_id) {
            return Err(PinchConError::DuplicateLane(lane_id).into());
        }
        self.sequences.insert(lane_id, sequence.into());
        self.order.push(lane_id);
        Ok(())
    }

    /// Creates an alignment graph with one unpinched lane per registered sequence, in registration order.
    pub fn build_graph(&self) -> Result<PinchGraph, Box<dyn std::error::Error>> {
        let mut graph = PinchGraph::new();
        for &lane_id in self.order.iter() {
            graph.add_lane(lane_id, self.sequences[&lane_id].len())?;
        }
        Ok(graph)
    }

    /// Returns the full sequence for a lane, if registered
    pub fn sequence(&self, lane_id: LaneId) -> Option<&[u8]> {
        self.sequences.get(&lane_id).map(|s| s.as_slice())
    }

    /// Returns the length of a lane's sequence, if registered
    pub fn sequence_len(&self, lane_id: LaneId) -> Option<usize> {
        self.sequences.get(&lane_id).map(|s| s.len())
    }

    pub fn lane_ids(&self) -> &[LaneId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

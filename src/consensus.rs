/*!
This module builds a consensus sequence for a chosen block path and holds the final consensus record.

Each block contributes one symbol per column: the most common symbol at that column across every segment in the block.
Ties go to the smallest byte value, so the same input always gives the same output.

# Example usage
```rust
use pinch_con::consensus::build_consensus;
use pinch_con::pinch::{Pinch, Strand};
use pinch_con::sequence_registry::SequenceRegistry;

let registry = SequenceRegistry::from_named_records([
    ("1", "ACGTAC"),
    ("2", "ACCTAC"),
    ("3", "ACGTAC")
]).unwrap();
let mut graph = registry.build_graph().unwrap();
graph.apply_pinches([
    Pinch::new(1, 0, 2, 0, 6, Strand::Forward),
    Pinch::new(1, 0, 3, 0, 6, Strand::Forward)
]).unwrap();

let path: Vec<usize> = graph.blocks().collect();
let consensus = build_consensus(&graph, &registry, &path).unwrap();
assert_eq!(consensus, b"ACGTAC".to_vec());
```
*/

use std::io::Write;

use crate::errors::PinchConError;
use crate::pinch_graph::{BlockIndex, PinchGraph};
use crate::sequence_registry::{LaneId, SequenceRegistry};

/// Contains one accepted consensus repeat
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RepeatConsensus {
    /// Position in extraction order, starting at 0
    index: usize,
    /// The generated consensus
    sequence: Vec<u8>,
    /// Heaviest-path score that produced this consensus
    score: i64,
    /// Lanes claimed by this extraction, sorted
    lanes: Vec<LaneId>
}

impl RepeatConsensus {
    /// Constructor
    pub fn new(index: usize, sequence: Vec<u8>, score: i64, lanes: Vec<LaneId>) -> RepeatConsensus {
        RepeatConsensus {
            index,
            sequence,
            score,
            lanes
        }
    }

    /// FASTA header line (without newline) for this consensus
    pub fn fasta_header(&self, name_prefix: &str) -> String {
        format!(">{}_consensus_{} length={} score={}", name_prefix, self.index, self.sequence.len(), self.score)
    }

    // Getters
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn lanes(&self) -> &[LaneId] {
        &self.lanes
    }
}

/// Writes consensus records as FASTA, one header and one sequence line each.
/// # Errors
/// * if the writer fails
pub fn write_fasta<W: Write>(consensuses: &[RepeatConsensus], name_prefix: &str, writer: &mut W) -> std::io::Result<()> {
    for consensus in consensuses.iter() {
        writeln!(writer, "{}", consensus.fasta_header(name_prefix))?;
        writer.write_all(consensus.sequence())?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Majority-votes every column of every block in `path`, concatenating the results.
/// The output length is the sum of the block lengths.
/// # Arguments
/// * `graph` - the alignment graph the path was found in
/// * `registry` - source of the segment text
/// * `path` - the blocks, in order
/// # Errors
/// * if a segment's lane has no registered sequence
/// * if a segment runs past the end of its registered sequence
pub fn build_consensus(graph: &PinchGraph, registry: &SequenceRegistry, path: &[BlockIndex]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let total_length: usize = path.iter().map(|&b| graph.block_length(b)).sum();
    let mut consensus = Vec::with_capacity(total_length);

    for &block in path.iter() {
        let length = graph.block_length(block);
        let mut texts: Vec<&[u8]> = vec![];
        for segment in graph.block_segments(block) {
            let sequence = registry.sequence(segment.lane)
                .ok_or(PinchConError::UnknownLane(segment.lane))?;
            let text = sequence.get(segment.start..segment.end)
                .ok_or(PinchConError::PinchOutOfBounds {
                    lane: segment.lane,
                    start: segment.start,
                    length: segment.len(),
                    lane_length: sequence.len()
                })?;
            texts.push(text);
        }

        for column in 0..length {
            consensus.push(majority_symbol(texts.iter().map(|t| t[column])));
        }
    }
    Ok(consensus)
}

/// Most frequent symbol, smallest byte on ties
fn majority_symbol<I: Iterator<Item = u8>>(symbols: I) -> u8 {
    let mut counts = [0_usize; 256];
    for symbol in symbols {
        counts[symbol as usize] += 1;
    }
    let mut best = 0_u8;
    let mut best_count = 0;
    for (symbol, &count) in counts.iter().enumerate() {
        if count > best_count {
            best = symbol as u8;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::pinch::{Pinch, Strand};

    #[test]
    fn test_majority_symbol() {
        assert_eq!(majority_symbol(b"AAC".iter().copied()), b'A');
        assert_eq!(majority_symbol(b"TGGT".iter().copied()), b'G');
        assert_eq!(majority_symbol(b"tT".iter().copied()), b'T');
    }

    #[test]
    fn test_basic_merge_consensus() {
        let registry = SequenceRegistry::from_named_records([("1", "AAAACCCC"), ("2", "AAAACCCC")]).unwrap();
        let mut graph = registry.build_graph().unwrap();
        graph.apply_pinch(&Pinch::new(1, 0, 2, 0, 8, Strand::Forward)).unwrap();
        let path: Vec<BlockIndex> = graph.blocks().collect();
        assert_eq!(build_consensus(&graph, &registry, &path).unwrap(), b"AAAACCCC".to_vec());
    }

    #[test]
    fn test_multi_block_path() {
        // lane 3 only aligns to the tail, so the head block votes 2-way and the tail 3-way
        let registry = SequenceRegistry::from_named_records([
            ("1", "GGTTACGA"),
            ("2", "GCTTACCA"),
            ("3", "ACGT")
        ]).unwrap();
        let mut graph = registry.build_graph().unwrap();
        graph.apply_pinches([
            Pinch::new(1, 0, 2, 0, 8, Strand::Forward),
            Pinch::new(1, 4, 3, 0, 4, Strand::Forward)
        ]).unwrap();

        let path: Vec<BlockIndex> = graph.lane_segments(1).unwrap().iter().map(|s| s.block).collect();
        assert_eq!(path.len(), 2);
        let consensus = build_consensus(&graph, &registry, &path).unwrap();
        assert_eq!(consensus.len(), 8);
        // head: G/G, C/G -> C, T/T, T/T; tail: A/A/A, C/C/C, C/G/G -> G, A/A/T -> A
        assert_eq!(consensus, b"GCTTACGA".to_vec());
    }

    #[test]
    fn test_fasta_output() {
        let consensuses = vec![
            RepeatConsensus::new(0, b"ACGT".to_vec(), 1200, vec![1, 2, 3]),
            RepeatConsensus::new(1, b"TT".to_vec(), 8, vec![4])
        ];
        assert_eq!(consensuses[0].fasta_header("rep"), ">rep_consensus_0 length=4 score=1200");

        let mut buffer: Vec<u8> = vec![];
        write_fasta(&consensuses, "", &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            ">_consensus_0 length=4 score=1200\nACGT\n>_consensus_1 length=2 score=8\nTT\n"
        );
    }
}

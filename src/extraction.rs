/*!
This module provides the ConsensusExtractor, which repeatedly pulls consensus repeats out of a finalized alignment graph.

Each pass picks the heaviest block that still has unseen lanes, runs the heaviest-path search over those lanes,
marks them seen, and accepts the resulting consensus if its score per base reaches the configured degree.
Extraction stops when no block has an unseen lane, or right after accepting a consensus that scores below the minimum score.

# Example usage
```rust
use pinch_con::extraction::extract_consensuses;
use pinch_con::extraction_config::ExtractionConfigBuilder;
use pinch_con::pinch::PinchReader;
use pinch_con::sequence_registry::SequenceRegistry;

let registry = SequenceRegistry::from_named_records([
    ("1", "TTGACCA"),
    ("2", "TTGACCA"),
    ("3", "TTGTCCA"),
    ("4", "GG")
]).unwrap();
let pinches = PinchReader::new("1 0 2 0 7 1\n2 0 3 0 7 1\n".as_bytes());
let config = ExtractionConfigBuilder::default()
    .min_consensus_score(10)
    .build()
    .unwrap();

let consensuses = extract_consensuses(&registry, pinches, &config).unwrap();
assert_eq!(consensuses.len(), 1);
assert_eq!(consensuses[0].sequence(), b"TTGACCA");
assert_eq!(consensuses[0].score(), 21);
```
*/

use log::debug;
use rustc_hash::FxHashSet as HashSet;
use std::io::Write;

use crate::block_order::BlockOrder;
use crate::consensus::{build_consensus, write_fasta, RepeatConsensus};
use crate::extraction_config::ExtractionConfig;
use crate::heaviest_path::{find_heaviest_path, HeaviestPath};
use crate::pinch::Pinch;
use crate::pinch_graph::{BlockIndex, PinchGraph};
use crate::sequence_registry::{LaneId, SequenceRegistry};

/// Lanes already claimed by an extraction pass; only ever grows
pub type SeenLanes = HashSet<LaneId>;

/// Outcome of one extraction pass
#[derive(Clone, Debug, PartialEq)]
pub enum ExtractionStep {
    /// The path passed the degree filter
    Accepted {
        path: HeaviestPath,
        sequence: Vec<u8>,
        /// Lanes claimed by this pass, sorted
        lanes: Vec<LaneId>
    },
    /// The path failed the degree filter, its lanes are still claimed
    Rejected {
        path: HeaviestPath,
        consensus_degree: f64,
        lanes: Vec<LaneId>
    },
    /// No block has an unseen lane left
    Done
}

/// Drives consensus extraction over a finalized graph
#[derive(Debug)]
pub struct ConsensusExtractor<'a> {
    graph: &'a PinchGraph,
    registry: &'a SequenceRegistry,
    order: BlockOrder,
    config: ExtractionConfig
}

impl<'a> ConsensusExtractor<'a> {
    /// Creates a new extractor and computes the block order.
    /// # Arguments
    /// * `graph` - the graph after every pinch has been applied
    /// * `registry` - the sequences backing the graph lanes
    /// * `config` - extraction parameters
    /// # Errors
    /// * if the config is invalid
    /// * if the graph has no consistent block order
    pub fn new(graph: &'a PinchGraph, registry: &'a SequenceRegistry, config: ExtractionConfig) -> Result<ConsensusExtractor<'a>, Box<dyn std::error::Error>> {
        config.validate()?;
        let order = BlockOrder::compute(graph)?;
        Ok(ConsensusExtractor {
            graph,
            registry,
            order,
            config
        })
    }

    /// Picks the block with the largest `unseen lanes * length`, first in block enumeration order on ties.
    /// Returns None if no block has positive weight.
    pub fn select_start_block(&self, seen: &SeenLanes) -> Option<BlockIndex> {
        let mut start_block = None;
        let mut highest_weight = 0;
        for block in self.graph.blocks() {
            let unseen = self.graph.block_lanes(block)
                .filter(|lane| !seen.contains(lane))
                .count();
            let weight = unseen * self.graph.block_length(block);
            if weight > highest_weight {
                highest_weight = weight;
                start_block = Some(block);
            }
        }
        start_block
    }

    /// Runs one selection, extraction, and filtering pass.
    /// Every candidate lane is added to `seen` before filtering, so a rejected path is never reconsidered.
    /// # Errors
    /// * if the consensus cannot be built from the registry
    pub fn extract_next(&self, seen: &mut SeenLanes) -> Result<ExtractionStep, Box<dyn std::error::Error>> {
        let Some(start_block) = self.select_start_block(seen) else {
            return Ok(ExtractionStep::Done);
        };

        let candidates: HashSet<LaneId> = self.graph.block_lanes(start_block)
            .filter(|lane| !seen.contains(lane))
            .collect();
        let path = find_heaviest_path(self.graph, &self.order, self.config.gap_penalty, &candidates);

        seen.extend(candidates.iter().copied());
        let mut lanes: Vec<LaneId> = candidates.into_iter().collect();
        lanes.sort_unstable();

        let sequence = build_consensus(self.graph, self.registry, &path.blocks)?;
        let consensus_degree = if sequence.is_empty() {
            0.0
        } else {
            path.score as f64 / sequence.len() as f64
        };

        if consensus_degree < self.config.min_consensus_degree {
            debug!("Rejected path of {} blocks over {} lanes: score {}, degree {:.3}", path.blocks.len(), lanes.len(), path.score, consensus_degree);
            Ok(ExtractionStep::Rejected {
                path,
                consensus_degree,
                lanes
            })
        } else {
            debug!("Accepted path of {} blocks over {} lanes: score {}, degree {:.3}", path.blocks.len(), lanes.len(), path.score, consensus_degree);
            Ok(ExtractionStep::Accepted {
                path,
                sequence,
                lanes
            })
        }
    }

    /// Runs passes until done, returning accepted consensuses in extraction order.
    /// # Errors
    /// * if any pass fails
    pub fn extract_all(&self) -> Result<Vec<RepeatConsensus>, Box<dyn std::error::Error>> {
        let mut seen = SeenLanes::default();
        let mut consensuses: Vec<RepeatConsensus> = vec![];
        let mut rejected: usize = 0;

        loop {
            match self.extract_next(&mut seen)? {
                ExtractionStep::Done => break,
                ExtractionStep::Rejected { .. } => rejected += 1,
                ExtractionStep::Accepted { path, sequence, lanes } => {
                    let score = path.score;
                    consensuses.push(RepeatConsensus::new(consensuses.len(), sequence, score, lanes));
                    if score < self.config.min_consensus_score {
                        debug!("Score {score} is below {}, stopping", self.config.min_consensus_score);
                        break;
                    }
                }
            };
        }

        debug!("accepted: {}", consensuses.len());
        debug!("rejected: {rejected}");
        debug!("lanes_seen: {} / {}", seen.len(), self.graph.lane_count());
        Ok(consensuses)
    }

    /// Writes consensuses as FASTA, naming them with the configured prefix.
    /// # Errors
    /// * if the writer fails
    pub fn write_fasta<W: Write>(&self, consensuses: &[RepeatConsensus], writer: &mut W) -> std::io::Result<()> {
        write_fasta(consensuses, &self.config.name_prefix, writer)
    }

    // getters
    pub fn order(&self) -> &BlockOrder {
        &self.order
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }
}

/// Builds the graph for `registry`, applies every pinch, and extracts all consensuses.
/// # Errors
/// * if a pinch references an unknown lane or is out of bounds
/// * if the resulting graph has no consistent block order
pub fn extract_consensuses<I: IntoIterator<Item = Pinch>>(registry: &SequenceRegistry, pinches: I, config: &ExtractionConfig) -> Result<Vec<RepeatConsensus>, Box<dyn std::error::Error>> {
    let mut graph = registry.build_graph()?;
    graph.apply_pinches(pinches)?;
    debug!("Graph has {} blocks", graph.total_block_count());
    let extractor = ConsensusExtractor::new(&graph, registry, config.clone())?;
    extractor.extract_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    use crate::errors::PinchConError;
    use crate::example_gen::generate_repeat_family;
    use crate::extraction_config::ExtractionConfigBuilder;
    use crate::pinch::{PinchReader, Strand};

    fn low_threshold_config(min_consensus_degree: f64) -> ExtractionConfig {
        ExtractionConfigBuilder::default()
            .min_consensus_score(1)
            .min_consensus_degree(min_consensus_degree)
            .build().unwrap()
    }

    /// lanes 1 and 2 share one degree-2 block, lanes 3, 4, 5 share one degree-3 block
    fn two_family_setup() -> (SequenceRegistry, PinchGraph) {
        let registry = SequenceRegistry::from_named_records([
            ("1", "AAAACCCC"),
            ("2", "AAAACCCC"),
            ("3", "GGGG"),
            ("4", "GGGG"),
            ("5", "GGGG")
        ]).unwrap();
        let mut graph = registry.build_graph().unwrap();
        graph.apply_pinches([
            Pinch::new(1, 0, 2, 0, 8, Strand::Forward),
            Pinch::new(3, 0, 4, 0, 4, Strand::Forward),
            Pinch::new(5, 0, 4, 0, 4, Strand::Forward)
        ]).unwrap();
        (registry, graph)
    }

    #[test]
    fn test_basic_accept() {
        let registry = SequenceRegistry::from_named_records([("1", "AAAACCCC"), ("2", "AAAACCCC")]).unwrap();
        let config = ExtractionConfigBuilder::default()
            .min_consensus_degree(2.0)
            .build().unwrap();
        let consensuses = extract_consensuses(&registry, [Pinch::new(1, 0, 2, 0, 8, Strand::Forward)], &config).unwrap();
        assert_eq!(consensuses, vec![RepeatConsensus::new(0, b"AAAACCCC".to_vec(), 16, vec![1, 2])]);
    }

    #[test]
    fn test_degree_filter_rejection() {
        let (registry, graph) = two_family_setup();
        let extractor = ConsensusExtractor::new(&graph, &registry, ExtractionConfig::default()).unwrap();
        let mut seen = SeenLanes::default();

        // the degree-2 block is heaviest (16 vs 12) but fails the 3.0 degree filter
        match extractor.extract_next(&mut seen).unwrap() {
            ExtractionStep::Rejected { path, consensus_degree, lanes } => {
                assert_eq!(path.score, 16);
                assert_eq!(consensus_degree, 2.0);
                assert_eq!(lanes, vec![1, 2]);
            },
            step => panic!("expected rejection, got {step:?}")
        };
        assert_eq!(seen, [1, 2].into_iter().collect());

        // lanes 1 and 2 are never picked again
        match extractor.extract_next(&mut seen).unwrap() {
            ExtractionStep::Accepted { path, sequence, lanes } => {
                assert_eq!(path.score, 12);
                assert_eq!(sequence, b"GGGG".to_vec());
                assert_eq!(lanes, vec![3, 4, 5]);
            },
            step => panic!("expected acceptance, got {step:?}")
        };
        assert_eq!(extractor.extract_next(&mut seen).unwrap(), ExtractionStep::Done);

        // the full loop only reports the accepted one, and numbers it 0
        let consensuses = extractor.extract_all().unwrap();
        assert_eq!(consensuses, vec![RepeatConsensus::new(0, b"GGGG".to_vec(), 12, vec![3, 4, 5])]);
    }

    #[test]
    fn test_stops_below_min_score() {
        let (registry, graph) = two_family_setup();

        // both accepted with a low degree, but a score of 16 is below 100 so only the first is emitted
        let config = ExtractionConfigBuilder::default()
            .min_consensus_score(100)
            .min_consensus_degree(1.0)
            .build().unwrap();
        let extractor = ConsensusExtractor::new(&graph, &registry, config).unwrap();
        let consensuses = extractor.extract_all().unwrap();
        assert_eq!(consensuses.len(), 1);
        assert_eq!(consensuses[0].sequence(), b"AAAACCCC");

        // with a low score bar, both come out in weight order
        let extractor = ConsensusExtractor::new(&graph, &registry, low_threshold_config(1.0)).unwrap();
        let consensuses = extractor.extract_all().unwrap();
        let indexed: Vec<(usize, i64)> = consensuses.iter().map(|c| (c.index(), c.score())).collect();
        assert_eq!(indexed, vec![(0, 16), (1, 12)]);
    }

    #[test]
    fn test_seen_lanes_monotonic() {
        let (_consensus, records, pinches) = generate_repeat_family(4, 60, 8, 20, 0.02, 3);
        let registry = SequenceRegistry::from_named_records(records).unwrap();
        let mut graph = registry.build_graph().unwrap();
        graph.apply_pinches(pinches).unwrap();
        let extractor = ConsensusExtractor::new(&graph, &registry, low_threshold_config(0.0)).unwrap();

        let mut seen = SeenLanes::default();
        let mut passes = 0;
        loop {
            let before = seen.clone();
            let step = extractor.extract_next(&mut seen).unwrap();
            if step == ExtractionStep::Done {
                assert_eq!(seen, before);
                break;
            }
            passes += 1;
            assert!(seen.is_superset(&before));
            assert!(seen.len() > before.len());
        }
        assert!(passes <= graph.lane_count());
        assert_eq!(seen.len(), graph.lane_count());
    }

    #[test]
    fn test_fasta_uses_configured_prefix() {
        let (registry, graph) = two_family_setup();
        let config = ExtractionConfigBuilder::default()
            .min_consensus_score(1)
            .min_consensus_degree(1.0)
            .name_prefix("ltr".to_string())
            .build().unwrap();
        let extractor = ConsensusExtractor::new(&graph, &registry, config).unwrap();
        let consensuses = extractor.extract_all().unwrap();

        let mut buffer: Vec<u8> = vec![];
        extractor.write_fasta(&consensuses, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            ">ltr_consensus_0 length=8 score=16\nAAAACCCC\n>ltr_consensus_1 length=4 score=12\nGGGG\n"
        );
    }

    #[test]
    fn test_recovers_generated_repeat() {
        let (consensus, records, pinches) = generate_repeat_family(4, 200, 10, 0, 0.02, 7);
        let registry = SequenceRegistry::from_named_records(records).unwrap();
        let consensuses = extract_consensuses(&registry, pinches, &ExtractionConfig::default()).unwrap();
        assert_eq!(consensuses.len(), 1);
        assert_eq!(consensuses[0].sequence(), consensus.as_slice());
        assert_eq!(consensuses[0].score(), 2000);
    }

    #[test]
    fn test_flanked_repeat_contains_consensus() {
        let (consensus, records, pinches) = generate_repeat_family(4, 200, 10, 50, 0.02, 11);
        let registry = SequenceRegistry::from_named_records(records).unwrap();
        let consensuses = extract_consensuses(&registry, pinches, &ExtractionConfig::default()).unwrap();
        assert!(!consensuses.is_empty());
        assert!(consensuses[0].sequence().windows(consensus.len()).any(|w| w == consensus.as_slice()));
    }

    #[test]
    fn test_reproducible() {
        let render = || {
            let (_consensus, records, pinches) = generate_repeat_family(4, 120, 12, 30, 0.05, 5);
            let registry = SequenceRegistry::from_named_records(records).unwrap();
            let consensuses = extract_consensuses(&registry, pinches, &low_threshold_config(1.0)).unwrap();
            let mut buffer: Vec<u8> = vec![];
            write_fasta(&consensuses, "rep", &mut buffer).unwrap();
            buffer
        };
        let first = render();
        assert!(!first.is_empty());
        assert_eq!(first, render());
    }

    #[test]
    fn test_cycle_is_fatal() {
        let registry = SequenceRegistry::from_named_records([("1", "ACGTTGCA"), ("2", "TGCAACGT")]).unwrap();
        let pinches = [
            Pinch::new(1, 0, 2, 4, 4, Strand::Forward),
            Pinch::new(1, 4, 2, 0, 4, Strand::Forward)
        ];
        let error = extract_consensuses(&registry, pinches, &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(error.downcast_ref::<PinchConError>(), Some(PinchConError::InconsistentAlignment { .. })));
    }

    #[derive(Debug, serde::Deserialize)]
    struct LaneRecord {
        lane: String,
        sequence: String
    }

    #[derive(Debug, serde::Deserialize)]
    struct ExpectedRecord {
        index: usize,
        length: usize,
        score: i64,
        sequence: String
    }

    /// Loads a lane csv (columns "lane", "sequence") into a registry.
    fn load_lane_csv(filename: &Path) -> SequenceRegistry {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(filename)
            .unwrap();
        let records: Vec<(String, String)> = csv_reader.deserialize()
            .map(|row| {
                let record: LaneRecord = row.unwrap();
                (record.lane, record.sequence)
            })
            .collect();
        SequenceRegistry::from_named_records(records).unwrap()
    }

    /// Loads expected output (columns "index", "length", "score", "sequence").
    fn load_expected_csv(filename: &Path) -> Vec<RepeatConsensus> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(filename)
            .unwrap();
        csv_reader.deserialize()
            .map(|row| {
                let record: ExpectedRecord = row.unwrap();
                assert_eq!(record.length, record.sequence.len());
                (record.index, record.sequence.into_bytes(), record.score)
            })
            .map(|(index, sequence, score)| RepeatConsensus::new(index, sequence, score, vec![]))
            .collect()
    }

    /// Wrapper that runs a lane/pinch fixture and compares to the expected csv.
    fn run_test_files(lane_file: &str, pinch_file: &str, expected_file: &str, config: ExtractionConfig) {
        let registry = load_lane_csv(Path::new(lane_file));
        let pinch_text = std::fs::read_to_string(pinch_file).unwrap();
        let mut reader = PinchReader::new(pinch_text.as_bytes());
        let mut graph = registry.build_graph().unwrap();
        graph.apply_pinches(reader.by_ref()).unwrap();
        graph.validate().unwrap();
        assert_eq!(reader.skipped(), 1);

        let extractor = ConsensusExtractor::new(&graph, &registry, config).unwrap();
        let consensuses = extractor.extract_all().unwrap();
        let expected = load_expected_csv(Path::new(expected_file));

        // lanes are not in the expected file
        assert_eq!(consensuses.len(), expected.len());
        for (result, expected) in consensuses.iter().zip(expected.iter()) {
            assert_eq!(result.index(), expected.index());
            assert_eq!(result.sequence(), expected.sequence());
            assert_eq!(result.score(), expected.score());
        }
    }

    #[test]
    fn test_csv_two_families_001() {
        run_test_files(
            "./tests/lanes_001.csv",
            "./tests/pinches_001.txt",
            "./tests/expected_001.csv",
            ExtractionConfigBuilder::default()
                .min_consensus_score(10)
                .build().unwrap()
        );
    }
}

/*!
# pinch_con
This library derives consensus repeat sequences from pairwise alignments between many sequences.
Pairwise matches ("pinches") are merged into a shared alignment graph of blocks, the blocks are put in a consistent order,
and consensus sequences are extracted one at a time from the heaviest chains of blocks whose lanes have not been claimed yet.

Key benefits:
* Transitive merging: if A aligns to B and B aligns to C, all three land in one block
* Deterministic: the same sequences and pinches always give the same consensuses
* No reference or backbone sequence is needed

Performance notes:
* Pinch application is cheapest when most pinches touch few existing blocks
* Each extraction pass is linear in the total number of segments

# Example usage
```rust
use pinch_con::extraction::extract_consensuses;
use pinch_con::extraction_config::ExtractionConfigBuilder;
use pinch_con::pinch::{Pinch, Strand};
use pinch_con::sequence_registry::SequenceRegistry;

let registry = SequenceRegistry::from_named_records([
    ("1", "AAAACCCC"),
    ("2", "AAAACCCC"),
    ("3", "AAATCCCC")
]).unwrap();
let pinches = [
    Pinch::new(1, 0, 2, 0, 8, Strand::Forward),
    Pinch::new(2, 0, 3, 0, 8, Strand::Forward)
];
let config = ExtractionConfigBuilder::default()
    .min_consensus_score(10)
    .build()
    .unwrap();

let consensuses = extract_consensuses(&registry, pinches, &config).unwrap();
assert_eq!(consensuses.len(), 1);
assert_eq!(consensuses[0].sequence(), b"AAAACCCC");
assert_eq!(consensuses[0].score(), 24);
assert_eq!(consensuses[0].fasta_header("rep"), ">rep_consensus_0 length=8 score=24");
```
*/

/// Linear ordering of blocks that agrees with every lane
pub mod block_order;
/// Majority-vote consensus building and the consensus output record
pub mod consensus;
/// Error types for graph construction and ordering
pub mod errors;
/// Utility for generating examples
pub mod example_gen;
/// The extraction loop that turns a finalized graph into consensus repeats
pub mod extraction;
/// Configuration for extraction and insertion scanning
pub mod extraction_config;
/// Genome tree traversal and insertion scanning
pub mod genome_tree;
/// Graphviz debug output for the alignment graph
pub mod graph_dot;
/// Maximum-weight block chain search
pub mod heaviest_path;
/// Pairwise match records and their text reader
pub mod pinch;
/// The alignment graph of lanes, segments, and blocks
pub mod pinch_graph;
/// Sequence storage keyed by lane id
pub mod sequence_registry;

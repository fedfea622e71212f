/*!
Pulls candidate insertion sequences out of a tree of genomes.
A top segment with no parent in its ancestor genome is an insertion; those are the sequences that typically get pinched and fed into consensus extraction.

# Example usage
```rust
use pinch_con::extraction_config::InsertionConfig;
use pinch_con::genome_tree::{insertions_by_genome, Genome, TopSegment};

let root = Genome::new("anc", vec![], vec![
    Genome::new("human", vec![
        TopSegment::new(b"ACGT".to_vec(), true),
        TopSegment::new(b"GGGGGG".to_vec(), false),
    ], vec![])
]);
let config = InsertionConfig { min_insertion_size: 3, insertion_join_distance: 0 };
let insertions = insertions_by_genome(&root, &config);
assert_eq!(insertions, vec![("human".to_string(), b"GGGGGG".to_vec())]);
```
*/

use log::debug;

use crate::extraction_config::InsertionConfig;

/// A segment of a genome, aligned or not to its parent genome
#[derive(Clone, Debug, PartialEq)]
pub struct TopSegment {
    sequence: Vec<u8>,
    has_parent: bool
}

impl TopSegment {
    pub fn new(sequence: Vec<u8>, has_parent: bool) -> TopSegment {
        TopSegment {
            sequence,
            has_parent
        }
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn has_parent(&self) -> bool {
        self.has_parent
    }
}

/// A node of the genome tree
pub trait GenomeNode: Sized {
    fn name(&self) -> &str;
    fn children(&self) -> &[Self];
    /// Top segments in left-to-right order
    fn top_segments(&self) -> &[TopSegment];
}

/// Simple owned genome tree
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Genome {
    name: String,
    top_segments: Vec<TopSegment>,
    children: Vec<Genome>
}

impl Genome {
    pub fn new(name: &str, top_segments: Vec<TopSegment>, children: Vec<Genome>) -> Genome {
        Genome {
            name: name.to_string(),
            top_segments,
            children
        }
    }
}

impl GenomeNode for Genome {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[Genome] {
        &self.children
    }

    fn top_segments(&self) -> &[TopSegment] {
        &self.top_segments
    }
}

/// Stack-based pre-order walk; children are pushed in order, so the last child is visited first.
pub struct GenomeIterator<'a, N: GenomeNode> {
    stack: Vec<&'a N>
}

impl<'a, N: GenomeNode> GenomeIterator<'a, N> {
    pub fn new(root: &'a N) -> GenomeIterator<'a, N> {
        GenomeIterator {
            stack: vec![root]
        }
    }
}

impl<'a, N: GenomeNode> Iterator for GenomeIterator<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<&'a N> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter());
        Some(node)
    }
}

/// Scans one genome's top segments for insertions
pub struct InsertionScanner<'a> {
    segments: &'a [TopSegment],
    position: usize,
    config: InsertionConfig
}

impl<'a> InsertionScanner<'a> {
    pub fn new(segments: &'a [TopSegment], config: InsertionConfig) -> InsertionScanner<'a> {
        InsertionScanner {
            segments,
            position: 0,
            config
        }
    }

    /// Extends a parentless segment at `position` across short parented gaps into later parentless segments.
    /// Returns the joined pieces; parented pieces trailing the last parentless one are left out.
    fn join_from(&mut self) -> Vec<&'a [u8]> {
        let segments = self.segments;
        let join_distance = self.config.insertion_join_distance;
        let mut pieces: Vec<&'a [u8]> = vec![segments[self.position].sequence()];
        let mut pending: Vec<&'a [u8]> = vec![];
        let mut gap_length = 0;
        self.position += 1;

        while let Some(segment) = segments.get(self.position) {
            if !segment.has_parent() {
                pieces.append(&mut pending);
                pieces.push(segment.sequence());
                gap_length = 0;
            } else if gap_length + segment.sequence().len() < join_distance {
                gap_length += segment.sequence().len();
                pending.push(segment.sequence());
            } else {
                break;
            }
            self.position += 1;
        }
        pieces
    }
}

impl<'a> Iterator for InsertionScanner<'a> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let segments = self.segments;
        while let Some(segment) = segments.get(self.position) {
            if segment.has_parent() {
                self.position += 1;
                continue;
            }

            let insertion: Vec<u8> = if self.config.insertion_join_distance > 0 {
                let pieces = self.join_from();
                if pieces.len() > 1 {
                    debug!("Joining {} segments to form an insertion", pieces.len());
                }
                pieces.concat()
            } else {
                self.position += 1;
                segment.sequence().to_vec()
            };

            if insertion.len() > self.config.min_insertion_size {
                return Some(insertion);
            }
        }
        None
    }
}

/// Collects every insertion in the tree as (genome name, insertion), in traversal order.
pub fn insertions_by_genome<N: GenomeNode>(root: &N, config: &InsertionConfig) -> Vec<(String, Vec<u8>)> {
    GenomeIterator::new(root)
        .flat_map(|genome| {
            InsertionScanner::new(genome.top_segments(), config.clone())
                .map(move |insertion| (genome.name().to_string(), insertion))
        })
        .collect()
}

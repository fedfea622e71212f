/*!
Pairwise match records ("pinches") and a lazy reader for them.

The text format is one record per line with six whitespace separated fields:
```text
# laneA posA laneB posB length strand
1 0 2 0 120 1
```
A strand of `1` is a forward match, `0` is a reverse-complement match.

# Example usage
```rust
use pinch_con::pinch::{Pinch, PinchReader, Strand};

let text = "1 0 2 4 10 1\nnot a record\n3 5 1 0 8 0\n";
let mut reader = PinchReader::new(text.as_bytes());
let pinches: Vec<Pinch> = reader.by_ref().collect();
assert_eq!(pinches, vec![
    Pinch::new(1, 0, 2, 4, 10, Strand::Forward),
    Pinch::new(3, 5, 1, 0, 8, Strand::Reverse)
]);
assert_eq!(reader.skipped(), 1);
```
*/

use log::warn;
use std::io::BufRead;

use crate::sequence_registry::LaneId;

/// Orientation of the second window relative to the first
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Strand {
    Forward,
    /// Reverse-complement match, never merged into blocks
    Reverse
}

/// A single pairwise match asserting two equal-length windows are aligned
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Pinch {
    pub lane_a: LaneId,
    pub start_a: usize,
    pub lane_b: LaneId,
    pub start_b: usize,
    pub length: usize,
    pub strand: Strand
}

impl Pinch {
    /// Constructor
    pub fn new(lane_a: LaneId, start_a: usize, lane_b: LaneId, start_b: usize, length: usize, strand: Strand) -> Pinch {
        Pinch {
            lane_a,
            start_a,
            lane_b,
            start_b,
            length,
            strand
        }
    }

    /// Parses one record line, returns None if any field is missing or malformed.
    pub fn parse_line(line: &str) -> Option<Pinch> {
        let mut fields = line.split_whitespace();
        let lane_a = fields.next()?.parse().ok()?;
        let start_a = fields.next()?.parse().ok()?;
        let lane_b = fields.next()?.parse().ok()?;
        let start_b = fields.next()?.parse().ok()?;
        let length = fields.next()?.parse().ok()?;
        let strand = match fields.next()? {
            "1" => Strand::Forward,
            "0" => Strand::Reverse,
            _ => return None
        };
        if fields.next().is_some() {
            return None;
        }
        Some(Pinch::new(lane_a, start_a, lane_b, start_b, length, strand))
    }
}

/// Pull-based reader that yields pinches one line at a time, skipping malformed lines.
/// To restart the stream, construct a new reader over the original source.
pub struct PinchReader<R: BufRead> {
    reader: R,
    line_buffer: String,
    line_number: usize,
    skipped: usize
}

impl<R: BufRead> PinchReader<R> {
    pub fn new(reader: R) -> PinchReader<R> {
        PinchReader {
            reader,
            line_buffer: String::new(),
            line_number: 0,
            skipped: 0
        }
    }

    /// Number of malformed lines skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for PinchReader<R> {
    type Item = Pinch;

    fn next(&mut self) -> Option<Pinch> {
        loop {
            self.line_buffer.clear();
            match self.reader.read_line(&mut self.line_buffer) {
                Ok(0) => return None,
                Ok(_) => {},
                Err(e) => {
                    warn!("Stopped reading pinches after line {}: {e}", self.line_number);
                    return None;
                }
            };
            self.line_number += 1;

            let line = self.line_buffer.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match Pinch::parse_line(line) {
                Some(pinch) => return Some(pinch),
                None => {
                    warn!("Skipping malformed pinch record on line {}: {line:?}", self.line_number);
                    self.skipped += 1;
                }
            }
        }
    }
}

/*!
Graphviz snapshot of an alignment graph, for eyeballing block structure.
One node per block labeled with its length and degree, and one edge per adjacent segment pair on each lane, labeled with the lane id.
*/

use itertools::Itertools;
use std::io::Write;

use crate::pinch_graph::PinchGraph;

/// Writes the graph in DOT format.
/// # Arguments
/// * `graph` - the graph to render
/// * `writer` - destination for the DOT text
/// # Errors
/// * if the writer fails
pub fn write_dot<W: Write>(graph: &PinchGraph, writer: &mut W) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(writer, "digraph pinch_graph {{")?;
    for block in graph.blocks() {
        writeln!(writer, "\tb{block} [label=\"len={} deg={}\"];", graph.block_length(block), graph.block_degree(block))?;
    }
    for lane_id in graph.lane_ids() {
        for (prev, next) in graph.lane_segments(lane_id)?.iter().tuple_windows() {
            writeln!(writer, "\tb{} -> b{} [label=\"{lane_id}\"];", prev.block, next.block)?;
        }
    }
    writeln!(writer, "}}")?;
    Ok(())
}

//! Behavioral model of a reduction tree
//!
//! Folds the inputs level by level with [`Operation::evaluate`], tracking the
//! width each stage would have, so the result is bit-exact with the pipeline.

use redtree_gen::Operation;

/// Per-stage values of a reduction, first entry being the inputs
pub fn reduce_levels(op: Operation, input_width: usize, inputs: &[i64]) -> Vec<Vec<i64>> {
    let mut levels = vec![inputs.to_vec()];
    let mut width = input_width;

    while levels[levels.len() - 1].len() > 1 {
        let current = &levels[levels.len() - 1];
        let next = current
            .chunks(2)
            .map(|pair| op.evaluate(pair[0], pair.get(1).copied().unwrap_or(0), width))
            .collect();
        width = op.output_width(width).unwrap_or(width);
        levels.push(next);
    }

    levels
}

/// Final output of reducing `inputs` through a tree of `op`
pub fn reference_reduce(op: Operation, input_width: usize, inputs: &[i64]) -> i64 {
    reduce_levels(op, input_width, inputs)
        .last()
        .and_then(|level| level.first().copied())
        .unwrap_or(0)
}

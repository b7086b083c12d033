//! redtree - pipelined binary-tree reduction generator
//!
//! Builds `2^N`-input reduction trees (sum, min, max; signed or unsigned) as
//! chains of clocked stages and emits them as a validated structural design.
//!
//! ```rust
//! use redtree::{Operation, Tree};
//!
//! let tree = Tree::new(Operation::AddUnsigned, 4, 2, false, false).unwrap();
//! assert_eq!(tree.output_width(), 6);
//! assert_eq!(tree.latency(), 2);
//! let design = tree.elaborate().unwrap();
//! assert_eq!(design.modules.len(), 3);
//! ```

pub use redtree_gen::{
    config, input_name, output_name, Combiner, Operation, PortDescriptor, Stage, Tree,
    TreeBuilder, TreeConfig, TreeError, CLOCK_ENABLE, TREE_OUTPUT,
};
pub use redtree_ir as ir;
pub use redtree_sim as sim;

use anyhow::{Context, Result};
use redtree_ir::Design;
use std::path::Path;
use tracing::info;

/// A tree together with its elaborated design
#[derive(Debug, Clone)]
pub struct Elaboration {
    pub tree: Tree,
    pub design: Design,
}

impl Elaboration {
    /// Backend-facing text summary of the design
    pub fn summary(&self) -> String {
        redtree_ir::render_summary(&self.design)
    }
}

/// Build and elaborate a tree from parsed configuration
pub fn elaborate_config(config: &TreeConfig) -> Result<Elaboration> {
    let tree = Tree::from_config(config)
        .with_context(|| format!("failed to build {} tree", config.operation))?;
    let design = tree
        .elaborate()
        .with_context(|| format!("failed to elaborate {}", tree.name()))?;
    Ok(Elaboration { tree, design })
}

/// Load a TOML tree configuration and elaborate it
pub fn elaborate_file(path: impl AsRef<Path>) -> Result<Elaboration> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading tree configuration");
    let config = config::from_path(path)
        .with_context(|| format!("failed to read tree configuration {}", path.display()))?;
    elaborate_config(&config)
}

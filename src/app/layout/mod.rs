mod spacing;
mod tree;

pub(in crate::app) use spacing::HeuristicSpacing;
pub(in crate::app) use tree::TreeLayoutEngine;

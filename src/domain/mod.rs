// Declaration model and the pure tree operations: locate, synthesize, merge.

pub mod declaration;
pub mod fragment;
pub mod locator;
pub mod merger;
pub mod synthesizer;
pub mod tree;

// Infrastructure implementations of the ports: filesystem, syn, prettyplease.

pub mod printer;
pub mod source_store;
pub mod syn_parser;

pub use printer::PrettyPrinter;
pub use source_store::{FsSourceStore, MemorySourceStore};
pub use syn_parser::SynTreeParser;

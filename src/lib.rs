pub mod allowlist;
pub mod error;
pub mod graph;
pub mod output;
pub mod parser;

//! numeralbank: phylogeny pruning and display metadata for the Numeralbank dataset
//!
//! Layers:
//! - `domain`: tree arena, Newick codec, pruning, dataset entities
//! - `application`: dataset loading and phylogeny display services
//! - `infrastructure`: filesystem boundary and service wiring
//! - `cli`: argument parsing, dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

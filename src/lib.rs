// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # reefer-twin
//!
//! A knowledge-graph digital twin of a ship refrigeration plant. Engineering
//! facts extracted from the plant manual become a directed graph, and free-text
//! questions are routed onto structural graph queries.
//!
//! ## Architecture
//!
//! - **Facts** (`fact`): two-stage loader for noisy extractor output
//! - **Graph** (`graph`): immutable petgraph model, name resolution, traversals
//! - **Routing** (`router`): ordered question rules with a remote-classifier fallback
//! - **Session** (`session`): line-oriented question loop and failure policy
//! - **Collaborator** (`llm`): blocking chat-completions client behind a trait
//! - **Config** (`config`): TOML settings, API key from the environment
//!
//! ## Library usage
//!
//! ```no_run
//! use reefer_twin::fact;
//! use reefer_twin::graph::{PlantGraph, QueryEngine};
//!
//! let facts = fact::load_file("kg/raw_facts.json".as_ref()).unwrap();
//! let graph = PlantGraph::build(&facts);
//! let queries = QueryEngine::new(&graph);
//! for influence in queries.who_affects("compressor").unwrap() {
//!     println!("{influence}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod fact;
pub mod graph;
pub mod llm;
pub mod router;
pub mod session;

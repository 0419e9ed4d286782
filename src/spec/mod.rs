//! Command grammars
//!
//! - `model`: the runtime grammar tree and its deferred-loader states
//! - `document`: JSON grammar documents and their conversion into the tree
//! - `generator`: grammar computed on demand, and external spec locations
//! - `resolver`: turning deferred children into concrete nodes, once

pub mod document;
pub mod generator;
pub mod model;
pub mod resolver;

pub use document::{SubcommandSpec, parse_document};
pub use generator::{
    CommandGenerator, DirectoryLocations, GeneratedSpec, LocationResolver, SpecGenerator,
    SpecLocation, SpecValue, UnsupportedLocations,
};
pub use model::{
    ArgumentSlot, CommandOption, Definition, Loader, StaticSuggestion, SubcommandNode, Template,
};
pub use resolver::{SpecResolver, normalize};

pub mod config;
pub mod diff;
pub mod forge;
pub mod frontmatter;
pub mod model;
pub mod monitor;
pub mod paths;
pub mod search;
pub mod state;
pub mod sync;

//! Interactive network topology rendering: static and force-directed
//! layouts, quadtree hit-testing, level-of-detail frame composition and a
//! pointer state machine, independent of the window that paints them.

pub mod config;
pub mod geometry;
pub mod layout;
pub mod physics;
pub mod spatial;
pub mod topology;
pub mod view;

mod quadtree;

pub use config::ViewOptions;
pub use topology::{RenderGraph, SavedLayout, TopologySnapshot};
pub use view::{GraphEvent, HighlightSelection, TopologyKey, TopologyView};

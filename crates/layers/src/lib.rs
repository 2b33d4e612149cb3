pub mod cluster;
pub mod composer;
pub mod glyphs;
pub mod layer;
pub mod query;
pub mod surface;
pub mod symbology;
pub mod toggles;

pub use composer::*;
pub use layer::*;
pub use query::*;
pub use toggles::*;
pub use surface::{Geometry, MapSurface, present_layer, present_layers};

pub mod dashboard;
pub mod epoch;
pub mod event_bus;
pub mod stats;
pub mod view;

pub use dashboard::*;
pub use epoch::*;
pub use event_bus::*;
pub use stats::*;
pub use view::*;

pub mod feed;
pub mod firms;
pub mod measurement;
pub mod station;

pub use feed::*;
pub use firms::*;
pub use measurement::*;
pub use station::*;

pub type StationCollection = FeatureCollection<StationProperties>;
pub type FirmsCollection = FeatureCollection<FirmsProperties>;

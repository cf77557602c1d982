pub mod datastream;
pub mod sensor;
pub mod series;

pub use datastream::Datastream;
pub use sensor::{Coordinates, KeyProperty, Sensor, SensorDetail};
pub use series::{NormalizedSeries, Observation};

mod handlers;
mod types;

pub use handlers::{get_sensor, list_sensors};
pub use types::{DatastreamResponse, SensorDetailResponse, SensorResponse, SensorsQuery};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{__path_get_sensor, __path_list_sensors};

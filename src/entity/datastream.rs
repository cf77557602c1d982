use serde::Serialize;
use utoipa::ToSchema;

use crate::sta::EntityId;

/// One measured quantity of a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Datastream {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    /// Empty when the server omits `unitOfMeasurement.symbol`.
    pub unit_symbol: String,
    /// Empty when the server omits `observedProperty.name`.
    pub observed_property_name: String,
}

impl Datastream {
    pub fn display_name(&self) -> String {
        if self.unit_symbol.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.unit_symbol)
        }
    }
}

// Domain layer: data model, diagram projections and ports (interfaces).

pub mod diagram;
pub mod model;
pub mod ports;

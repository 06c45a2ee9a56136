// Domain layer: core models and ports (interfaces) shared by adapters and pipelines.

pub mod model;
pub mod ports;

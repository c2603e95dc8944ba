// Domain layer: filter model, response shapes and the ports the core talks through.

pub mod filters;
pub mod model;
pub mod ports;

// Domain layer: backend payloads and the seams (config, storage, views) the screens are built on.

pub mod model;
pub mod ports;

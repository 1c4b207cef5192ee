pub mod engine;
pub mod errors;
pub mod input_systems;
pub mod instruments;
pub mod model;
pub mod profiles;
pub mod providers;
pub mod storage;

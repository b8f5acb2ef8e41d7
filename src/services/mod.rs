pub mod geo;
pub mod heartbeat;
pub mod leads;
pub mod recorder;
pub mod session;

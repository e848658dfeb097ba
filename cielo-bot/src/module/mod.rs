pub mod browser;
pub mod camera;
pub mod delivery;
pub mod report;
pub mod satellite;

pub mod bus;
pub mod dd;
pub mod disk;
pub mod trace;

pub use bus::map::DdBus;
pub use dd::DdController;

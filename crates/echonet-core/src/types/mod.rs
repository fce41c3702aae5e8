pub mod eoj;
pub mod epc;
pub mod esv;
pub mod manufacturer;
#[cfg(feature = "alloc")]
pub mod property_map;

pub use eoj::Eoj;
pub use esv::Esv;
pub use manufacturer::ManufacturerCode;
#[cfg(feature = "alloc")]
pub use property_map::PropertyMap;

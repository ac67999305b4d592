pub mod decoder;
pub mod scanner;

pub use decoder::decode_advertisement;
pub use scanner::scan_for_sensorboxes;

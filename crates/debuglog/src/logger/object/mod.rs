pub(crate) mod clock;

pub mod level;
pub use level::LoggerLevel;

pub mod order;
pub use order::FieldOrder;

pub mod timezone;
pub use timezone::{LoggerTimeZone, init_local_offset};

pub mod rotate;
pub use rotate::{RotatingFile, RotatingFileWriter};

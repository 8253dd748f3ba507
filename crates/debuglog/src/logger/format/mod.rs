pub(crate) mod fields;
pub mod text;

pub(crate) use fields::SpanFieldsLayer;
pub use text::TextFormat;

mod attribute;
mod types;

pub use attribute::Attribute;
pub use types::{AttributeType, ValueKind};

mod metadata;
mod template;
mod value;

pub use metadata::Metadata;
pub use template::Template;
pub use value::Value;

//! PMD: a prompt templating engine.
//!
//! A PMD template is a text file with an optional `@key: value` metadata
//! block, followed by a body of literal text, `{{ variable }}`
//! interpolations, `{% if %}` conditionals, `{% for %}` loops,
//! `{% include "path" %}` directives and `{# comments #}`.
//!
//! ```
//! use pmd::{Engine, context};
//!
//! let engine = Engine::new();
//! let template = engine
//!     .parse_str("@model: small\n\n{% if urgent %}URGENT: {% endif %}{{ task }}", "t.pmd")
//!     .unwrap();
//! assert_eq!(template.metadata().get("model"), Some("small"));
//!
//! let output = engine
//!     .render(&template, &context! { "urgent" => true, "task" => "review" })
//!     .unwrap();
//! assert_eq!(output, "URGENT: review");
//! ```

pub mod error;
pub mod interpreter;
pub mod parser;
pub mod types;

pub use error::Error;
pub use interpreter::{
    Engine, EvalError, FileSystemLoader, IncludeError, MemoryLoader, RenderContext, Resolution,
    TemplateCache, TemplateLoader,
};
pub use parser::{LexError, MetadataError, ParseError, parse_template};
pub use types::{Metadata, Template, Value};

/// Creates an object [`Value`] from key-value pairs, for use as a render
/// context.
///
/// Values are automatically converted via `Into<Value>`, so you can pass
/// integers, floats, strings, vectors or nested `Value`s directly. Keys keep
/// the order they are written in.
///
/// # Example
///
/// ```
/// use pmd::{context, Value};
///
/// let ctx = context! { "count" => 3, "name" => "Alice" };
/// assert_eq!(ctx.get("count"), Some(&Value::Number(3.0)));
/// assert_eq!(ctx.get("name").and_then(Value::as_str), Some("Alice"));
/// ```
#[macro_export]
macro_rules! context {
    {} => {
        $crate::Value::Object(::std::default::Default::default())
    };
    { $($key:expr => $value:expr),+ $(,)? } => {
        ::std::iter::Iterator::collect::<$crate::Value>(::std::iter::IntoIterator::into_iter([
            $(
                (
                    ::std::string::ToString::to_string(&$key),
                    ::std::convert::Into::<$crate::Value>::into($value),
                ),
            )+
        ]))
    };
}

//! Template binding engine.
//!
//! A compiled [`Template`] renders three ways:
//! - [`Template::render`] to a markup string;
//! - [`Template::append_to`] into a live [`tether_dom::Node`] tree, creating a
//!   [`Binding`] for every dynamic position;
//! - [`Template::chunks`] into a lazy sequence of [`Chunk`]s that stops at
//!   pending values.
//!
//! Bindings update their output in place, and list bindings can insert,
//! remove and move items without touching their siblings. [`rehydrate`]
//! claims a tree parsed from server markup so its bindings drive the nodes
//! that already exist.

pub mod binding;
pub mod chunks;
pub mod context;
pub mod error;
mod html;
mod live;
mod range;
pub mod registry;
pub mod rehydrate;
pub mod scope;
#[cfg(feature = "serialize")]
pub mod serialize;
pub mod tags;
pub mod template;
pub mod value;

pub use binding::{Binding, BindingKind, Span};
pub use chunks::{Chunk, Chunks, PendingChunk, Slot, collect};
pub use context::{Context, Ctx, Expression};
pub use error::Error;
pub use registry::Registry;
pub use rehydrate::{attach, rehydrate};
pub use scope::{Computed, Else, Model, Path, Scope, computed, otherwise, path, this};
pub use template::{
    Attribute, AttributeMap, Template, attr, block, boundary, comment, conditional,
    dynamic_attr, dynamic_comment, dynamic_text, each, element, template, text,
};
pub use value::{Pending, Value};

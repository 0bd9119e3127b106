//! The data capability the engine renders against.
//!
//! The engine never looks inside data itself: it asks an [`Expression`] for a
//! value and asks a [`Context`] to narrow scope. Both are implemented by the
//! embedding application; [`crate::scope`] ships a reference pair.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::binding::Binding;
use crate::value::Value;

/// Shared handle to a context. Bindings keep the context they were rendered
/// with so `update` can re-run against it.
pub type Ctx = Rc<dyn Context>;

pub trait Expression: fmt::Debug + fmt::Display {
    fn get(&self, context: &dyn Context) -> Value;

    fn truthy(&self, context: &dyn Context) -> bool {
        self.get(context).truthy()
    }

    /// Rust constructor source that rebuilds this expression.
    fn serialize(&self) -> String {
        format!("path({:?})", self.to_string())
    }

    /// Lets a context recognize its own expression types.
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

pub trait Context {
    /// The current scope value when `expression` is `None`.
    fn get(&self, expression: Option<&dyn Expression>) -> Value;

    /// Scope narrowed to the value of `expression`.
    fn child(&self, expression: &dyn Expression) -> Ctx;

    /// Scope of the item at `index`, called on a list scope.
    fn each_child(&self, index: usize) -> Ctx;

    /// Called once for every binding created under this context. Nodes only
    /// refer to their bindings weakly; a binding nobody keeps from here on
    /// is dropped with its render.
    fn on_add(&self, binding: &Binding);

    /// Called when a binding's output leaves the tree.
    fn on_remove(&self, binding: &Binding);

    /// Called on the scope of a list item after a range operation left the
    /// item at `index`.
    fn set_item_index(&self, _index: usize) {}

    /// Lets expressions reach their own context type.
    fn as_any(&self) -> &dyn Any;
}

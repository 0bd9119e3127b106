//! Reference data model: dotted-path expressions evaluated against a shared
//! [`Model`], with [`Scope`] contexts that report bindings to a [`Registry`].

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::binding::Binding;
use crate::context::{Context, Ctx, Expression};
use crate::registry::Registry;
use crate::value::Value;

/// Dotted lookup such as `user.name` or `items.0`. Resolves against the
/// current scope first and falls back to enclosing scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    source: String,
}

impl Path {
    pub fn new(source: impl Into<String>) -> Self {
        Path {
            source: source.into(),
        }
    }

    /// The current scope value.
    pub fn this() -> Self {
        Path::new("this")
    }

    pub fn is_this(&self) -> bool {
        self.source == "this"
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Expression for Path {
    fn get(&self, context: &dyn Context) -> Value {
        let Some(scope) = context.as_any().downcast_ref::<Scope>() else {
            warn!(path = %self.source, "path evaluated outside a scope");
            return Value::Null;
        };
        if self.is_this() {
            return scope.value();
        }
        scope.lookup(&self.source)
    }

    fn serialize(&self) -> String {
        if self.is_this() {
            "this()".to_string()
        } else {
            format!("path({:?})", self.source)
        }
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

/// Always truthy; the last branch of a conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Else;

impl fmt::Display for Else {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("else")
    }
}

impl Expression for Else {
    fn get(&self, context: &dyn Context) -> Value {
        context.get(None)
    }

    fn truthy(&self, _: &dyn Context) -> bool {
        true
    }

    fn serialize(&self) -> String {
        "otherwise()".to_string()
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

type Compute = dyn Fn(&dyn Context) -> Value;

/// Expression backed by a closure. Handy for values that arrive later.
#[derive(Clone)]
pub struct Computed {
    name: String,
    compute: Rc<Compute>,
}

impl Computed {
    pub fn new(name: impl Into<String>, compute: impl Fn(&dyn Context) -> Value + 'static) -> Self {
        Computed {
            name: name.into(),
            compute: Rc::new(compute),
        }
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed").field("name", &self.name).finish()
    }
}

impl fmt::Display for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Expression for Computed {
    fn get(&self, context: &dyn Context) -> Value {
        (self.compute)(context)
    }
}

pub fn path(source: &str) -> Rc<dyn Expression> {
    Rc::new(Path::new(source))
}

pub fn this() -> Rc<dyn Expression> {
    Rc::new(Path::this())
}

pub fn otherwise() -> Rc<dyn Expression> {
    Rc::new(Else)
}

pub fn computed(
    name: &str,
    compute: impl Fn(&dyn Context) -> Value + 'static,
) -> Rc<dyn Expression> {
    Rc::new(Computed::new(name, compute))
}

/// Mutable root data shared by every scope of a render.
#[derive(Debug, Default)]
pub struct Model {
    root: RefCell<Value>,
}

impl Model {
    pub fn new(root: Value) -> Rc<Self> {
        Rc::new(Model {
            root: RefCell::new(root),
        })
    }

    pub fn get(&self, path: &str) -> Value {
        self.read(path, |v| v.cloned().unwrap_or_default())
    }

    /// Runs `f` on the value at dotted `location`; the empty location is the
    /// root.
    fn read<R>(&self, location: &str, f: impl FnOnce(Option<&Value>) -> R) -> R {
        let root = self.root.borrow();
        if location.is_empty() {
            f(Some(&root))
        } else {
            f(lookup(&root, location))
        }
    }

    /// Replaces the value at `path`, creating map entries along the way.
    pub fn set(&self, path: &str, value: Value) {
        let mut root = self.root.borrow_mut();
        let mut current = &mut *root;
        for segment in path.split('.') {
            if !matches!(current, Value::Map(_) | Value::List(_)) {
                *current = Value::Map(Default::default());
            }
            current = match current {
                Value::Map(entries) => entries.entry(segment.to_string()).or_default(),
                Value::List(items) => match segment.parse::<usize>() {
                    Ok(i) if i < items.len() => &mut items[i],
                    _ => {
                        warn!(path, "list index out of range");
                        return;
                    }
                },
                _ => return,
            };
        }
        *current = value;
    }

    /// Inserts `values` into the list at `path` before `index`.
    pub fn insert(&self, path: &str, index: usize, values: Vec<Value>) {
        self.with_list(path, |items| {
            let index = index.min(items.len());
            items.splice(index..index, values);
        });
    }

    /// Removes up to `count` entries from the list at `path`.
    pub fn remove(&self, path: &str, index: usize, count: usize) -> Vec<Value> {
        self.with_list(path, |items| {
            let start = index.min(items.len());
            let end = (index + count).min(items.len());
            items.drain(start..end).collect()
        })
        .unwrap_or_default()
    }

    /// Moves `count` entries; `to` indexes the list after they are taken out.
    pub fn move_items(&self, path: &str, from: usize, to: usize, count: usize) {
        self.with_list(path, |items| {
            let start = from.min(items.len());
            let end = (from + count).min(items.len());
            let moved: Vec<Value> = items.drain(start..end).collect();
            let to = to.min(items.len());
            items.splice(to..to, moved);
        });
    }

    fn with_list<R>(&self, path: &str, f: impl FnOnce(&mut Vec<Value>) -> R) -> Option<R> {
        let mut root = self.root.borrow_mut();
        let mut current = &mut *root;
        for segment in path.split('.') {
            current = current.get_mut(segment)?;
        }
        match current {
            Value::List(items) => Some(f(items)),
            _ => {
                warn!(path, "not a list");
                None
            }
        }
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, segment| v.get(segment))
}

fn join(location: &str, segment: &str) -> String {
    match (location.is_empty(), segment.is_empty()) {
        (true, _) => segment.to_string(),
        (_, true) => location.to_string(),
        _ => format!("{location}.{segment}"),
    }
}

enum Data {
    Root,
    /// Reads through the model at `segment` below `base`'s location, so
    /// later model writes are visible.
    Live {
        base: Rc<Scope>,
        segment: RefCell<String>,
    },
    /// Value of an expression that does not name a model location.
    Snapshot(Value),
}

/// Context over a [`Model`]. Scopes narrowed by a [`Path`], by [`Else`] or
/// to a list item read the model live; scopes narrowed by any other
/// expression hold the value it produced.
pub struct Scope {
    data: Data,
    model: Rc<Model>,
    parent: Option<Rc<Scope>>,
    registry: Weak<Registry>,
    me: Weak<Scope>,
}

impl Scope {
    /// Root scope over `model`. The caller keeps `registry` alive; bindings
    /// created after it is dropped go unrecorded.
    pub fn root(model: Rc<Model>, registry: Rc<Registry>) -> Ctx {
        Scope::create(Data::Root, model, None, Rc::downgrade(&registry))
    }

    fn create(
        data: Data,
        model: Rc<Model>,
        parent: Option<Rc<Scope>>,
        registry: Weak<Registry>,
    ) -> Rc<Scope> {
        Rc::new_cyclic(|me| Scope {
            data,
            model,
            parent,
            registry,
            me: me.clone(),
        })
    }

    fn narrowed(&self, data: Data) -> Ctx {
        Scope::create(
            data,
            self.model.clone(),
            self.me.upgrade(),
            self.registry.clone(),
        )
    }

    fn live(&self, base: Rc<Scope>, segment: String) -> Ctx {
        self.narrowed(Data::Live {
            base,
            segment: RefCell::new(segment),
        })
    }

    pub fn registry(&self) -> Option<Rc<Registry>> {
        self.registry.upgrade()
    }

    /// Dotted model location this scope reads, if it reads the model live.
    pub fn location(&self) -> Option<String> {
        match &self.data {
            Data::Root => Some(String::new()),
            Data::Live { base, segment } => {
                base.location().map(|l| join(&l, &segment.borrow()))
            }
            Data::Snapshot(_) => None,
        }
    }

    /// The value this scope is narrowed to.
    pub fn value(&self) -> Value {
        match (&self.data, self.location()) {
            (Data::Snapshot(value), _) => value.clone(),
            (_, Some(location)) => self.model.get(&location),
            (_, None) => Value::Null,
        }
    }

    /// Resolves `path` here, then in each enclosing scope.
    pub fn lookup(&self, path: &str) -> Value {
        let found = match (&self.data, self.location()) {
            (Data::Snapshot(value), _) => lookup(value, path).cloned(),
            (_, Some(location)) => self
                .model
                .read(&location, |v| v.and_then(|v| lookup(v, path)).cloned()),
            (_, None) => None,
        };
        match (found, &self.parent) {
            (Some(value), _) => value,
            (None, Some(parent)) => parent.lookup(path),
            (None, None) => Value::Null,
        }
    }

    /// Scope and segment `path` resolves to, following the same fallback as
    /// [`Scope::lookup`]. `None` when a snapshot scope answers first.
    fn locate(&self, path: &Path) -> Option<(Rc<Scope>, String)> {
        match self.location() {
            Some(location) => {
                let me = self.me.upgrade()?;
                if path.is_this() {
                    return Some((me, String::new()));
                }
                let found = self
                    .model
                    .read(&location, |v| v.and_then(|v| lookup(v, &path.source)).is_some());
                // the outermost scope claims paths that do not exist yet
                if found || self.parent.is_none() {
                    return Some((me, path.source.clone()));
                }
            }
            None => {
                if path.is_this() || lookup(&self.value(), &path.source).is_some() {
                    return None;
                }
            }
        }
        self.parent.as_ref()?.locate(path)
    }
}

impl Context for Scope {
    fn get(&self, expression: Option<&dyn Expression>) -> Value {
        match expression {
            Some(expression) => expression.get(self),
            None => self.value(),
        }
    }

    fn child(&self, expression: &dyn Expression) -> Ctx {
        let any = expression.as_any();
        if let Some(path) = any.and_then(|a| a.downcast_ref::<Path>()) {
            if let Some((base, segment)) = self.locate(path) {
                return self.live(base, segment);
            }
        }
        if any.is_some_and(|a| a.is::<Else>()) && self.location().is_some() {
            if let Some(me) = self.me.upgrade() {
                return self.live(me, String::new());
            }
        }
        self.narrowed(Data::Snapshot(expression.get(self)))
    }

    fn each_child(&self, index: usize) -> Ctx {
        if let (Some(_), Some(me)) = (self.location(), self.me.upgrade()) {
            return self.live(me, index.to_string());
        }
        let item = self.value().as_list().and_then(|l| l.get(index).cloned());
        self.narrowed(Data::Snapshot(item.unwrap_or_default()))
    }

    fn on_add(&self, binding: &Binding) {
        if let Some(registry) = self.registry() {
            registry.add(binding);
        }
    }

    fn on_remove(&self, binding: &Binding) {
        if let Some(registry) = self.registry() {
            registry.remove(binding);
        }
    }

    fn set_item_index(&self, index: usize) {
        if let Data::Live { segment, .. } = &self.data {
            *segment.borrow_mut() = index.to_string();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

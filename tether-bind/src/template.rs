//! Compiled template nodes.
//!
//! A template is built once and shared by every render; nothing in the engine
//! mutates it. Nodes are reference counted so bindings can point back at the
//! position that produced them.

use std::rc::Rc;

use tether_dom::is_void;

use crate::context::Expression;
use crate::value::Value;

#[derive(Debug)]
pub enum Template {
    Text(String),
    Comment(String),
    DynamicText(Rc<dyn Expression>),
    DynamicComment(Rc<dyn Expression>),
    Element(Element),
    Block(Block),
    Conditional(Conditional),
    Each(Each),
    /// Top-level sequence of nodes.
    Root(Vec<Rc<Template>>),
    /// Forces the chunked renderer to flush. Renders nothing.
    Boundary,
}

#[derive(Debug)]
pub struct Element {
    pub tag: String,
    pub attributes: AttributeMap,
    pub children: Vec<Rc<Template>>,
    pub is_void: bool,
}

/// Text of the comment pair bounding a block in the live tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub begin: String,
    pub end: String,
}

impl Markers {
    fn for_expression(expression: &dyn Expression) -> Markers {
        let begin = expression.to_string();
        let end = format!("/{begin}");
        Markers { begin, end }
    }
}

#[derive(Debug)]
pub struct Block {
    pub expression: Rc<dyn Expression>,
    pub children: Vec<Rc<Template>>,
    pub markers: Markers,
}

#[derive(Debug)]
pub struct Branch {
    pub expression: Rc<dyn Expression>,
    pub children: Vec<Rc<Template>>,
}

#[derive(Debug)]
pub struct Conditional {
    pub branches: Vec<Branch>,
    pub markers: Markers,
}

impl Conditional {
    /// First branch whose expression is truthy.
    pub fn select(&self, context: &dyn crate::context::Context) -> Option<&Branch> {
        self.branches.iter().find(|b| b.expression.truthy(context))
    }
}

#[derive(Debug)]
pub struct Each {
    pub expression: Rc<dyn Expression>,
    pub children: Vec<Rc<Template>>,
    pub else_children: Option<Vec<Rc<Template>>>,
    pub markers: Markers,
}

#[derive(Debug, Clone)]
pub enum Attribute {
    Static(Value),
    Dynamic(Rc<dyn Expression>),
}

/// Attributes in insertion order with unique names.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap(Vec<(String, Attribute)>);

impl AttributeMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds `name`, replacing an earlier value in place.
    pub fn set(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = attribute,
            None => self.0.push((name, attribute)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, a)| a)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.0.iter().map(|(k, a)| (k.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Attribute)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, Attribute)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(AttributeMap::new(), |map, (k, a)| map.set(k, a))
    }
}

// Attribute names whose bound updates write a live property instead of the
// markup attribute.
const UPDATE_PROPERTIES: &[(&str, &str)] = &[
    ("checked", "checked"),
    ("disabled", "disabled"),
    ("selected", "selected"),
    ("type", "type"),
    ("value", "value"),
    ("class", "className"),
    ("for", "htmlFor"),
    ("tabindex", "tabIndex"),
    ("readonly", "readOnly"),
    ("maxlength", "maxLength"),
    ("cellspacing", "cellSpacing"),
    ("cellpadding", "cellPadding"),
    ("rowspan", "rowSpan"),
    ("colspan", "colSpan"),
    ("usemap", "useMap"),
    ("frameborder", "frameBorder"),
    ("contenteditable", "contentEditable"),
    ("enctype", "encoding"),
    ("id", "id"),
    ("title", "title"),
];

/// Property written when a bound attribute updates.
pub fn update_property(name: &str) -> Option<&'static str> {
    UPDATE_PROPERTIES
        .iter()
        .find(|(attr, _)| *attr == name)
        .map(|(_, prop)| *prop)
}

/// Property written when an element is first created. `checked`, `selected`
/// and `value` go through their default-reflecting properties so the markup
/// attribute carries the initial state.
pub fn create_property(name: &str) -> Option<&'static str> {
    match name {
        "checked" => Some("defaultChecked"),
        "selected" => Some("defaultSelected"),
        "value" => Some("defaultValue"),
        _ => update_property(name),
    }
}

pub fn text(data: impl Into<String>) -> Rc<Template> {
    Rc::new(Template::Text(data.into()))
}

pub fn comment(data: impl Into<String>) -> Rc<Template> {
    Rc::new(Template::Comment(data.into()))
}

pub fn dynamic_text(expression: Rc<dyn Expression>) -> Rc<Template> {
    Rc::new(Template::DynamicText(expression))
}

pub fn dynamic_comment(expression: Rc<dyn Expression>) -> Rc<Template> {
    Rc::new(Template::DynamicComment(expression))
}

pub fn element(
    tag: impl Into<String>,
    attributes: AttributeMap,
    children: Vec<Rc<Template>>,
) -> Rc<Template> {
    let tag = tag.into();
    let is_void = is_void(&tag);
    Rc::new(Template::Element(Element {
        tag,
        attributes,
        children,
        is_void,
    }))
}

pub fn block(expression: Rc<dyn Expression>, children: Vec<Rc<Template>>) -> Rc<Template> {
    let markers = Markers::for_expression(&*expression);
    Rc::new(Template::Block(Block {
        expression,
        children,
        markers,
    }))
}

/// Branches are tried in order; markers come from the first expression.
pub fn conditional(branches: Vec<(Rc<dyn Expression>, Vec<Rc<Template>>)>) -> Rc<Template> {
    let markers = match branches.first() {
        Some((expression, _)) => Markers::for_expression(&**expression),
        None => Markers {
            begin: String::new(),
            end: "/".to_string(),
        },
    };
    let branches = branches
        .into_iter()
        .map(|(expression, children)| Branch {
            expression,
            children,
        })
        .collect();
    Rc::new(Template::Conditional(Conditional { branches, markers }))
}

pub fn each(
    expression: Rc<dyn Expression>,
    children: Vec<Rc<Template>>,
    else_children: Option<Vec<Rc<Template>>>,
) -> Rc<Template> {
    let markers = Markers::for_expression(&*expression);
    Rc::new(Template::Each(Each {
        expression,
        children,
        else_children,
        markers,
    }))
}

pub fn template(children: Vec<Rc<Template>>) -> Rc<Template> {
    Rc::new(Template::Root(children))
}

pub fn boundary() -> Rc<Template> {
    Rc::new(Template::Boundary)
}

pub fn attr(value: impl Into<Value>) -> Attribute {
    Attribute::Static(value.into())
}

pub fn dynamic_attr(expression: Rc<dyn Expression>) -> Attribute {
    Attribute::Dynamic(expression)
}

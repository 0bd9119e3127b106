//! String rendering. No bindings are created in this mode.

use std::rc::Rc;

use tether_dom::{escape_attribute, escape_text};
use tracing::{debug, warn};

use crate::context::{Context, Ctx};
use crate::template::{Attribute, Template};
use crate::value::Value;

impl Template {
    /// Renders to escaped markup.
    pub fn render(&self, context: &Ctx) -> String {
        debug!("rendering markup");
        let mut out = String::new();
        write(self, &**context, &mut out, true);
        out
    }

    /// Renders without escaping text content. Used where a template value
    /// lands in an attribute or comment.
    pub fn render_unescaped(&self, context: &dyn Context) -> String {
        let mut out = String::new();
        write(self, context, &mut out, false);
        out
    }
}

fn write(template: &Template, context: &dyn Context, out: &mut String, escaped: bool) {
    match template {
        Template::Text(data) => push_text(out, data, escaped),
        Template::Comment(data) => push_comment(out, data),
        Template::DynamicText(expression) => match expression.get(context) {
            Value::Template(inner) => write(&inner, context, out, escaped),
            value => push_text(out, &sync_text(value), escaped),
        },
        Template::DynamicComment(expression) => {
            let value = unwrap_template(expression.get(context), context);
            push_comment(out, &sync_text(value));
        }
        Template::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, attribute) in element.attributes.iter() {
                let value = match attribute {
                    Attribute::Static(value) => value.clone(),
                    Attribute::Dynamic(expression) => {
                        unwrap_template(expression.get(context), context)
                    }
                };
                push_attribute(out, name, &value);
            }
            out.push('>');
            if element.is_void {
                return;
            }
            write_all(&element.children, context, out, escaped);
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        Template::Block(block) => {
            let inner = context.child(&*block.expression);
            write_all(&block.children, &*inner, out, escaped);
        }
        Template::Conditional(conditional) => {
            if let Some(branch) = conditional.select(context) {
                let inner = context.child(&*branch.expression);
                write_all(&branch.children, &*inner, out, escaped);
            }
        }
        Template::Each(each) => {
            let count = item_count(&each.expression.get(context));
            let items = context.child(&*each.expression);
            if count > 0 {
                for index in 0..count {
                    let item = items.each_child(index);
                    write_all(&each.children, &*item, out, escaped);
                }
            } else if let Some(children) = &each.else_children {
                write_all(children, &*items, out, escaped);
            }
        }
        Template::Root(children) => write_all(children, context, out, escaped),
        Template::Boundary => {}
    }
}

fn write_all(children: &[Rc<Template>], context: &dyn Context, out: &mut String, escaped: bool) {
    for child in children {
        write(child, context, out, escaped);
    }
}

fn push_text(out: &mut String, data: &str, escaped: bool) {
    if escaped {
        out.push_str(&escape_text(data));
    } else {
        out.push_str(data);
    }
}

pub(crate) fn push_comment(out: &mut String, data: &str) {
    out.push_str("<!--");
    out.push_str(data);
    out.push_str("-->");
}

/// `true` writes the bare name, `false` and null write nothing. Pending
/// values count as null.
pub(crate) fn push_attribute(out: &mut String, name: &str, value: &Value) {
    match value {
        Value::Null | Value::Bool(false) => {}
        Value::Pending(_) => warn_pending(),
        Value::Bool(true) => {
            out.push(' ');
            out.push_str(name);
        }
        other => {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attribute(&other.to_text()));
            out.push('"');
        }
    }
}

/// Renders template values to unescaped text, leaving anything else as is.
pub(crate) fn unwrap_template(value: Value, context: &dyn Context) -> Value {
    match value {
        Value::Template(template) => Value::String(template.render_unescaped(context)),
        other => other,
    }
}

/// Pending values cannot be awaited in a synchronous render; they become null.
pub(crate) fn settle_sync(value: Value) -> Value {
    if let Value::Pending(_) = value {
        warn_pending();
        return Value::Null;
    }
    value
}

/// Text for a synchronous position.
pub(crate) fn sync_text(value: Value) -> String {
    settle_sync(value).to_text()
}

fn warn_pending() {
    warn!("pending value reached a synchronous render; rendering it empty");
}

pub(crate) fn item_count(items: &Value) -> usize {
    items.as_list().map_or(0, <[Value]>::len)
}

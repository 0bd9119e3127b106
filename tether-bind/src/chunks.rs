//! Chunked rendering.
//!
//! [`Chunks`] walks the template with an explicit work stack so it can stop
//! at any position. It emits as much contiguous markup as it can, then hands
//! a pending value to the caller unresolved. The caller resolves one pending
//! chunk before pulling the next, so output stays in document order.

use std::fmt;
use std::future::Future;
use std::iter::FusedIterator;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context as TaskContext, Poll};

use tether_dom::escape_text;

use crate::context::{Ctx, Expression};
use crate::error::Error;
use crate::html::{item_count, push_attribute, push_comment};
use crate::template::{Attribute, Template};
use crate::value::{Pending, Value};

pub enum Chunk {
    Text(String),
    Pending(PendingChunk),
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Chunk::Pending(p) => f.debug_tuple("Pending").field(&p.slot).finish(),
        }
    }
}

/// Output position a pending value fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Text,
    Comment,
    Attribute(String),
}

impl Slot {
    fn name(&self) -> &'static str {
        match self {
            Slot::Text => "text",
            Slot::Comment => "comment",
            Slot::Attribute(_) => "attribute",
        }
    }
}

/// A chunk whose markup is not known yet. Resolves to the finished markup
/// for its position.
pub struct PendingChunk {
    slot: Slot,
    future: Pin<Box<dyn Future<Output = Result<String, Error>>>>,
}

impl PendingChunk {
    fn new(pending: Pending, context: Ctx, slot: Slot) -> Self {
        let future = Box::pin(settle(pending, context, slot.clone()));
        PendingChunk { slot, future }
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }
}

impl Future for PendingChunk {
    type Output = Result<String, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

async fn settle(pending: Pending, context: Ctx, slot: Slot) -> Result<String, Error> {
    let mut value = pending.take()?.await?;
    // unwrap chains of pending values
    while let Value::Pending(next) = value {
        value = next.take()?.await?;
    }
    match (value, &slot) {
        (Value::Template(template), Slot::Text) => collect(template.chunks(&context)).await,
        (Value::Template(template), _) => {
            let text = template.render_unescaped(&*context);
            finish(Value::String(text), &slot)
        }
        (value, _) => finish(value, &slot),
    }
}

fn finish(value: Value, slot: &Slot) -> Result<String, Error> {
    let unrenderable = || Error::Unrenderable {
        slot: slot.name(),
        found: value.kind().to_string(),
    };
    match slot {
        Slot::Text => match &value {
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Ok(escape_text(&value.to_text()).into_owned())
            }
            _ => Err(unrenderable()),
        },
        Slot::Comment => match &value {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Ok(value.to_text())
            }
            _ => Err(unrenderable()),
        },
        Slot::Attribute(name) => match &value {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                let mut out = String::new();
                push_attribute(&mut out, name, &value);
                Ok(out)
            }
            _ => Err(unrenderable()),
        },
    }
}

/// Resolves every chunk in order and joins them.
pub async fn collect(chunks: Chunks) -> Result<String, Error> {
    let mut out = String::new();
    for chunk in chunks {
        match chunk {
            Chunk::Text(text) => out.push_str(&text),
            Chunk::Pending(pending) => out.push_str(&pending.await?),
        }
    }
    Ok(out)
}

enum Work {
    Node(Rc<Template>, Ctx),
    Literal(String),
    Attribute {
        name: String,
        attribute: Attribute,
        context: Ctx,
    },
}

enum Step {
    Continue,
    Flush,
    Pending(PendingChunk),
}

/// Lazy chunk sequence for one render. Ends with `None` and stays ended.
pub struct Chunks {
    stack: Vec<Work>,
    buffer: String,
    queued: Option<Chunk>,
}

impl Template {
    pub fn chunks(self: &Rc<Self>, context: &Ctx) -> Chunks {
        Chunks {
            stack: vec![Work::Node(self.clone(), context.clone())],
            buffer: String::new(),
            queued: None,
        }
    }
}

impl Chunks {
    fn take_buffer(&mut self) -> Option<Chunk> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(Chunk::Text(mem::take(&mut self.buffer)))
        }
    }

    fn push_children(&mut self, children: &[Rc<Template>], context: &Ctx) {
        for child in children.iter().rev() {
            self.stack.push(Work::Node(child.clone(), context.clone()));
        }
    }

    fn step(&mut self, work: Work) -> Step {
        match work {
            Work::Literal(text) => self.buffer.push_str(&text),
            Work::Attribute {
                name,
                attribute,
                context,
            } => {
                let value = match attribute {
                    Attribute::Static(value) => value,
                    Attribute::Dynamic(expression) => expression.get(&*context),
                };
                match value {
                    Value::Pending(pending) => {
                        return Step::Pending(PendingChunk::new(
                            pending,
                            context,
                            Slot::Attribute(name),
                        ));
                    }
                    Value::Template(template) => {
                        let text = template.render_unescaped(&*context);
                        push_attribute(&mut self.buffer, &name, &Value::String(text));
                    }
                    value => push_attribute(&mut self.buffer, &name, &value),
                }
            }
            Work::Node(template, context) => return self.step_node(&template, context),
        }
        Step::Continue
    }

    fn step_node(&mut self, template: &Rc<Template>, context: Ctx) -> Step {
        match &**template {
            Template::Text(data) => self.buffer.push_str(&escape_text(data)),
            Template::Comment(data) => push_comment(&mut self.buffer, data),
            Template::DynamicText(expression) => match expression.get(&*context) {
                Value::Pending(pending) => {
                    return Step::Pending(PendingChunk::new(pending, context, Slot::Text));
                }
                Value::Template(inner) => self.stack.push(Work::Node(inner, context)),
                value => self.buffer.push_str(&escape_text(&value.to_text())),
            },
            Template::DynamicComment(expression) => {
                return self.step_comment(&**expression, context);
            }
            Template::Element(element) => {
                self.buffer.push('<');
                self.buffer.push_str(&element.tag);
                if !element.is_void {
                    self.stack.push(Work::Literal(format!("</{}>", element.tag)));
                    self.push_children(&element.children, &context);
                }
                self.stack.push(Work::Literal(">".to_string()));
                let attributes: Vec<_> = element.attributes.iter().collect();
                for (name, attribute) in attributes.into_iter().rev() {
                    self.stack.push(Work::Attribute {
                        name: name.to_string(),
                        attribute: attribute.clone(),
                        context: context.clone(),
                    });
                }
            }
            Template::Block(block) => {
                let inner = context.child(&*block.expression);
                self.push_children(&block.children, &inner);
            }
            Template::Conditional(conditional) => {
                if let Some(branch) = conditional.select(&*context) {
                    let inner = context.child(&*branch.expression);
                    self.push_children(&branch.children, &inner);
                }
            }
            Template::Each(each) => {
                let count = item_count(&each.expression.get(&*context));
                let items = context.child(&*each.expression);
                if count > 0 {
                    for index in (0..count).rev() {
                        let item = items.each_child(index);
                        self.push_children(&each.children, &item);
                    }
                } else if let Some(children) = &each.else_children {
                    self.push_children(children, &items);
                }
            }
            Template::Root(children) => self.push_children(children, &context),
            Template::Boundary => return Step::Flush,
        }
        Step::Continue
    }

    fn step_comment(&mut self, expression: &dyn Expression, context: Ctx) -> Step {
        match expression.get(&*context) {
            Value::Pending(pending) => {
                self.buffer.push_str("<!--");
                self.stack.push(Work::Literal("-->".to_string()));
                Step::Pending(PendingChunk::new(pending, context, Slot::Comment))
            }
            Value::Template(template) => {
                let text = template.render_unescaped(&*context);
                push_comment(&mut self.buffer, &text);
                Step::Continue
            }
            value => {
                push_comment(&mut self.buffer, &value.to_text());
                Step::Continue
            }
        }
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if let Some(chunk) = self.queued.take() {
            return Some(chunk);
        }
        while let Some(work) = self.stack.pop() {
            match self.step(work) {
                Step::Continue => {}
                Step::Flush => {
                    if let Some(chunk) = self.take_buffer() {
                        return Some(chunk);
                    }
                }
                Step::Pending(pending) => match self.take_buffer() {
                    Some(text) => {
                        self.queued = Some(Chunk::Pending(pending));
                        return Some(text);
                    }
                    None => return Some(Chunk::Pending(pending)),
                },
            }
        }
        self.take_buffer()
    }
}

impl FusedIterator for Chunks {}

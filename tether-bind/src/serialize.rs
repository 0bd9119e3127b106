//! Rust constructor source for a template, for embedding compiled templates
//! in generated code. The output calls the builder functions of
//! [`crate::template`] and the expression constructors each expression
//! reports through [`Expression::serialize`].

use std::rc::Rc;

use proc_macro2::TokenStream;
use quote::quote;

use crate::context::Expression;
use crate::template::{Attribute, AttributeMap, Template};
use crate::value::Value;

impl Template {
    pub fn serialize(&self) -> String {
        tokens(self).to_string()
    }
}

fn tokens(template: &Template) -> TokenStream {
    match template {
        Template::Text(data) => quote!(text(#data)),
        Template::Comment(data) => quote!(comment(#data)),
        Template::DynamicText(expression) => {
            let expression = expression_tokens(&**expression);
            quote!(dynamic_text(#expression))
        }
        Template::DynamicComment(expression) => {
            let expression = expression_tokens(&**expression);
            quote!(dynamic_comment(#expression))
        }
        Template::Element(element) => {
            let tag = &element.tag;
            let attributes = attribute_map_tokens(&element.attributes);
            let children = children_tokens(&element.children);
            quote!(element(#tag, #attributes, #children))
        }
        Template::Block(block) => {
            let expression = expression_tokens(&*block.expression);
            let children = children_tokens(&block.children);
            quote!(block(#expression, #children))
        }
        Template::Conditional(conditional) => {
            let branches = conditional.branches.iter().map(|branch| {
                let expression = expression_tokens(&*branch.expression);
                let children = children_tokens(&branch.children);
                quote!((#expression, #children))
            });
            quote!(conditional(vec![#(#branches),*]))
        }
        Template::Each(each) => {
            let expression = expression_tokens(&*each.expression);
            let children = children_tokens(&each.children);
            let else_children = match &each.else_children {
                Some(children) => {
                    let children = children_tokens(children);
                    quote!(Some(#children))
                }
                None => quote!(None),
            };
            quote!(each(#expression, #children, #else_children))
        }
        Template::Root(children) => {
            let children = children_tokens(children);
            quote!(template(#children))
        }
        Template::Boundary => quote!(boundary()),
    }
}

fn children_tokens(children: &[Rc<Template>]) -> TokenStream {
    let children = children.iter().map(|child| tokens(child));
    quote!(vec![#(#children),*])
}

fn attribute_map_tokens(attributes: &AttributeMap) -> TokenStream {
    let entries = attributes.iter().map(|(name, attribute)| {
        let value = match attribute {
            Attribute::Static(value) => {
                let value = value_tokens(value);
                quote!(attr(#value))
            }
            Attribute::Dynamic(expression) => {
                let expression = expression_tokens(&**expression);
                quote!(dynamic_attr(#expression))
            }
        };
        quote!(.set(#name, #value))
    });
    quote!(AttributeMap::new() #(#entries)*)
}

fn value_tokens(value: &Value) -> TokenStream {
    match value {
        Value::Bool(b) => quote!(#b),
        Value::Number(n) => quote!(#n),
        Value::String(s) => quote!(#s),
        _ => quote!(Value::Null),
    }
}

fn expression_tokens(expression: &dyn Expression) -> TokenStream {
    match expression.serialize().parse::<TokenStream>() {
        Ok(tokens) => tokens,
        Err(_) => {
            let source = expression.to_string();
            quote!(path(#source))
        }
    }
}

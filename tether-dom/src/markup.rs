use std::borrow::Cow;

use pest::Parser;
use pest::iterators::Pair;

use crate::html::is_void;
use crate::node::Node;

#[derive(pest_derive::Parser)]
#[grammar = "markup.pest"]
struct MarkupParser;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("markup syntax error: {0}")]
    Syntax(String),
}

/// Parses markup into a fragment, the way a browser would materialize
/// server-rendered HTML: adjacent text is merged into one node, void tags
/// never get children, and unmatched end tags are ignored.
pub fn parse_fragment(input: &str) -> Result<Node, ParseError> {
    let root = Node::fragment();
    let mut stack: Vec<Node> = vec![root.clone()];

    let pairs =
        MarkupParser::parse(Rule::markup, input).map_err(|e| ParseError::Syntax(e.to_string()))?;

    for pair in pairs {
        let current = stack.last().cloned().unwrap_or_else(|| root.clone());
        match pair.as_rule() {
            Rule::comment => {
                let body = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                current.append_child(&Node::comment(body));
            }
            Rule::start_tag => {
                let (element, self_closing) = read_start_tag(pair);
                current.append_child(&element);
                let void = element.tag_name().is_some_and(|t| is_void(t));
                if !self_closing && !void {
                    stack.push(element);
                }
            }
            Rule::end_tag => {
                let tag = pair
                    .into_inner()
                    .next()
                    .map(|p| p.as_str().to_ascii_lowercase())
                    .unwrap_or_default();
                // pop until matching tag; stray end tags are dropped
                let open = stack.iter().rposition(|n| n.tag_name() == Some(tag.as_str()));
                if let Some(pos) = open {
                    stack.truncate(pos);
                }
            }
            Rule::text => push_text(&current, &decode_entities(pair.as_str())),
            Rule::stray_lt => push_text(&current, pair.as_str()),
            _ => {}
        }
    }

    Ok(root)
}

fn read_start_tag(pair: Pair<Rule>) -> (Node, bool) {
    let mut element: Option<Node> = None;
    let mut attrs: Vec<(String, Option<String>)> = Vec::new();
    let mut self_closing = false;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::tag_name => element = Some(Node::element(part.as_str().to_ascii_lowercase())),
            Rule::attribute => attrs.push(read_attribute(part)),
            Rule::self_close => self_closing = true,
            _ => {}
        }
    }

    let element = element.unwrap_or_else(|| Node::element("div"));
    for (name, value) in attrs {
        if element.has_attribute(&name) {
            continue;
        }
        match value {
            Some(value) => element.set_attribute(&name, value),
            None => element.set_bare_attribute(&name),
        }
    }
    (element, self_closing)
}

/// Name and value; `None` when the attribute was written bare.
fn read_attribute(attr: Pair<Rule>) -> (String, Option<String>) {
    let mut name = String::new();
    let mut value = None;
    for part in attr.into_inner() {
        match part.as_rule() {
            Rule::attr_name => name = part.as_str().to_ascii_lowercase(),
            Rule::attr_value => {
                let raw = part.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                value = Some(decode_entities(raw).into_owned());
            }
            _ => {}
        }
    }
    (name, value)
}

fn push_text(parent: &Node, data: &str) {
    if data.is_empty() {
        return;
    }
    match parent.last_child() {
        Some(last) if last.is_text() => {
            let merged = last.data().unwrap_or_default() + data;
            last.set_data(merged);
        }
        _ => parent.append_child(&Node::text(data)),
    }
}

/// Decodes the named references the renderer emits plus numeric ones.
/// Unknown references are kept verbatim.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_reference(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

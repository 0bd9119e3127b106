use tether_dom::{Node, NodeType, PropValue, h, text};

#[test]
fn serializes_void_and_bare_attributes() {
    let input = h("input", vec![("type", "checkbox")], vec![]);
    input.set_bare_attribute("checked");
    assert_eq!(input.to_html(), r#"<input type="checkbox" checked>"#);
    assert_eq!(input.attribute("checked").as_deref(), Some(""));

    // an empty string is still a value
    let empty = h("div", vec![("class", "")], vec![]);
    assert_eq!(empty.to_html(), r#"<div class=""></div>"#);
    assert!(!empty.is_bare_attribute("class"));

    let div = h("div", vec![("title", "a \"b\" & c")], vec![text("x < y")]);
    assert_eq!(div.to_html(), r#"<div title="a &quot;b&quot; &amp; c">x &lt; y</div>"#);
}

#[test]
fn comments_are_written_verbatim() {
    let frag = Node::fragment();
    frag.append_child(&Node::comment("a & b"));
    frag.append_child(&text("c"));
    assert_eq!(frag.inner_html(), "<!--a & b-->c");
    assert_eq!(frag.text_content(), "c");
}

#[test]
fn value_property_defaults_to_attribute_until_written() {
    let input = Node::element("input");
    input.set_property("defaultValue", "hello");
    assert_eq!(input.attribute("value").as_deref(), Some("hello"));
    assert_eq!(input.property("value"), PropValue::Str("hello".into()));

    input.set_property("value", "typed");
    assert_eq!(input.property("value"), PropValue::Str("typed".into()));
    // the attribute keeps the default
    assert_eq!(input.attribute("value").as_deref(), Some("hello"));
}

#[test]
fn checked_reflects_default_checked() {
    let input = Node::element("input");
    input.set_property("defaultChecked", true);
    assert!(input.is_bare_attribute("checked"));
    assert_eq!(input.to_html(), "<input checked>");
    assert_eq!(input.property("checked"), PropValue::Bool(true));

    let other = Node::element("input");
    other.set_property("defaultChecked", false);
    assert!(!other.has_attribute("checked"));
    assert_eq!(other.property("checked"), PropValue::Bool(false));
}

#[test]
fn reflected_string_properties_write_attributes() {
    let label = Node::element("label");
    label.set_property("className", "big");
    label.set_property("htmlFor", "name");
    assert_eq!(label.to_html(), r#"<label class="big" for="name"></label>"#);
    label.set_property("className", PropValue::Null);
    assert!(!label.has_attribute("class"));
}

#[test]
fn replace_child_with_fragment() {
    let parent = h("p", (), vec![text("a"), Node::comment("x"), text("c")]);
    let old = parent.children()[1].clone();
    let frag = Node::fragment();
    frag.append_child(&text("b1"));
    frag.append_child(&text("b2"));
    parent.replace_child(&frag, &old);
    assert_eq!(parent.child_count(), 4);
    assert_eq!(parent.text_content(), "ab1b2c");
    assert!(old.parent().is_none());
}

#[test]
fn clone_node_is_shallow() {
    let el = h("div", vec![("id", "a")], vec![text("child")]);
    let copy = el.clone_node();
    assert_eq!(copy.node_type(), NodeType::Element);
    assert_eq!(copy.attribute("id").as_deref(), Some("a"));
    assert!(!copy.has_child_nodes());
    assert_ne!(copy, el);
}

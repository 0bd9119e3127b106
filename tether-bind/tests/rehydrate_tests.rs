use std::rc::Rc;

use tether_bind::*;
use tether_dom::{Node, parse_fragment};

fn name(n: &str) -> Value {
    Value::map([("name", Value::from(n))])
}

fn server_markup(t: &Rc<Template>, data: Value) -> String {
    t.render(&Scope::root(Model::new(data), Registry::new()))
}

#[test]
fn bindings_drive_the_existing_nodes() {
    let list = each(
        path("people"),
        vec![
            element("li", AttributeMap::new(), vec![dynamic_text(path("name"))]),
            text(" "),
        ],
        None,
    );
    let footer = dynamic_text(path("footer"));
    let t = template(vec![
        element(
            "ul",
            AttributeMap::new().set("class", dynamic_attr(path("kind"))),
            vec![list.clone()],
        ),
        footer.clone(),
        text("!"),
    ]);
    let data = Value::map([
        ("kind", Value::from("team")),
        ("people", Value::list([name("a"), name("b")])),
        ("footer", Value::from("end")),
    ]);

    let markup = server_markup(&t, data.clone());
    assert_eq!(markup, r#"<ul class="team"><li>a</li> <li>b</li> </ul>end!"#);
    let existing = parse_fragment(&markup).unwrap();
    let ul = existing.first_child().unwrap();
    let first_li = ul.first_child().unwrap();
    // the parser merged "end" and "!"
    assert_eq!(existing.child_count(), 2);

    let model = Model::new(data);
    let registry = Registry::new();
    let ctx = Scope::root(model.clone(), registry.clone());
    rehydrate(&t, &ctx, &existing).unwrap();

    assert_eq!(
        existing.inner_html(),
        r#"<ul class="team"><!--people--><li>a</li> <li>b</li> <!--/people--></ul>end!"#
    );
    assert_eq!(ul.children()[1], first_li);
    assert_eq!(existing.child_count(), 3);

    model.set("footer", "fin".into());
    registry.binding_for(&footer).unwrap().update();
    assert_eq!(existing.children()[1].data().as_deref(), Some("fin"));

    model.set("kind", "staff".into());
    for binding in registry.bindings() {
        if binding.kind() == BindingKind::Attribute {
            binding.update();
        }
    }
    assert_eq!(ul.attribute("class").as_deref(), Some("staff"));

    model.insert("people", 2, vec![name("c")]);
    registry.binding_for(&list).unwrap().insert(2, 1);
    assert_eq!(
        ul.inner_html(),
        "<!--people--><li>a</li> <li>b</li> <li>c</li> <!--/people-->"
    );
}

#[test]
fn missing_text_and_markers_are_synthesized() {
    let missing = dynamic_text(path("missing"));
    let empty_items = each(path("items"), vec![], None);
    let t = template(vec![element(
        "p",
        AttributeMap::new(),
        vec![missing.clone(), empty_items.clone()],
    )]);
    let data = Value::map([("items", Value::list([1, 2]))]);
    let markup = server_markup(&t, data.clone());
    assert_eq!(markup, "<p></p>");

    let existing = parse_fragment(&markup).unwrap();
    let model = Model::new(data);
    let registry = Registry::new();
    let ctx = Scope::root(model.clone(), registry.clone());
    rehydrate(&t, &ctx, &existing).unwrap();
    assert_eq!(
        existing.inner_html(),
        "<p><!--items--><!--empty--><!--empty--><!--/items--></p>"
    );

    model.set("missing", "now".into());
    registry.binding_for(&missing).unwrap().update();
    assert_eq!(existing.text_content(), "now");
    assert_eq!(registry.binding_for(&empty_items).unwrap().items().len(), 2);
}

#[test]
fn different_template_is_a_structural_mismatch() {
    let server = template(vec![element("p", AttributeMap::new(), vec![text("hi")])]);
    let client = template(vec![element("div", AttributeMap::new(), vec![text("hi")])]);
    let existing = parse_fragment(&server_markup(&server, Value::Null)).unwrap();

    let ctx = Scope::root(Model::new(Value::Null), Registry::new());
    let err = rehydrate(&client, &ctx, &existing).unwrap_err();
    assert_eq!(
        err,
        Error::StructuralMismatch {
            path: "0".into(),
            expected: "<div>".into(),
            found: "<p>".into(),
        }
    );
}

#[test]
fn text_drift_is_reported_with_its_position() {
    let t = template(vec![element(
        "p",
        AttributeMap::new(),
        vec![text("hello")],
    )]);
    let existing = parse_fragment("<p>goodbye</p>").unwrap();
    let ctx = Scope::root(Model::new(Value::Null), Registry::new());
    match rehydrate(&t, &ctx, &existing) {
        Err(Error::StructuralMismatch { path, expected, .. }) => {
            assert_eq!(path, "0/0");
            assert_eq!(expected, r#"text "hello""#);
        }
        other => panic!("expected a mismatch, got {other:?}"),
    }
}

#[test]
fn trailing_existing_nodes_are_rejected() {
    let t = template(vec![element("p", AttributeMap::new(), vec![])]);
    let existing = parse_fragment("<p></p><span></span>").unwrap();
    let ctx = Scope::root(Model::new(Value::Null), Registry::new());
    let err = rehydrate(&t, &ctx, &existing).unwrap_err();
    assert!(matches!(err, Error::StructuralMismatch { ref found, .. } if found == "<span>"));
}

#[test]
fn attach_moves_bindings_between_trees() {
    let greeting = dynamic_text(path("greeting"));
    let t = template(vec![element("h1", AttributeMap::new(), vec![greeting.clone()])]);
    let model = Model::new(Value::map([("greeting", Value::from("hi"))]));
    let registry = Registry::new();
    let ctx = Scope::root(model.clone(), registry.clone());

    let reference = t.fragment(&ctx);
    let existing = Node::fragment();
    let h1 = Node::element("h1");
    h1.append_child(&Node::text("hi"));
    existing.append_child(&h1);

    attach(&reference, &existing).unwrap();
    let binding = registry.binding_for(&greeting).unwrap();
    assert_eq!(binding.node(), h1.first_child());

    model.set("greeting", "hey".into());
    binding.update();
    assert_eq!(existing.inner_html(), "<h1>hey</h1>");
    assert_eq!(reference.inner_html(), "<h1>hi</h1>");
}

#![cfg(feature = "serialize")]

use tether_bind::*;

fn compact(source: &str) -> String {
    source.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn serialized_template_is_a_rust_expression() {
    let t = template(vec![
        element(
            "div",
            AttributeMap::new()
                .set("class", attr("post"))
                .set("title", dynamic_attr(path("title"))),
            vec![
                dynamic_text(path("body")),
                comment("note"),
                boundary(),
            ],
        ),
        conditional(vec![
            (path("user.admin"), vec![text("admin")]),
            (otherwise(), vec![text("guest")]),
        ]),
        each(
            path("items"),
            vec![dynamic_text(this())],
            Some(vec![text("none")]),
        ),
        block(path("user"), vec![dynamic_comment(path("name"))]),
    ]);
    let source = t.serialize();
    syn::parse_str::<syn::Expr>(&source).expect("valid rust expression");

    let source = compact(&source);
    assert!(source.starts_with("template(vec![element(\"div\","));
    assert!(source.contains(
        r#"element("div",AttributeMap::new().set("class",attr("post")).set("title",dynamic_attr(path("title"))),vec!["#
    ));
    assert!(source.contains(r#"conditional(vec![(path("user.admin"),vec![text("admin")]),(otherwise(),vec![text("guest")])])"#));
    assert!(source.contains(r#"each(path("items"),vec![dynamic_text(this())],Some(vec![text("none")]))"#));
    assert!(source.contains(r#"block(path("user"),vec![dynamic_comment(path("name"))])"#));
    assert!(source.contains("boundary()"));
}

#[test]
fn lists_without_else_serialize_none() {
    let t = each(path("rows"), vec![text("row")], None);
    assert_eq!(
        compact(&t.serialize()),
        r#"each(path("rows"),vec![text("row")],None)"#
    );
}

#[test]
fn computed_expressions_fall_back_to_their_name() {
    let t = dynamic_text(computed("clock", |_| Value::from(0)));
    let source = t.serialize();
    syn::parse_str::<syn::Expr>(&source).expect("valid rust expression");
    assert_eq!(compact(&source), r#"dynamic_text(path("clock"))"#);
}

use std::rc::Rc;

use tether_bind::*;
use tether_dom::Node;

fn person(name: &str) -> Value {
    Value::map([("name", Value::from(name))])
}

fn people(names: &[&str]) -> Value {
    Value::map([("people", Value::list(names.iter().map(|n| person(n))))])
}

// Every item renders two sibling nodes: the element and a trailing comma.
fn people_list(else_children: Option<Vec<Rc<Template>>>) -> Rc<Template> {
    each(
        path("people"),
        vec![
            element("li", AttributeMap::new(), vec![dynamic_text(path("name"))]),
            text(","),
        ],
        else_children,
    )
}

struct Fixture {
    model: Rc<Model>,
    registry: Rc<Registry>,
    page: Rc<Template>,
    root: Node,
    list: Binding,
}

fn mount(list: Rc<Template>, data: Value) -> Fixture {
    let page = template(vec![element("ul", AttributeMap::new(), vec![list.clone()])]);
    let model = Model::new(data);
    let registry = Registry::new();
    let ctx = Scope::root(model.clone(), registry.clone());
    let root = Node::element("div");
    page.append_to(&root, &ctx);
    let binding = registry.binding_for(&list).unwrap();
    Fixture {
        model,
        registry,
        page,
        root,
        list: binding,
    }
}

impl Fixture {
    /// Markup of a from-scratch render of the current data.
    fn fresh(&self) -> String {
        let ctx = Scope::root(self.model.clone(), Registry::new());
        self.page.fragment(&ctx).inner_html()
    }
}

#[test]
fn insert_renders_new_items_in_place() {
    let f = mount(people_list(None), people(&["a", "b", "c"]));
    assert_eq!(f.root.text_content(), "a,b,c,");

    f.model.insert("people", 1, vec![person("x"), person("y")]);
    f.list.insert(1, 2);
    assert_eq!(f.root.text_content(), "a,x,y,b,c,");
    assert_eq!(f.root.inner_html(), f.fresh());

    let kinds: Vec<BindingKind> = f.list.items().iter().map(Binding::kind).collect();
    assert_eq!(
        kinds,
        (0..5).map(BindingKind::Item).collect::<Vec<_>>()
    );
}

#[test]
fn insert_at_end() {
    let f = mount(people_list(None), people(&["a"]));
    f.model.insert("people", 1, vec![person("b")]);
    f.list.insert(1, 1);
    assert_eq!(f.root.text_content(), "a,b,");
    assert_eq!(f.root.inner_html(), f.fresh());
}

#[test]
fn remove_takes_every_node_of_each_item() {
    let f = mount(people_list(None), people(&["a", "b", "c", "d"]));
    let before = f.registry.len();

    f.model.remove("people", 1, 2);
    f.list.remove(1, 2);
    assert_eq!(f.root.text_content(), "a,d,");
    assert_eq!(f.root.inner_html(), f.fresh());
    // each item owns its range binding and one text binding
    assert_eq!(f.registry.removed().len(), 4);
    assert_eq!(f.registry.len(), before - 4);
    assert_eq!(f.list.items().len(), 2);
}

#[test]
fn move_keeps_node_identity() {
    let f = mount(people_list(None), people(&["a", "b", "c"]));
    let ul = f.root.first_child().unwrap();
    let first_li = ul.children()[1].clone();

    f.model.move_items("people", 0, 2, 1);
    f.list.move_items(0, 2, 1);
    assert_eq!(f.root.text_content(), "b,c,a,");
    assert_eq!(f.root.inner_html(), f.fresh());

    let children = ul.children();
    assert_eq!(children[children.len() - 3], first_li);
    assert!(f.registry.removed().is_empty());
}

#[test]
fn move_several_items_backwards() {
    let f = mount(people_list(None), people(&["a", "b", "c", "d", "e"]));
    f.model.move_items("people", 3, 1, 2);
    f.list.move_items(3, 1, 2);
    assert_eq!(f.root.text_content(), "a,d,e,b,c,");
    assert_eq!(f.root.inner_html(), f.fresh());
}

#[test]
fn mirrored_operations_match_a_full_render() {
    let f = mount(people_list(None), people(&["a", "b", "c"]));
    let ops: &[(&str, usize, usize, usize)] = &[
        ("insert", 0, 2, 0),
        ("move", 4, 0, 1),
        ("remove", 2, 1, 0),
        ("insert", 4, 1, 0),
        ("move", 0, 3, 2),
        ("remove", 0, 3, 0),
        ("insert", 1, 3, 0),
    ];
    let mut next = 0;
    for &(op, a, b, c) in ops {
        match op {
            "insert" => {
                let values: Vec<Value> = (0..b)
                    .map(|_| {
                        next += 1;
                        person(&format!("n{next}"))
                    })
                    .collect();
                f.model.insert("people", a, values);
                f.list.insert(a, b);
            }
            "remove" => {
                f.model.remove("people", a, b);
                f.list.remove(a, b);
            }
            _ => {
                f.model.move_items("people", a, b, c);
                f.list.move_items(a, b, c);
            }
        }
        assert_eq!(f.root.inner_html(), f.fresh(), "after {op} {a} {b} {c}");
    }
}

#[test]
fn nested_lists_do_not_disturb_item_counting() {
    let groups = each(
        path("groups"),
        vec![
            text("["),
            each(path("tags"), vec![dynamic_text(this())], None),
            text("]"),
        ],
        None,
    );
    fn group(tags: &[&str]) -> Value {
        Value::map([("tags", Value::list(tags.iter().copied()))])
    }
    let data = Value::map([(
        "groups",
        Value::list([group(&["x", "y"]), group(&[]), group(&["z"])]),
    )]);
    let f = mount(groups.clone(), data);
    assert_eq!(f.root.text_content(), "[xy][][z]");

    f.model.remove("groups", 1, 1);
    f.list.remove(1, 1);
    assert_eq!(f.root.text_content(), "[xy][z]");
    assert_eq!(f.root.inner_html(), f.fresh());

    f.model.move_items("groups", 1, 0, 1);
    f.list.move_items(1, 0, 1);
    assert_eq!(f.root.text_content(), "[z][xy]");
    assert_eq!(f.root.inner_html(), f.fresh());
}

#[test]
fn else_content_comes_and_goes() {
    let f = mount(people_list(Some(vec![text("nobody")])), people(&[]));
    assert_eq!(f.root.text_content(), "nobody");

    f.model.insert("people", 0, vec![person("a")]);
    f.list.insert(0, 1);
    assert_eq!(f.root.text_content(), "a,");
    assert_eq!(f.root.inner_html(), f.fresh());

    f.model.remove("people", 0, 1);
    f.list.remove(0, 1);
    assert_eq!(f.root.text_content(), "nobody");
    assert_eq!(f.root.inner_html(), f.fresh());
}

#[test]
fn whole_list_update_rebuilds_items() {
    let f = mount(people_list(None), people(&["a", "b"]));
    f.model.set("people", Value::list([person("q")]));
    f.list.update();
    assert_eq!(f.root.text_content(), "q,");
    assert_eq!(f.list.items().len(), 1);
    assert_eq!(f.registry.removed().len(), 4);
}

#[test]
#[should_panic(expected = "needs the binding of a whole list")]
fn range_operations_reject_other_bindings() {
    let user = block(path("user"), vec![text("x")]);
    let model = Model::new(Value::Null);
    let registry = Registry::new();
    let ctx = Scope::root(model, registry.clone());
    user.fragment(&ctx);
    registry.binding_for(&user).unwrap().insert(0, 1);
}

#[test]
fn item_bindings_follow_their_item_after_range_operations() {
    let name = dynamic_text(path("name"));
    let list = each(
        path("people"),
        vec![element("li", AttributeMap::new(), vec![name.clone()])],
        None,
    );
    let f = mount(list, people(&["a", "b"]));
    // creation order: a, b, then x
    f.model.insert("people", 0, vec![person("x")]);
    f.list.insert(0, 1);
    let names = f.registry.bindings_for(&name);
    assert_eq!(names.len(), 3);

    f.model.set("people.1.name", "A".into());
    names[0].update();
    assert_eq!(f.root.text_content(), "xAb");

    f.model.move_items("people", 0, 2, 1);
    f.list.move_items(0, 2, 1);
    f.model.set("people.2.name", "X".into());
    names[2].update();
    assert_eq!(f.root.text_content(), "AbX");

    f.model.remove("people", 0, 1);
    f.list.remove(0, 1);
    f.model.set("people.0.name", "B".into());
    names[1].update();
    assert_eq!(f.root.text_content(), "BX");
    assert_eq!(f.root.inner_html(), f.fresh());
}

//! Integration tests for weft.
//!
//! These tests exercise the public API from outside the crate: templates are
//! rendered through the pilot or a bare renderer, models are mutated, and the
//! document and subscription counts are checked after every step.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use weft::reactive::change_channel;
use weft::testing::{render_to_string, to_html, Pilot};
use weft::{
    Actions, Collection, Controller, Dom, Inert, Model, PropertyHolder, RenderConfig, RenderError,
    Renderer, Schema, Template, Value, ViewRegistry,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn inert() -> Rc<dyn Controller> {
    Rc::new(Inert)
}

fn person(name: &str) -> Rc<PropertyHolder> {
    Schema::new().property("name", name).build()
}

// ---------------------------------------------------------------------------
// Rendering output
// ---------------------------------------------------------------------------

#[test]
fn test_render_to_string_snapshot() {
    let model = Schema::new()
        .property("title", "Inbox")
        .property("url", "/mail")
        .property("tint", "navy")
        .property("unread", true)
        .build();
    let html = render_to_string(
        "nav\n  a[href=@url class=\"top\" style:color=@tint] @title\n  - if @unread\n    b \"new\"\n",
        model,
    )
    .unwrap();
    insta::assert_snapshot!(html, @r#"<nav><a href="/mail" class="top" style="color: navy">Inbox</a><b>new</b></nav>"#);
}

#[test]
fn test_formatter_display() {
    let mut pilot = Pilot::new();
    let model = Schema::new()
        .formatted("price", 3, |v| Value::from(format!("${v}")))
        .build();
    let root = pilot.mount_source("span @price\n", model.clone(), inert()).unwrap();
    assert_eq!(pilot.html(root), "<span>$3</span>");

    model.set("price", 12.into()).unwrap();
    assert_eq!(pilot.html(root), "<span>$12</span>");
    assert_eq!(model.get("price"), Value::from(12));
}

#[test]
fn test_formatter_does_not_drive_conditionals() {
    let mut pilot = Pilot::new();
    let model = Schema::new()
        .formatted("done", false, |v| {
            Value::from(if v.is_truthy() { "Yes" } else { "No" })
        })
        .build();
    let root = pilot
        .mount_source("div\n  - if @done\n    b \"shown\"\n  span @done\n", model.clone(), inert())
        .unwrap();
    assert_eq!(pilot.html(root), "<div><span>No</span></div>");

    model.set("done", true.into()).unwrap();
    assert_eq!(pilot.html(root), "<div><b>shown</b><span>Yes</span></div>");
}

#[test]
fn test_labelled_anchors() {
    let mut pilot = Pilot::with_config(RenderConfig::new().with_anchor_label("anchor"));
    let model = Schema::new().property("open", false).build();
    let root = pilot
        .mount_source("div\n  - if @open\n    p \"x\"\n", model.clone(), inert())
        .unwrap();
    insta::assert_snapshot!(pilot.html(root), @"<div><!--anchor--></div>");

    model.set("open", true.into()).unwrap();
    insta::assert_snapshot!(pilot.html(root), @"<div><!--anchor--><p>x</p></div>");
}

#[test]
fn test_unless_and_in() {
    let mut pilot = Pilot::new();
    let author = person("Ada");
    let model = Schema::new()
        .property("busy", false)
        .property("author", author.clone())
        .build();
    let root = pilot
        .mount_source(
            "div\n  - unless @busy\n    p \"idle\"\n  - in @author\n    em @name\n",
            model.clone(),
            inert(),
        )
        .unwrap();
    assert_eq!(pilot.html(root), "<div><p>idle</p><em>Ada</em></div>");

    model.set("busy", true.into()).unwrap();
    author.set("name", "Grace".into()).unwrap();
    assert_eq!(pilot.html(root), "<div><em>Grace</em></div>");

    model.set("author", Value::Null).unwrap();
    assert_eq!(pilot.html(root), "<div></div>");
    assert_eq!(author.total_subscribers(), 0);
}

// ---------------------------------------------------------------------------
// Subscription hygiene
// ---------------------------------------------------------------------------

#[test]
fn test_nested_conditionals_do_not_leak() {
    init_tracing();
    let mut pilot = Pilot::new();
    let model = Schema::new()
        .property("open", true)
        .property("inner", true)
        .property("label", "hi")
        .build();
    let root = pilot
        .mount_source(
            "div\n  - if @open\n    - if @inner\n      p @label\n",
            model.clone(),
            inert(),
        )
        .unwrap();
    assert_eq!(pilot.html(root), "<div><p>hi</p></div>");
    assert_eq!(model.total_subscribers(), 3);

    for _ in 0..5 {
        model.set("open", false.into()).unwrap();
        assert_eq!(model.total_subscribers(), 1);
        assert_eq!(pilot.html(root), "<div></div>");

        model.set("open", true.into()).unwrap();
        assert_eq!(model.total_subscribers(), 3);
        assert_eq!(pilot.html(root), "<div><p>hi</p></div>");
    }

    // Same truthiness: nothing is rebuilt.
    let paragraph = pilot.find("p");
    model.set("open", "yes".into()).unwrap();
    assert_eq!(model.total_subscribers(), 3);
    assert_eq!(pilot.find("p"), paragraph);

    model.set("inner", false.into()).unwrap();
    assert_eq!(model.total_subscribers(), 2);
    assert_eq!(pilot.subscription_count(), 2);

    pilot.teardown();
    assert_eq!(model.total_subscribers(), 0);
    assert!(pilot.dom().is_empty());
}

#[test]
fn test_toggle_releases_leaking_channel() {
    let mut pilot = Pilot::new();
    let model = Schema::new()
        .property("toggle", true)
        .property("leaking", true)
        .build();
    pilot
        .mount_source(
            "div\n  - if @toggle\n    div\n      - if @leaking\n        p \"test\"\n",
            model.clone(),
            inert(),
        )
        .unwrap();
    assert_eq!(model.subscriber_count(&change_channel("leaking")), 1);

    model.set("toggle", false.into()).unwrap();
    assert_eq!(model.subscriber_count(&change_channel("leaking")), 0);
    assert_eq!(model.subscriber_count(&change_channel("toggle")), 1);
}

#[test]
fn test_collection_inside_conditional_is_released() {
    let mut pilot = Pilot::new();
    let ada = person("Ada");
    let grace = person("Grace");
    let items = Collection::from_items([ada.clone(), grace.clone()]);
    let model = Schema::new()
        .property("show", true)
        .property("items", items.clone())
        .build();
    let root = pilot
        .mount_source(
            "div\n  - if @show\n    ul\n      - collection @items\n        li @name\n",
            model.clone(),
            inert(),
        )
        .unwrap();
    insta::assert_snapshot!(pilot.html(root), @"<div><ul><li>Ada</li><li>Grace</li></ul></div>");
    assert_eq!(items.subscriber_count(), 1);
    assert_eq!(ada.total_subscribers(), 1);

    model.set("show", false.into()).unwrap();
    assert_eq!(items.subscriber_count(), 0);
    assert_eq!(ada.total_subscribers(), 0);
    assert_eq!(grace.total_subscribers(), 0);
    assert_eq!(model.total_subscribers(), 1);

    // Changes while hidden touch nothing.
    items.push(person("Linus"));
    assert_eq!(pilot.html(root), "<div></div>");

    model.set("show", true.into()).unwrap();
    assert_eq!(
        pilot.html(root),
        "<div><ul><li>Ada</li><li>Grace</li><li>Linus</li></ul></div>"
    );
}

#[test]
fn test_subview_inside_conditional_is_released() {
    let mut pilot = Pilot::new();
    pilot
        .registry()
        .register_view("card", "section\n  h2 @title\n")
        .unwrap();
    let post = Schema::new().property("title", "Hello").build();
    let model = Schema::new()
        .property("open", true)
        .property("post", post.clone())
        .build();
    let root = pilot
        .mount_source("div\n  - if @open\n    - view \"card\" @post\n", model.clone(), inert())
        .unwrap();
    assert_eq!(pilot.html(root), "<div><section><h2>Hello</h2></section></div>");
    assert_eq!(post.total_subscribers(), 1);

    model.set("open", false.into()).unwrap();
    assert_eq!(post.total_subscribers(), 0);
    assert_eq!(model.total_subscribers(), 1);
    assert_eq!(pilot.html(root), "<div></div>");
}

#[test]
fn test_nested_path_reassignment_releases_old_model() {
    let mut pilot = Pilot::new();
    let first = person("Ada");
    let second = person("Grace");
    let model = Schema::new().property("user", first.clone()).build();
    let root = pilot
        .mount_source("p @user.name\n", model.clone(), inert())
        .unwrap();
    assert_eq!(pilot.html(root), "<p>Ada</p>");
    assert_eq!(first.total_subscribers(), 1);

    model.set("user", second.clone().into()).unwrap();
    assert_eq!(pilot.html(root), "<p>Grace</p>");
    assert_eq!(first.total_subscribers(), 0);
    assert_eq!(second.total_subscribers(), 1);

    first.set("name", "stale".into()).unwrap();
    second.set("name", "Hopper".into()).unwrap();
    assert_eq!(pilot.html(root), "<p>Hopper</p>");
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[test]
fn test_collection_insert_keeps_existing_nodes() {
    let mut pilot = Pilot::new();
    let items = Collection::from_items([person("a"), person("c")]);
    let model = Schema::new().property("items", items.clone()).build();
    let root = pilot
        .mount_source("ul\n  - collection @items\n    li @name\n", model, inert())
        .unwrap();
    let before = pilot.find_all("li");
    assert_eq!(before.len(), 2);

    items.insert(1, person("b"));
    let after = pilot.find_all("li");
    assert_eq!(pilot.html(root), "<ul><li>a</li><li>b</li><li>c</li></ul>");
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[1]);

    items.remove_at(0);
    assert_eq!(pilot.html(root), "<ul><li>b</li><li>c</li></ul>");
    assert_eq!(pilot.find_all("li")[1], before[1]);

    items.update(0, person("B"));
    items.push(person("d"));
    assert_eq!(pilot.html(root), "<ul><li>B</li><li>c</li><li>d</li></ul>");

    items.replace([person("z")]);
    assert_eq!(pilot.html(root), "<ul><li>z</li></ul>");
    assert_eq!(items.subscriber_count(), 1);
}

#[test]
fn test_in_over_collection_follows_its_length() {
    let mut pilot = Pilot::new();
    let items = Collection::from_items(["a"]);
    let model = Schema::new().property("items", items.clone()).build();
    let root = pilot
        .mount_source("ul\n  - in @items\n    li \"x\"\n", model, inert())
        .unwrap();
    assert_eq!(pilot.html(root), "<ul><li>x</li></ul>");
    assert_eq!(items.subscriber_count(), 1);

    items.push("b");
    assert_eq!(pilot.find_all("li").len(), 2);
    assert_eq!(pilot.html(root), "<ul><li>x</li><li>x</li></ul>");
    assert_eq!(items.subscriber_count(), 1);

    items.remove_at(0);
    items.remove_at(0);
    assert_eq!(pilot.html(root), "<ul></ul>");

    pilot.teardown();
    assert_eq!(items.subscriber_count(), 0);
}

#[test]
fn test_removed_item_model_is_released() {
    let mut pilot = Pilot::new();
    let gone = person("gone");
    let items = Collection::from_items([gone.clone(), person("kept")]);
    let model = Schema::new().property("items", items.clone()).build();
    pilot
        .mount_source("ul\n  - collection @items\n    li @name\n", model, inert())
        .unwrap();
    assert_eq!(gone.total_subscribers(), 1);

    items.remove(&Value::from(gone.clone()));
    assert_eq!(gone.total_subscribers(), 0);
    assert_eq!(pilot.find_all("li").len(), 1);
}

// ---------------------------------------------------------------------------
// Independent renders
// ---------------------------------------------------------------------------

#[test]
fn test_two_renders_are_independent() {
    let dom = Rc::new(RefCell::new(Dom::new()));
    let renderer = Renderer::new(dom.clone(), Rc::new(ViewRegistry::new()));
    let template = Rc::new(Template::parse("p @name\n").unwrap());
    let shared = person("Ada");

    let a = renderer.render(&template, shared.clone(), inert()).unwrap();
    let b = renderer.render(&template, shared.clone(), inert()).unwrap();
    assert_ne!(a.root(), b.root());
    assert_eq!(shared.total_subscribers(), 2);

    a.teardown();
    assert!(!a.is_live());
    assert_eq!(shared.total_subscribers(), 1);

    shared.set("name", "Grace".into()).unwrap();
    assert_eq!(to_html(&dom.borrow(), b.root()), "<p>Grace</p>");

    drop(b);
    assert_eq!(shared.total_subscribers(), 0);
    assert!(dom.borrow().is_empty());
}

// ---------------------------------------------------------------------------
// Events and controllers
// ---------------------------------------------------------------------------

#[test]
fn test_click_updates_model_and_view() {
    let mut pilot = Pilot::new();
    let model = Schema::new().property("count", 0).build();
    let controller = Actions::new()
        .on("inc", |_, model| {
            let next = model.get("count").as_number().unwrap_or(0.0) + 1.0;
            model.set("count", next.into()).unwrap();
        })
        .on("reset", |_, model| {
            model.set("count", 0.into()).unwrap();
        });
    let root = pilot
        .mount_source(
            "div\n  button[id=\"inc\" event:click=inc] \"+\"\n  a[id=\"reset\" href=\"#\" event:click=reset!] \"reset\"\n  span @count\n",
            model.clone(),
            Rc::new(controller),
        )
        .unwrap();

    let inc = pilot.find_by_attribute("id", "inc").unwrap();
    for _ in 0..3 {
        let event = pilot.click(inc);
        assert!(!event.default_prevented());
    }
    assert_eq!(pilot.text(pilot.find("span").unwrap()), "3");

    let reset = pilot.find_by_attribute("id", "reset").unwrap();
    let event = pilot.click(reset);
    assert!(event.default_prevented());
    insta::assert_snapshot!(
        pilot.html(root),
        @r##"<div><button id="inc">+</button><a id="reset" href="#">reset</a><span>0</span></div>"##
    );
}

#[test]
fn test_subview_controller_forwards_to_parent() {
    let mut pilot = Pilot::new();
    pilot
        .registry()
        .register_view("row", "li\n  button[event:click=remove] @name\n  em[event:click=select] @name\n")
        .unwrap();
    pilot.registry().register_controller("row", || {
        Rc::new(Actions::new().on("select", |event, model| {
            event.stop_propagation();
            model.set("name", "picked".into()).unwrap();
        })) as Rc<dyn Controller>
    });

    let items = Collection::from_items([person("a"), person("b")]);
    let outer_items = items.clone();
    let parent = Actions::new().on("remove", move |_, model| {
        if let Some(index) = outer_items.items().iter().position(|item| {
            item.as_model()
                .is_some_and(|m| std::ptr::addr_eq(Rc::as_ptr(m), Rc::as_ptr(model)))
        }) {
            outer_items.remove_at(index);
        }
    });
    let model = Schema::new().property("items", items.clone()).build();
    let root = pilot
        .mount_source(
            "ul\n  - collection @items\n    - view \"row\"\n",
            model,
            Rc::new(parent),
        )
        .unwrap();

    let ems = pilot.find_all("em");
    pilot.click(ems[1]);
    assert_eq!(
        pilot.html(root),
        "<ul><li><button>a</button><em>a</em></li><li><button>picked</button><em>picked</em></li></ul>"
    );

    let first = pilot.find("button").unwrap();
    pilot.click(first);
    assert_eq!(items.len(), 1);
    assert_eq!(
        pilot.html(root),
        "<ul><li><button>picked</button><em>picked</em></li></ul>"
    );
}

#[test]
fn test_listener_on_torn_down_node_is_inert() {
    let mut pilot = Pilot::new();
    let model = Schema::new().property("count", 0).build();
    let controller = Actions::new().on("inc", |_, model| {
        let next = model.get("count").as_number().unwrap_or(0.0) + 1.0;
        model.set("count", next.into()).unwrap();
    });
    pilot
        .mount_source("button[event:click=inc] \"+\"\n", model.clone(), Rc::new(controller))
        .unwrap();
    let button = pilot.find("button").unwrap();
    pilot.teardown();

    pilot.click(button);
    assert_eq!(model.get("count"), Value::from(0));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_parse_error_reports_line() {
    let err = render_to_string("div\n  p\n    - bogus @x\n      span\n", Schema::new().build()).unwrap_err();
    match err {
        RenderError::Parse(parse) => assert_eq!(parse.line(), Some(3)),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_unknown_view_builds_nothing() {
    let mut pilot = Pilot::new();
    let model = Schema::new().property("open", true).build();
    let err = pilot
        .mount_source("div\n  - if @open\n    - view \"ghost\"\n", model.clone(), inert())
        .unwrap_err();
    assert_eq!(err, RenderError::UnknownView { name: "ghost".into() });
    assert_eq!(model.total_subscribers(), 0);
    assert!(pilot.dom().is_empty());
}

#[test]
fn test_depth_exceeded_during_rebuild_is_contained() {
    init_tracing();
    let mut pilot = Pilot::with_config(RenderConfig::new().with_max_view_depth(4));
    pilot
        .registry()
        .register_view("nest", "div\n  - if @deep\n    - view \"nest\"\n")
        .unwrap();
    let model = Schema::new().property("deep", false).build();
    let root = pilot.mount_view("nest", model.clone()).unwrap();
    assert_eq!(pilot.html(root), "<div></div>");

    // The rebuild fails partway; the failure is logged and the render stays usable.
    model.set("deep", true.into()).unwrap();
    assert!(pilot.find_all("div").len() > 1);

    model.set("deep", false.into()).unwrap();
    assert_eq!(pilot.html(root), "<div></div>");
    assert_eq!(model.total_subscribers(), 1);
}

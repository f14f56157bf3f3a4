//! Integration tests for bindery.
//!
//! These tests exercise the public API from outside the crate: pushing and
//! reading records, list reconciliation, directives, deferred values,
//! templates and the testing helpers working together.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bindery::dom::REMOVE_EVENT;
use bindery::testing::{outline, Pilot};
use bindery::{
    record, settle, BindError, BindingConfig, Document, ElementBuilder, Handler, ItemKey, PassStats,
    Record, TemplateStore, Value, View,
};
use pretty_assertions::assert_eq;
use tokio::task::LocalSet;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn people_page(doc: &Document) -> View {
    let root = doc.build(
        &ElementBuilder::new("section")
            .child(ElementBuilder::new("h1").name("title"))
            .child(
                ElementBuilder::new("table").child(
                    ElementBuilder::new("tr")
                        .name("rows[]")
                        .child(
                            ElementBuilder::new("td")
                                .child(ElementBuilder::new("input").attr("type", "text").name("name")),
                        )
                        .child(ElementBuilder::new("td").name("note")),
                ),
            ),
    );
    let view = View::from_root(doc, root);
    view.open().unwrap();
    view
}

fn rows(items: &[(i64, &str)]) -> Value {
    Value::from(
        items
            .iter()
            .map(|&(id, name)| record! { "id" => id, "name" => name })
            .collect::<Vec<Record>>(),
    )
}

fn keyed_by_id() -> Document {
    Document::with_config(BindingConfig::new().with_key_field("id"))
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn scalar_values_round_trip() {
    let doc = Document::new();
    let root = doc.build(
        &ElementBuilder::new("form")
            .child(ElementBuilder::new("input").name("first_name"))
            .child(ElementBuilder::new("textarea").name("bio"))
            .child(ElementBuilder::new("img").name("avatar"))
            .child(ElementBuilder::new("div").attr("contenteditable", "").name("notes")),
    );
    let view = View::from_root(&doc, root);
    let data = record! {
        "first_name" => "Ada",
        "bio" => "Analyst",
        "avatar" => "ada.png",
        "notes" => "engine",
    };
    view.set_data(&data);
    let names: Vec<&str> = data.keys().collect();
    assert_eq!(view.read_data(Some(names.as_slice())), data);
}

#[test]
fn unknown_names_are_ignored() {
    let doc = Document::new();
    let view = people_page(&doc);
    let pending = view.set_data(&record! { "nope" => 1, "title" => "People" });
    assert!(pending.is_empty());
    assert_eq!(Pilot::new(&view).text("title"), "People");
}

// ---------------------------------------------------------------------------
// People scenario
// ---------------------------------------------------------------------------

#[test]
fn people_list_reads_back_tagged_records() {
    let doc = keyed_by_id();
    let view = people_page(&doc);
    view.set_data(&record! { "rows" => rows(&[(1, "A"), (2, "B")]) });

    let read = view.read_data(Some(&["rows"]));
    let Some(Value::List(items)) = read.get("rows") else {
        panic!("rows should read as a list: {read:?}");
    };
    let tagged: Vec<(Value, Value)> = items
        .iter()
        .map(|item| {
            let item = item.as_record().unwrap();
            (item.get("id").cloned().unwrap(), item.get("name").cloned().unwrap())
        })
        .collect();
    assert_eq!(
        tagged,
        vec![
            (Value::from(1), Value::from("A")),
            (Value::from(2), Value::from("B")),
        ]
    );
}

#[test]
fn people_reorder_preserves_sub_views() {
    let doc = keyed_by_id();
    let view = people_page(&doc);
    view.set_data(&record! { "rows" => rows(&[(1, "A"), (2, "B")]) });
    let list = view.list("rows").unwrap();
    let a = list.view(&ItemKey::Int(1)).unwrap();
    let b = list.view(&ItemKey::Int(2)).unwrap();

    view.set_data(&record! { "rows" => rows(&[(2, "B"), (1, "A")]) });

    assert_eq!(list.view(&ItemKey::Int(1)).unwrap(), a);
    assert_eq!(list.view(&ItemKey::Int(2)).unwrap(), b);
    assert_eq!(
        list.last_pass(),
        PassStats {
            created: 0,
            reused: 2,
            destroyed: 0
        }
    );
    let table = doc.with(|dom| dom.parent(list.anchor()).unwrap());
    assert_eq!(
        doc.with(|dom| dom.children(table).to_vec()),
        vec![b.root(), a.root(), list.anchor()]
    );
}

#[test]
fn people_list_snapshot() {
    let doc = keyed_by_id();
    let view = people_page(&doc);
    view.set_data(&record! {
        "title" => "People",
        "rows" => rows(&[(1, "A"), (2, "B")]),
    });
    insta::assert_snapshot!(outline(&doc, view.root()), @r#"
    section
      h1 name="title" "People"
      table
        tr
          td
            input name="name" type="text"
          td name="note"
        tr
          td
            input name="name" type="text"
          td name="note"
        <!--><-->
    "#);
}

// ---------------------------------------------------------------------------
// Reconciliation laws
// ---------------------------------------------------------------------------

#[test]
fn identity_survives_and_removed_keys_disappear() {
    let doc = keyed_by_id();
    let view = people_page(&doc);
    view.set_data(&record! { "rows" => rows(&[(1, "A"), (2, "B"), (3, "C")]) });
    let list = view.list("rows").unwrap();
    let kept = list.view(&ItemKey::Int(2)).unwrap();
    let dropped = list.view(&ItemKey::Int(3)).unwrap();

    let removed = Rc::new(Cell::new(0));
    let r = removed.clone();
    doc.with_mut(|dom| {
        dom.add_listener(dropped.root(), REMOVE_EVENT, Handler::new(move |_| r.set(r.get() + 1)))
            .unwrap();
    });

    view.set_data(&record! { "rows" => rows(&[(2, "B2"), (4, "D")]) });

    assert_eq!(list.view(&ItemKey::Int(2)).unwrap(), kept);
    assert!(list.view(&ItemKey::Int(3)).is_none());
    assert_eq!(removed.get(), 1);
    let ids: Vec<Value> = list
        .read_all()
        .iter()
        .map(|item| item.get("id").cloned().unwrap())
        .collect();
    assert_eq!(ids, vec![Value::from(2), Value::from(4)]);
}

#[test]
fn empty_array_clears_list() {
    let doc = keyed_by_id();
    let view = people_page(&doc);
    view.set_data(&record! { "rows" => rows(&[(1, "A"), (2, "B")]) });
    view.set_data(&record! { "rows" => Vec::<Value>::new() });

    let list = view.list("rows").unwrap();
    assert!(list.is_empty());
    assert_eq!(view.read_data(Some(&["rows"])), record! { "rows" => Vec::<Value>::new() });
    let table = doc.with(|dom| dom.parent(list.anchor()).unwrap());
    assert_eq!(doc.with(|dom| dom.children(table).to_vec()), vec![list.anchor()]);
}

#[test]
fn same_array_twice_creates_nothing() {
    let doc = keyed_by_id();
    let view = people_page(&doc);
    let data = record! { "rows" => rows(&[(1, "A"), (2, "B")]) };
    view.set_data(&data);
    view.set_data(&data);
    assert_eq!(
        view.list("rows").unwrap().last_pass(),
        PassStats {
            created: 0,
            reused: 2,
            destroyed: 0
        }
    );
}

#[test]
fn ordinal_keys_for_append_only_lists() {
    let doc = Document::new();
    let view = people_page(&doc);
    view.set_data(&record! { "rows" => vec![record! { "name" => "A" }] });
    let first = view.list("rows").unwrap().view(&ItemKey::Int(0)).unwrap();
    view.set_data(&record! { "rows" => vec![record! { "name" => "A" }, record! { "name" => "B" }] });
    let list = view.list("rows").unwrap();
    assert_eq!(list.view(&ItemKey::Int(0)).unwrap(), first);
    assert_eq!(list.keys(), vec![ItemKey::Int(0), ItemKey::Int(1)]);
}

#[test]
fn lists_survive_content_rebuild() {
    let doc = keyed_by_id();
    let view = people_page(&doc);
    view.set_data(&record! { "rows" => rows(&[(1, "A")]) });
    let before = view.list("rows").unwrap();

    let badge = doc.build(&ElementBuilder::new("span").name("badge"));
    view.set_data(&record! { "title" => badge });

    let after = view.list("rows").unwrap();
    assert!(Rc::ptr_eq(&before, &after));
    assert!(view.names().contains(&"badge".to_owned()));
    assert!(!view.names().contains(&"note".to_owned()));
}

// ---------------------------------------------------------------------------
// Shared names
// ---------------------------------------------------------------------------

fn labelled_list(name: &str) -> ElementBuilder {
    ElementBuilder::new("ul").child(
        ElementBuilder::new("li")
            .name(name)
            .child(ElementBuilder::new("input").name("label")),
    )
}

#[test]
fn same_named_lists_read_as_one_list() {
    let doc = Document::new();
    let root = doc.build(
        &ElementBuilder::new("div")
            .child(labelled_list("rows[]"))
            .child(labelled_list("rows[]")),
    );
    let view = View::from_root(&doc, root);
    view.set_data(&record! { "rows" => vec![record! { "_id" => 1, "label" => "x" }] });

    let read = view.read_data(Some(&["rows"]));
    assert_eq!(
        read.get("rows"),
        Some(&Value::from(vec![
            record! { "label" => "x", "_id" => 1 },
            record! { "label" => "x", "_id" => 1 },
        ]))
    );
}

#[test]
fn node_and_list_under_one_name_merge_in_tree_order() {
    let doc = Document::new();
    let root = doc.build(
        &ElementBuilder::new("div")
            .child(ElementBuilder::new("input").name("mix"))
            .child(labelled_list("mix[]")),
    );
    let view = View::from_root(&doc, root);
    view.set_data(&record! { "mix" => vec![record! { "label" => "x" }] });

    let input = view.targets("mix").unwrap()[0].node().unwrap();
    doc.with_mut(|dom| dom.get_mut(input).unwrap().set_value("typed"));

    assert_eq!(
        view.read_data(Some(&["mix"])).get("mix"),
        Some(&Value::from(vec![
            Value::from("typed"),
            Value::from(record! { "label" => "x", "_id" => 0 }),
        ]))
    );
}

#[test]
fn radio_group_checks_the_matching_value() {
    let doc = Document::new();
    let mut form = ElementBuilder::new("form");
    for choice in ["a", "b", "c"] {
        form = form.child(
            ElementBuilder::new("input")
                .attr("type", "radio")
                .attr("value", choice)
                .name("choice"),
        );
    }
    let view = View::from_root(&doc, doc.build(&form));

    view.set_data(&record! { "choice" => "b" });
    assert_eq!(view.read_all(), record! { "choice" => vec!["b"] });

    view.set_data(&record! { "choice" => "c" });
    assert_eq!(view.read_all(), record! { "choice" => vec!["c"] });
}

// ---------------------------------------------------------------------------
// Arena use
// ---------------------------------------------------------------------------

#[test]
fn repeated_text_pushes_keep_arena_size() {
    let doc = Document::new();
    let root = doc.build(&ElementBuilder::new("div").child(ElementBuilder::new("span").name("t")));
    let view = View::from_root(&doc, root);
    view.set_data(&record! { "t" => "x" });

    let before = doc.with(|dom| dom.len());
    for i in 0..1000 {
        view.set_data(&record! { "t" => i });
    }
    assert_eq!(doc.with(|dom| dom.len()), before);
    assert_eq!(doc.with(|dom| dom.text_content(root)), "999");

    view.clear_item("t");
    assert_eq!(doc.with(|dom| dom.len()), before - 1);
}

#[test]
fn reused_list_items_keep_arena_size() {
    let doc = keyed_by_id();
    let view = people_page(&doc);
    let data = record! { "rows" => rows(&[(1, "A"), (2, "B")]) };
    view.set_data(&data);
    let before = doc.with(|dom| dom.len());
    for _ in 0..50 {
        view.set_data(&data);
        view.set_data(&record! { "rows" => rows(&[(2, "B"), (1, "A")]) });
    }
    assert_eq!(doc.with(|dom| dom.len()), before);
}

// ---------------------------------------------------------------------------
// Listener directives
// ---------------------------------------------------------------------------

#[test]
fn repeated_click_directive_keeps_one_listener() {
    let doc = Document::new();
    let root = doc.build(&ElementBuilder::new("div").child(ElementBuilder::new("button").name("save")));
    let view = View::from_root(&doc, root);
    let fired = Rc::new(RefCell::new(Vec::new()));

    for label in ["first", "second"] {
        let log = fired.clone();
        view.set_data(&record! {
            "save" => record! { "!click" => Value::handler(move |_| log.borrow_mut().push(label)) },
        });
    }

    Pilot::new(&view).click("save");
    assert_eq!(*fired.borrow(), vec!["second"]);
}

// ---------------------------------------------------------------------------
// Deferred values
// ---------------------------------------------------------------------------

#[test]
fn deferred_value_lands_after_sync_value() {
    tokio_test::block_on(LocalSet::new().run_until(async {
        let doc = Document::new();
        let view = people_page(&doc);
        let pilot = Pilot::new(&view);
        let (tx, rx) = tokio::sync::oneshot::channel::<String>();

        let pending = view.set_data(&record! {
            "name_slot" => 0,
            "title" => Value::deferred(async move { Value::from(rx.await.unwrap_or_default()) }),
            "rows" => Vec::<Value>::new(),
        });
        view.set_data(&record! { "title" => "Loading" });
        assert_eq!(pilot.text("title"), "Loading");
        assert_eq!(pending.len(), 1);
        assert!(!pending[0].is_finished());

        tx.send("People".to_owned()).unwrap();
        settle(pending).await.unwrap();
        assert_eq!(pilot.text("title"), "People");
    }));
}

#[test]
fn deferred_values_inside_list_items_are_tracked() {
    tokio_test::block_on(LocalSet::new().run_until(async {
        let doc = keyed_by_id();
        let view = people_page(&doc);
        let pending = view.set_data(&record! {
            "rows" => vec![record! {
                "id" => 1,
                "note" => Value::deferred(async { Value::from("Later") }),
            }],
        });
        assert_eq!(pending.len(), 1);
        settle(pending).await.unwrap();
        let item = view.list("rows").unwrap().view(&ItemKey::Int(1)).unwrap();
        assert_eq!(Pilot::new(&item).text("note"), "Later");
    }));
}

// ---------------------------------------------------------------------------
// Templates and lifecycle
// ---------------------------------------------------------------------------

#[test]
fn view_from_template_and_scoped_views() {
    let doc = Document::new();
    let mut store = TemplateStore::new();
    store.define(
        &doc,
        "dialog",
        &ElementBuilder::new("template")
            .attr("data-tag", "dialog")
            .child(
                ElementBuilder::new("div")
                    .name("body")
                    .child(ElementBuilder::new("input").name("answer")),
            )
            .child(ElementBuilder::new("button").name("ok")),
    );
    let view = View::from_template(&doc, &store, "dialog").unwrap();
    assert_eq!(view.names(), vec!["body", "answer", "ok"]);

    let body = view.create_scoped("body").unwrap();
    body.set_data(&record! { "answer" => "42" });
    assert_eq!(view.read_data(Some(&["answer"])), record! { "answer" => "42" });

    assert_eq!(
        View::from_template(&doc, &store, "missing").unwrap_err(),
        BindError::TemplateNotFound("missing".into())
    );
}

#[test]
fn close_notifies_subtree_once() {
    let doc = Document::new();
    let view = people_page(&doc);
    let seen = Rc::new(Cell::new(0));
    let s = seen.clone();
    let title = Pilot::new(&view).node("title");
    doc.with_mut(|dom| {
        dom.add_listener(title, REMOVE_EVENT, Handler::new(move |_| s.set(s.get() + 1)))
            .unwrap();
    });
    view.close().unwrap();
    assert_eq!(seen.get(), 1);
    assert!(view.close().is_err());
}

#[test]
fn default_action_on_enter() {
    let doc = Document::new();
    let view = people_page(&doc);
    let submitted: Rc<RefCell<Option<Record>>> = Rc::new(RefCell::new(None));
    let out = submitted.clone();
    view.set_default_action(
        move |view| {
            *out.borrow_mut() = Some(view.read_data(Some(&["title"])));
            true
        },
        None,
    );
    view.set_data(&record! { "title" => "x" });
    let event = Pilot::new(&view).press_key("title", "Enter");
    assert!(event.is_stopped());
    assert_eq!(*submitted.borrow(), Some(Record::new()));
}

// ---------------------------------------------------------------------------
// JSON boundary
// ---------------------------------------------------------------------------

#[test]
fn json_push_drives_lists() {
    let doc = keyed_by_id();
    let view = people_page(&doc);
    view.set_json(serde_json::json!({
        "title": "People",
        "rows": [{ "id": 5, "name": "E" }],
    }));
    assert_eq!(
        view.read_json(),
        serde_json::json!({ "rows": [{ "name": "E", "id": 5 }] })
    );
}

// ---------------------------------------------------------------------------
// markup! macro
// ---------------------------------------------------------------------------

#[cfg(feature = "macros")]
#[test]
fn markup_macro_builds_bindable_tree() {
    use bindery::markup;

    let doc = Document::new();
    let label = "greeting";
    let root = doc.build(&markup! {
        <form>
            <h1 data-name={label}></h1>
            <input type="checkbox" name="agree" value="yes" />
        </form>
    });
    let view = View::from_root(&doc, root);
    view.set_data(&record! { "greeting" => "Hi", "agree" => true });
    assert_eq!(Pilot::new(&view).text("greeting"), "Hi");
    assert_eq!(view.read_all(), record! { "agree" => "yes" });
}

//! Basic query example - selecting, editing and batch dispatch

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dom::{DomService, Event};
use query::{args, Arg, Query};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let doc = DomService::from_body_html(
        "<div id='app'><h1>Todo</h1><ul><li>write</li><li>test</li></ul></div>",
    )?;
    let doc = Rc::new(RefCell::new(doc));
    let q = Query::new(doc.clone());

    // Typed, chainable calls
    let list = q.select("ul")?;
    list.add_last_child("ship")?;
    list.set_css("borderLeft", "2px solid")?.add_class(["todo"])?;
    println!("List markup: {}", list.html()?);

    // Named operations over every item
    let items = q.select("li")?;
    let texts = q.dispatch(&items, "text", &[])?;
    println!("{} items: {:?}", items.len(), texts);
    q.dispatch(&items, "attr", &args![Arg::map([("dataState", "open")])])?;

    // Events bubble from the target up through the ancestors
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();
    q.select("#app")?
        .on("click", Rc::new(move |event: &Event| {
            counter.set(counter.get() + 1);
            println!("click reached #app from node {}", event.target());
        }))?;
    items.eq(-1)?.trigger("click")?;
    println!("Clicks seen: {}", clicks.get());

    // Structural edits are visible to every later query
    q.select("h1")?.remove()?;
    println!("Document: {}", doc.borrow().outer_html(doc.borrow().body()?)?);

    Ok(())
}

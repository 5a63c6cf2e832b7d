//! Browser host for the Life background: mounts the board on `<canvas id="life">`.

mod app;
mod canvas;
mod console_log;
mod dom;

use log::{warn, LevelFilter};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

pub use app::WebApp;
pub use canvas::CanvasSurface;
pub use dom::{DomLayoutProvider, DomNode};

thread_local! {
    static APP: RefCell<Option<Rc<RefCell<WebApp>>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_log::init(LevelFilter::Info);
    let Some(window) = web_sys::window() else {
        return;
    };
    match WebApp::mount(window) {
        Ok(Some(app)) => APP.with(|slot| *slot.borrow_mut() = Some(app)),
        Ok(None) => {}
        Err(e) => warn!("Life board not started: {:?}", e),
    }
}

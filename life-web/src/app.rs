//! Binds the controller to the page: frames, pointer and touch events,
//! control buttons, resizing and the palette fetch.

use crate::canvas::CanvasSurface;
use crate::dom::{DomLayoutProvider, DomNode};
use life_common::{HighlightPalette, DEFAULT_COLOUR, DEFAULT_PALETTE_SLOTS};
use life_engine::input::is_interactive;
use life_engine::{Command, ControllerSettings, FrameHost, FrameToken, Layout, LifeController, PointerPosition};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlCanvasElement, MouseEvent, Response, TouchEvent,
    Window,
};

const PALETTE_URL: &str = "content.json";

/// `requestAnimationFrame` behind the scheduler's frame host.
struct RafHost {
    window: Window,
    app: Weak<RefCell<WebApp>>,
    handles: HashMap<FrameToken, i32>,
}

impl FrameHost for RafHost {
    fn now_ms(&self) -> f64 {
        self.window.performance().map_or(0.0, |p| p.now())
    }

    fn request_frame(&mut self, token: FrameToken) {
        let app = self.app.clone();
        let callback = Closure::once_into_js(move |timestamp: f64| {
            if let Some(app) = app.upgrade() {
                WebApp::on_frame(&app, token, timestamp);
            }
        });
        match self.window.request_animation_frame(callback.unchecked_ref()) {
            Ok(handle) => {
                self.handles.insert(token, handle);
            }
            Err(e) => warn!("requestAnimationFrame failed: {:?}", e),
        }
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if let Some(handle) = self.handles.remove(&token) {
            if let Err(e) = self.window.cancel_animation_frame(handle) {
                warn!("cancelAnimationFrame failed: {:?}", e);
            }
        }
    }
}

/// Optional page chrome that mirrors the board state.
struct Chrome {
    generation: Option<Element>,
    play_button: Option<Element>,
}

pub struct WebApp {
    controller: LifeController,
    surface: CanvasSurface,
    host: RafHost,
    layout_source: DomLayoutProvider,
    chrome: Chrome,
}

impl WebApp {
    /// Builds the board on `#life`. Returns `Ok(None)` if the page has no canvas.
    pub fn mount(window: Window) -> Result<Option<Rc<RefCell<WebApp>>>, JsValue> {
        let Some(document) = window.document() else {
            return Ok(None);
        };
        let Some(canvas) = document
            .get_element_by_id("life")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            debug!("No #life canvas on this page");
            return Ok(None);
        };

        let surface = CanvasSurface::new(canvas.clone())?;
        let layout_source = DomLayoutProvider::new(window.clone(), document.clone(), &canvas);
        let layout = Layout::resolve(&layout_source).unwrap_or_default();
        surface.fit(&layout)?;

        let settings = ControllerSettings {
            seed: (js_sys::Math::random() * u64::MAX as f64) as u64,
            ..ControllerSettings::default()
        };
        let palette = HighlightPalette::fallback(DEFAULT_COLOUR, DEFAULT_PALETTE_SLOTS);
        let controller = LifeController::new(settings, layout, palette);
        let chrome = Chrome {
            generation: document.get_element_by_id("gen"),
            play_button: document.get_element_by_id("btn-play"),
        };

        let app = Rc::new_cyclic(|weak| {
            RefCell::new(WebApp {
                controller,
                surface,
                host: RafHost { window: window.clone(), app: weak.clone(), handles: HashMap::new() },
                layout_source,
                chrome,
            })
        });

        bind_pointer(&app, &window, &document, &canvas)?;
        bind_buttons(&app, &document)?;
        bind_resize(&app, &window)?;
        fetch_palette(&app, &window);

        {
            let mut this = app.borrow_mut();
            this.render();
            let WebApp { controller, host, .. } = &mut *this;
            controller.start(host);
            this.sync_chrome();
        }
        info!("Life board mounted");
        Ok(Some(app))
    }

    fn render(&mut self) {
        self.controller.render(&mut self.surface);
    }

    fn dispatch(&mut self, command: Command) {
        let WebApp { controller, surface, host, .. } = &mut *self;
        controller.dispatch(command, surface, host);
        self.sync_chrome();
    }

    fn sync_chrome(&self) {
        if let Some(el) = &self.chrome.generation {
            el.set_text_content(Some(&self.controller.generation().to_string()));
        }
        if let Some(button) = &self.chrome.play_button {
            let running = self.controller.is_running();
            button.set_text_content(Some(if running { "Pause" } else { "Play" }));
            let classes = button.class_list();
            let result = if running { classes.add_1("active") } else { classes.remove_1("active") };
            if let Err(e) = result {
                warn!("Failed to update play button: {:?}", e);
            }
        }
    }

    fn relayout(&mut self) {
        let Some(layout) = Layout::resolve(&self.layout_source) else {
            return;
        };
        if let Err(e) = self.surface.fit(&layout) {
            warn!("Canvas resize failed: {:?}", e);
        }
        self.controller.apply_layout(layout, &mut self.surface);
    }

    fn on_frame(app: &Rc<RefCell<WebApp>>, token: FrameToken, timestamp: f64) {
        let Ok(mut this) = app.try_borrow_mut() else {
            return;
        };
        this.host.handles.remove(&token);
        let WebApp { controller, surface, host, .. } = &mut *this;
        let outcome = controller.on_frame(token, timestamp, surface, host);
        if outcome.step.is_some() {
            this.sync_chrome();
        }
    }

    fn pointer_at(&self, client_x: f64, client_y: f64) -> PointerPosition {
        let rect = self.surface.canvas().get_bounding_client_rect();
        PointerPosition { client_x, client_y, canvas_left: rect.left(), canvas_top: rect.top() }
    }
}

/// Runs `f` on the app unless it is gone or already borrowed.
fn with_app(app: &Weak<RefCell<WebApp>>, f: impl FnOnce(&mut WebApp)) {
    if let Some(app) = app.upgrade() {
        if let Ok(mut this) = app.try_borrow_mut() {
            f(&mut this);
        }
    }
}

fn listen(
    target: &EventTarget,
    kind: &str,
    passive: Option<bool>,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    match passive {
        Some(passive) => {
            let options = AddEventListenerOptions::new();
            options.set_passive(passive);
            target.add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                callback.as_ref().unchecked_ref(),
                &options,
            )?;
        }
        None => target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?,
    }
    callback.forget();
    Ok(())
}

fn first_touch(event: &Event) -> Option<(f64, f64)> {
    let touch = event.dyn_ref::<TouchEvent>()?.touches().get(0)?;
    Some((touch.client_x() as f64, touch.client_y() as f64))
}

fn mouse_point(event: &Event) -> Option<(f64, f64)> {
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some((mouse.client_x() as f64, mouse.client_y() as f64))
}

fn bind_pointer(
    app: &Rc<RefCell<WebApp>>,
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    let starts_on_board = {
        let canvas = canvas.clone();
        let body = document.body();
        move |event: &Event| !is_interactive(DomNode::from_target(event.target(), &canvas, body.as_ref()))
    };

    let weak = Rc::downgrade(app);
    let on_board = starts_on_board.clone();
    listen(document, "mousedown", None, move |event| {
        let Some((x, y)) = mouse_point(&event) else { return };
        if !on_board(&event) {
            return;
        }
        with_app(&weak, |this| this.dispatch(Command::PointerDown(this.pointer_at(x, y))));
    })?;

    let weak = Rc::downgrade(app);
    listen(document, "mousemove", None, move |event| {
        let Some((x, y)) = mouse_point(&event) else { return };
        with_app(&weak, |this| {
            if this.controller.is_drawing() {
                this.dispatch(Command::PointerMove(this.pointer_at(x, y)));
            }
        });
    })?;

    let weak = Rc::downgrade(app);
    listen(window, "mouseup", None, move |_| with_app(&weak, |this| this.dispatch(Command::PointerUp)))?;

    let weak = Rc::downgrade(app);
    listen(document, "touchstart", Some(false), move |event| {
        if !starts_on_board(&event) {
            return;
        }
        let Some((x, y)) = first_touch(&event) else { return };
        event.prevent_default();
        with_app(&weak, |this| this.dispatch(Command::PointerDown(this.pointer_at(x, y))));
    })?;

    let weak = Rc::downgrade(app);
    listen(document, "touchmove", Some(false), move |event| {
        let Some((x, y)) = first_touch(&event) else { return };
        with_app(&weak, |this| {
            if this.controller.is_drawing() {
                event.prevent_default();
                this.dispatch(Command::PointerMove(this.pointer_at(x, y)));
            }
        });
    })?;

    let weak = Rc::downgrade(app);
    listen(window, "touchend", None, move |_| with_app(&weak, |this| this.dispatch(Command::PointerUp)))?;
    Ok(())
}

fn bind_buttons(app: &Rc<RefCell<WebApp>>, document: &Document) -> Result<(), JsValue> {
    let buttons = [
        ("btn-play", Command::TogglePlay),
        ("btn-step", Command::StepOnce),
        ("btn-clear", Command::Clear),
        ("btn-random", Command::Randomize),
    ];
    for (id, command) in buttons {
        let Some(button) = document.get_element_by_id(id) else {
            continue;
        };
        let weak = Rc::downgrade(app);
        listen(&button, "click", None, move |_| with_app(&weak, |this| this.dispatch(command)))?;
    }
    Ok(())
}

fn bind_resize(app: &Rc<RefCell<WebApp>>, window: &Window) -> Result<(), JsValue> {
    let weak = Rc::downgrade(app);
    listen(window, "resize", None, move |_| with_app(&weak, WebApp::relayout))?;

    let section = app.borrow().layout_source.section().cloned();
    if let Some(section) = section {
        let weak = Rc::downgrade(app);
        let callback = Closure::wrap(Box::new(move || with_app(&weak, WebApp::relayout)) as Box<dyn FnMut()>);
        let observer = web_sys::ResizeObserver::new(callback.as_ref().unchecked_ref())?;
        observer.observe(&section);
        callback.forget();
    }
    Ok(())
}

/// Fetches the palette document once; any failure keeps the default palette.
fn fetch_palette(app: &Rc<RefCell<WebApp>>, window: &Window) {
    let weak = Rc::downgrade(app);
    let request = window.fetch_with_str(PALETTE_URL);
    wasm_bindgen_futures::spawn_local(async move {
        let text = match load_text(request).await {
            Ok(text) => text,
            Err(e) => {
                debug!("Palette document unavailable: {:?}", e);
                return;
            }
        };
        let palette = HighlightPalette::from_content_json(&text, DEFAULT_COLOUR, DEFAULT_PALETTE_SLOTS);
        with_app(&weak, |this| {
            let WebApp { controller, surface, .. } = this;
            controller.set_palette(palette, surface);
        });
    });
}

async fn load_text(request: js_sys::Promise) -> Result<String, JsValue> {
    let response: Response = JsFuture::from(request).await?.dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }
    let text = JsFuture::from(response.text()?).await?;
    text.as_string().ok_or_else(|| JsValue::from_str("response body is not text"))
}

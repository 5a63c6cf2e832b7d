//! Page geometry and element lookups.

use life_common::PixelRect;
use life_engine::input::{ChromeNode, INTERACTIVE_SELECTOR};
use life_engine::layout::{ContainerMetrics, LayoutProvider, TabMetrics};
use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, Node, Window};

const SHOW_TEXT: u32 = 0x4;

/// Reads the board geometry from the live DOM.
pub struct DomLayoutProvider {
    window: Window,
    document: Document,
    section: Option<Element>,
    tab: Option<HtmlElement>,
    text: Option<Element>,
}

impl DomLayoutProvider {
    /// The container is the canvas's enclosing `<section>`, or its parent.
    pub fn new(window: Window, document: Document, canvas: &HtmlCanvasElement) -> Self {
        let section = canvas
            .closest("section")
            .ok()
            .flatten()
            .or_else(|| canvas.parent_element());
        let tab = section
            .as_ref()
            .and_then(|s| s.query_selector(".contact-tab").ok().flatten())
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        let text = section.as_ref().and_then(|s| s.query_selector(".home").ok().flatten());
        DomLayoutProvider { window, document, section, tab, text }
    }

    pub fn section(&self) -> Option<&Element> {
        self.section.as_ref()
    }

    fn window_extent(&self) -> (f64, f64) {
        let width = self.window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = self.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        (width, height)
    }

    /// One box per non-empty character of every text node under `root`.
    fn character_boxes(&self, root: &Element) -> Vec<PixelRect> {
        let mut boxes = Vec::new();
        let (walker, range) = match (
            self.document.create_tree_walker_with_what_to_show(root, SHOW_TEXT),
            self.document.create_range(),
        ) {
            (Ok(walker), Ok(range)) => (walker, range),
            _ => {
                warn!("Text measurement unavailable, no text dead zones");
                return boxes;
            }
        };

        while let Ok(Some(node)) = walker.next_node() {
            let length = node.text_content().map_or(0, |t| t.encode_utf16().count()) as u32;
            for i in 0..length {
                if range.set_start(&node, i).is_err() || range.set_end(&node, i + 1).is_err() {
                    break;
                }
                let rect = range.get_bounding_client_rect();
                boxes.push(PixelRect::new(rect.left(), rect.top(), rect.right(), rect.bottom()));
            }
        }
        boxes
    }
}

impl LayoutProvider for DomLayoutProvider {
    fn container(&self) -> Option<ContainerMetrics> {
        let (window_width, window_height) = self.window_extent();
        let width = self.section.as_ref().map_or(window_width, |s| s.client_width() as f64);
        let height = match (&self.tab, &self.section) {
            (Some(tab), _) => (tab.offset_top() + tab.offset_height()) as f64,
            (None, Some(section)) => section.scroll_height() as f64,
            (None, None) => window_height,
        };
        let (origin_left, origin_top) = self.section.as_ref().map_or((0.0, 0.0), |s| {
            let rect = s.get_bounding_client_rect();
            (rect.left(), rect.top())
        });
        Some(ContainerMetrics {
            width,
            height,
            device_pixel_ratio: self.window.device_pixel_ratio(),
            origin_left,
            origin_top,
        })
    }

    fn reserved_tab(&self) -> Option<TabMetrics> {
        self.tab.as_ref().map(|tab| TabMetrics {
            left: tab.offset_left() as f64,
            top: tab.offset_top() as f64,
            width: tab.offset_width() as f64,
            height: tab.offset_height() as f64,
        })
    }

    fn glyph_boxes(&self) -> Vec<PixelRect> {
        match &self.text {
            Some(text) => self.character_boxes(text),
            None => Vec::new(),
        }
    }
}

/// An element on the path from an event target up to `<body>`.
pub struct DomNode<'a> {
    element: Element,
    canvas: &'a HtmlCanvasElement,
    body: Option<&'a HtmlElement>,
}

impl<'a> DomNode<'a> {
    pub fn from_target(
        target: Option<web_sys::EventTarget>,
        canvas: &'a HtmlCanvasElement,
        body: Option<&'a HtmlElement>,
    ) -> Option<Self> {
        let element = target?.dyn_into::<Element>().ok()?;
        Some(DomNode { element, canvas, body }).filter(|n| !n.is_body())
    }

    fn is_body(&self) -> bool {
        self.body.is_some_and(|body| {
            let body: &Node = body.as_ref();
            let element: &Node = self.element.as_ref();
            body == element
        })
    }
}

impl ChromeNode for DomNode<'_> {
    fn is_canvas(&self) -> bool {
        let canvas: &Element = self.canvas.as_ref();
        *canvas == self.element
    }

    fn is_chrome(&self) -> bool {
        self.element.matches(INTERACTIVE_SELECTOR).unwrap_or(false)
    }

    fn parent(&self) -> Option<Self> {
        let element = self.element.parent_element()?;
        Some(DomNode { element, canvas: self.canvas, body: self.body }).filter(|n| !n.is_body())
    }
}

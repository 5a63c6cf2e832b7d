use life_common::Colour;
use life_engine::render::Surface;
use life_engine::Layout;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// The board's 2D canvas. All drawing is in logical pixels; the context
/// transform carries the device pixel ratio.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(CanvasSurface { canvas, context })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Sizes the backing store to the layout, rescales the context and
    /// applies the clip path.
    pub fn fit(&self, layout: &Layout) -> Result<(), JsValue> {
        let (pixel_width, pixel_height) = layout.canvas_pixel_size();
        self.canvas.set_width(pixel_width);
        self.canvas.set_height(pixel_height);

        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", layout.logical_width))?;
        style.set_property("height", &format!("{}px", layout.logical_height))?;
        style.set_property("clip-path", &layout.clip_path_css())?;

        // Resizing resets the transform
        let dpr = layout.device_pixel_ratio;
        self.context.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.context.clear_rect(0.0, 0.0, width, height);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, colour: Colour) {
        self.context.set_fill_style_str(&colour.to_css());
        self.context.fill_rect(x, y, width, height);
    }
}

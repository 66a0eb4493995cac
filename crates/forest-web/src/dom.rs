use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

const MAX_PIXEL_RATIO: f64 = 2.0;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

#[inline]
pub fn add_click_listener(element: &web::Element, mut handler: impl FnMut() + 'static) {
    let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
    let _ = element.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

#[inline]
pub fn add_window_listener(event: &str, mut handler: impl FnMut() + 'static) {
    if let Some(w) = web::window() {
        let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
        let _ = w.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

/// `pageshow`, reporting whether the page came back from the back/forward
/// cache.
pub fn add_page_show_listener(mut handler: impl FnMut(bool) + 'static) {
    if let Some(w) = web::window() {
        let closure = Closure::wrap(Box::new(move |e: web::PageTransitionEvent| handler(e.persisted()))
            as Box<dyn FnMut(web::PageTransitionEvent)>);
        let _ = w.add_event_listener_with_callback("pageshow", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

/// Size the backing store to CSS size × devicePixelRatio, with the ratio
/// clamped to `[1, 2]`. Returns the new pixel size.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) -> (u32, u32) {
    if let Some(w) = web::window() {
        let dpr = w.device_pixel_ratio().clamp(1.0, MAX_PIXEL_RATIO);
        let rect = canvas.get_bounding_client_rect();
        let w_px = ((rect.width() * dpr) as u32).max(1);
        let h_px = ((rect.height() * dpr) as u32).max(1);
        if canvas.width() != w_px || canvas.height() != h_px {
            canvas.set_width(w_px);
            canvas.set_height(h_px);
        }
    }
    (canvas.width(), canvas.height())
}

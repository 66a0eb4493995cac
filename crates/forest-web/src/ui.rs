use forest_core::audio::AudioState;
use wasm_bindgen::JsCast;
use web_sys as web;

/// The "enable immersive audio" button.
#[derive(Clone)]
pub struct AudioControl {
    button: web::HtmlButtonElement,
}

impl AudioControl {
    pub fn find(document: &web::Document, id: &str) -> Option<Self> {
        let el = document.get_element_by_id(id)?;
        let button = el.dyn_into::<web::HtmlButtonElement>().ok()?;
        Some(Self { button })
    }

    pub fn element(&self) -> &web::Element {
        &self.button
    }

    pub fn sync(&self, state: AudioState) {
        let label = state.label();
        if self.button.text_content().as_deref() != Some(label) {
            self.button.set_text_content(Some(label));
        }
        self.button.set_disabled(!state.control_enabled());
        let _ = self
            .button
            .set_attribute("aria-pressed", if state.is_active() { "true" } else { "false" });
        let _ = self
            .button
            .set_attribute("data-state", &format!("{:?}", state).to_lowercase());
    }
}

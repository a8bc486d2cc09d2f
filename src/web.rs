//! Browser side: DOM page, `gloo-net` transport, SageMathCell bindings and the
//! `ModelPage` class exported to JavaScript.

use std::rc::{Rc, Weak};

use gloo_net::http::{Request, Response};
use js_sys::{Array, Function, Promise};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{Document, Element, HtmlAnchorElement, HtmlElement};

use crate::cell::CellFactory;
use crate::config::{CellOptions, Layout, SiteConfig};
use crate::controller::Controller;
use crate::error::{GlueError, Result};
use crate::export::{Download, ExportOutcome, ExportState, ExportStrategy};
use crate::page::Page;
use crate::transport::Transport;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = sagecell, js_name = makeSagecell)]
    fn make_sagecell(options: &JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = sagecell, js_name = deleteSagecell)]
    fn delete_sagecell(cell: &JsValue) -> std::result::Result<(), JsValue>;
}

fn to_js_err<E: core::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn js_value_to_string(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn dom_err(e: JsValue) -> GlueError {
    GlueError::Dom(js_value_to_string(&e))
}

// ------------------------------------------------------------------ sagecell

pub struct SageCellFactory;

impl CellFactory for SageCellFactory {
    type Handle = JsValue;

    fn create(&self, options: &CellOptions) -> Result<JsValue> {
        let json = serde_json::to_string(options).map_err(|e| GlueError::Cell(e.to_string()))?;
        let options = js_sys::JSON::parse(&json).map_err(|e| GlueError::Cell(js_value_to_string(&e)))?;
        make_sagecell(&options).map_err(|e| GlueError::Cell(js_value_to_string(&e)))
    }

    fn dispose(&self, handle: JsValue) {
        if let Err(e) = delete_sagecell(&handle) {
            log::warn!("sagecell.deleteSagecell failed: {}", js_value_to_string(&e));
        }
    }
}

// ------------------------------------------------------------------ http

pub struct HttpTransport;

fn transport_err(url: &str, e: impl core::fmt::Display) -> GlueError {
    GlueError::Transport { url: url.to_string(), reason: e.to_string() }
}

async fn read_text(url: &str, resp: Response) -> Result<String> {
    if !resp.ok() {
        return Err(GlueError::Status { url: url.to_string(), status: resp.status() });
    }
    resp.text().await.map_err(|e| transport_err(url, e))
}

impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = Request::get(url).send().await.map_err(|e| transport_err(url, e))?;
        read_text(url, resp).await
    }

    async fn post_text(&self, url: &str, body: String) -> Result<String> {
        let resp = Request::post(url)
            .header("Content-Type", "text/plain")
            .body(body)
            .map_err(|e| transport_err(url, e))?
            .send()
            .await
            .map_err(|e| transport_err(url, e))?;
        read_text(url, resp).await
    }
}

// ------------------------------------------------------------------ dom

pub struct DomPage {
    document: Document,
    layout: Layout,
}

impl DomPage {
    pub fn new(document: Document, layout: Layout) -> Self {
        Self { document, layout }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn select(&self, selector: &str) -> Result<Element> {
        self.document
            .query_selector(selector)
            .map_err(dom_err)?
            .ok_or_else(|| GlueError::MissingElement(selector.to_string()))
    }

    fn by_id(&self, id: &str) -> Result<Element> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| GlueError::MissingElement(format!("#{id}")))
    }

    fn create(&self, tag: &str) -> Result<Element> {
        self.document.create_element(tag).map_err(dom_err)
    }
}

impl Page for DomPage {
    fn replace_script(&self, text: &str) -> Result<()> {
        self.select(&self.layout.script)?.set_text_content(Some(text));
        Ok(())
    }

    fn prepend_script(&self, text: &str) -> Result<()> {
        self.select(&self.layout.script)?.prepend_with_str_1(text).map_err(dom_err)
    }

    fn append_cell_region(&self) -> Result<()> {
        let container = self.select(&self.layout.cell_container)?;
        let region = self.create("div")?;
        region.set_id(&self.layout.fresh_cell_id);
        region.set_class_name(&self.layout.fresh_cell_class);
        container.append_child(&region).map_err(dom_err)?;
        Ok(())
    }

    fn ensure_submit_button(&self, label: &str) -> Result<bool> {
        if self.document.get_element_by_id(&self.layout.submit_button_id).is_some() {
            return Ok(false);
        }
        let controls = self.by_id(&self.layout.controls_id)?;
        let button = self.create("button")?;
        button.set_id(&self.layout.submit_button_id);
        button.set_attribute("type", "button").map_err(dom_err)?;
        button.set_text_content(Some(label));
        controls.append_child(&button).map_err(dom_err)?;
        controls.append_child(&self.create("br")?).map_err(dom_err)?;
        Ok(true)
    }

    fn output_text(&self) -> Result<String> {
        Ok(self.by_id(&self.layout.output_id)?.text_content().unwrap_or_default())
    }

    fn show_progress(&self, notice: &str, spinner: &str) -> Result<()> {
        self.clear_progress();
        let controls = self.by_id(&self.layout.controls_id)?;

        let message = self.create("div")?;
        message.set_id(&self.layout.message_id);
        let text = self.create("p")?;
        text.set_text_content(Some(notice));
        message.append_child(&text).map_err(dom_err)?;
        let img = self.create("img")?;
        img.set_attribute("src", spinner).map_err(dom_err)?;
        message.append_child(&img).map_err(dom_err)?;

        controls.prepend_with_node_1(&message).map_err(dom_err)
    }

    fn clear_progress(&self) {
        if let Some(message) = self.document.get_element_by_id(&self.layout.message_id) {
            message.remove();
        }
    }

    fn alert(&self, message: &str) {
        let shown = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|w| w.alert_with_message(message));
        if let Err(e) = shown {
            log::error!("could not show alert `{message}`: {}", js_value_to_string(&e));
        }
    }

    fn offer_download(&self, download: &Download) -> Result<()> {
        let body = self.document.body().ok_or_else(|| GlueError::MissingElement("body".into()))?;
        let anchor = self
            .create("a")?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(|_| GlueError::Dom("failed to cast to anchor".into()))?;

        anchor.set_href(&download.data_uri());
        anchor.set_download(&download.filename);
        anchor.style().set_property("display", "none").map_err(dom_err)?;

        body.append_child(&anchor).map_err(dom_err)?;
        anchor.click();
        anchor.remove();
        Ok(())
    }
}

// ------------------------------------------------------------------ js api

type WebController = Controller<DomPage, HttpTransport, SageCellFactory>;

// Mirrors `typeof cb === "function"`: anything else is ignored.
fn call_if_function(callback: &JsValue) {
    if let Some(f) = callback.dyn_ref::<Function>() {
        if let Err(e) = f.call0(&JsValue::NULL) {
            log::error!("model load callback threw: {}", js_value_to_string(&e));
        }
    }
}

/// One model page: the script region, its computation cell and the STL export.
#[wasm_bindgen]
pub struct ModelPage {
    inner: Rc<WebController>,
}

#[wasm_bindgen]
impl ModelPage {
    /// `config_json` is layered over the preset of its `variant` (default `builder`).
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> std::result::Result<ModelPage, JsValue> {
        let config = match config_json {
            Some(json) => SiteConfig::from_json(&json).map_err(to_js_err)?,
            None => SiteConfig::default(),
        };
        log::set_max_level(config.log_filter().map_err(to_js_err)?);

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let page = DomPage::new(document, config.layout.clone());

        log::info!("model page ready ({:?})", config.variant);
        Ok(Self { inner: Rc::new(Controller::new(config, page, HttpTransport, SageCellFactory)) })
    }

    /// Resolves with the model path once prelude and model are in place;
    /// `on_loaded` runs first if it is a function.
    #[wasm_bindgen(js_name = loadModel)]
    pub fn load_model(&self, path: String, on_loaded: JsValue) -> Promise {
        let ctl = Rc::clone(&self.inner);
        future_to_promise(async move {
            let loaded = ctl
                .load_model_then(&path, |_| call_if_function(&on_loaded))
                .await
                .map_err(to_js_err)?;
            Ok(JsValue::from_str(&loaded.model_path))
        })
    }

    #[wasm_bindgen(js_name = loadNamedModel)]
    pub fn load_named_model(&self, name: String, on_loaded: JsValue) -> Promise {
        let ctl = Rc::clone(&self.inner);
        future_to_promise(async move {
            let loaded = ctl
                .load_named_model(&name, |_| call_if_function(&on_loaded))
                .await
                .map_err(to_js_err)?;
            Ok(JsValue::from_str(&loaded.model_path))
        })
    }

    /// Recreate the computation cell. On `post_and_download` pages the submit
    /// button is created if missing and given a click handler if it has none,
    /// including buttons that came with the page markup.
    #[wasm_bindgen(js_name = refreshCell)]
    pub fn refresh_cell(&self) -> std::result::Result<(), JsValue> {
        self.inner.refresh_cell().map_err(to_js_err)?;
        if self.inner.config().export_strategy() == ExportStrategy::PostAndDownload {
            self.wire_submit_button()?;
        }
        Ok(())
    }

    #[wasm_bindgen(getter, js_name = hasCell)]
    pub fn has_cell(&self) -> bool {
        self.inner.has_live_cell()
    }

    /// True while an STL request is outstanding.
    #[wasm_bindgen(getter, js_name = exportBusy)]
    pub fn export_busy(&self) -> bool {
        self.inner.export_state() != ExportState::Idle
    }

    /// Resolves with the rendered text (`return_text`) or `undefined` once the
    /// download was offered (`post_and_download`).
    #[wasm_bindgen(js_name = exportModel)]
    pub fn export_model(&self) -> Promise {
        let ctl = Rc::clone(&self.inner);
        future_to_promise(async move {
            match ctl.export_model().await.map_err(to_js_err)? {
                ExportOutcome::Returned(text) => Ok(JsValue::from_str(&text)),
                ExportOutcome::Downloaded(_) => Ok(JsValue::UNDEFINED),
            }
        })
    }

    /// Names of the models in the catalog.
    pub fn models(&self) -> Array {
        self.inner.config().models.keys().map(|k| JsValue::from_str(k)).collect()
    }

    /// Dispose the live cell. Call from `pagehide`.
    pub fn teardown(&self) {
        self.inner.teardown();
    }
}

impl ModelPage {
    /// Attach the export handler to the submit button unless it already has one.
    /// Returns whether a handler was attached.
    fn wire_submit_button(&self) -> std::result::Result<bool, JsValue> {
        let id = &self.inner.config().layout.submit_button_id;
        let Some(button) = self.inner.page().document().get_element_by_id(id) else {
            return Ok(false);
        };
        let button = button
            .dyn_into::<HtmlElement>()
            .map_err(|_| JsValue::from_str("submit button is not an HTML element"))?;
        if button.onclick().is_some() {
            return Ok(false);
        }

        let weak: Weak<WebController> = Rc::downgrade(&self.inner);
        let on_click = Closure::<dyn FnMut()>::new(move || {
            let Some(ctl) = weak.upgrade() else { return };
            spawn_local(async move {
                // Failures were already logged and, for the POST, alerted.
                let _ = ctl.export_model().await;
            });
        });
        button.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        on_click.forget();
        log::debug!("submit button #{id} wired to export");
        Ok(true)
    }
}

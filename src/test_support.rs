//! In-memory stand-ins for the browser, the network and the cell widget.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use futures::channel::oneshot;

use crate::cell::CellFactory;
use crate::config::CellOptions;
use crate::error::{GlueError, Result};
use crate::export::Download;
use crate::page::Page;
use crate::transport::Transport;

// ---------------------------------------------------------------- page

#[derive(Debug, Default)]
pub struct PageState {
    pub script: String,
    pub regions_appended: usize,
    pub submit_buttons: usize,
    pub output: Option<String>,
    pub progress: Option<String>,
    pub alerts: Vec<String>,
    pub downloads: Vec<Download>,
}

#[derive(Clone, Default)]
pub struct MockPage(pub Rc<RefCell<PageState>>);

impl MockPage {
    pub fn with_output(text: &str) -> Self {
        let page = Self::default();
        page.0.borrow_mut().output = Some(text.to_string());
        page
    }

    pub fn state(&self) -> std::cell::Ref<'_, PageState> {
        self.0.borrow()
    }
}

impl Page for MockPage {
    fn replace_script(&self, text: &str) -> Result<()> {
        self.0.borrow_mut().script = text.to_string();
        Ok(())
    }

    fn prepend_script(&self, text: &str) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.script.insert_str(0, text);
        Ok(())
    }

    fn append_cell_region(&self) -> Result<()> {
        self.0.borrow_mut().regions_appended += 1;
        Ok(())
    }

    fn ensure_submit_button(&self, _label: &str) -> Result<bool> {
        let mut state = self.0.borrow_mut();
        if state.submit_buttons > 0 {
            return Ok(false);
        }
        state.submit_buttons += 1;
        Ok(true)
    }

    fn output_text(&self) -> Result<String> {
        self.0
            .borrow()
            .output
            .clone()
            .ok_or_else(|| GlueError::MissingElement("#scad".into()))
    }

    fn show_progress(&self, notice: &str, _spinner: &str) -> Result<()> {
        self.0.borrow_mut().progress = Some(notice.to_string());
        Ok(())
    }

    fn clear_progress(&self) {
        self.0.borrow_mut().progress = None;
    }

    fn alert(&self, message: &str) {
        self.0.borrow_mut().alerts.push(message.to_string());
    }

    fn offer_download(&self, download: &Download) -> Result<()> {
        self.0.borrow_mut().downloads.push(download.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------- network

pub enum Reply {
    Text(String),
    Status(u16),
    /// Resolves when the test sends on the paired channel.
    Deferred(oneshot::Receiver<Result<String>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
}

#[derive(Default)]
pub struct NetState {
    pub scripted: VecDeque<(String, Reply)>,
    pub requests: Vec<Request>,
}

#[derive(Clone, Default)]
pub struct MockTransport(pub Rc<RefCell<NetState>>);

impl MockTransport {
    pub fn reply(&self, url: &str, reply: Reply) -> &Self {
        self.0.borrow_mut().scripted.push_back((url.to_string(), reply));
        self
    }

    pub fn text(&self, url: &str, body: &str) -> &Self {
        self.reply(url, Reply::Text(body.to_string()))
    }

    /// Script a reply that stays pending until the returned sender fires.
    pub fn deferred(&self, url: &str) -> oneshot::Sender<Result<String>> {
        let (tx, rx) = oneshot::channel();
        self.reply(url, Reply::Deferred(rx));
        tx
    }

    pub fn requests(&self) -> Vec<Request> {
        self.0.borrow().requests.clone()
    }

    async fn answer(&self, method: &'static str, url: &str, body: Option<String>) -> Result<String> {
        let reply = {
            let mut state = self.0.borrow_mut();
            state.requests.push(Request { method, url: url.to_string(), body });
            let pos = state.scripted.iter().position(|(u, _)| u == url);
            pos.and_then(|i| state.scripted.remove(i)).map(|(_, r)| r)
        };

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Status(status)) => Err(GlueError::Status { url: url.to_string(), status }),
            Some(Reply::Deferred(rx)) => rx.await.unwrap_or_else(|_| {
                Err(GlueError::Transport { url: url.to_string(), reason: "dropped".into() })
            }),
            None => Err(GlueError::Status { url: url.to_string(), status: 404 }),
        }
    }
}

impl Transport for MockTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.answer("GET", url, None).await
    }

    async fn post_text(&self, url: &str, body: String) -> Result<String> {
        self.answer("POST", url, Some(body)).await
    }
}

// ---------------------------------------------------------------- cells

#[derive(Debug, Default)]
pub struct CellLog {
    pub next_id: u32,
    pub live: BTreeSet<u32>,
    pub created: Vec<CellOptions>,
    pub disposed: Vec<u32>,
    pub fail_next: bool,
}

#[derive(Clone, Default)]
pub struct MockCells(pub Rc<RefCell<CellLog>>);

impl MockCells {
    pub fn log(&self) -> std::cell::Ref<'_, CellLog> {
        self.0.borrow()
    }
}

impl CellFactory for MockCells {
    type Handle = u32;

    fn create(&self, options: &CellOptions) -> Result<u32> {
        let mut log = self.0.borrow_mut();
        if std::mem::take(&mut log.fail_next) {
            return Err(GlueError::Cell("sagecell is not loaded".into()));
        }
        let id = log.next_id;
        log.next_id += 1;
        log.live.insert(id);
        log.created.push(options.clone());
        Ok(id)
    }

    fn dispose(&self, handle: u32) {
        let mut log = self.0.borrow_mut();
        log.live.remove(&handle);
        log.disposed.push(handle);
    }
}

//! The per-page controller: owns the live cell and wires loader, cell and export together.

use std::cell::Cell;

use crate::cell::{CellFactory, CellSlot};
use crate::config::SiteConfig;
use crate::error::{GlueError, Result};
use crate::export::{Download, ExportOutcome, ExportState, ExportStrategy, InFlight};
use crate::loader::{self, LoadedModel};
use crate::page::Page;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// A previous cell was disposed first.
    pub replaced: bool,
    pub submit_button_created: bool,
}

pub struct Controller<P, T, F: CellFactory> {
    config: SiteConfig,
    page: P,
    transport: T,
    cells: CellSlot<F>,
    export_state: Cell<ExportState>,
    /// Bumped by every load; only the newest one may write the script region.
    load_generation: Cell<u64>,
}

impl<P, T, F> Controller<P, T, F>
where
    P: Page,
    T: Transport,
    F: CellFactory,
{
    pub fn new(config: SiteConfig, page: P, transport: T, factory: F) -> Self {
        Self {
            config,
            page,
            transport,
            cells: CellSlot::new(factory),
            export_state: Cell::new(ExportState::Idle),
            load_generation: Cell::new(0),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn export_state(&self) -> ExportState {
        self.export_state.get()
    }

    pub fn has_live_cell(&self) -> bool {
        self.cells.is_live()
    }

    /// Load `model_path` behind the prelude. Starting another load before this
    /// one finishes makes this one stop with [`GlueError::Superseded`].
    pub async fn load_model(&self, model_path: &str) -> Result<LoadedModel> {
        let generation = self.load_generation.get() + 1;
        self.load_generation.set(generation);
        let is_current = || self.load_generation.get() == generation;
        loader::load_model(&self.transport, &self.page, model_path, &self.config.prelude, is_current).await
    }

    /// Load, then run `continuation` once both texts are in place.
    pub async fn load_model_then<C>(&self, model_path: &str, continuation: C) -> Result<LoadedModel>
    where
        C: FnOnce(&LoadedModel),
    {
        let loaded = self.load_model(model_path).await?;
        continuation(&loaded);
        Ok(loaded)
    }

    pub async fn load_named_model<C>(&self, name: &str, continuation: C) -> Result<LoadedModel>
    where
        C: FnOnce(&LoadedModel),
    {
        let path = self.config.model_path(name)?.to_string();
        self.load_model_then(&path, continuation).await
    }

    /// Replace the live computation cell with a fresh one bound to the script region.
    pub fn refresh_cell(&self) -> Result<RefreshOutcome> {
        let replaced = self.cells.dispose();
        if replaced {
            self.page.append_cell_region()?;
        }

        self.cells.create(&self.config.cell_options())?;

        let submit_button_created = match self.config.export_strategy() {
            ExportStrategy::PostAndDownload => self.page.ensure_submit_button(&self.config.export.submit_label)?,
            ExportStrategy::ReturnText => false,
        };

        Ok(RefreshOutcome { replaced, submit_button_created })
    }

    pub async fn export_model(&self) -> Result<ExportOutcome> {
        self.export_with(self.config.export_strategy()).await
    }

    pub async fn export_with(&self, strategy: ExportStrategy) -> Result<ExportOutcome> {
        match strategy {
            ExportStrategy::ReturnText => {
                let text = self.page.output_text()?;
                log::debug!("returning {} bytes of rendered output", text.len());
                Ok(ExportOutcome::Returned(text))
            }
            ExportStrategy::PostAndDownload => self.post_and_download().await,
        }
    }

    async fn post_and_download(&self) -> Result<ExportOutcome> {
        let Some(flight) = InFlight::begin(&self.export_state) else {
            log::warn!("STL export requested while another is in flight; ignoring");
            return Err(GlueError::ExportInFlight);
        };

        let export = &self.config.export;
        self.page.show_progress(&export.notice, &export.spinner)?;

        let geometry = match self.page.output_text() {
            Ok(text) => text,
            Err(e) => {
                self.page.clear_progress();
                return Err(e);
            }
        };
        log::debug!("posting {} bytes to {}", geometry.len(), export.endpoint);

        let reply = self.transport.post_text(&export.endpoint, geometry).await;
        self.page.clear_progress();

        match reply {
            Ok(stl) => {
                flight.advance(ExportState::Downloading);
                let download = Download::new(export.filename.clone(), stl);
                self.page.offer_download(&download)?;
                log::info!("offered {} ({} bytes)", download.filename, download.contents.len());
                Ok(ExportOutcome::Downloaded(download))
            }
            Err(e) => {
                flight.advance(ExportState::Alerted);
                log::error!("STL generation failed: {e}");
                self.page.alert(&export.failure_message);
                Err(e)
            }
        }
    }

    /// Release the live cell; called when the page goes away.
    pub fn teardown(&self) {
        self.cells.dispose();
    }
}

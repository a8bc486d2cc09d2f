//! Two-stage model loading: model text first, then the shared prelude in front of it.

use std::fmt;

use crate::error::{GlueError, Result};
use crate::page::Page;
use crate::transport::Transport;

/// What ended up in the script region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModel {
    pub model_path: String,
    pub model_len: usize,
    pub prelude_len: usize,
}

impl fmt::Display for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` ({} + {} bytes)", self.model_path, self.prelude_len, self.model_len)
    }
}

/// Fetch `model_path` into the script region, then prepend `prelude_path`.
///
/// The prelude is only requested once the model text is in place. A failed
/// stage stops the pipeline and leaves the region as the last completed stage
/// wrote it. `is_current` is consulted before every write; once it turns false
/// a newer load owns the region and this one stops with [`GlueError::Superseded`].
pub async fn load_model<T, P, C>(
    transport: &T,
    page: &P,
    model_path: &str,
    prelude_path: &str,
    is_current: C,
) -> Result<LoadedModel>
where
    T: Transport,
    P: Page,
    C: Fn() -> bool,
{
    let superseded = || {
        log::debug!("load of `{model_path}` superseded by a newer one");
        GlueError::Superseded(model_path.to_string())
    };

    log::debug!("fetching model `{model_path}`");
    let model = transport.get_text(model_path).await.inspect_err(|e| {
        log::error!("could not load model `{model_path}`: {e}");
    })?;
    if !is_current() {
        return Err(superseded());
    }
    page.replace_script(&model)?;

    log::debug!("fetching prelude `{prelude_path}`");
    let prelude = transport.get_text(prelude_path).await.inspect_err(|e| {
        log::error!("could not load prelude `{prelude_path}`: {e}");
    })?;
    if !is_current() {
        return Err(superseded());
    }
    page.prepend_script(&prelude)?;

    let loaded = LoadedModel {
        model_path: model_path.to_string(),
        model_len: model.len(),
        prelude_len: prelude.len(),
    };
    log::info!("loaded {loaded}");
    Ok(loaded)
}

//! Page configuration.
//!
//! The two shipped pages differ only in a handful of constants, so they are
//! modelled as presets of one [`SiteConfig`]. A page may pass a JSON object
//! that is deep-merged over the preset named by its `variant` field.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GlueError, Result};
use crate::export::ExportStrategy;

/// Which of the two page layouts is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Auto-evaluating cell, hidden controls, "Generate STL" button posting to the server.
    #[default]
    Builder,
    /// Manual "Create Model" button; export hands the text back to the caller.
    Local,
}

/// UI parts of the cell widget that can be suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HiddenElement {
    Editor,
    EvalButton,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub variant: Variant,
    /// Class/prelude file prepended to every model.
    pub prelude: String,
    /// Named model files offered by the page.
    pub models: BTreeMap<String, String>,
    /// Filter handed to `log::set_max_level` (`off`, `error`, … `trace`).
    pub log_level: String,
    pub layout: Layout,
    pub cell: CellConfig,
    pub export: ExportConfig,
}

/// Selectors and element ids the controller touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Region holding prelude + model text; the cell reads its code from here.
    pub script: String,
    /// Selector of the regions the widget turns into cells.
    pub input_location: String,
    /// Parent that receives a fresh cell region after a teardown.
    pub cell_container: String,
    pub fresh_cell_id: String,
    pub fresh_cell_class: String,
    /// Element whose text is the rendered geometry.
    pub output_id: String,
    /// Holds the submit button and the progress notice.
    pub controls_id: String,
    pub message_id: String,
    pub submit_button_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    pub editor: String,
    pub autoeval: Option<bool>,
    pub hide: Option<Vec<HiddenElement>>,
    pub eval_button_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub strategy: Option<ExportStrategy>,
    pub endpoint: String,
    pub filename: String,
    pub submit_label: String,
    pub notice: String,
    pub spinner: String,
    pub failure_message: String,
}

/// Options object understood by `sagecell.makeSagecell`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellOptions {
    pub input_location: String,
    pub editor: String,
    pub code_location: String,
    pub autoeval: bool,
    pub hide: Vec<HiddenElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_button_text: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::for_variant(Variant::Builder)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            script: "#sage_script".into(),
            input_location: ".sage".into(),
            cell_container: ".cell_container".into(),
            fresh_cell_id: "main".into(),
            fresh_cell_class: "sage".into(),
            output_id: "scad".into(),
            controls_id: "get_models".into(),
            message_id: "message".into(),
            submit_button_id: "generate_stl".into(),
        }
    }
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            editor: "codemirror-readonly".into(),
            autoeval: None,
            hide: None,
            eval_button_text: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            strategy: None,
            endpoint: "/generate_stl".into(),
            filename: "output.stl".into(),
            submit_label: "Generate STL".into(),
            notice: "Make sure you've clicked 'Create model' and chosen what parameters to use. \
                     This may take several minutes. A download window will appear when the STL \
                     file has been generated."
                .into(),
            spinner: "assets/ajax-loader.gif".into(),
            failure_message: "Could not generate stl file".into(),
        }
    }
}

impl SiteConfig {
    /// Preset matching one of the two shipped pages.
    pub fn for_variant(variant: Variant) -> Self {
        let (prelude, models): (&str, &[(&str, &str)]) = match variant {
            Variant::Builder => (
                "builder/classes/model.sage",
                &[("weyl", "builder/weyl.sage"), ("reflections", "builder/reflections.sage")],
            ),
            Variant::Local => (
                "classes/model.sage",
                &[
                    ("weyl", "weyl-short.sage"),
                    ("reflections-short", "dev_models-short.sage"),
                    ("reflections", "refl-models.sage"),
                    ("dummy", "dummy.sage"),
                ],
            ),
        };

        Self {
            variant,
            prelude: prelude.into(),
            models: models.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            log_level: "debug".into(),
            layout: Layout::default(),
            cell: CellConfig::default(),
            export: ExportConfig::default(),
        }
    }

    /// Parse page-supplied JSON, layering it over the preset of its `variant`.
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(json)?;
        if !overrides.is_object() {
            return Err(GlueError::Config("expected a JSON object".into()));
        }

        let variant = match overrides.get("variant") {
            Some(v) => Variant::deserialize(v)?,
            None => Variant::default(),
        };

        let mut merged = serde_json::to_value(Self::for_variant(variant))?;
        merge(&mut merged, overrides);
        let config: Self = serde_json::from_value(merged)?;
        config.log_filter()?;
        Ok(config)
    }

    pub fn log_filter(&self) -> Result<log::LevelFilter> {
        log::LevelFilter::from_str(&self.log_level)
            .map_err(|_| GlueError::Config(format!("unknown log level `{}`", self.log_level)))
    }

    pub fn export_strategy(&self) -> ExportStrategy {
        self.export.strategy.unwrap_or(match self.variant {
            Variant::Builder => ExportStrategy::PostAndDownload,
            Variant::Local => ExportStrategy::ReturnText,
        })
    }

    pub fn model_path(&self, name: &str) -> Result<&str> {
        self.models
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| GlueError::UnknownModel(name.to_string()))
    }

    /// Widget options for this variant, with per-field overrides applied.
    pub fn cell_options(&self) -> CellOptions {
        let (autoeval, hide, eval_button_text) = match self.variant {
            Variant::Builder => (true, vec![HiddenElement::Editor, HiddenElement::EvalButton], None),
            Variant::Local => (false, vec![HiddenElement::Editor], Some("Create Model".to_string())),
        };

        CellOptions {
            input_location: self.layout.input_location.clone(),
            editor: self.cell.editor.clone(),
            code_location: self.layout.script.clone(),
            autoeval: self.cell.autoeval.unwrap_or(autoeval),
            hide: self.cell.hide.clone().unwrap_or(hide),
            eval_button_text: self.cell.eval_button_text.clone().or(eval_button_text),
        }
    }
}

// Objects merge key by key; anything else is replaced.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

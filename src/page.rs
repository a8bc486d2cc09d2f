use crate::error::Result;
use crate::export::Download;

/// The handful of DOM mutations the controller performs.
///
/// Implementors resolve element selectors from their own [`Layout`](crate::config::Layout);
/// callers only say *what* should change.
pub trait Page {
    /// Replace the script region's content with `text`.
    fn replace_script(&self, text: &str) -> Result<()>;

    /// Insert `text` before whatever the script region currently holds.
    fn prepend_script(&self, text: &str) -> Result<()>;

    /// Append an empty cell region for the next widget instance.
    fn append_cell_region(&self) -> Result<()>;

    /// Create the submit button unless one is already there. Returns `true` if it was created.
    fn ensure_submit_button(&self, label: &str) -> Result<bool>;

    /// Text rendered by the widget into the output element.
    fn output_text(&self) -> Result<String>;

    fn show_progress(&self, notice: &str, spinner: &str) -> Result<()>;

    /// Remove the progress notice; no-op when absent.
    fn clear_progress(&self);

    fn alert(&self, message: &str);

    /// Hand `download` to the browser's save mechanism.
    fn offer_download(&self, download: &Download) -> Result<()>;
}

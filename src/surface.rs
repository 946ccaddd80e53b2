use crate::render::ResultsView;
use crate::worker::WorkerRegistrar;

/// The widgets a [`crate::ProofreadingClient`] drives: the input field, the
/// word-count label, the error-message slot, the submit button, and the
/// results container.
pub trait Surface {
    /// Current contents of the input field.
    fn text(&self) -> String;

    fn set_text(&mut self, text: &str);

    fn set_word_count_label(&mut self, label: &str);

    /// Marks the word-count label as being in an error state.
    fn set_counter_error(&mut self, error: bool);

    /// An empty message clears the slot.
    fn set_error_message(&mut self, message: &str);

    fn set_submit_enabled(&mut self, enabled: bool);

    fn set_submit_label(&mut self, label: &str);

    /// Replaces the results area.
    fn show_results(&mut self, view: ResultsView);

    /// Hosts able to run an offline asset-caching worker return a registrar.
    fn worker_registrar(&mut self) -> Option<&mut dyn WorkerRegistrar> {
        None
    }
}

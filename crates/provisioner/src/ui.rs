use types::Ui;

/// [`Ui`] that forwards notices to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUi;

impl Ui for TracingUi {
    fn say(&self, message: &str) {
        tracing::info!(target: "orka_builder::ui", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "orka_builder::ui", "{message}");
    }
}

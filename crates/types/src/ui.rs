/// Sink for human-readable progress and error notices.
pub trait Ui: Send + Sync {
    fn say(&self, message: &str);

    fn error(&self, message: &str);
}

/// Local side effects the flows trigger: a desktop-style notification and a
/// celebration after a successful upload.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);

    fn celebrate(&self, student_name: &str);
}

/// Writes both effects to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!(title, body, "Notification");
    }

    fn celebrate(&self, student_name: &str) {
        tracing::info!(student_name, "Upload celebrated");
    }
}

use crate::milestone::Milestone;

/// Local notification display seam. The presentation layer (the platform's
/// notification API) implements this; the countdown notifier only decides
/// when to call it.
pub trait Notifier: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn notify<'a>(&'a self, milestone: &'a Milestone) -> Self::Fut<'a>;
}

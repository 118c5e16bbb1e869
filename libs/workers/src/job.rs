use eyre::Result;
use std::{future::Future, pin::Pin};

type ExecFn<T> = dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<T>> + Send>> + Send;

/// A unit of work for the pool: a typed closure capturing its own arguments,
/// executed at most once.
pub struct Job<T> {
    exec: Box<ExecFn<T>>,
}

impl<T> Job<T> {
    pub fn new<F, Fut>(exec: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self { exec: Box::new(move || Box::pin(exec())) }
    }

    pub(crate) async fn execute(self) -> Result<T> {
        (self.exec)().await
    }
}

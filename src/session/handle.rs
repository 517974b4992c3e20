//! Shared handle with an in-flight guard
//!
//! Only one Run/Step/Back may be in flight. A second request while one is
//! running is refused with [`SessionError::Busy`] instead of queueing.
//! Reset never waits its turn: it raises the cancel flag first so the
//! in-flight action bails out at its next checkpoint, then takes the lock.

use super::{BackOutcome, RunOutcome, Session, SessionError, SessionView, StepOutcome};
use crate::animation::Renderer;
use crate::executor::CodeExecutor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

pub struct SharedSession<E: CodeExecutor, R: Renderer> {
    inner: Arc<Mutex<Session<E, R>>>,
    cancel: Arc<AtomicBool>,
    view: watch::Receiver<SessionView>,
}

impl<E: CodeExecutor, R: Renderer> Clone for SharedSession<E, R> {
    fn clone(&self) -> Self {
        SharedSession {
            inner: Arc::clone(&self.inner),
            cancel: Arc::clone(&self.cancel),
            view: self.view.clone(),
        }
    }
}

impl<E: CodeExecutor, R: Renderer> SharedSession<E, R> {
    pub fn new(session: Session<E, R>) -> Self {
        let cancel = session.cancel_flag();
        let view = session.subscribe();
        SharedSession {
            inner: Arc::new(Mutex::new(session)),
            cancel,
            view,
        }
    }

    /// Latest published state; never blocks
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// An action is in flight
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    pub async fn run(&self, source: &str) -> Result<RunOutcome, SessionError> {
        let mut session = self.inner.try_lock().map_err(|_| SessionError::Busy)?;
        session.run(source).await
    }

    pub async fn step(&self) -> Result<StepOutcome, SessionError> {
        let mut session = self.inner.try_lock().map_err(|_| SessionError::Busy)?;
        session.step().await
    }

    pub async fn back(&self) -> Result<BackOutcome, SessionError> {
        let mut session = self.inner.try_lock().map_err(|_| SessionError::Busy)?;
        session.back().await
    }

    /// Cancel whatever is in flight and discard the run.
    pub async fn reset(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        let mut session = self.inner.lock().await;
        session.reset();
    }

    /// Read the session once no action is in flight
    pub async fn inspect<T>(&self, f: impl FnOnce(&Session<E, R>) -> T) -> T {
        let session = self.inner.lock().await;
        f(&session)
    }
}

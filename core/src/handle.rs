//! Shared, once-transitioning readiness gate around an [`Engine`].

use crate::engine::Engine;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Readiness {
    NotReady,
    Ready(Arc<Engine>),
    Failed(String),
}

/// Status without the engine payload, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotReady,
    Ready,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotReady => "not_ready",
            Status::Ready => "ready",
            Status::Failed => "failed",
        }
    }
}

/// Clone freely; all clones observe the same transition.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    state: Arc<RwLock<Readiness>>,
}

impl Default for EngineHandle {
    fn default() -> Self { Self::new() }
}

impl EngineHandle {
    pub fn new() -> Self {
        Self { state: Arc::new(RwLock::new(Readiness::NotReady)) }
    }

    pub fn ready(engine: Engine) -> Self {
        Self { state: Arc::new(RwLock::new(Readiness::Ready(Arc::new(engine)))) }
    }

    /// Move to `Ready` or `Failed`. Returns false if the handle already left `NotReady`.
    pub fn complete(&self, outcome: Result<Engine, String>) -> bool {
        let mut state = self.state.write();
        if !matches!(*state, Readiness::NotReady) {
            tracing::warn!("engine handle already transitioned; ignoring");
            return false;
        }
        *state = match outcome {
            Ok(engine) => Readiness::Ready(Arc::new(engine)),
            Err(msg) => {
                tracing::error!(error = %msg, "engine build failed");
                Readiness::Failed(msg)
            }
        };
        true
    }

    pub fn status(&self) -> Status {
        match &*self.state.read() {
            Readiness::NotReady => Status::NotReady,
            Readiness::Ready(_) => Status::Ready,
            Readiness::Failed(_) => Status::Failed,
        }
    }

    pub fn readiness(&self) -> Readiness { self.state.read().clone() }

    /// The engine, once ready.
    pub fn get(&self) -> Option<Arc<Engine>> {
        match &*self.state.read() {
            Readiness::Ready(engine) => Some(Arc::clone(engine)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_once() {
        let handle = EngineHandle::new();
        let clone = handle.clone();
        assert_eq!(handle.status(), Status::NotReady);
        assert!(handle.get().is_none());

        assert!(clone.complete(Ok(Engine::from_items(Vec::new()))));
        assert_eq!(handle.status(), Status::Ready);
        assert!(handle.get().is_some());

        assert!(!handle.complete(Err("late".into())));
        assert_eq!(handle.status(), Status::Ready);
    }

    #[test]
    fn failure_is_reported() {
        let handle = EngineHandle::new();
        handle.complete(Err("missing corpus".into()));
        assert_eq!(handle.status(), Status::Failed);
        assert!(matches!(handle.readiness(), Readiness::Failed(m) if m == "missing corpus"));
    }
}

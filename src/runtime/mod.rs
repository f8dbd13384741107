//! Client Runtime
//!
//! Owns the page and wires the pieces together:
//!
//! ```text
//! click / submit ─▶ capture ─▶ HttpChannel ─┐
//!                                           ├─▶ apply_and_store ─▶ Dom + StateStore
//! ConnectionManager (push frames) ──────────┘
//! ```
//!
//! Both channels end in the same [`Runtime::apply_and_store`], which applies
//! a change-set and swaps the snapshot inside one critical section. Whichever
//! update completes last wins.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::apply::{ApplyError, ApplyOptions, ApplyReport, apply};
use crate::capture::{CaptureOptions, SubmitEvent, click_payload, submit_payload};
use crate::core::ShutdownSignal;
use crate::dom::Dom;
use crate::error::ClientError;
use crate::lifecycle::{ConnectionManager, LifecycleExit};
use crate::protocol::InboundMessage;
use crate::store::StateStore;
use crate::transport::HttpChannel;


#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub apply: ApplyOptions,
    pub capture: CaptureOptions,
}

/// Application context for one page.
pub struct Runtime<D: Dom> {
    dom: Arc<Mutex<D>>,
    store: StateStore,
    http: HttpChannel,
    push: Option<ConnectionManager>,
    options: RuntimeOptions,
}

impl<D: Dom> Runtime<D> {
    pub fn new(dom: D, store: StateStore, http: HttpChannel, options: RuntimeOptions) -> Self {
        Self {
            dom: Arc::new(Mutex::new(dom)),
            store,
            http,
            push: None,
            options,
        }
    }

    /// Enable the push channel.
    pub fn with_push(mut self, manager: ConnectionManager) -> Self {
        self.push = Some(manager);
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn http(&self) -> &HttpChannel {
        &self.http
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Lock the page. Do not hold the guard across an await.
    pub fn dom(&self) -> MutexGuard<'_, D> {
        self.dom.lock()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Apply `msg.changes`, then store `msg.state`, without interleaving.
    ///
    /// A rejected change-set (`fail` policy) leaves both page and state as
    /// they were.
    pub fn apply_and_store(&self, msg: InboundMessage) -> Result<ApplyReport, ApplyError> {
        let mut dom = self.dom.lock();
        let report = apply(&mut *dom, &msg.changes, &self.options.apply)?;
        self.store.set(msg.state);
        Ok(report)
    }

    /// Send a click on `elem_id` and apply the response.
    pub async fn click(&self, elem_id: &str) -> Result<ApplyReport, ClientError> {
        let payload = click_payload(&self.store, elem_id);
        let msg = self.http.send_event(&payload).await?;
        Ok(self.apply_and_store(msg)?)
    }

    /// Handle a submit event: suppress native submission, capture the form,
    /// send it and apply the response.
    pub async fn submit(&self, event: &mut SubmitEvent<D::Node>) -> Result<ApplyReport, ClientError> {
        event.prevent_default();

        let payload = {
            let dom = self.dom.lock();
            submit_payload(&*dom, &self.store, event.source, &self.options.capture)?
        };
        let msg = self.http.send_event(&payload).await?;
        Ok(self.apply_and_store(msg)?)
    }

    /// Run the push lifecycle, applying every update.
    pub async fn run_push(&self, shutdown: ShutdownSignal) -> Result<LifecycleExit, ClientError> {
        self.run_push_with(shutdown, |_| {}).await
    }

    /// Like [`run_push`](Self::run_push), reporting each update's outcome to `observe`.
    pub async fn run_push_with<F>(
        &self,
        shutdown: ShutdownSignal,
        mut observe: F,
    ) -> Result<LifecycleExit, ClientError>
    where
        F: FnMut(&Result<ApplyReport, ApplyError>),
    {
        let Some(manager) = &self.push else {
            return Err(ClientError::PushDisabled);
        };

        let exit = manager
            .run(shutdown, |msg| {
                let outcome = self.apply_and_store(msg);
                if let Err(e) = &outcome {
                    crate::log!("apply"; "push update rejected: {}", e);
                }
                observe(&outcome);
            })
            .await;
        Ok(exit)
    }
}

//! Deferral of non-critical work to browser idle time.
//!
//! Telemetry must never compete with rendering. In the browser, work passed to
//! [`schedule`] runs from `requestIdleCallback`, or from a zero-delay timeout
//! where idle callbacks are unsupported. Native builds have no render loop and
//! run it inline.

#[cfg(test)]
#[path = "idle_test.rs"]
mod idle_test;

#[cfg(feature = "hydrate")]
use std::cell::RefCell;
#[cfg(feature = "hydrate")]
use std::rc::Rc;

#[cfg(feature = "hydrate")]
use gloo_timers::callback::Timeout;
#[cfg(feature = "hydrate")]
use wasm_bindgen::{JsCast, closure::Closure};

/// Run `work` when the host is idle. Fire-and-forget: there is no completion
/// signal and a dropped callback is not retried.
pub fn schedule<F>(work: F)
where
    F: FnOnce() + 'static,
{
    #[cfg(feature = "hydrate")]
    {
        let Some(window) = web_sys::window() else {
            work();
            return;
        };

        let slot: Rc<RefCell<Option<F>>> = Rc::new(RefCell::new(Some(work)));
        let slot_for_idle = Rc::clone(&slot);
        let on_idle = Closure::once_into_js(move || run_slot(&slot_for_idle));

        if window
            .request_idle_callback(on_idle.unchecked_ref())
            .is_err()
        {
            Timeout::new(0, move || run_slot(&slot)).forget();
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        work();
    }
}

#[cfg(feature = "hydrate")]
fn run_slot<F: FnOnce()>(slot: &Rc<RefCell<Option<F>>>) {
    let work = slot.borrow_mut().take();
    if let Some(work) = work {
        work();
    }
}

//! Async drivers for the scanner's host requests.
//!
//! Each function splits a request into the scanner's begin/finish halves and
//! awaits the host in between. The `RefCell` borrow is never held across an
//! await point, so frame ticks, timers and visibility events can reach the
//! scanner while a request is pending.

use std::cell::RefCell;

use crate::acquire::{acquire_stream, MediaDevices};
use crate::platform::Platform;
use crate::scanner::{LifecycleState, Playback, Scanner, StartRequest, TorchRequest};

/// Acquire a camera stream, start playback and begin scanning.
///
/// A no-op unless the scanner is stopped. Returns the resulting state.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip_all))]
pub async fn start<P, D>(scanner: &RefCell<Scanner<P>>, devices: &D) -> LifecycleState
where
    P: Platform,
    D: MediaDevices<Stream = P::Stream>,
{
    let request = scanner.borrow_mut().begin_start();
    let Some(StartRequest { token, plan }) = request else {
        return scanner.borrow().state();
    };

    let acquired = acquire_stream(devices, &plan).await;
    let playback = scanner.borrow_mut().finish_acquire(token, acquired);
    if let Some(Playback { epoch, request }) = playback {
        let result = request.await;
        scanner.borrow_mut().finish_playback(epoch, result);
    }

    scanner.borrow().state()
}

/// Flip the torch of the active track, if any.
pub async fn toggle_torch<P: Platform>(scanner: &RefCell<Scanner<P>>) {
    let request = scanner.borrow_mut().begin_torch_toggle();
    if let Some(TorchRequest {
        epoch,
        target,
        request,
    }) = request
    {
        let result = request.await;
        scanner
            .borrow_mut()
            .finish_torch_toggle(epoch, target, result);
    }
}

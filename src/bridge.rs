//! The callback trampolines libFLAC calls into.
//!
//! libFLAC's decoder is push-style: while it processes input it calls three C function pointers
//! (error, metadata, write) with an opaque `client_data` pointer it was given at init time. This
//! module supplies those function pointers and turns each call into a [`DecodeHandler`] call.
//!
//! Registration model:
//! - a [`Session<H>`] owns one handler plus the per-registration [`SessionId`]
//! - the session's address is the `client_data` token, so there is no global registry and no
//!   state shared between sessions
//! - [`Session::callbacks`] returns trampolines monomorphized for `H`, so the token is always
//!   cast back to the right type
//! - a [`Registration<H>`] pins a session on the heap for as long as a native decoder may call
//!   back into it, and is the only way the session is reached while it is registered
//!
//! Boundary rules (libFLAC is C; unwinding into it is undefined behavior):
//! - every handler call runs under `catch_unwind`
//! - handler errors and panics are logged and swallowed for error/metadata callbacks
//! - for the write callback they become `FLAC__STREAM_DECODER_WRITE_STATUS_ABORT`
//! - once a session has aborted, further write callbacks answer ABORT without reaching the
//!   handler

use std::any::Any;
use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;

use crate::ffi::{
    ErrorCallback, FLAC__Frame, FLAC__StreamDecoder, FLAC__StreamDecoderErrorStatus,
    FLAC__StreamDecoderWriteStatus, FLAC__StreamMetadata, FLAC__int32, MetadataCallback,
    WriteCallback,
};
use crate::frame::Frame;
use crate::handler::{CallbackContext, DecodeHandler, DecoderHandle, SessionId};
use crate::metadata::Metadata;
use crate::status::{ErrorStatus, WriteStatus};

/// The three trampolines for one handler type, ready to hand to `FLAC__stream_decoder_init_*`.
#[derive(Clone, Copy)]
pub struct Callbacks {
    pub error: ErrorCallback,
    pub metadata: MetadataCallback,
    pub write: WriteCallback,
}

/// One registration: a handler and the context value its callbacks report.
pub struct Session<H> {
    id: SessionId,
    handler: H,
    aborted: bool,
}

impl<H: DecodeHandler> Session<H> {
    pub fn new(handler: H) -> Self {
        Self::with_id(SessionId::next(), handler)
    }

    pub fn with_id(id: SessionId, handler: H) -> Self {
        Self {
            id,
            handler,
            aborted: false,
        }
    }

    /// Trampolines that expect a `client_data` produced by [`Session::as_client_data`] on a
    /// `Session<H>`.
    pub fn callbacks() -> Callbacks {
        Callbacks {
            error: error_callback::<H>,
            metadata: metadata_callback::<H>,
            write: write_callback::<H>,
        }
    }

    /// The opaque token to pass as libFLAC's `client_data`.
    ///
    /// The pointer is valid as long as the session is neither moved nor dropped, and nothing
    /// else may borrow the session while libFLAC is running callbacks with it. For a token that
    /// outlives a borrow, register the session with [`Registration::new`] instead.
    pub fn as_client_data(&mut self) -> *mut c_void {
        (self as *mut Self).cast()
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Whether a write callback has answered ABORT.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Clear the abort latch, e.g. before re-initializing the native decoder.
    pub fn reset(&mut self) {
        self.aborted = false;
    }
}

/// A session parked on the heap while a native decoder holds its address.
///
/// The registration owns the allocation through a raw pointer, so handing out
/// [`client_data`](Self::client_data) and later reaching the session through
/// [`session`](Self::session)/[`session_mut`](Self::session_mut) never invalidates the token,
/// and moving the registration itself does not move the session.
pub struct Registration<H> {
    ptr: NonNull<Session<H>>,
}

impl<H: DecodeHandler> Registration<H> {
    pub fn new(session: Session<H>) -> Self {
        Self {
            ptr: NonNull::from(Box::leak(Box::new(session))),
        }
    }

    /// The `client_data` token for this session. Stable for the registration's lifetime.
    pub fn client_data(&self) -> *mut c_void {
        self.ptr.as_ptr().cast()
    }

    pub fn session(&self) -> &Session<H> {
        // SAFETY: `ptr` came from `Box::leak` and is freed only by `into_session`/`drop`.
        unsafe { self.ptr.as_ref() }
    }

    pub fn session_mut(&mut self) -> &mut Session<H> {
        // SAFETY: as in `session`; `&mut self` rules out other Rust borrows.
        unsafe { self.ptr.as_mut() }
    }

    /// Take the session back. The caller must make sure no native decoder can still call back
    /// with [`client_data`](Self::client_data).
    pub fn into_session(self) -> Session<H> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `ptr` came from `Box::leak`, and `Drop` will not run for `this`.
        *unsafe { Box::from_raw(this.ptr.as_ptr()) }
    }
}

impl<H> Drop for Registration<H> {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `Box::leak` and has not been reclaimed.
        drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
    }
}

// The registration is the unique owner of its session.
unsafe impl<H: Send> Send for Registration<H> {}

/// `FLAC__StreamDecoderErrorCallback` for `Session<H>`.
///
/// # Safety
/// `client_data` must be null or come from [`Session::as_client_data`] or
/// [`Registration::client_data`] for a live `Session<H>` that nothing else is borrowing for the
/// duration of the call.
pub unsafe extern "C" fn error_callback<H: DecodeHandler>(
    decoder: *const FLAC__StreamDecoder,
    status: FLAC__StreamDecoderErrorStatus,
    client_data: *mut c_void,
) {
    let Some(session) = (unsafe { session_from::<H>(client_data) }) else {
        tracing::warn!("FLAC error callback without client data; dropping it");
        return;
    };

    let ctx = session.context(decoder);
    let status = ErrorStatus::from_raw(status);
    tracing::debug!(session = ctx.session.0, %status, "dispatching FLAC stream error");

    let handler = &mut session.handler;
    dispatch("error", &ctx, || handler.on_error(&ctx, status));
}

/// `FLAC__StreamDecoderMetadataCallback` for `Session<H>`.
///
/// # Safety
/// Same contract as [`error_callback`]; `metadata` must be null or a record delivered by
/// libFLAC for this call.
pub unsafe extern "C" fn metadata_callback<H: DecodeHandler>(
    decoder: *const FLAC__StreamDecoder,
    metadata: *const FLAC__StreamMetadata,
    client_data: *mut c_void,
) {
    let Some(session) = (unsafe { session_from::<H>(client_data) }) else {
        tracing::warn!("FLAC metadata callback without client data; dropping it");
        return;
    };
    let ctx = session.context(decoder);

    let Some(record) = (unsafe { metadata.as_ref() }) else {
        tracing::warn!(session = ctx.session.0, "FLAC metadata callback with a null record");
        return;
    };

    // Copy everything out before the handler runs: the record dies with this call.
    let Some(metadata) = guard("metadata", &ctx, || unsafe { Metadata::from_raw(record) }) else {
        return;
    };
    tracing::debug!(session = ctx.session.0, kind = ?metadata.kind(), "dispatching FLAC metadata");

    let handler = &mut session.handler;
    dispatch("metadata", &ctx, || handler.on_metadata(&ctx, &metadata));
}

/// `FLAC__StreamDecoderWriteCallback` for `Session<H>`.
///
/// Always returns `FLAC__STREAM_DECODER_WRITE_STATUS_CONTINUE` or `_ABORT`.
///
/// # Safety
/// Same contract as [`error_callback`]; `frame` and `buffer` must be null or the frame and
/// per-channel sample arrays libFLAC delivered for this call.
pub unsafe extern "C" fn write_callback<H: DecodeHandler>(
    decoder: *const FLAC__StreamDecoder,
    frame: *const FLAC__Frame,
    buffer: *const *const FLAC__int32,
    client_data: *mut c_void,
) -> FLAC__StreamDecoderWriteStatus {
    let Some(session) = (unsafe { session_from::<H>(client_data) }) else {
        tracing::warn!("FLAC write callback without client data; aborting");
        return WriteStatus::Abort.as_raw();
    };
    let ctx = session.context(decoder);

    if session.aborted {
        return WriteStatus::Abort.as_raw();
    }

    let Some(frame) = (unsafe { Frame::from_raw(frame, buffer) }) else {
        tracing::warn!(session = ctx.session.0, "malformed FLAC frame; aborting");
        session.aborted = true;
        return WriteStatus::Abort.as_raw();
    };

    let handler = &mut session.handler;
    let status = dispatch("write", &ctx, || handler.on_write(&ctx, &frame))
        .unwrap_or(WriteStatus::Abort);

    if status == WriteStatus::Abort {
        tracing::debug!(session = ctx.session.0, "write handler aborted decoding");
        session.aborted = true;
    }
    status.as_raw()
}

impl<H> Session<H> {
    fn context(&self, decoder: *const FLAC__StreamDecoder) -> CallbackContext {
        CallbackContext {
            session: self.id,
            decoder: DecoderHandle::from_raw(decoder),
        }
    }
}

unsafe fn session_from<'s, H>(client_data: *mut c_void) -> Option<&'s mut Session<H>> {
    unsafe { client_data.cast::<Session<H>>().as_mut() }
}

/// Run a handler call, logging (and discarding) errors and panics.
fn dispatch<T>(
    callback: &'static str,
    ctx: &CallbackContext,
    call: impl FnOnce() -> anyhow::Result<T>,
) -> Option<T> {
    match guard(callback, ctx, call)? {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                session = ctx.session.0,
                callback,
                error = %format!("{err:#}"),
                "FLAC {callback} handler failed"
            );
            None
        }
    }
}

/// Run `call`, stopping any panic at this frame.
fn guard<T>(callback: &'static str, ctx: &CallbackContext, call: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(value) => Some(value),
        Err(payload) => {
            tracing::error!(
                session = ctx.session.0,
                callback,
                panic = panic_message(payload.as_ref()),
                "FLAC {callback} handler panicked"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}

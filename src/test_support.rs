//! Fakes shared by the unit tests.

use crate::audio::{AudioBackend, AudioDevice, AudioError, ToneSpec};
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResumeBehavior {
    Immediate,
    /// Resolves when the test calls [`FakeAudio::complete_resume`].
    Deferred,
    Reject,
}

#[derive(Default)]
struct FakeInner {
    opens: Cell<u32>,
    plays: Cell<u32>,
    closes: Cell<u32>,
    fail_open: Cell<bool>,
    fail_tones: Cell<bool>,
    suspended: Cell<Option<ResumeBehavior>>,
    pending_resume: RefCell<Option<oneshot::Sender<Result<(), AudioError>>>>,
}

/// Counts every device interaction so tests can assert on them after the
/// emitter has taken ownership of the backend.
#[derive(Clone, Default)]
pub(crate) struct FakeAudio {
    inner: Rc<FakeInner>,
}

impl FakeAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_open(self) -> Self {
        self.inner.fail_open.set(true);
        self
    }

    pub fn failing_tones(self) -> Self {
        self.inner.fail_tones.set(true);
        self
    }

    pub fn suspended(self, behavior: ResumeBehavior) -> Self {
        self.inner.suspended.set(Some(behavior));
        self
    }

    pub fn backend(&self) -> FakeBackend {
        FakeBackend {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn opens(&self) -> u32 {
        self.inner.opens.get()
    }

    /// Tone requests that reached the device, failed ones included.
    pub fn plays(&self) -> u32 {
        self.inner.plays.get()
    }

    pub fn closes(&self) -> u32 {
        self.inner.closes.get()
    }

    pub fn complete_resume(&self, outcome: Result<(), AudioError>) {
        if let Some(tx) = self.inner.pending_resume.borrow_mut().take() {
            let _ = tx.send(outcome);
        }
    }
}

pub(crate) struct FakeBackend {
    inner: Rc<FakeInner>,
}

impl AudioBackend for FakeBackend {
    fn open(&self) -> Result<Rc<dyn AudioDevice>, AudioError> {
        self.inner.opens.set(self.inner.opens.get() + 1);
        if self.inner.fail_open.get() {
            return Err(AudioError::Unavailable("no output device".into()));
        }
        Ok(Rc::new(FakeDevice {
            inner: Rc::clone(&self.inner),
        }))
    }
}

struct FakeDevice {
    inner: Rc<FakeInner>,
}

impl AudioDevice for FakeDevice {
    fn is_suspended(&self) -> bool {
        self.inner.suspended.get().is_some()
    }

    fn resume(&self) -> LocalBoxFuture<'static, Result<(), AudioError>> {
        match self.inner.suspended.get() {
            None | Some(ResumeBehavior::Immediate) => future::ready(Ok(())).boxed_local(),
            Some(ResumeBehavior::Reject) => {
                future::ready(Err(AudioError::ResumeRejected("not allowed".into()))).boxed_local()
            }
            Some(ResumeBehavior::Deferred) => {
                let (tx, rx) = oneshot::channel();
                *self.inner.pending_resume.borrow_mut() = Some(tx);
                async move {
                    rx.await
                        .unwrap_or_else(|_| Err(AudioError::ResumeRejected("cancelled".into())))
                }
                .boxed_local()
            }
        }
    }

    fn play_tone(&self, _tone: &ToneSpec) -> Result<(), AudioError> {
        self.inner.plays.set(self.inner.plays.get() + 1);
        if self.inner.fail_tones.get() {
            return Err(AudioError::Synthesis("oscillator refused".into()));
        }
        Ok(())
    }

    fn close(&self) {
        self.inner.closes.set(self.inner.closes.get() + 1);
    }
}

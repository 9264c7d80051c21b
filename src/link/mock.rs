// Mock link for testing

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{Link, LinkError, RawSample};

/// Mock link for unit testing. Clones share the same buffers, so a test can
/// keep a handle while the pilot owns the link.
#[derive(Clone)]
pub struct MockLink {
    inner: Arc<Mutex<MockLinkInner>>,
}

#[derive(Default)]
struct MockLinkInner {
    samples: VecDeque<RawSample>,
    written: Vec<u8>,
}

impl MockLink {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockLinkInner::default())),
        }
    }

    /// Queue a raw orientation sample to be read
    pub fn push_sample(&self, sample: RawSample) {
        let mut inner = self.inner.lock().unwrap();
        inner.samples.push_back(sample);
    }

    /// Get all written command words
    pub fn written(&self) -> Vec<u8> {
        let inner = self.inner.lock().unwrap();
        inner.written.clone()
    }

    /// Clear captured writes
    pub fn clear_written(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.written.clear();
    }
}

impl Link for MockLink {
    fn read_last(&mut self) -> Result<Option<RawSample>, LinkError> {
        let mut inner = self.inner.lock().unwrap();
        let mut last = None;
        while let Some(sample) = inner.samples.pop_front() {
            last = Some(sample);
        }
        Ok(last)
    }

    fn write(&mut self, word: u8) -> Result<(), LinkError> {
        let mut inner = self.inner.lock().unwrap();
        inner.written.push(word);
        Ok(())
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

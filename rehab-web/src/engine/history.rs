//! Fixed-capacity angle history for the in-progress rep
//!
//! Holds up to 10 s of samples at 30 fps. Nothing is allocated after
//! construction; the buffer is cleared at every rep boundary.

/// Number of samples kept (longest plausible single rep at 30 fps)
pub const HISTORY_CAPACITY: usize = 300;

/// One tracked-angle sample
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AngleSample {
    pub angle: f32,
    pub timestamp_ms: f64,
}

/// Rolling buffer that maintains the most recent samples in chronological order
pub struct AngleHistory {
    /// Circular buffer data
    data: Box<[AngleSample; HISTORY_CAPACITY]>,

    /// Current write position (points to next slot to write)
    write_index: usize,

    /// Valid samples, saturates at capacity
    len: usize,
}

impl AngleHistory {
    pub fn new() -> Self {
        Self {
            data: Box::new([AngleSample::default(); HISTORY_CAPACITY]),
            write_index: 0,
            len: 0,
        }
    }

    /// Push a sample, overwriting the oldest once full
    pub fn push(&mut self, sample: AngleSample) {
        self.data[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % HISTORY_CAPACITY;
        self.len = (self.len + 1).min(HISTORY_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == HISTORY_CAPACITY
    }

    /// Index into `data` of the i-th oldest sample
    fn slot(&self, i: usize) -> usize {
        (self.write_index + HISTORY_CAPACITY - self.len + i) % HISTORY_CAPACITY
    }

    pub fn oldest(&self) -> Option<AngleSample> {
        if self.is_empty() {
            None
        } else {
            Some(self.data[self.slot(0)])
        }
    }

    pub fn newest(&self) -> Option<AngleSample> {
        if self.is_empty() {
            None
        } else {
            Some(self.data[self.slot(self.len - 1)])
        }
    }

    /// Time covered by the buffer; zero when timestamps went backwards
    pub fn span_ms(&self) -> f64 {
        match (self.oldest(), self.newest()) {
            (Some(first), Some(last)) => (last.timestamp_ms - first.timestamp_ms).max(0.0),
            _ => 0.0,
        }
    }

    /// Drop everything (rep boundary or reset)
    pub fn clear(&mut self) {
        self.write_index = 0;
        self.len = 0;
    }
}

impl Default for AngleHistory {
    fn default() -> Self {
        Self::new()
    }
}

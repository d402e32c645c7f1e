/// Register access tracing for the DD.
///
/// The controller reports every register and buffer access to a
/// `RegisterTracer` by mnemonic. The default tracer does nothing; the
/// frontend can install `LogTracer` or a `TraceLog` ring buffer for
/// post-mortem dumps of the last few hundred accesses.
use std::cell::RefCell;
use std::rc::Rc;

pub trait RegisterTracer {
    fn on_read(&mut self, name: &'static str, word: u32);
    fn on_write(&mut self, name: &'static str, word: u32, mask: u32);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl RegisterTracer for NoopTracer {
    fn on_read(&mut self, _name: &'static str, _word: u32) {}
    fn on_write(&mut self, _name: &'static str, _word: u32, _mask: u32) {}
}

/// Forwards accesses to the `log` facade at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracer;

impl RegisterTracer for LogTracer {
    fn on_read(&mut self, name: &'static str, word: u32) {
        log::trace!("DD read  {}: {:#010X}", name, word);
    }

    fn on_write(&mut self, name: &'static str, word: u32, mask: u32) {
        log::trace!("DD write {}: {:#010X} (mask {:#010X})", name, word, mask);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write { mask: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    pub name: &'static str,
    pub word: u32,
    pub access: Access,
}

/// Ring buffer of the most recent accesses.
pub struct TraceLog {
    entries: Vec<TraceEntry>,
    capacity: usize,
    write_pos: usize,
}

impl TraceLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity.min(256)),
            capacity,
            write_pos: 0,
        }
    }

    pub fn push(&mut self, entry: TraceEntry) {
        if self.entries.len() < self.capacity {
            self.entries.push(entry);
        } else {
            self.entries[self.write_pos] = entry;
        }
        self.write_pos = (self.write_pos + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the most recent `count` entries in chronological order.
    pub fn iter_recent(&self, count: usize) -> impl Iterator<Item = &TraceEntry> {
        let len = self.entries.len();
        let count = count.min(len);
        let start = if len < self.capacity {
            len - count
        } else {
            (self.write_pos + self.capacity - count) % self.capacity
        };
        (0..count).map(move |i| &self.entries[(start + i) % len])
    }
}

impl RegisterTracer for TraceLog {
    fn on_read(&mut self, name: &'static str, word: u32) {
        self.push(TraceEntry {
            name,
            word,
            access: Access::Read,
        });
    }

    fn on_write(&mut self, name: &'static str, word: u32, mask: u32) {
        self.push(TraceEntry {
            name,
            word,
            access: Access::Write { mask },
        });
    }
}

/// Shared handle, so the owner can inspect a tracer after handing it to
/// the controller.
impl<T: RegisterTracer> RegisterTracer for Rc<RefCell<T>> {
    fn on_read(&mut self, name: &'static str, word: u32) {
        self.borrow_mut().on_read(name, word);
    }

    fn on_write(&mut self, name: &'static str, word: u32, mask: u32) {
        self.borrow_mut().on_write(name, word, mask);
    }
}

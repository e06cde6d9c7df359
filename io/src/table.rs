//! Handle table: maps issued handles to open streams.
//!
//! Slots are reused lowest-first after retirement. The table only does
//! bookkeeping; callers clone the `SharedStream` out and poll it without
//! holding the table lock.

use alloc::vec::Vec;

use tinyrt_abi::{Handle, IoResult, RtError};
use tinyrt_lib::{klog_debug, klog_warn};

use crate::stream::{SharedStream, StreamKind};

pub const HANDLE_TABLE_MAX: usize = 64;

struct HandleSlot {
    stream: SharedStream,
    kind: StreamKind,
    faulted: bool,
}

pub struct HandleTable {
    slots: Vec<Option<HandleSlot>>,
    max_handles: usize,
}

impl HandleTable {
    pub fn new(max_handles: usize) -> Self {
        Self {
            slots: Vec::new(),
            max_handles: max_handles.min(HANDLE_TABLE_MAX),
        }
    }

    fn find_free_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .position(Option::is_none)
            .or_else(|| (self.slots.len() < self.max_handles).then_some(self.slots.len()))
    }

    /// Issue a handle for `stream`. `None` when the table is full.
    pub fn install(&mut self, stream: SharedStream) -> Option<Handle> {
        let slot_idx = self.find_free_slot()?;
        let handle = Handle::try_from_slot(slot_idx)?;
        let kind = stream.lock().kind();
        let slot = HandleSlot {
            stream,
            kind,
            faulted: false,
        };
        if slot_idx == self.slots.len() {
            self.slots.push(Some(slot));
        } else {
            self.slots[slot_idx] = Some(slot);
        }
        klog_debug!("handle: issued {} ({})", handle, kind);
        Some(handle)
    }

    fn get_slot(&self, handle: Handle) -> Option<&HandleSlot> {
        self.slots.get(handle.slot()).and_then(Option::as_ref)
    }

    /// The stream behind `handle`, ready to poll.
    pub fn lookup(&self, handle: Handle) -> IoResult<SharedStream> {
        let slot = self.get_slot(handle).ok_or(RtError::InvalidHandle)?;
        if slot.faulted {
            return Err(RtError::StreamFault);
        }
        Ok(slot.stream.clone())
    }

    /// Validate `handle` without touching its stream.
    pub fn validate(&self, handle: Handle) -> IoResult<()> {
        match self.get_slot(handle) {
            None => Err(RtError::InvalidHandle),
            Some(slot) if slot.faulted => Err(RtError::StreamFault),
            Some(_) => Ok(()),
        }
    }

    pub fn is_open(&self, handle: Handle) -> bool {
        self.get_slot(handle).is_some()
    }

    /// Close `handle`. The stream is returned so the caller can drop it
    /// after releasing the table lock.
    pub fn retire(&mut self, handle: Handle) -> IoResult<SharedStream> {
        let slot = self
            .slots
            .get_mut(handle.slot())
            .and_then(Option::take)
            .ok_or(RtError::InvalidHandle)?;
        klog_debug!("handle: retired {} ({})", handle, slot.kind);
        Ok(slot.stream)
    }

    /// Mark `handle` faulted; later transfers fail with `StreamFault`.
    pub fn fault(&mut self, handle: Handle) -> IoResult<()> {
        let slot = self
            .slots
            .get_mut(handle.slot())
            .and_then(Option::as_mut)
            .ok_or(RtError::InvalidHandle)?;
        slot.faulted = true;
        klog_warn!("handle: {} ({}) faulted", handle, slot.kind);
        Ok(())
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Every open stream, for flushing at exit.
    pub fn streams(&self) -> Vec<SharedStream> {
        self.slots
            .iter()
            .flatten()
            .map(|slot| slot.stream.clone())
            .collect()
    }
}

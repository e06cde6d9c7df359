//! The hosted reference backend.
//!
//! Everything runs on the calling thread. Blocking reads and writes wait by
//! running rounds of the cooperative scheduler; the tasks spawned on it are
//! the only other contexts that can make a stream ready.

use core::ffi::CStr;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU64, Ordering};
use std::boxed::Box;
use std::vec::Vec;

use spin::Mutex;
use tinyrt_abi::{AbiConfig, ExitStatus, Handle, IoResult, RtError, Timeout};
use tinyrt_core::Shim;
use tinyrt_io::{CaptureStream, HandleTable, LoopbackStream, PipeWriter, SharedStream, Stream, StreamPoll, pipe, share};
use tinyrt_lib::InitFlag;
use tinyrt_lib::klog::klog_set_level;
use tinyrt_lib::{klog_debug, klog_error, klog_info, klog_warn};
use tinyrt_mm::{HeapArena, HeapStats};
use tinyrt_sched::{MAX_YIELD_DEPTH, SchedStats, Scheduler, TaskId, TaskPoll};

use crate::config::{DiagTarget, ExitMode, HostConfig, PendingIoPolicy};
use crate::diag::{CaptureSink, DiagSink, DiscardSink, StderrSink};
use crate::terminate::{ProcessExit, Terminator, UnwindExit};

/// Outcome of one wait step of a blocked call.
enum Wait {
    Retry,
    TimedOut,
}

pub struct HostedShim {
    config: HostConfig,
    heap: Option<HeapArena>,
    handles: Mutex<HandleTable>,
    sched: Scheduler<dyn Shim>,
    stdin: Mutex<Option<PipeWriter>>,
    stdout: CaptureStream,
    stderr: CaptureStream,
    diag: Box<dyn DiagSink>,
    diag_capture: Option<CaptureSink>,
    terminator: Box<dyn Terminator>,
    exited: InitFlag,
    exit_bits: AtomicU64,
}

impl HostedShim {
    /// Build a shim whose diagnostic sink and terminator follow `config`.
    pub fn new(config: HostConfig) -> Self {
        let (diag, diag_capture): (Box<dyn DiagSink>, Option<CaptureSink>) = match config.diag {
            DiagTarget::Stderr => (Box::new(StderrSink), None),
            DiagTarget::Discard => (Box::new(DiscardSink), None),
            DiagTarget::Capture => {
                let sink = CaptureSink::new();
                (Box::new(sink.clone()), Some(sink))
            }
        };
        let terminator: Box<dyn Terminator> = match config.exit_mode {
            ExitMode::Process => Box::new(ProcessExit),
            ExitMode::Unwind => Box::new(UnwindExit),
        };
        let mut shim = Self::with_parts(config, diag, terminator);
        shim.diag_capture = diag_capture;
        shim
    }

    /// Build a shim with a caller-supplied diagnostic sink and terminator.
    /// `config.diag` and `config.exit_mode` are ignored.
    pub fn with_parts(config: HostConfig, diag: Box<dyn DiagSink>, terminator: Box<dyn Terminator>) -> Self {
        if let Some(level) = config.log_level {
            klog_set_level(level);
        }

        let heap = if config.heap_size == 0 {
            None
        } else {
            let arena = HeapArena::with_capacity(config.heap_size);
            if arena.is_none() {
                klog_error!("host: could not reserve a {} byte heap", config.heap_size);
            }
            arena
        };

        let mut table = HandleTable::new(config.max_handles);
        let (stdin_reader, stdin_writer) = pipe(config.pipe_capacity);
        let stdout = CaptureStream::new(config.line_limit);
        let stderr = CaptureStream::new(config.line_limit);
        let std_streams: [SharedStream; 3] = [share(stdin_reader), share(stdout.clone()), share(stderr.clone())];
        for (expected, stream) in [Handle::STDIN, Handle::STDOUT, Handle::STDERR].into_iter().zip(std_streams) {
            if table.install(stream) != Some(expected) {
                klog_warn!("host: standard handle {} not issued", expected);
            }
        }

        klog_info!(
            "host: shim ready (abi rev {}, heap {} bytes, {} handles)",
            config.abi.revision,
            heap.as_ref().map_or(0, HeapArena::capacity),
            table.open_count()
        );

        Self {
            config,
            heap,
            handles: Mutex::new(table),
            sched: Scheduler::new(),
            stdin: Mutex::new(Some(stdin_writer)),
            stdout,
            stderr,
            diag,
            diag_capture: None,
            terminator,
            exited: InitFlag::new(),
            exit_bits: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Panic if the program already exited. Any call after `exit` is a
    /// contract violation.
    fn check_live(&self, op: &str) {
        if self.exited.is_set() {
            klog_error!("host: {} called after exit", op);
            panic!("contract violation: {} called after exit", op);
        }
    }

    /// One wait step of a blocked call on `handle`.
    ///
    /// Runs a scheduler round when another task could make progress. With
    /// nothing runnable, a finite wait jumps the clock to its deadline and an
    /// infinite wait is reported as a stalled stream. An infinite wait also
    /// stalls once it has spun through `stall_rounds` rounds, if set.
    fn wait(&self, op: &str, handle: Handle, deadline: Option<u64>, rounds: &mut u64) -> IoResult<Wait> {
        if deadline.is_some_and(|d| self.sched.now() >= d) {
            return Ok(Wait::TimedOut);
        }

        let runnable = self.sched.has_ready() && self.sched.depth() < MAX_YIELD_DEPTH;
        let spun_out = deadline.is_none() && self.config.stall_rounds.is_some_and(|limit| *rounds >= limit);
        if runnable && !spun_out {
            *rounds += 1;
            self.sched.yield_now(self);
        } else if let Some(deadline) = deadline {
            self.sched.advance_to(deadline);
        } else {
            klog_warn!(
                "host: {} on {} stalled after {} rounds",
                op,
                handle,
                rounds
            );
            return Err(RtError::StreamFault);
        }

        // A task may have retired or faulted the handle meanwhile.
        self.handles.lock().validate(handle)?;
        Ok(Wait::Retry)
    }

    // Host-side handle control. None of this is part of the runtime contract.

    /// Issue a handle for an arbitrary stream.
    pub fn open_stream(&self, stream: SharedStream) -> Option<Handle> {
        self.handles.lock().install(stream)
    }

    /// Issue a connected `(reader, writer)` handle pair.
    pub fn open_pipe(&self) -> Option<(Handle, Handle)> {
        let (reader, writer) = pipe(self.config.pipe_capacity);
        let mut table = self.handles.lock();
        let r = table.install(share(reader))?;
        match table.install(share(writer)) {
            Some(w) => Some((r, w)),
            None => {
                let reader = table.retire(r);
                drop(table);
                drop(reader);
                None
            }
        }
    }

    pub fn open_loopback(&self) -> Option<Handle> {
        self.open_stream(share(LoopbackStream::new(self.config.pipe_capacity)))
    }

    /// Retire `handle`. Blocked callers see `InvalidHandle` on their next
    /// wait step.
    pub fn retire(&self, handle: Handle) -> IoResult<()> {
        let stream = self.handles.lock().retire(handle)?;
        drop(stream);
        Ok(())
    }

    /// Inject a hard fault on `handle`.
    pub fn fault(&self, handle: Handle) -> IoResult<()> {
        self.handles.lock().fault(handle)
    }

    pub fn is_open(&self, handle: Handle) -> bool {
        self.handles.lock().is_open(handle)
    }

    pub fn open_handles(&self) -> usize {
        self.handles.lock().open_count()
    }

    /// Queue more input on the standard input handle. Returns the bytes
    /// accepted, which is short when the pipe is full or stdin is closed.
    pub fn feed_stdin(&self, data: &[u8]) -> usize {
        let mut stdin = self.stdin.lock();
        let Some(writer) = stdin.as_mut() else {
            return 0;
        };
        match writer.poll_write(data) {
            StreamPoll::Ready(n) => n,
            _ => 0,
        }
    }

    /// End of stream on standard input once the queued bytes are read.
    pub fn close_stdin(&self) {
        self.stdin.lock().take();
    }

    pub fn take_stdout(&self) -> Vec<u8> {
        self.stdout.take()
    }

    pub fn take_stderr(&self) -> Vec<u8> {
        self.stderr.take()
    }

    /// Diagnostic output, when the shim was built with `DiagTarget::Capture`.
    pub fn take_diag(&self) -> Vec<u8> {
        self.diag_capture.as_ref().map(CaptureSink::take).unwrap_or_default()
    }

    /// Add a cooperative task. It runs whenever the program yields or
    /// blocks.
    pub fn spawn<F>(&self, name: &'static str, mut task: F) -> TaskId
    where
        F: FnMut(&dyn Shim) -> TaskPoll + Send + 'static,
    {
        self.sched.spawn(name, move |cx: &(dyn Shim + 'static)| task(cx))
    }

    /// Run scheduler rounds until no task is ready. Returns the rounds run.
    pub fn run_until_idle(&self, max_rounds: usize) -> usize {
        self.sched.run_until_idle(self, max_rounds)
    }

    pub fn now(&self) -> u64 {
        self.sched.now()
    }

    pub fn sched_stats(&self) -> SchedStats {
        self.sched.stats()
    }

    pub fn heap_stats(&self) -> Option<HeapStats> {
        self.heap.as_ref().map(HeapArena::stats)
    }

    pub fn has_exited(&self) -> bool {
        self.exited.is_set()
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.has_exited()
            .then(|| ExitStatus::from_unsigned(self.exit_bits.load(Ordering::Acquire)))
    }
}

impl Shim for HostedShim {
    fn abi(&self) -> AbiConfig {
        self.config.abi
    }

    fn exit(&self, status: ExitStatus) -> ! {
        self.check_live("exit");
        self.exit_bits.store(status.bits(), Ordering::Release);
        self.exited.mark_set();

        let streams = self.handles.lock().streams();
        for stream in &streams {
            let mut stream = stream.lock();
            match self.config.io_policy {
                PendingIoPolicy::Flush => stream.flush(),
                PendingIoPolicy::Abandon => stream.abandon(),
            }
        }
        let dropped = self.sched.clear();

        let code = status.to_host_code(self.config.abi.exit_signedness);
        klog_info!(
            "host: exit status {:#x} (host code {}, {:?} {} streams, {} tasks dropped)",
            status.bits(),
            code,
            self.config.io_policy,
            streams.len(),
            dropped
        );
        drop(streams);
        if let Some(heap) = &self.heap {
            heap.log_stats();
        }
        self.terminator.terminate(status, code)
    }

    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        self.check_live("allocate");
        match &self.heap {
            Some(heap) => heap.allocate(size),
            None if size == 0 => NonNull::new(tinyrt_mm::ZERO_SIZE_SENTINEL),
            None => None,
        }
    }

    unsafe fn release(&self, ptr: *mut u8) {
        self.check_live("release");
        if !self.config.abi.release_supported() {
            // The revision's heap is grow-only; blocks stay allocated.
            klog_debug!("host: release of {:p} ignored on abi rev {}", ptr, self.config.abi.revision);
            return;
        }
        if let Some(heap) = &self.heap {
            unsafe { heap.release(ptr) };
        }
    }

    fn read(&self, handle: Handle, buf: &mut [u8], timeout: Timeout) -> IoResult<usize> {
        self.check_live("read");
        let stream = self.handles.lock().lookup(handle)?;
        if buf.is_empty() {
            return Ok(0);
        }

        let deadline = timeout.deadline(self.sched.now());
        let mut rounds = 0;
        loop {
            let poll = stream.lock().poll_read(buf);
            if let Some(res) = poll.into_result() {
                return res;
            }
            if timeout.is_poll() {
                return Ok(0);
            }
            match self.wait("read", handle, deadline, &mut rounds)? {
                Wait::Retry => continue,
                Wait::TimedOut => {
                    klog_debug!("host: read on {} timed out at tick {}", handle, self.sched.now());
                    return Ok(0);
                }
            }
        }
    }

    fn write(&self, handle: Handle, buf: &[u8]) -> IoResult<usize> {
        self.check_live("write");
        let stream = self.handles.lock().lookup(handle)?;
        if buf.is_empty() {
            return Ok(0);
        }

        let mut rounds = 0;
        loop {
            let poll = stream.lock().poll_write(buf);
            if let Some(res) = poll.into_result() {
                return res;
            }
            // Writes have no timeout, so the wait never reports TimedOut.
            self.wait("write", handle, None, &mut rounds)?;
        }
    }

    fn yield_now(&self) {
        self.check_live("yield");
        self.sched.yield_now(self);
    }

    fn print(&self, text: &CStr) {
        if self.has_exited() {
            klog_warn!("host: print after exit dropped");
            return;
        }
        self.diag.emit(text.to_bytes());
    }
}

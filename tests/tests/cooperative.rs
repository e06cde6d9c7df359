//! Blocking I/O, timeouts and exit on the hosted cooperative runner.

use std::sync::{Arc, Mutex};

use tinyrt_abi::{AbiConfig, ExitStatus, Handle, RtError, Timeout};
use tinyrt_core::{Runtime, Shim};
use tinyrt_host::{ExitRequest, HostConfig, HostedShim, PendingIoPolicy, catch_exit};
use tinyrt_sched::TaskPoll;

fn hosted(config: HostConfig) -> HostedShim {
    HostedShim::new(config)
}

fn exit_with(shim: &HostedShim, status: ExitStatus) -> ExitRequest {
    match catch_exit(|| {
        Runtime::new(shim).exit(status);
    }) {
        Ok(()) => panic!("exit returned"),
        Err(req) => req,
    }
}

#[test]
fn backpressured_write_drains_through_a_task() {
    let shim = hosted(HostConfig::for_tests().with_pipe_capacity(8));
    let (r, w) = shim.open_pipe().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = received.clone();
    shim.spawn("consumer", move |cx: &dyn Shim| {
        let mut buf = [0u8; 5];
        if let Ok(n) = cx.read(r, &mut buf, Timeout::POLL) {
            sink.lock().unwrap().extend_from_slice(&buf[..n]);
        }
        if sink.lock().unwrap().len() >= 64 {
            TaskPoll::Complete
        } else {
            TaskPoll::Pending
        }
    });

    let payload: Vec<u8> = (0..64u8).collect();
    let rt = Runtime::new(&shim);
    rt.write_all(w, &payload).unwrap();
    shim.run_until_idle(100);

    assert_eq!(*received.lock().unwrap(), payload);
    assert_eq!(shim.sched_stats().tasks_completed, 1);
}

#[test]
fn blocked_read_returns_partial_data() {
    let shim = hosted(HostConfig::for_tests());
    let h = shim.open_loopback().unwrap();
    let rt = Runtime::new(&shim);
    rt.write_all(h, b"abc").unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(rt.read_timeout(h, &mut buf, Timeout::Ticks(10)), Ok(3));
    assert_eq!(shim.now(), 0);
}

#[test]
fn timeout_elapses_while_tasks_spin() {
    let shim = hosted(HostConfig::for_tests());
    let (r, _w) = shim.open_pipe().unwrap();
    shim.spawn("spinner", |_: &dyn Shim| TaskPoll::Pending);

    let mut buf = [0u8; 4];
    let rt = Runtime::new(&shim);
    assert_eq!(rt.read_timeout(r, &mut buf, Timeout::Ticks(5)), Ok(0));
    assert!(shim.now() >= 5);
    assert_eq!(shim.sched_stats().total_yields, 5);
}

#[test]
fn infinite_wait_against_spinning_tasks_stalls() {
    let shim = hosted(HostConfig::for_tests().with_stall_rounds(100));
    let (r, _w) = shim.open_pipe().unwrap();
    shim.spawn("spinner", |_: &dyn Shim| TaskPoll::Pending);

    let mut buf = [0x11u8; 4];
    assert_eq!(Runtime::new(&shim).read(r, &mut buf), Err(RtError::StreamFault));
    assert_eq!(buf, [0x11u8; 4]);
    assert_eq!(shim.sched_stats().total_yields, 100);
}

#[test]
fn infinite_wait_outlasts_a_slow_producer() {
    let shim = hosted(HostConfig::for_tests());
    let (r, w) = shim.open_pipe().unwrap();
    let mut steps = 0u32;
    shim.spawn("slow-producer", move |cx: &dyn Shim| {
        steps += 1;
        if steps < 70_000 {
            return TaskPoll::Pending;
        }
        cx.write(w, b"late").unwrap();
        TaskPoll::Complete
    });

    let mut buf = [0u8; 8];
    assert_eq!(Runtime::new(&shim).read(r, &mut buf), Ok(4));
    assert_eq!(&buf[..4], b"late");
    assert_eq!(shim.sched_stats().tasks_completed, 1);
}

#[test]
fn yield_steps_every_ready_task() {
    let shim = hosted(HostConfig::for_tests());
    let steps = Arc::new(Mutex::new(0u32));
    let counter = steps.clone();
    shim.spawn("counter", move |_: &dyn Shim| {
        *counter.lock().unwrap() += 1;
        TaskPoll::Pending
    });
    let rt = Runtime::new(&shim);
    for _ in 0..1000 {
        rt.yield_now();
    }
    assert_eq!(*steps.lock().unwrap(), 1000);
    assert_eq!(shim.now(), 1000);
}

#[test]
fn tasks_may_yield_from_inside_a_step() {
    let shim = hosted(HostConfig::for_tests());
    for _ in 0..3 {
        shim.spawn("nested", |cx: &dyn Shim| {
            cx.yield_now();
            TaskPoll::Complete
        });
    }
    Runtime::new(&shim).yield_now();
    let stats = shim.sched_stats();
    assert_eq!(stats.tasks_completed, 3);
    assert_eq!(stats.total_yields, 4);
}

#[test]
fn stdin_is_fed_by_the_host() {
    let shim = hosted(HostConfig::for_tests());
    let rt = Runtime::new(&shim);
    shim.feed_stdin(b"line one\n");
    shim.feed_stdin(b"line two\n");
    shim.close_stdin();

    let mut all = Vec::new();
    let mut buf = [0u8; 5];
    loop {
        match rt.read(Handle::STDIN, &mut buf) {
            Ok(0) => break,
            Ok(n) => all.extend_from_slice(&buf[..n]),
            Err(err) => panic!("stdin read failed: {:?}", err),
        }
    }
    assert_eq!(all, b"line one\nline two\n");
    assert_eq!(rt.read(Handle::STDIN, &mut buf), Ok(0));
}

#[test]
fn exit_maps_status_and_flushes() {
    let shim = hosted(HostConfig::for_tests());
    let rt = Runtime::new(&shim);
    rt.write_all(Handle::STDOUT, b"done").unwrap();
    rt.write_all(Handle::STDERR, b"warn\n").unwrap();
    let req = exit_with(&shim, ExitStatus::from_signed(-1));
    assert_eq!(req.code, -1);
    assert_eq!(req.status.as_unsigned(), u64::MAX);
    assert_eq!(shim.take_stdout(), b"done");
    assert_eq!(shim.take_stderr(), b"warn\n");
    assert!(shim.has_exited());
}

#[test]
fn unsigned_revision_saturates_wide_statuses() {
    let shim = hosted(HostConfig::for_tests().with_abi(AbiConfig::REV1));
    let req = exit_with(&shim, ExitStatus::from_unsigned(1 << 40));
    assert_eq!(req.code, i32::MAX);
    assert_eq!(shim.exit_status(), Some(ExitStatus::from_unsigned(1 << 40)));
}

#[test]
fn abandon_policy_drops_pending_output() {
    let shim = hosted(HostConfig::for_tests().with_io_policy(PendingIoPolicy::Abandon));
    let rt = Runtime::new(&shim);
    rt.write_all(Handle::STDOUT, b"whole\nhalf").unwrap();
    exit_with(&shim, ExitStatus::SUCCESS);
    assert_eq!(shim.take_stdout(), b"whole\n");
}

#[test]
fn config_from_cmdline_builds_a_working_shim() {
    let config = HostConfig::from_cmdline("heap=16k pipe=64 rev=1 diag=capture exit=unwind").unwrap();
    let shim = hosted(config);
    assert_eq!(shim.abi(), AbiConfig::REV1);
    assert!(shim.allocate(1024).is_some());
    assert!(shim.allocate(32 * 1024).is_none());
}

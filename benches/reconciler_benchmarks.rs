//! Performance benchmarks for monitord
//!
//! `apply()` runs on every signal and the event queue drains on every
//! wakeup, so both sit on the loop's hot path.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::rc::Rc;

use monitord::inhibitor::InhibitorError;
use monitord::reconciler::decide_topology;
use monitord::{
    DisplayConfigurator, EventConnection, EventQueue, InhibitorBackend, OutputRole, PowerSnapshot,
    Reconciler, SystemState, Topology,
};

struct NullConfigurator;

impl DisplayConfigurator for NullConfigurator {
    fn configure(&mut self, topology: Topology) -> anyhow::Result<()> {
        black_box(topology);
        Ok(())
    }
}

struct NullBackend;

impl InhibitorBackend for NullBackend {
    type Handle = ();

    fn request(&mut self) -> Result<(), InhibitorError> {
        Ok(())
    }
}

struct BufferedConnection {
    socket: UnixStream,
    pending: RefCell<VecDeque<u32>>,
}

impl EventConnection for BufferedConnection {
    type Event = u32;
    type Error = std::io::Error;

    fn poll_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }

    fn flush(&self) -> std::io::Result<()> {
        Ok(())
    }

    fn poll_for_event(&self) -> std::io::Result<Option<u32>> {
        Ok(self.pending.borrow_mut().pop_front())
    }
}

/// Benchmark the topology decision over every state
fn bench_decide_topology(c: &mut Criterion) {
    let states: Vec<SystemState> = (0u8..128)
        .map(|bits| SystemState {
            on_battery: bits & 0x01 != 0,
            lid_present: bits & 0x02 != 0,
            lid_closed: bits & 0x04 != 0,
            ext_display_present: bits & 0x08 != 0,
            ext_display_active: bits & 0x10 != 0,
            int_display_present: bits & 0x20 != 0,
            int_display_active: bits & 0x40 != 0,
        })
        .collect();

    c.bench_function("decide_topology_all_states", |b| {
        b.iter(|| {
            for state in &states {
                black_box(decide_topology(black_box(state), true));
            }
        })
    });
}

/// Benchmark a stream of alternating output and power updates
fn bench_update_stream(c: &mut Criterion) {
    c.bench_function("reconciler_update_stream", |b| {
        b.iter_batched(
            || Reconciler::new(NullConfigurator, NullBackend),
            |mut reconciler| {
                for i in 0..100 {
                    reconciler.update_output(OutputRole::External, true, i % 3 != 0);
                    reconciler.update_power(PowerSnapshot {
                        on_battery: i % 7 == 0,
                        lid_present: true,
                        lid_closed: i % 2 == 0,
                    });
                }
                black_box(reconciler.decide())
            },
            BatchSize::SmallInput,
        )
    });
}

/// Benchmark draining and dispatching a burst of buffered events
fn bench_event_queue_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_queue_burst");

    for burst in [1usize, 16, 256] {
        group.bench_function(format!("drain_dispatch_{}", burst), |b| {
            b.iter_batched(
                || {
                    let (socket, _) = UnixStream::pair().unwrap();
                    let conn = Rc::new(BufferedConnection {
                        socket,
                        pending: RefCell::new((0..burst as u32).collect()),
                    });
                    EventQueue::new(conn)
                },
                |mut queue| {
                    queue.prepare();
                    let mut sum = 0u64;
                    while !queue.is_empty() {
                        queue.dispatch(|event| {
                            sum += u64::from(event);
                            true
                        });
                    }
                    black_box(sum)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decide_topology,
    bench_update_stream,
    bench_event_queue_burst
);
criterion_main!(benches);

//! Fixed-rate priority scheduler.
//!
//! A single OS thread drives every registered node cooperatively: once per
//! period (60 Hz nominal) each running node's `tick` is invoked in priority
//! order, then the thread sleeps until the next deadline. Faults are
//! contained per node — an init failure or tick panic never takes down its
//! neighbors.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::communication::registry::registry;
use crate::core::log_buffer::{publish_log, LogEntry, LogType};
use crate::core::node::{Node, NodeInfo, NodeState, MAX_NODE_NAME_LEN};
use crate::error::{HorusError, HorusResult};
use crate::time::{self, timestamp_now};

/// Default scheduler rate.
pub const DEFAULT_RATE_HZ: f64 = 60.0;

/// Dispatch priority within a tick. Lower runs earlier; ties break by
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Critical = 0,
    High = 1,
    Normal = 2,
    Low = 3,
    Background = 4,
}

impl From<u8> for Priority {
    fn from(v: u8) -> Self {
        match v {
            0 => Priority::Critical,
            1 => Priority::High,
            2 => Priority::Normal,
            3 => Priority::Low,
            _ => Priority::Background,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
            Priority::Background => "Background",
        };
        write!(f, "{}", s)
    }
}

// Interrupt flags shared by every scheduler in the process. The handler
// only flips flags; the run loop observes them between ticks, so the
// in-flight tick always completes before shutdown begins.
static SIGINT_RECEIVED: AtomicBool = AtomicBool::new(false);
static SIGTERM_RECEIVED: AtomicBool = AtomicBool::new(false);
static HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// SIGTERM handler. Must only touch async-signal-safe state.
#[cfg(unix)]
extern "C" fn sigterm_handler(_signum: libc::c_int) {
    SIGTERM_RECEIVED.store(true, Ordering::SeqCst);
}

struct RegisteredNode {
    node: Option<Box<dyn Node>>,
    priority: Priority,
    state: NodeState,
    context: NodeInfo,
    /// Registration order, the tiebreaker within a priority level.
    index: usize,
}

/// Central orchestrator: holds nodes, drives the tick loop.
pub struct Scheduler {
    name: String,
    nodes: Vec<RegisteredNode>,
    running: Arc<AtomicBool>,
    tick_period: Duration,
    current_tick: u64,
}

impl Scheduler {
    /// Create a scheduler ticking at the default 60 Hz.
    pub fn new(name: &str) -> Self {
        // Pin the process clock epoch no later than scheduler creation.
        let _ = time::process_start();
        Self {
            name: name.to_string(),
            nodes: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            tick_period: Duration::from_secs_f64(1.0 / DEFAULT_RATE_HZ),
            current_tick: 0,
        }
    }

    /// Override the tick rate (chainable). The 60 Hz default is what
    /// scheduler-driven nodes are designed against.
    pub fn with_rate_hz(mut self, rate_hz: f64) -> Self {
        assert!(rate_hz > 0.0, "tick rate must be positive");
        self.tick_period = Duration::from_secs_f64(1.0 / rate_hz);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.tick_period
    }

    /// Ticks completed since `run` started.
    pub fn tick_count(&self) -> u64 {
        self.current_tick
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Register a node. Nodes are ticked in `(priority, registration
    /// order)`; `log_enabled` controls whether the node's publish/receive
    /// records reach the log sink.
    pub fn add<N: Node + 'static>(
        &mut self,
        node: N,
        priority: Priority,
        log_enabled: bool,
    ) -> HorusResult<()> {
        self.add_boxed(Box::new(node), priority, log_enabled)
    }

    /// Register an already-boxed node.
    pub fn add_boxed(
        &mut self,
        node: Box<dyn Node>,
        priority: Priority,
        log_enabled: bool,
    ) -> HorusResult<()> {
        let name = node.name().to_string();
        if name.is_empty() {
            return Err(HorusError::node(name, "node name is empty"));
        }
        if name.len() > MAX_NODE_NAME_LEN {
            return Err(HorusError::node(
                name,
                format!("node name exceeds {} bytes", MAX_NODE_NAME_LEN),
            ));
        }
        if self.nodes.iter().any(|rn| rn.context.name() == name) {
            return Err(HorusError::AlreadyExists(format!(
                "node '{}' is already registered",
                name
            )));
        }

        let index = self.nodes.len();
        print_line(&format!(
            "Added node '{}' with priority {}",
            name, priority
        ));
        self.nodes.push(RegisteredNode {
            node: Some(node),
            priority,
            state: NodeState::Registered,
            context: NodeInfo::new(name, log_enabled),
            index,
        });
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request a cooperative stop. The current tick completes, then
    /// shutdown begins.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// A handle that stops this scheduler from another thread.
    pub fn stop_handle(&self) -> SchedulerStopHandle {
        SchedulerStopHandle {
            running: self.running.clone(),
        }
    }

    /// Main loop with signal handling and cleanup. Returns when a signal
    /// arrives or `stop` is called.
    pub fn run(&mut self) -> HorusResult<()> {
        self.run_inner(None)
    }

    /// Run for at most `duration`, then shut down. Signal handling and
    /// ordering behave exactly like `run`.
    pub fn run_for(&mut self, duration: Duration) -> HorusResult<()> {
        self.run_inner(Some(duration))
    }

    fn run_inner(&mut self, duration: Option<Duration>) -> HorusResult<()> {
        install_signal_handlers()?;
        SIGINT_RECEIVED.store(false, Ordering::SeqCst);
        SIGTERM_RECEIVED.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        self.current_tick = 0;

        self.init_nodes();

        // Dispatch order is fixed once after init: stable by priority,
        // registration order breaking ties.
        self.nodes
            .sort_by_key(|rn| (rn.priority as u8, rn.index));
        for rn in self.nodes.iter_mut() {
            if rn.state == NodeState::Initialized {
                rn.state = NodeState::Running;
            }
        }

        let period = self.tick_period;
        let started = Instant::now();
        let run_deadline = duration.map(|d| started + d);
        let mut next_deadline = started + period;

        while self.should_keep_running(run_deadline) {
            let tick_start = Instant::now();
            self.tick_all();
            self.current_tick += 1;

            let tick_duration = tick_start.elapsed();
            if tick_duration > period {
                self.scheduler_log(
                    LogType::Warning,
                    format!(
                        "tick {} overran the period: {:?} > {:?}",
                        self.current_tick - 1,
                        tick_duration,
                        period
                    ),
                );
            }

            let now = Instant::now();
            if now < next_deadline {
                time::sleep_until(next_deadline);
            }
            next_deadline += period;
            if Instant::now() > next_deadline {
                // Frame overrun: re-anchor instead of accumulating catch-up.
                next_deadline = Instant::now() + period;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.shutdown_nodes();
        registry().teardown();
        Ok(())
    }

    fn should_keep_running(&self, run_deadline: Option<Instant>) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        if SIGINT_RECEIVED.load(Ordering::SeqCst) || SIGTERM_RECEIVED.load(Ordering::SeqCst) {
            print_line("\nInterrupt received! Shutting down HORUS scheduler...");
            return false;
        }
        if let Some(deadline) = run_deadline {
            if Instant::now() >= deadline {
                return false;
            }
        }
        true
    }

    /// Init phase, registration order. A failed init removes only that
    /// node; its handles are unbound with it.
    fn init_nodes(&mut self) {
        for rn in self.nodes.iter_mut() {
            if rn.state != NodeState::Registered {
                continue;
            }
            rn.context.mark_started();
            rn.context.set_tick(0);

            let node = rn.node.as_mut().expect("registered node present");
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| node.init(&mut rn.context)));

            match outcome {
                Ok(Ok(())) => {
                    rn.state = NodeState::Initialized;
                    print_line(&format!("Initialized node '{}'", rn.context.name()));
                }
                Ok(Err(e)) => {
                    rn.context
                        .log_error(&format!("init failed: {}", e));
                    print_line(&format!(
                        "Failed to initialize node '{}': {}",
                        rn.context.name(),
                        e
                    ));
                    rn.state = NodeState::Gone;
                    rn.node = None;
                }
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    rn.context
                        .log_error(&format!("init panicked: {}", msg));
                    print_line(&format!(
                        "Node '{}' panicked during init: {}",
                        rn.context.name(),
                        msg
                    ));
                    rn.state = NodeState::Gone;
                    rn.node = None;
                }
            }
        }
    }

    /// One full tick: every running node, priority order. A panic demotes
    /// only the offending node to Stopping.
    fn tick_all(&mut self) {
        let period = self.tick_period;
        for rn in self.nodes.iter_mut() {
            if rn.state != NodeState::Running {
                continue;
            }
            rn.context.set_tick(self.current_tick);
            rn.context.begin_tick();

            let node = rn.node.as_mut().expect("running node present");
            let t0 = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| node.tick(&mut rn.context)));
            let tick_duration = t0.elapsed();

            rn.context.end_tick();

            match outcome {
                Ok(()) => {
                    if tick_duration > period {
                        rn.context.log_warn(&format!(
                            "tick {} took {:?} (period {:?})",
                            self.current_tick, tick_duration, period
                        ));
                    }
                }
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    rn.context.log_error(&format!(
                        "tick {} panicked: {}",
                        self.current_tick, msg
                    ));
                    print_line(&format!(
                        "Node '{}' panicked on tick {}: {}",
                        rn.context.name(),
                        self.current_tick,
                        msg
                    ));
                    rn.state = NodeState::Stopping;
                }
            }
        }
    }

    /// Shutdown phase, reverse priority order, once per successful init.
    /// Failures are logged and never block scheduler exit.
    fn shutdown_nodes(&mut self) {
        for rn in self.nodes.iter_mut().rev() {
            if !matches!(rn.state, NodeState::Running | NodeState::Stopping) {
                continue;
            }
            let node = rn.node.as_mut().expect("initialized node present");
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| node.shutdown(&mut rn.context)));

            match outcome {
                Ok(Ok(())) => {
                    print_line(&format!("Shut down node '{}'", rn.context.name()));
                }
                Ok(Err(e)) => {
                    rn.context
                        .log_error(&format!("shutdown failed: {}", e));
                }
                Err(payload) => {
                    rn.context.log_error(&format!(
                        "shutdown panicked: {}",
                        panic_message(payload.as_ref())
                    ));
                }
            }
            rn.state = NodeState::Shutdown;
            rn.node = None;
        }
        for rn in self.nodes.iter_mut() {
            rn.state = NodeState::Gone;
        }
        self.nodes.clear();
    }

    fn scheduler_log(&self, level: LogType, message: String) {
        publish_log(LogEntry {
            timestamp_ns: timestamp_now(),
            level,
            node: self.name.clone(),
            tick: self.current_tick,
            topic: None,
            message,
            tick_us: 0,
            ipc_ns: 0,
        });
    }
}

/// Cloneable stop switch for a scheduler, usable from other threads.
#[derive(Clone)]
pub struct SchedulerStopHandle {
    running: Arc<AtomicBool>,
}

impl SchedulerStopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Install the interrupt handlers once per process. Failure to bind the
/// SIGINT handler is fatal for `run`.
fn install_signal_handlers() -> HorusResult<()> {
    if HANDLER_INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    if let Err(e) = ctrlc::set_handler(|| {
        SIGINT_RECEIVED.store(true, Ordering::SeqCst);
    }) {
        HANDLER_INSTALLED.store(false, Ordering::SeqCst);
        return Err(HorusError::scheduling(format!(
            "failed to install interrupt handler: {}",
            e
        )));
    }

    #[cfg(unix)]
    unsafe {
        libc::signal(
            libc::SIGTERM,
            sigterm_handler as *const () as libc::sighandler_t,
        );
    }

    Ok(())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn print_line(msg: &str) {
    println!("{} {}", "[horus]".cyan(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        name: String,
        ticks: std::sync::Arc<std::sync::atomic::AtomicU64>,
    }

    impl Node for Counter {
        fn name(&self) -> &str {
            &self.name
        }
        fn tick(&mut self, _ctx: &mut NodeInfo) {
            self.ticks.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_priority_from_u8() {
        assert_eq!(Priority::from(0), Priority::Critical);
        assert_eq!(Priority::from(2), Priority::Normal);
        assert_eq!(Priority::from(4), Priority::Background);
        assert_eq!(Priority::from(200), Priority::Background);
    }

    #[test]
    fn test_add_rejects_bad_names() {
        let mut sched = Scheduler::new("name_checks");

        struct Named(String);
        impl Node for Named {
            fn name(&self) -> &str {
                &self.0
            }
            fn tick(&mut self, _ctx: &mut NodeInfo) {}
        }

        let long = Named("n".repeat(32));
        assert!(sched.add(long, Priority::Normal, false).is_err());

        let ok = Named("short_enough".to_string());
        assert!(sched.add(ok, Priority::Normal, false).is_ok());

        let dup = Named("short_enough".to_string());
        assert!(matches!(
            sched.add(dup, Priority::Normal, false),
            Err(HorusError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_run_for_ticks_counter() {
        let ticks = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let mut sched = Scheduler::new("counter_run").with_rate_hz(200.0);
        sched
            .add(
                Counter {
                    name: "counter".to_string(),
                    ticks: ticks.clone(),
                },
                Priority::Normal,
                false,
            )
            .unwrap();

        sched.run_for(Duration::from_millis(100)).unwrap();
        let n = ticks.load(Ordering::Relaxed);
        // 200 Hz for 100 ms ≈ 20 ticks; generous bounds for busy machines.
        assert!(n >= 10, "expected at least 10 ticks, got {}", n);
        assert_eq!(sched.node_count(), 0); // nodes retired after run
    }

    #[test]
    fn test_stop_handle_ends_run() {
        let ticks = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let mut sched = Scheduler::new("stop_handle_run").with_rate_hz(100.0);
        sched
            .add(
                Counter {
                    name: "stoppable".to_string(),
                    ticks: ticks.clone(),
                },
                Priority::Normal,
                false,
            )
            .unwrap();

        let handle = sched.stop_handle();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            handle.stop();
        });

        sched.run().unwrap();
        stopper.join().unwrap();
        assert!(ticks.load(Ordering::Relaxed) > 0);
    }
}

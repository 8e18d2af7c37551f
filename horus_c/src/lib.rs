//! HORUS C FFI - handle-based API over the core runtime.
//!
//! The surface mirrors the Rust API with opaque 32-bit handles: `0` always
//! means failure, every fallible call flattens `HorusResult` to a boolean.
//! Typed topics share channels with Rust nodes in the same process, so a C
//! publisher and a Rust subscriber interoperate directly.
//!
//! # Safety
//!
//! Callers must pass pointers to properly aligned message structs matching
//! the declared [`MessageType`] layouts from the catalog. Strings are
//! NUL-terminated C strings.

use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use horus_core::communication::{Publisher, RawPublisher, RawSubscriber, Subscriber};
use horus_core::core::log_buffer::{publish_log, LogEntry, LogType};
use horus_core::core::{Node, NodeInfo};
use horus_core::error::HorusResult;
use horus_core::time::timestamp_now;
use horus_core::{registry, Priority, Scheduler, SchedulerStopHandle};

use horus_library::messages::control::JointCommand;
use horus_library::messages::geometry::{Pose2D, Twist};
use horus_library::messages::perception::PointCloud;
use horus_library::messages::sensor::{Imu, LaserScan};
use horus_library::messages::vision::Image;

// Handle management
static NEXT_HANDLE: AtomicU32 = AtomicU32::new(1);

fn next_handle() -> u32 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

/// Message type identifiers shared with the C header.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Custom = 0,
    Twist = 1,
    Pose = 2,
    LaserScan = 3,
    Image = 4,
    Imu = 5,
    JointState = 6,
    PointCloud = 7,
}

enum PubHandle {
    Twist(Publisher<Twist>),
    Pose(Publisher<Pose2D>),
    LaserScan(Publisher<LaserScan>),
    Image(Publisher<Image>),
    Imu(Publisher<Imu>),
    JointState(Publisher<JointCommand>),
    PointCloud(Publisher<PointCloud>),
    Custom(RawPublisher),
}

enum SubHandle {
    Twist(Subscriber<Twist>),
    Pose(Subscriber<Pose2D>),
    LaserScan(Subscriber<LaserScan>),
    Image(Subscriber<Image>),
    Imu(Subscriber<Imu>),
    JointState(Subscriber<JointCommand>),
    PointCloud(Subscriber<PointCloud>),
    Custom(RawSubscriber),
}

lazy_static::lazy_static! {
    static ref PUBLISHERS: Mutex<HashMap<u32, PubHandle>> = Mutex::new(HashMap::new());
    static ref SUBSCRIBERS: Mutex<HashMap<u32, SubHandle>> = Mutex::new(HashMap::new());
    static ref NODES: Mutex<HashMap<u32, CallbackNode>> = Mutex::new(HashMap::new());
    static ref SCHEDULERS: Mutex<HashMap<u32, SchedulerSlot>> = Mutex::new(HashMap::new());
    static ref NODE_NAME: Mutex<Option<String>> = Mutex::new(None);
}

struct SchedulerSlot {
    /// Taken out while `scheduler_run` executes.
    scheduler: Option<Scheduler>,
    stop: SchedulerStopHandle,
}

fn cstr_or<'a>(ptr: *const c_char, fallback: &'a str) -> &'a str {
    if ptr.is_null() {
        return fallback;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or(fallback)
}

// ============================================================================
// Core API
// ============================================================================

/// Initialize this process as a named HORUS participant.
#[no_mangle]
pub extern "C" fn init(node_name: *const c_char) -> bool {
    let name = cstr_or(node_name, "default_node");
    *NODE_NAME.lock().unwrap() = Some(name.to_string());
    true
}

/// Release every handle and clear the participant name.
#[no_mangle]
pub extern "C" fn shutdown() {
    PUBLISHERS.lock().unwrap().clear();
    SUBSCRIBERS.lock().unwrap().clear();
    NODES.lock().unwrap().clear();
    SCHEDULERS.lock().unwrap().clear();
    *NODE_NAME.lock().unwrap() = None;
}

/// Whether `init` has been called and `shutdown` has not.
#[no_mangle]
pub extern "C" fn ok() -> bool {
    NODE_NAME.lock().unwrap().is_some()
}

// ============================================================================
// Publisher / Subscriber creation
// ============================================================================

fn make_publisher(topic: &str, msg_type: MessageType) -> HorusResult<PubHandle> {
    let reg = registry();
    Ok(match msg_type {
        MessageType::Twist => PubHandle::Twist(reg.bind_publisher::<Twist>(topic)?),
        MessageType::Pose => PubHandle::Pose(reg.bind_publisher::<Pose2D>(topic)?),
        MessageType::LaserScan => PubHandle::LaserScan(reg.bind_publisher::<LaserScan>(topic)?),
        MessageType::Image => PubHandle::Image(reg.bind_publisher::<Image>(topic)?),
        MessageType::Imu => PubHandle::Imu(reg.bind_publisher::<Imu>(topic)?),
        MessageType::JointState => {
            PubHandle::JointState(reg.bind_publisher::<JointCommand>(topic)?)
        }
        MessageType::PointCloud => PubHandle::PointCloud(reg.bind_publisher::<PointCloud>(topic)?),
        MessageType::Custom => {
            return Err(horus_core::HorusError::invalid_input(
                "custom publishers take publisher_custom()",
            ))
        }
    })
}

fn make_subscriber(topic: &str, msg_type: MessageType) -> HorusResult<SubHandle> {
    let reg = registry();
    Ok(match msg_type {
        MessageType::Twist => SubHandle::Twist(reg.bind_subscriber::<Twist>(topic)?),
        MessageType::Pose => SubHandle::Pose(reg.bind_subscriber::<Pose2D>(topic)?),
        MessageType::LaserScan => SubHandle::LaserScan(reg.bind_subscriber::<LaserScan>(topic)?),
        MessageType::Image => SubHandle::Image(reg.bind_subscriber::<Image>(topic)?),
        MessageType::Imu => SubHandle::Imu(reg.bind_subscriber::<Imu>(topic)?),
        MessageType::JointState => {
            SubHandle::JointState(reg.bind_subscriber::<JointCommand>(topic)?)
        }
        MessageType::PointCloud => {
            SubHandle::PointCloud(reg.bind_subscriber::<PointCloud>(topic)?)
        }
        MessageType::Custom => {
            return Err(horus_core::HorusError::invalid_input(
                "custom subscribers take subscriber_custom()",
            ))
        }
    })
}

/// Create a typed publisher. Returns 0 on failure.
#[no_mangle]
pub extern "C" fn publisher(topic: *const c_char, msg_type: MessageType) -> u32 {
    if topic.is_null() {
        return 0;
    }
    let topic = cstr_or(topic, "");
    match make_publisher(topic, msg_type) {
        Ok(handle) => {
            let id = next_handle();
            PUBLISHERS.lock().unwrap().insert(id, handle);
            id
        }
        Err(_) => 0,
    }
}

/// Create a size-only publisher for application-defined payloads.
/// The payload is copied verbatim and never validated for structure.
#[no_mangle]
pub extern "C" fn publisher_custom(topic: *const c_char, msg_size: usize) -> u32 {
    if topic.is_null() || msg_size == 0 {
        return 0;
    }
    let topic = cstr_or(topic, "");
    match registry().bind_publisher_custom(topic, msg_size) {
        Ok(handle) => {
            let id = next_handle();
            PUBLISHERS.lock().unwrap().insert(id, PubHandle::Custom(handle));
            id
        }
        Err(_) => 0,
    }
}

/// Create a typed subscriber. Returns 0 on failure.
#[no_mangle]
pub extern "C" fn subscriber(topic: *const c_char, msg_type: MessageType) -> u32 {
    if topic.is_null() {
        return 0;
    }
    let topic = cstr_or(topic, "");
    match make_subscriber(topic, msg_type) {
        Ok(handle) => {
            let id = next_handle();
            SUBSCRIBERS.lock().unwrap().insert(id, handle);
            id
        }
        Err(_) => 0,
    }
}

/// Create a size-only subscriber for application-defined payloads.
#[no_mangle]
pub extern "C" fn subscriber_custom(topic: *const c_char, msg_size: usize) -> u32 {
    if topic.is_null() || msg_size == 0 {
        return 0;
    }
    let topic = cstr_or(topic, "");
    match registry().bind_subscriber_custom(topic, msg_size) {
        Ok(handle) => {
            let id = next_handle();
            SUBSCRIBERS
                .lock()
                .unwrap()
                .insert(id, SubHandle::Custom(handle));
            id
        }
        Err(_) => 0,
    }
}

/// Destroy a publisher handle, releasing the topic's writer slot.
#[no_mangle]
pub extern "C" fn publisher_destroy(pub_handle: u32) -> bool {
    PUBLISHERS.lock().unwrap().remove(&pub_handle).is_some()
}

/// Destroy a subscriber handle, releasing its cursor.
#[no_mangle]
pub extern "C" fn subscriber_destroy(sub_handle: u32) -> bool {
    SUBSCRIBERS.lock().unwrap().remove(&sub_handle).is_some()
}

// ============================================================================
// Send / Receive
// ============================================================================

/// Publish the record `data` points at. The pointee must match the layout
/// the handle was created with.
#[no_mangle]
pub extern "C" fn send(pub_handle: u32, data: *const c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let mut pubs = PUBLISHERS.lock().unwrap();
    let Some(handle) = pubs.get_mut(&pub_handle) else {
        return false;
    };

    send_inner(handle, data, &mut None)
}

fn send_inner(
    handle: &mut PubHandle,
    data: *const c_void,
    ctx: &mut Option<&mut NodeInfo>,
) -> bool {
    // SAFETY: caller contract — `data` points to a valid, aligned record of
    // the handle's bound type (or `payload_size` bytes for custom).
    unsafe {
        match handle {
            PubHandle::Twist(p) => p.send_ref(&*(data as *const Twist), ctx),
            PubHandle::Pose(p) => p.send_ref(&*(data as *const Pose2D), ctx),
            PubHandle::LaserScan(p) => p.send_ref(&*(data as *const LaserScan), ctx),
            PubHandle::Image(p) => p.send_ref(&*(data as *const Image), ctx),
            PubHandle::Imu(p) => p.send_ref(&*(data as *const Imu), ctx),
            PubHandle::JointState(p) => p.send_ref(&*(data as *const JointCommand), ctx),
            PubHandle::PointCloud(p) => p.send_ref(&*(data as *const PointCloud), ctx),
            PubHandle::Custom(p) => {
                let payload = std::slice::from_raw_parts(data as *const u8, p.payload_size());
                return p.send(payload);
            }
        }
    }
    true
}

fn try_recv_inner(
    handle: &mut SubHandle,
    data: *mut c_void,
    ctx: &mut Option<&mut NodeInfo>,
) -> bool {
    // SAFETY: caller contract as in `send`.
    unsafe {
        match handle {
            SubHandle::Twist(s) => s.recv_into(&mut *(data as *mut Twist), ctx),
            SubHandle::Pose(s) => s.recv_into(&mut *(data as *mut Pose2D), ctx),
            SubHandle::LaserScan(s) => s.recv_into(&mut *(data as *mut LaserScan), ctx),
            SubHandle::Image(s) => s.recv_into(&mut *(data as *mut Image), ctx),
            SubHandle::Imu(s) => s.recv_into(&mut *(data as *mut Imu), ctx),
            SubHandle::JointState(s) => s.recv_into(&mut *(data as *mut JointCommand), ctx),
            SubHandle::PointCloud(s) => s.recv_into(&mut *(data as *mut PointCloud), ctx),
            SubHandle::Custom(s) => {
                let out = std::slice::from_raw_parts_mut(data as *mut u8, s.payload_size());
                s.recv(out)
            }
        }
    }
}

/// Non-blocking receive. Returns true when a message was copied into `data`.
#[no_mangle]
pub extern "C" fn try_recv(sub_handle: u32, data: *mut c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let mut subs = SUBSCRIBERS.lock().unwrap();
    let Some(handle) = subs.get_mut(&sub_handle) else {
        return false;
    };
    try_recv_inner(handle, data, &mut None)
}

/// Blocking receive: polls until a message arrives or `shutdown` is called.
#[no_mangle]
pub extern "C" fn recv(sub_handle: u32, data: *mut c_void) -> bool {
    if data.is_null() {
        return false;
    }
    loop {
        {
            let mut subs = SUBSCRIBERS.lock().unwrap();
            let Some(handle) = subs.get_mut(&sub_handle) else {
                return false;
            };
            if try_recv_inner(handle, data, &mut None) {
                return true;
            }
        }
        if !ok() {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

// ============================================================================
// Timing utilities
// ============================================================================

#[no_mangle]
pub extern "C" fn sleep_ms(ms: u32) {
    std::thread::sleep(Duration::from_millis(ms as u64));
}

#[no_mangle]
pub extern "C" fn time_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Process one round of housekeeping.
#[no_mangle]
pub extern "C" fn spin_once() {
    sleep_ms(1);
}

/// Spin until `shutdown` is called.
#[no_mangle]
pub extern "C" fn spin() {
    while ok() {
        spin_once();
    }
}

// ============================================================================
// Logging
// ============================================================================

fn log_at(level: LogType, msg: *const c_char) {
    if msg.is_null() {
        return;
    }
    let message = cstr_or(msg, "");
    let node = NODE_NAME
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| "-".to_string());
    publish_log(LogEntry {
        timestamp_ns: timestamp_now(),
        level,
        node,
        tick: 0,
        topic: None,
        message: message.to_string(),
        tick_us: 0,
        ipc_ns: 0,
    });
}

#[no_mangle]
pub extern "C" fn log_info(msg: *const c_char) {
    log_at(LogType::Info, msg);
}

#[no_mangle]
pub extern "C" fn log_warn(msg: *const c_char) {
    log_at(LogType::Warning, msg);
}

#[no_mangle]
pub extern "C" fn log_error(msg: *const c_char) {
    log_at(LogType::Error, msg);
}

#[no_mangle]
pub extern "C" fn log_debug(msg: *const c_char) {
    log_at(LogType::Debug, msg);
}

// ============================================================================
// Callback nodes and scheduler
// ============================================================================

/// init/shutdown callback: returns false to signal failure.
pub type LifecycleCallback = Option<extern "C" fn(user_data: *mut c_void) -> bool>;
/// tick callback: invoked once per scheduler period.
pub type TickCallback = Option<extern "C" fn(user_data: *mut c_void)>;
/// Context-scoped init/shutdown callback: also receives the opaque node
/// context for use with the `node_*` functions.
pub type LifecycleCtxCallback =
    Option<extern "C" fn(ctx: *mut c_void, user_data: *mut c_void) -> bool>;
/// Context-scoped tick callback.
pub type TickCtxCallback = Option<extern "C" fn(ctx: *mut c_void, user_data: *mut c_void)>;

/// A node defined by C function pointers plus an opaque user pointer.
/// Either the plain or the context-scoped callback set is populated.
struct CallbackNode {
    name: String,
    init_cb: LifecycleCallback,
    tick_cb: TickCallback,
    shutdown_cb: LifecycleCallback,
    init_ctx_cb: LifecycleCtxCallback,
    tick_ctx_cb: TickCtxCallback,
    shutdown_ctx_cb: LifecycleCtxCallback,
    user_data: *mut c_void,
}

// SAFETY: the scheduler drives every callback from its single thread; the
// user_data pointer is owned by the caller for the node's lifetime.
unsafe impl Send for CallbackNode {}

impl Node for CallbackNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, ctx: &mut NodeInfo) -> HorusResult<()> {
        let passed = if let Some(cb) = self.init_ctx_cb {
            cb(ctx as *mut NodeInfo as *mut c_void, self.user_data)
        } else if let Some(cb) = self.init_cb {
            cb(self.user_data)
        } else {
            true
        };
        if !passed {
            return Err(horus_core::HorusError::InitializationFailed(format!(
                "C init callback for '{}' returned false",
                ctx.name()
            )));
        }
        Ok(())
    }

    fn tick(&mut self, ctx: &mut NodeInfo) {
        if let Some(cb) = self.tick_ctx_cb {
            cb(ctx as *mut NodeInfo as *mut c_void, self.user_data);
        } else if let Some(cb) = self.tick_cb {
            cb(self.user_data);
        }
    }

    fn shutdown(&mut self, ctx: &mut NodeInfo) -> HorusResult<()> {
        let passed = if let Some(cb) = self.shutdown_ctx_cb {
            cb(ctx as *mut NodeInfo as *mut c_void, self.user_data)
        } else if let Some(cb) = self.shutdown_cb {
            cb(self.user_data)
        } else {
            true
        };
        if !passed {
            return Err(horus_core::HorusError::node(
                ctx.name(),
                "C shutdown callback returned false",
            ));
        }
        Ok(())
    }
}

/// Create a callback-driven node. Returns 0 on failure.
#[no_mangle]
pub extern "C" fn node_create(
    name: *const c_char,
    init_cb: LifecycleCallback,
    tick_cb: TickCallback,
    shutdown_cb: LifecycleCallback,
    user_data: *mut c_void,
) -> u32 {
    if name.is_null() {
        return 0;
    }
    let name = cstr_or(name, "").to_string();
    if name.is_empty() {
        return 0;
    }
    let id = next_handle();
    NODES.lock().unwrap().insert(
        id,
        CallbackNode {
            name,
            init_cb,
            tick_cb,
            shutdown_cb,
            init_ctx_cb: None,
            tick_ctx_cb: None,
            shutdown_ctx_cb: None,
            user_data,
        },
    );
    id
}

/// Create a callback-driven node whose callbacks receive the opaque node
/// context, usable with the `node_*` context-scoped functions.
#[no_mangle]
pub extern "C" fn node_create_with_context(
    name: *const c_char,
    init_cb: LifecycleCtxCallback,
    tick_cb: TickCtxCallback,
    shutdown_cb: LifecycleCtxCallback,
    user_data: *mut c_void,
) -> u32 {
    if name.is_null() {
        return 0;
    }
    let name = cstr_or(name, "").to_string();
    if name.is_empty() {
        return 0;
    }
    let id = next_handle();
    NODES.lock().unwrap().insert(
        id,
        CallbackNode {
            name,
            init_cb: None,
            tick_cb: None,
            shutdown_cb: None,
            init_ctx_cb: init_cb,
            tick_ctx_cb: tick_cb,
            shutdown_ctx_cb: shutdown_cb,
            user_data,
        },
    );
    id
}

/// Destroy a node that was never handed to a scheduler.
#[no_mangle]
pub extern "C" fn node_destroy(node_handle: u32) -> bool {
    NODES.lock().unwrap().remove(&node_handle).is_some()
}

// ============================================================================
// Context-scoped variants
// ============================================================================
//
// `ctx` is the opaque pointer handed to context-scoped callbacks. It is only
// valid for the duration of that callback.

unsafe fn ctx_mut<'a>(ctx: *mut c_void) -> Option<&'a mut NodeInfo> {
    (ctx as *mut NodeInfo).as_mut()
}

/// Publish with the node's logging identity attached (timed record in the
/// log sink).
#[no_mangle]
pub extern "C" fn node_send(ctx: *mut c_void, pub_handle: u32, data: *const c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let mut pubs = PUBLISHERS.lock().unwrap();
    let Some(handle) = pubs.get_mut(&pub_handle) else {
        return false;
    };
    // SAFETY: ctx comes from a context-scoped callback invocation.
    let mut ctx = unsafe { ctx_mut(ctx) };
    send_inner(handle, data, &mut ctx)
}

/// Non-blocking receive with the node's logging identity attached.
#[no_mangle]
pub extern "C" fn node_try_recv(ctx: *mut c_void, sub_handle: u32, data: *mut c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let mut subs = SUBSCRIBERS.lock().unwrap();
    let Some(handle) = subs.get_mut(&sub_handle) else {
        return false;
    };
    // SAFETY: ctx comes from a context-scoped callback invocation.
    let mut ctx = unsafe { ctx_mut(ctx) };
    try_recv_inner(handle, data, &mut ctx)
}

fn node_log_at(ctx: *mut c_void, msg: *const c_char, level: LogType) {
    if msg.is_null() {
        return;
    }
    let message = cstr_or(msg, "");
    // SAFETY: ctx comes from a context-scoped callback invocation.
    match unsafe { ctx_mut(ctx) } {
        Some(info) => match level {
            LogType::Info => info.log_info(message),
            LogType::Warning => info.log_warn(message),
            LogType::Error => info.log_error(message),
            _ => info.log_debug(message),
        },
        None => log_at(level, msg),
    }
}

#[no_mangle]
pub extern "C" fn node_log_info(ctx: *mut c_void, msg: *const c_char) {
    node_log_at(ctx, msg, LogType::Info);
}

#[no_mangle]
pub extern "C" fn node_log_warn(ctx: *mut c_void, msg: *const c_char) {
    node_log_at(ctx, msg, LogType::Warning);
}

#[no_mangle]
pub extern "C" fn node_log_error(ctx: *mut c_void, msg: *const c_char) {
    node_log_at(ctx, msg, LogType::Error);
}

#[no_mangle]
pub extern "C" fn node_log_debug(ctx: *mut c_void, msg: *const c_char) {
    node_log_at(ctx, msg, LogType::Debug);
}

/// Current scheduler tick number, 0 without a context.
#[no_mangle]
pub extern "C" fn node_tick_number(ctx: *mut c_void) -> u64 {
    // SAFETY: ctx comes from a context-scoped callback invocation.
    unsafe { ctx_mut(ctx) }.map(|c| c.tick_number()).unwrap_or(0)
}

/// Monotonic nanoseconds since the scheduler started, 0 without a context.
#[no_mangle]
pub extern "C" fn node_time_ns(ctx: *mut c_void) -> u64 {
    // SAFETY: ctx comes from a context-scoped callback invocation.
    unsafe { ctx_mut(ctx) }.map(|c| c.elapsed_ns()).unwrap_or(0)
}

/// Create a scheduler. Returns 0 on failure.
#[no_mangle]
pub extern "C" fn scheduler_create(name: *const c_char) -> u32 {
    let name = cstr_or(name, "scheduler");
    let scheduler = Scheduler::new(name);
    let stop = scheduler.stop_handle();
    let id = next_handle();
    SCHEDULERS.lock().unwrap().insert(
        id,
        SchedulerSlot {
            scheduler: Some(scheduler),
            stop,
        },
    );
    id
}

/// Move a node into a scheduler. Priorities are 0 (critical) to
/// 4 (background); out-of-range values clamp to background.
#[no_mangle]
pub extern "C" fn scheduler_add(
    sched_handle: u32,
    node_handle: u32,
    priority: u8,
    log_enabled: bool,
) -> bool {
    let Some(node) = NODES.lock().unwrap().remove(&node_handle) else {
        return false;
    };
    let mut scheds = SCHEDULERS.lock().unwrap();
    let Some(slot) = scheds.get_mut(&sched_handle) else {
        return false;
    };
    let Some(scheduler) = slot.scheduler.as_mut() else {
        return false; // currently running
    };
    scheduler
        .add_boxed(Box::new(node), Priority::from(priority), log_enabled)
        .is_ok()
}

/// Run the scheduler until a signal or `scheduler_stop`. Blocking.
#[no_mangle]
pub extern "C" fn scheduler_run(sched_handle: u32) -> bool {
    let taken = {
        let mut scheds = SCHEDULERS.lock().unwrap();
        match scheds.get_mut(&sched_handle) {
            Some(slot) => slot.scheduler.take(),
            None => return false,
        }
    };
    let Some(mut scheduler) = taken else {
        return false; // already running elsewhere
    };

    let result = scheduler.run();

    let mut scheds = SCHEDULERS.lock().unwrap();
    if let Some(slot) = scheds.get_mut(&sched_handle) {
        slot.scheduler = Some(scheduler);
    }
    result.is_ok()
}

/// Request a cooperative stop of a running scheduler.
#[no_mangle]
pub extern "C" fn scheduler_stop(sched_handle: u32) -> bool {
    let scheds = SCHEDULERS.lock().unwrap();
    match scheds.get(&sched_handle) {
        Some(slot) => {
            slot.stop.stop();
            true
        }
        None => false,
    }
}

/// Destroy a scheduler that is not running.
#[no_mangle]
pub extern "C" fn scheduler_destroy(sched_handle: u32) -> bool {
    let mut scheds = SCHEDULERS.lock().unwrap();
    match scheds.get(&sched_handle) {
        Some(slot) if slot.scheduler.is_some() => {
            scheds.remove(&sched_handle);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    lazy_static::lazy_static! {
        // The handle tables and registry are process-wide; serialize the
        // tests so shutdown()/teardown cannot interleave with another
        // test's binds.
        static ref FFI_LOCK: Mutex<()> = Mutex::new(());
    }

    fn ffi_guard() -> std::sync::MutexGuard<'static, ()> {
        FFI_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_init_ok_shutdown() {
        let _guard = ffi_guard();
        let name = CString::new("c_node").unwrap();
        assert!(init(name.as_ptr()));
        assert!(ok());
        shutdown();
        assert!(!ok());
    }

    #[test]
    fn test_typed_pub_sub_round_trip() {
        let _guard = ffi_guard();
        let topic = CString::new("c_twist_topic").unwrap();
        let p = publisher(topic.as_ptr(), MessageType::Twist);
        let s = subscriber(topic.as_ptr(), MessageType::Twist);
        assert_ne!(p, 0);
        assert_ne!(s, 0);

        let msg = Twist::new_2d(1.0, -0.5);
        assert!(send(p, &msg as *const Twist as *const c_void));

        let mut out = Twist::stop();
        assert!(try_recv(s, &mut out as *mut Twist as *mut c_void));
        assert_eq!(out.linear, msg.linear);
        assert_eq!(out.angular, msg.angular);

        assert!(!try_recv(s, &mut out as *mut Twist as *mut c_void));
        assert!(publisher_destroy(p));
        assert!(subscriber_destroy(s));
    }

    #[test]
    fn test_duplicate_publisher_fails_with_zero() {
        let _guard = ffi_guard();
        let topic = CString::new("c_dup_topic").unwrap();
        let p1 = publisher(topic.as_ptr(), MessageType::Pose);
        assert_ne!(p1, 0);
        assert_eq!(publisher(topic.as_ptr(), MessageType::Pose), 0);
        assert!(publisher_destroy(p1));
    }

    #[test]
    fn test_custom_payload_round_trip() {
        let _guard = ffi_guard();
        let topic = CString::new("c_custom_topic").unwrap();
        let p = publisher_custom(topic.as_ptr(), 16);
        let s = subscriber_custom(topic.as_ptr(), 16);
        assert_ne!(p, 0);
        assert_ne!(s, 0);

        let data = [0xABu8; 16];
        assert!(send(p, data.as_ptr() as *const c_void));

        let mut out = [0u8; 16];
        assert!(try_recv(s, out.as_mut_ptr() as *mut c_void));
        assert_eq!(out, data);
    }

    #[test]
    fn test_null_arguments_fail_closed() {
        let _guard = ffi_guard();
        assert_eq!(publisher(std::ptr::null(), MessageType::Twist), 0);
        assert_eq!(publisher_custom(std::ptr::null(), 8), 0);
        assert!(!send(1234, std::ptr::null()));
        assert!(!try_recv(1234, std::ptr::null_mut()));
    }

    extern "C" fn ctx_tick(ctx: *mut c_void, user_data: *mut c_void) {
        let counter = unsafe { &*(user_data as *const std::sync::atomic::AtomicU64) };
        counter.store(node_tick_number(ctx) + 1, Ordering::Relaxed);
        let msg = CString::new("ticking with context").unwrap();
        node_log_info(ctx, msg.as_ptr());
    }

    #[test]
    fn test_context_scoped_node_callbacks() {
        let _guard = ffi_guard();
        let observed = Box::leak(Box::new(std::sync::atomic::AtomicU64::new(0)));

        let node_name = CString::new("c_ctx_node").unwrap();
        let node = node_create_with_context(
            node_name.as_ptr(),
            None,
            Some(ctx_tick),
            None,
            observed as *mut std::sync::atomic::AtomicU64 as *mut c_void,
        );
        assert_ne!(node, 0);

        let sched_name = CString::new("c_ctx_sched").unwrap();
        let sched = scheduler_create(sched_name.as_ptr());
        assert!(scheduler_add(sched, node, 2, true));

        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            scheduler_stop(sched);
        });
        assert!(scheduler_run(sched));
        stopper.join().unwrap();

        // The callback saw real tick numbers through the context.
        assert!(observed.load(Ordering::Relaxed) > 0);
        // And its log records are attributed to the node.
        let records = horus_core::GLOBAL_LOG_BUFFER.for_node("c_ctx_node");
        assert!(records.iter().any(|e| e.message.contains("ticking")));

        assert!(scheduler_destroy(sched));
    }

    extern "C" fn count_tick(user_data: *mut c_void) {
        let counter = unsafe { &*(user_data as *const std::sync::atomic::AtomicU64) };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn test_callback_node_in_scheduler() {
        let _guard = ffi_guard();
        let ticks = Box::leak(Box::new(std::sync::atomic::AtomicU64::new(0)));

        let node_name = CString::new("c_counter").unwrap();
        let node = node_create(
            node_name.as_ptr(),
            None,
            Some(count_tick),
            None,
            ticks as *mut std::sync::atomic::AtomicU64 as *mut c_void,
        );
        assert_ne!(node, 0);

        let sched_name = CString::new("c_sched").unwrap();
        let sched = scheduler_create(sched_name.as_ptr());
        assert_ne!(sched, 0);
        assert!(scheduler_add(sched, node, 2, false));

        // Stop the scheduler shortly after it starts ticking.
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            assert!(scheduler_stop(sched));
        });

        assert!(scheduler_run(sched));
        stopper.join().unwrap();

        assert!(ticks.load(Ordering::Relaxed) > 0);
        assert!(scheduler_destroy(sched));
    }
}

//! Daemon wiring and main loop
//!
//! Builds every signal source, hands them one shared [`Reconciler`] through
//! the loop data and runs until SIGINT/SIGTERM or until the display
//! connection dies.

use anyhow::{Context, Result};
use calloop::channel::{self, Channel};
use calloop::EventLoop;
use log::{info, warn};

use crate::config::MonitordConfig;
use crate::display::x11::{self, X11Display};
use crate::display::DisplayWatcher;
use crate::error::SetupError;
use crate::event_queue::EventQueue;
use crate::inhibitor::logind::{LogindInhibitor, LOGIND_SERVICE};
use crate::power::{PowerSource, UPowerMonitor, UPOWER_SERVICE};
use crate::reconciler::Reconciler;
use crate::state::PowerSnapshot;
use crate::topology::XrandrCommand;

pub type LiveReconciler = Reconciler<XrandrCommand, LogindInhibitor>;

/// State shared by every loop callback
pub struct Daemon {
    pub reconciler: LiveReconciler,
}

/// Set everything up and block until shutdown
pub fn run(config: &MonitordConfig) -> Result<()> {
    let mut event_loop: EventLoop<'static, Daemon> =
        EventLoop::try_new().map_err(SetupError::EventLoop)?;
    let handle = event_loop.handle();

    let display = X11Display::connect()?;

    let bus = zbus::blocking::Connection::system().map_err(SetupError::bus("system bus"))?;
    let (executor, scheduler) =
        calloop::futures::executor().context("Failed to create inhibitor executor")?;
    let inhibitor = LogindInhibitor::new(&bus, scheduler, &config.inhibitor)
        .map_err(SetupError::bus(LOGIND_SERVICE))?;
    let power = UPowerMonitor::connect(&bus).map_err(SetupError::bus(UPOWER_SERVICE))?;
    info!("✅ Connected to logind and UPower");

    let configurator = XrandrCommand::new(&config.display, config.outputs.clone());
    let mut daemon = Daemon {
        reconciler: Reconciler::new(configurator, inhibitor),
    };

    // Subscribe before reading so nothing that changes meanwhile is lost
    let power_watch = power.subscribe(&bus)?;
    let watcher = DisplayWatcher::new(display.clone(), config.outputs.clone());
    let seeded = watcher
        .start(&mut daemon.reconciler)
        .map_err(SetupError::from)?;
    info!(
        "Found {} of the managed outputs ({} / {})",
        seeded,
        watcher.names().external,
        watcher.names().internal
    );

    // First reconciliation, with real display and power state
    match power.snapshot() {
        Ok(snapshot) => {
            daemon.reconciler.update_power(snapshot);
        }
        Err(e) => {
            warn!("Failed to read power state: {}", e);
            daemon.reconciler.apply();
        }
    }

    handle
        .insert_source(executor, |reply, _, daemon: &mut Daemon| {
            daemon.reconciler.inhibitor_resolved(reply);
        })
        .map_err(|e| SetupError::EventLoop(e.error))?;

    let (sender, receiver): (_, Channel<PowerSnapshot>) = channel::channel();
    handle
        .insert_source(receiver, |event, _, daemon: &mut Daemon| match event {
            channel::Event::Msg(snapshot) => {
                daemon.reconciler.update_power(snapshot);
            }
            channel::Event::Closed => warn!("Power state updates stopped"),
        })
        .map_err(|e| SetupError::EventLoop(e.error))?;
    power_watch.forward(power, sender)?;

    handle
        .insert_source(
            EventQueue::new(display.connection()),
            move |event, _, daemon: &mut Daemon| {
                watcher.handle(x11::classify(&event), &mut daemon.reconciler)
            },
        )
        .map_err(|e| SetupError::EventLoop(e.error))?;

    let signal = event_loop.get_signal();
    ctrlc::set_handler(move || {
        signal.stop();
        signal.wakeup();
    })
    .map_err(SetupError::from)?;

    info!("👀 Watching displays, power and lid");
    event_loop
        .run(None, &mut daemon, |_| {})
        .context("Event loop failed")?;

    info!("👋 monitord shutting down");
    Ok(())
}

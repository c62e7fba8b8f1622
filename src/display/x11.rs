//! X11/RandR binding for the display signal source

use log::{info, warn};
use std::os::fd::{AsFd, BorrowedFd};
use std::rc::Rc;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::ConnectionError;
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::Window;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use super::{DisplayError, DisplayNotification, OutputProbe};
use crate::error::SetupError;
use crate::state::OutputEvent;

/// Oldest RandR that has output change notifications and primary outputs
const RANDR_MIN_VERSION: (u32, u32) = (1, 3);

impl crate::event_queue::EventConnection for RustConnection {
    type Event = Event;
    type Error = ConnectionError;

    fn poll_fd(&self) -> BorrowedFd<'_> {
        self.stream().as_fd()
    }

    fn flush(&self) -> Result<(), ConnectionError> {
        Connection::flush(self)
    }

    fn poll_for_event(&self) -> Result<Option<Event>, ConnectionError> {
        Connection::poll_for_event(self)
    }
}

/// Connection to the X server plus the root window we watch
#[derive(Clone)]
pub struct X11Display {
    conn: Rc<RustConnection>,
    root: Window,
}

impl X11Display {
    /// Connect to `$DISPLAY` and make sure RandR is usable
    pub fn connect() -> Result<Self, SetupError> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let root = conn.setup().roots[screen_num].root;

        if conn
            .extension_information(randr::X11_EXTENSION_NAME)
            .map_err(DisplayError::from)?
            .is_none()
        {
            return Err(SetupError::RandrMissing);
        }

        let version = conn
            .randr_query_version(RANDR_MIN_VERSION.0, RANDR_MIN_VERSION.1)
            .map_err(DisplayError::from)?
            .reply()
            .map_err(DisplayError::from)?;
        if (version.major_version, version.minor_version) < RANDR_MIN_VERSION {
            return Err(SetupError::RandrTooOld {
                major: version.major_version,
                minor: version.minor_version,
            });
        }

        info!(
            "✅ Connected to X server, RandR {}.{}",
            version.major_version, version.minor_version
        );
        Ok(Self {
            conn: Rc::new(conn),
            root,
        })
    }

    pub fn connection(&self) -> Rc<RustConnection> {
        self.conn.clone()
    }

    fn output_info(&self, output: randr::Output, timestamp: u32) -> Result<OutputEvent, DisplayError> {
        let info = self.conn.randr_get_output_info(output, timestamp)?.reply()?;
        Ok(OutputEvent {
            name: String::from_utf8_lossy(&info.name).into_owned(),
            connected: info.connection == randr::Connection::CONNECTED,
            has_active_crtc: info.crtc != x11rb::NONE,
        })
    }
}

impl OutputProbe for X11Display {
    fn output_status(&self, output: u32) -> Result<OutputEvent, DisplayError> {
        self.output_info(output, x11rb::CURRENT_TIME)
    }

    fn enumerate(&self) -> Result<Vec<OutputEvent>, DisplayError> {
        let resources = self
            .conn
            .randr_get_screen_resources_current(self.root)?
            .reply()?;
        let primary = self.conn.randr_get_output_primary(self.root)?.reply()?.output;

        let mut outputs = Vec::with_capacity(resources.outputs.len());
        for &output in &resources.outputs {
            match self.output_info(output, resources.config_timestamp) {
                Ok(event) => {
                    if output == primary {
                        info!("Primary output is {}", event.name);
                    }
                    outputs.push(event);
                }
                Err(e) => warn!("Failed to query output {}: {}", output, e),
            }
        }
        Ok(outputs)
    }

    /// Select output change notifications on the root window
    fn subscribe(&self) -> Result<(), DisplayError> {
        self.conn
            .randr_select_input(self.root, randr::NotifyMask::OUTPUT_CHANGE)?
            .check()?;
        Connection::flush(&*self.conn)?;
        Ok(())
    }
}

/// Reduce a raw X event to a notification
pub fn classify(event: &Event) -> DisplayNotification {
    match event {
        Event::RandrNotify(notify) if notify.sub_code == randr::Notify::OUTPUT_CHANGE => {
            let change = notify.u.as_oc();
            DisplayNotification::OutputChange {
                output: change.output,
                connected: change.connection == randr::Connection::CONNECTED,
                crtc: change.crtc,
            }
        }
        other => DisplayNotification::Other(format!("{:?}", other)),
    }
}

mod countdown;
mod intent;
mod progress;
mod runner;
mod service;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use countdown::{Countdown, CountdownHandle, Tick};
pub use intent::SessionIntent;
pub use progress::{NavigatorStatus, SessionProgress};
pub use runner::{SessionHandle, SessionRunner};
pub use service::ExamSession;
pub use view::{ReviewItem, SessionSnapshot, TIME_WARNING_SECS, format_clock};

//! Global subscriber setup

use std::sync::Once;

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Output style of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable lines on stderr, `nestset=debug`
    Development,
    /// One JSON object per event on stderr, `nestset=info`
    Production,
    /// Bare registry; install `init_test_capture()` to record events
    Test,
}

impl Profile {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "nestset=debug",
            Profile::Production => "nestset=info",
            Profile::Test => "off",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

static INIT: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// Only the first call in a process has an effect, and it yields to a
/// subscriber installed by someone else. Events go to stderr so that
/// stdout stays free for command output.
pub fn init(profile: Profile) {
    INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(profile.filter());
        let _ = match profile {
            Profile::Development => builder.finish().try_init(),
            Profile::Production => builder.json().finish().try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
    });
}

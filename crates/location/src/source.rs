//! Location source capability

use tracing::debug;

/// Anything that can produce a fix string for the platform.
pub trait LocationSource: Send {
    /// Current fix, or `None` when no fix is available right now.
    fn get_fix(&mut self) -> Option<String>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "location"
    }
}

impl<S: LocationSource + ?Sized> LocationSource for Box<S> {
    fn get_fix(&mut self) -> Option<String> {
        (**self).get_fix()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Tries `primary` first and falls back to `secondary`.
#[derive(Debug)]
pub struct FallbackSource<P, S> {
    primary: P,
    secondary: S,
}

impl<P: LocationSource, S: LocationSource> FallbackSource<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: LocationSource, S: LocationSource> LocationSource for FallbackSource<P, S> {
    fn get_fix(&mut self) -> Option<String> {
        if let Some(fix) = self.primary.get_fix() {
            return Some(fix);
        }
        debug!(
            primary = self.primary.name(),
            secondary = self.secondary.name(),
            "No fix from primary source, falling back"
        );
        self.secondary.get_fix()
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

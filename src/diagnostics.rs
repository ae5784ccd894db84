// src/diagnostics.rs
//! Capability-degradation diagnostics.
//!
//! Some descriptor features cannot be honored by the target engine. They are
//! downgraded to the nearest supported approximation and reported through a
//! structured sink passed into the compiler, so call sites stay pure and
//! testable; construction never aborts on a capability shortfall. Every
//! report is mirrored to `log::warn!` for ambient observability.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// A feature the engine cannot fully honor; the build proceeded with an
/// approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// A hollow primitive was requested; it was built solid.
    HollowShape,
    /// Spheroid axes deviate by more than 1%; a sphere of radius `size.x / 2`
    /// was built.
    NonUniformSpheroid,
    /// A non-convex mesh on a dynamic body; its convex hull was built.
    DynamicNonConvexMesh,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Capability::HollowShape => "hollow primitives are not supported; built solid",
            Capability::NonUniformSpheroid => {
                "non-uniform spheroids are not supported; built a sphere from the x extent"
            }
            Capability::DynamicNonConvexMesh => {
                "dynamic non-convex meshes are not supported; built the convex hull"
            }
        };
        f.write_str(msg)
    }
}

/// One-way sink for capability diagnostics.
pub trait DiagnosticsSink {
    fn report(&mut self, capability: Capability);
}

/// Discards diagnostics (the `log::warn!` mirror still fires).
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn report(&mut self, _capability: Capability) {}
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F: FnMut(Capability)> DiagnosticsSink for FnSink<F> {
    fn report(&mut self, capability: Capability) {
        (self.0)(capability)
    }
}

/// Collects diagnostics into an owned list, in emission order.
#[derive(Debug, Default)]
pub struct CollectedDiagnostics {
    events: Vec<Capability>,
}

impl CollectedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Capability] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of reports for one specific capability.
    pub fn count_of(&self, capability: Capability) -> usize {
        self.events.iter().filter(|&&c| c == capability).count()
    }
}

impl DiagnosticsSink for CollectedDiagnostics {
    fn report(&mut self, capability: Capability) {
        self.events.push(capability);
    }
}

/// Clonable, thread-safe collector for hosts that fan diagnostics out to a
/// central channel.
#[derive(Debug, Clone, Default)]
pub struct SharedDiagnostics {
    events: Arc<Mutex<Vec<Capability>>>,
}

impl SharedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Capability> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl DiagnosticsSink for SharedDiagnostics {
    fn report(&mut self, capability: Capability) {
        self.events.lock().push(capability);
    }
}

/// Report a degradation to the sink and the log at once.
pub(crate) fn degrade<D: DiagnosticsSink + ?Sized>(sink: &mut D, capability: Capability) {
    log::warn!("collision capability degraded: {}", capability);
    sink.report(capability);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collected_diagnostics_preserve_order() {
        let mut sink = CollectedDiagnostics::new();
        sink.report(Capability::HollowShape);
        sink.report(Capability::NonUniformSpheroid);
        sink.report(Capability::HollowShape);
        assert_eq!(
            sink.events(),
            &[
                Capability::HollowShape,
                Capability::NonUniformSpheroid,
                Capability::HollowShape,
            ]
        );
        assert_eq!(sink.count_of(Capability::HollowShape), 2);
    }

    #[test]
    fn test_shared_diagnostics_seen_by_clones() {
        let shared = SharedDiagnostics::new();
        let mut writer = shared.clone();
        writer.report(Capability::DynamicNonConvexMesh);
        assert_eq!(shared.take(), vec![Capability::DynamicNonConvexMesh]);
        assert!(shared.take().is_empty());
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = FnSink(|c: Capability| seen.push(c));
            degrade(&mut sink, Capability::HollowShape);
        }
        assert_eq!(seen, vec![Capability::HollowShape]);
    }
}

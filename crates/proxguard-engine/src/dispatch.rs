//! [`EventDispatcher`] – ordered, synchronous fan-out of risk events.
//!
//! After all zones have been evaluated for a tick the engine hands the
//! resulting [`RiskEvent`]s to the dispatcher, which delivers them to every
//! subscribed [`RiskSink`] in subscription order, events in zone-registration
//! order.  Delivery is synchronous and bounded by the sinks themselves; a
//! failing sink never prevents delivery to subsequent sinks.  Failures are
//! collected as [`SinkFailure`]s and surfaced to the caller after the full
//! dispatch pass.
//!
//! The batched dispatch replaces per-zone callbacks invoked inline on every
//! update: sinks observe a consistent, fully-evaluated tick instead of
//! reentrant callback chains.

use proxguard_types::{ProxError, RiskEvent};
use tracing::{info, warn};

// ────────────────────────────────────────────────────────────────────────────
// Sink trait
// ────────────────────────────────────────────────────────────────────────────

/// A consumer of risk-level transitions (boundary renderer, haptic driver,
/// telemetry writer).
///
/// Implementations must be fast: delivery happens inside the tick, on the
/// host's frame loop.
pub trait RiskSink {
    /// Stable name used for subscription management and failure reports.
    fn name(&self) -> &str;

    /// Handle one transition.  Returning an error marks this delivery as
    /// failed but does not affect other sinks or subsequent events.
    fn on_risk_event(&mut self, event: &RiskEvent) -> Result<(), ProxError>;
}

/// A delivery failure recorded during one dispatch pass.
#[derive(Debug)]
pub struct SinkFailure {
    /// Name of the failing sink.
    pub sink: String,
    /// Zone whose event could not be delivered.
    pub zone_id: String,
    pub error: ProxError,
}

// ────────────────────────────────────────────────────────────────────────────
// EventDispatcher
// ────────────────────────────────────────────────────────────────────────────

/// Owns the subscribed sinks and performs the per-tick dispatch pass.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn RiskSink>>,
}

impl EventDispatcher {
    /// Create a dispatcher with no sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a sink.  A previously subscribed sink with the same name is
    /// replaced in place, keeping its delivery position.
    pub fn subscribe(&mut self, sink: Box<dyn RiskSink>) {
        match self.sinks.iter_mut().find(|s| s.name() == sink.name()) {
            Some(slot) => *slot = sink,
            None => self.sinks.push(sink),
        }
    }

    /// Remove the sink with the given name.  Returns `true` when a sink was
    /// removed.
    pub fn unsubscribe(&mut self, name: &str) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|s| s.name() != name);
        self.sinks.len() != before
    }

    /// Number of subscribed sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver `events` to every sink: events outermost (zone-registration
    /// order), sinks innermost (subscription order).
    ///
    /// Every failure is logged and collected; none aborts the pass.
    pub fn dispatch(&mut self, events: &[RiskEvent]) -> Vec<SinkFailure> {
        let mut failures = Vec::new();
        for event in events {
            for sink in &mut self.sinks {
                if let Err(error) = sink.on_risk_event(event) {
                    warn!(
                        sink = %sink.name(),
                        zone_id = %event.zone_id,
                        %error,
                        "sink failed to handle risk event"
                    );
                    failures.push(SinkFailure {
                        sink: sink.name().to_string(),
                        zone_id: event.zone_id.clone(),
                        error,
                    });
                }
            }
        }
        failures
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in sinks
// ────────────────────────────────────────────────────────────────────────────

/// Sink that records every transition through `tracing`: escalations at
/// `warn`, easings at `info`.
#[derive(Default)]
pub struct TracingSink;

impl RiskSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn on_risk_event(&mut self, event: &RiskEvent) -> Result<(), ProxError> {
        if event.is_escalation() {
            warn!(
                zone_id = %event.zone_id,
                from = %event.previous_level,
                to = %event.new_level,
                contributor = event.contributor.as_deref().unwrap_or("-"),
                tick = event.tick,
                "risk level escalated"
            );
        } else {
            info!(
                zone_id = %event.zone_id,
                from = %event.previous_level,
                to = %event.new_level,
                tick = event.tick,
                "risk level eased"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proxguard_types::RiskLevel;
    use std::cell::RefCell;
    use std::rc::Rc;
    use uuid::Uuid;

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    struct RecordingSink {
        name: String,
        seen: Rc<RefCell<Vec<String>>>,
    }
    impl RecordingSink {
        fn new(name: &str, seen: Rc<RefCell<Vec<String>>>) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                seen,
            })
        }
    }
    impl RiskSink for RecordingSink {
        fn name(&self) -> &str {
            &self.name
        }
        fn on_risk_event(&mut self, event: &RiskEvent) -> Result<(), ProxError> {
            self.seen
                .borrow_mut()
                .push(format!("{}:{}", self.name, event.zone_id));
            Ok(())
        }
    }

    struct FailingSink;
    impl RiskSink for FailingSink {
        fn name(&self) -> &str {
            "broken"
        }
        fn on_risk_event(&mut self, _event: &RiskEvent) -> Result<(), ProxError> {
            Err(ProxError::SinkDelivery {
                sink: "broken".to_string(),
                details: "haptic device unplugged".to_string(),
            })
        }
    }

    fn event(zone_id: &str) -> RiskEvent {
        RiskEvent {
            id: Uuid::new_v4(),
            zone_id: zone_id.to_string(),
            previous_level: RiskLevel::Safe,
            new_level: RiskLevel::Warning,
            tick: 1,
            timestamp: Utc::now(),
            contributor: None,
        }
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[test]
    fn events_delivered_in_order_to_all_sinks() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.subscribe(RecordingSink::new("first", seen.clone()));
        dispatcher.subscribe(RecordingSink::new("second", seen.clone()));

        let failures = dispatcher.dispatch(&[event("a"), event("b")]);
        assert!(failures.is_empty());
        assert_eq!(
            *seen.borrow(),
            vec!["first:a", "second:a", "first:b", "second:b"],
            "events outermost, sinks innermost"
        );
    }

    #[test]
    fn failing_sink_does_not_block_others() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.subscribe(Box::new(FailingSink));
        dispatcher.subscribe(RecordingSink::new("healthy", seen.clone()));

        let failures = dispatcher.dispatch(&[event("a"), event("b")]);
        assert_eq!(failures.len(), 2, "one failure per event");
        assert_eq!(failures[0].sink, "broken");
        assert_eq!(failures[0].zone_id, "a");
        assert!(matches!(failures[0].error, ProxError::SinkDelivery { .. }));
        // The healthy sink saw everything despite the failures.
        assert_eq!(*seen.borrow(), vec!["healthy:a", "healthy:b"]);
    }

    #[test]
    fn unsubscribe_removes_sink() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.subscribe(RecordingSink::new("only", seen.clone()));
        assert!(dispatcher.unsubscribe("only"));
        assert!(!dispatcher.unsubscribe("only"), "second removal is a no-op");

        dispatcher.dispatch(&[event("a")]);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn resubscribe_replaces_in_place() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.subscribe(RecordingSink::new("sink", first.clone()));
        dispatcher.subscribe(RecordingSink::new("sink", second.clone()));
        assert_eq!(dispatcher.sink_count(), 1);

        dispatcher.dispatch(&[event("a")]);
        assert!(first.borrow().is_empty(), "replaced sink sees nothing");
        assert_eq!(*second.borrow(), vec!["sink:a"]);
    }

    #[test]
    fn dispatch_with_no_events_is_a_noop() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.subscribe(Box::new(FailingSink));
        assert!(dispatcher.dispatch(&[]).is_empty());
    }

    #[test]
    fn tracing_sink_accepts_all_events() {
        let mut sink = TracingSink;
        assert!(sink.on_risk_event(&event("a")).is_ok());
        let mut easing = event("b");
        easing.previous_level = RiskLevel::Critical;
        easing.new_level = RiskLevel::Warning;
        assert!(sink.on_risk_event(&easing).is_ok());
    }
}

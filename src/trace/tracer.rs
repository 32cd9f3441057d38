//! The event-recording trace sink

use super::{ExceptionInfo, StepEvent, TraceEvent, TraceHost, TraceSink};
use crate::config::TraceConfig;
use crate::snapshot::{build_snapshot, build_stack, render, SourceId};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracerState {
    Idle,
    Armed,
    Emitting,
}

/// Records one [`TraceEvent`] per accepted step, in observation order.
///
/// Steps are accepted only while armed and only from frames whose code
/// belongs to the user's source unit.
pub struct Tracer {
    state: TracerState,
    user_source: SourceId,
    config: TraceConfig,
    events: Vec<TraceEvent>,
}

impl Tracer {
    pub fn new(user_source: SourceId, config: TraceConfig) -> Self {
        Tracer {
            state: TracerState::Idle,
            user_source,
            config,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> TracerState {
        self.state
    }

    pub fn arm(&mut self) {
        if self.state == TracerState::Idle {
            debug!(source = self.user_source.0, "tracer armed");
            self.state = TracerState::Armed;
        }
    }

    pub fn disarm(&mut self) {
        if self.state != TracerState::Idle {
            debug!(events = self.events.len(), "tracer disarmed");
            self.state = TracerState::Idle;
        }
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }

    fn record<H: TraceHost>(
        &self,
        host: &H,
        frame: H::Frame,
        event: StepEvent<H::Value>,
    ) -> TraceEvent {
        let repr_length = self.config.repr_length;
        let locals = host
            .locals(frame)
            .into_iter()
            .filter(|(name, _)| !name.starts_with("__") && name != "self")
            .map(|(name, value)| (name, render(host, &value, repr_length)))
            .collect();
        let stack = build_stack(host, frame, self.user_source, self.config.max_stack_frames);
        let memory = build_snapshot(
            host,
            frame,
            self.user_source,
            self.config.limits,
            repr_length,
        );

        let kind = event.kind();
        let (return_value, exception) = match event {
            StepEvent::Return(value) => (Some(render(host, &value, repr_length)), None),
            StepEvent::Exception(error) => (
                None,
                Some(ExceptionInfo {
                    type_name: host.type_name(&error),
                    message: render(host, &error, repr_length),
                }),
            ),
            StepEvent::Call | StepEvent::Line => (None, None),
        };

        TraceEvent {
            event: kind,
            line: host.line(frame),
            function: host.function_name(frame),
            locals,
            stack,
            stdout: host.captured_stdout(),
            memory,
            return_value,
            exception,
        }
    }
}

impl<H: TraceHost> TraceSink<H> for Tracer {
    fn on_event(&mut self, host: &H, frame: H::Frame, event: StepEvent<H::Value>) {
        if self.state != TracerState::Armed || host.source_id(frame) != self.user_source {
            return;
        }
        self.state = TracerState::Emitting;
        let recorded = self.record(host, frame, event);
        trace!(
            index = self.events.len(),
            kind = recorded.event.as_str(),
            line = recorded.line,
            "recorded event"
        );
        self.events.push(recorded);
        self.state = TracerState::Armed;
    }
}

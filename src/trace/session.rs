//! Scoped tracer attachment

use super::tracer::Tracer;
use super::{TraceHost, TraceSink};
use std::cell::RefCell;
use std::rc::Rc;

/// Arms `tracer` and attaches it to `host` on creation; detaches and disarms
/// it when dropped, however the run ends.
pub struct TraceSession<'h, H: TraceHost> {
    host: &'h mut H,
    tracer: Rc<RefCell<Tracer>>,
}

impl<'h, H: TraceHost> TraceSession<'h, H> {
    pub fn new(host: &'h mut H, tracer: Rc<RefCell<Tracer>>) -> Self {
        tracer.borrow_mut().arm();
        let sink: Rc<RefCell<dyn TraceSink<H>>> = tracer.clone();
        host.attach_sink(sink);
        TraceSession { host, tracer }
    }

    /// The traced host
    pub fn host(&mut self) -> &mut H {
        self.host
    }
}

impl<H: TraceHost> Drop for TraceSession<'_, H> {
    fn drop(&mut self) {
        self.host.detach_sink();
        match self.tracer.try_borrow_mut() {
            Ok(mut tracer) => tracer.disarm(),
            Err(_) => tracing::warn!("tracer busy while closing trace session"),
        }
    }
}

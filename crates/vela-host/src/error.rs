//! Fault routing.
//!
//! Recoverable faults flow to the embedder's [`FaultHandler`]; cancellation
//! is expected during destroy and is swallowed here so handlers never see
//! it. Programmer misuse panics at the call site instead of passing through
//! this module.

use std::sync::Arc;

use vela_sdk::{FaultHandler, HostFault};

/// Default fault handler: logs and drops.
#[derive(Debug, Default)]
pub struct LoggingFaultHandler;

impl FaultHandler for LoggingFaultHandler {
    fn handle(&self, fault: HostFault) {
        log::error!("script host fault: {}", fault);
    }
}

/// Route a fault to the handler, swallowing cancellation.
pub(crate) fn report(handler: &Arc<dyn FaultHandler>, fault: HostFault) {
    if matches!(fault, HostFault::Cancelled) {
        log::debug!("build cancelled; not reporting");
        return;
    }
    handler.handle(fault);
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use vela_sdk::EngineFault;

    #[derive(Default)]
    struct Collecting(Mutex<Vec<HostFault>>);

    impl FaultHandler for Collecting {
        fn handle(&self, fault: HostFault) {
            self.0.lock().push(fault);
        }
    }

    #[test]
    fn test_cancellation_is_swallowed() {
        let collector = Arc::new(Collecting::default());
        let handler: Arc<dyn FaultHandler> = collector.clone();

        report(&handler, HostFault::Cancelled);
        assert!(collector.0.lock().is_empty());

        report(&handler, EngineFault::Bundle("boom".to_string()).into());
        assert_eq!(collector.0.lock().len(), 1);
    }
}

//! The `GameService` trait and the registry that drives service
//! lifecycles in lockstep with round phases.
//!
//! Services are the extension point for actual minigame rules: the host
//! registers anything implementing [`GameService`], and the round
//! controller starts, ticks, and stops every registered service as the
//! round moves through its phases.

use tracing::{debug, error, info, warn};

use crate::RegistryError;

/// A failure inside a single service's lifecycle hook.
///
/// Faults are isolated at the registry boundary: they are logged with
/// the offending service's identity and never propagate to the round.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ServiceError(pub String);

impl ServiceError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// A pluggable unit of gameplay logic with start/update/stop hooks.
///
/// The identity must be stable and unique within the registry. Whether
/// a service is running is tracked by the registry, not self-reported.
pub trait GameService: Send + 'static {
    /// Stable identifier, unique within the registry.
    fn id(&self) -> &str;

    /// Called once when the round enters Playing.
    fn start(&mut self) -> Result<(), ServiceError>;

    /// Called every round tick while Playing.
    fn update(&mut self) -> Result<(), ServiceError>;

    /// Called once when the round ends.
    fn stop(&mut self) -> Result<(), ServiceError>;
}

/// Holds every registered service and fans lifecycle calls out to them.
///
/// The resilience property of the registry: each bulk operation
/// isolates per-service failures (log, continue), so one broken service
/// can never prevent the others from starting, updating, or stopping.
pub struct ServiceRegistry {
    /// Registration order; ids are unique.
    services: Vec<Box<dyn GameService>>,
    started: bool,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            started: false,
        }
    }

    /// Registers a service. When the registry is already started, the
    /// new service is started immediately so services added mid-round
    /// are never silently excluded.
    pub fn register(&mut self, mut service: Box<dyn GameService>) -> Result<(), RegistryError> {
        if self.contains(service.id()) {
            warn!(service = service.id(), "service already registered");
            return Err(RegistryError::AlreadyRegistered(service.id().to_string()));
        }

        if self.started {
            if let Err(e) = service.start() {
                error!(service = service.id(), error = %e, "failed to start late-registered service");
            }
        }

        info!(service = service.id(), "registered game service");
        self.services.push(service);
        Ok(())
    }

    /// Unregisters a service by id, stopping it first if running.
    pub fn unregister(&mut self, id: &str) -> Result<(), RegistryError> {
        let Some(idx) = self.services.iter().position(|s| s.id() == id) else {
            return Err(RegistryError::NotFound(id.to_string()));
        };

        let mut service = self.services.remove(idx);
        if self.started {
            if let Err(e) = service.stop() {
                error!(service = id, error = %e, "failed to stop service during unregister");
            }
        }

        info!(service = id, "unregistered game service");
        Ok(())
    }

    /// Starts every service. A warning no-op when already started.
    pub fn start_all(&mut self) {
        if self.started {
            warn!("game services are already started");
            return;
        }

        for service in &mut self.services {
            match service.start() {
                Ok(()) => debug!(service = service.id(), "started game service"),
                Err(e) => error!(service = service.id(), error = %e, "failed to start game service"),
            }
        }

        self.started = true;
        info!(count = self.services.len(), "started game services");
    }

    /// Stops every service. A silent no-op when not started.
    pub fn stop_all(&mut self) {
        if !self.started {
            return;
        }

        for service in &mut self.services {
            match service.stop() {
                Ok(()) => debug!(service = service.id(), "stopped game service"),
                Err(e) => error!(service = service.id(), error = %e, "failed to stop game service"),
            }
        }

        self.started = false;
        info!("stopped all game services");
    }

    /// Ticks every service. A no-op when not started.
    pub fn update_all(&mut self) {
        if !self.started {
            return;
        }

        for service in &mut self.services {
            if let Err(e) = service.update() {
                error!(service = service.id(), error = %e, "error updating game service");
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn GameService> {
        self.services
            .iter()
            .find(|s| s.id() == id)
            .map(|s| s.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.services.iter().any(|s| s.id() == id)
    }

    /// Service ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records lifecycle calls into a shared log.
    struct Probe {
        id: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Probe {
        fn boxed(id: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Box<dyn GameService> {
            Box::new(Self {
                id,
                log: Arc::clone(log),
            })
        }

        fn record(&self, event: &str) {
            self.log.lock().unwrap().push(format!("{}:{}", self.id, event));
        }
    }

    impl GameService for Probe {
        fn id(&self) -> &str {
            self.id
        }
        fn start(&mut self) -> Result<(), ServiceError> {
            self.record("start");
            Ok(())
        }
        fn update(&mut self) -> Result<(), ServiceError> {
            self.record("update");
            Ok(())
        }
        fn stop(&mut self) -> Result<(), ServiceError> {
            self.record("stop");
            Ok(())
        }
    }

    /// Fails every hook.
    struct Faulty;

    impl GameService for Faulty {
        fn id(&self) -> &str {
            "faulty"
        }
        fn start(&mut self) -> Result<(), ServiceError> {
            Err(ServiceError::new("start blew up"))
        }
        fn update(&mut self) -> Result<(), ServiceError> {
            Err(ServiceError::new("update blew up"))
        }
        fn stop(&mut self) -> Result<(), ServiceError> {
            Err(ServiceError::new("stop blew up"))
        }
    }

    fn log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_register_rejects_duplicate_id() {
        let log = log();
        let mut registry = ServiceRegistry::new();
        registry.register(Probe::boxed("a", &log)).unwrap();

        let result = registry.register(Probe::boxed("a", &log));
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_unknown_is_not_found() {
        let mut registry = ServiceRegistry::new();
        assert!(matches!(
            registry.unregister("ghost"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_start_all_starts_in_registration_order() {
        let log = log();
        let mut registry = ServiceRegistry::new();
        registry.register(Probe::boxed("a", &log)).unwrap();
        registry.register(Probe::boxed("b", &log)).unwrap();

        registry.start_all();

        assert!(registry.is_started());
        assert_eq!(*log.lock().unwrap(), vec!["a:start", "b:start"]);
    }

    #[test]
    fn test_start_all_twice_is_noop() {
        let log = log();
        let mut registry = ServiceRegistry::new();
        registry.register(Probe::boxed("a", &log)).unwrap();

        registry.start_all();
        registry.start_all();

        assert_eq!(*log.lock().unwrap(), vec!["a:start"]);
    }

    #[test]
    fn test_stop_all_when_not_started_is_silent_noop() {
        let log = log();
        let mut registry = ServiceRegistry::new();
        registry.register(Probe::boxed("a", &log)).unwrap();

        registry.stop_all();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_update_all_only_when_started() {
        let log = log();
        let mut registry = ServiceRegistry::new();
        registry.register(Probe::boxed("a", &log)).unwrap();

        registry.update_all();
        assert!(log.lock().unwrap().is_empty());

        registry.start_all();
        registry.update_all();
        assert_eq!(*log.lock().unwrap(), vec!["a:start", "a:update"]);
    }

    #[test]
    fn test_faulty_service_does_not_block_others() {
        let log = log();
        let mut registry = ServiceRegistry::new();
        registry.register(Box::new(Faulty)).unwrap();
        registry.register(Probe::boxed("healthy", &log)).unwrap();

        registry.start_all();
        registry.update_all();
        registry.stop_all();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["healthy:start", "healthy:update", "healthy:stop"]
        );
        assert!(!registry.is_started());
    }

    #[test]
    fn test_register_while_started_starts_immediately() {
        let log = log();
        let mut registry = ServiceRegistry::new();
        registry.start_all();

        registry.register(Probe::boxed("late", &log)).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["late:start"]);
    }

    #[test]
    fn test_unregister_while_started_stops_service() {
        let log = log();
        let mut registry = ServiceRegistry::new();
        registry.register(Probe::boxed("a", &log)).unwrap();
        registry.start_all();

        registry.unregister("a").unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a:start", "a:stop"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_in_registration_order() {
        let log = log();
        let mut registry = ServiceRegistry::new();
        registry.register(Probe::boxed("b", &log)).unwrap();
        registry.register(Probe::boxed("a", &log)).unwrap();

        assert_eq!(registry.ids(), vec!["b", "a"]);
        assert!(registry.contains("a"));
        assert!(registry.get("b").is_some());
        assert!(registry.get("c").is_none());
    }
}

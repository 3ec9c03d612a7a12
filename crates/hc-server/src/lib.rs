//! homecore daemon
//!
//! [`HomeCore`] wires the shared event bus to the sensor loop, the
//! communication service, the device controller and the automation engine.

pub mod communication_service;
pub mod observers;
pub mod sensor_service;

mod error;

pub use communication_service::CommunicationService;
pub use error::{StartupError, StartupResult};
pub use sensor_service::SensorService;

use hc_automation::{rules_from_config, AutomationEngine};
use hc_command::DeviceController;
use hc_components::SensorFactory;
use hc_config::Config;
use hc_event_bus::EventBus;
use std::sync::Arc;
use tracing::{info, warn};

/// The running system, minus the sensor loop
pub struct HomeCore {
    pub config: Config,
    pub bus: Arc<EventBus>,
    pub controller: Arc<DeviceController>,
    pub automation: AutomationEngine,
    /// `None` when running offline
    pub communication: Option<CommunicationService>,
}

impl HomeCore {
    /// Build every service from `config`
    ///
    /// The sensor loop is returned separately so it can be moved onto its own
    /// task.
    pub fn start(config: Config) -> StartupResult<(Self, SensorService)> {
        let bus = Arc::new(EventBus::new());
        observers::install(&bus);

        let mut sensors = SensorService::from_config(bus.clone(), &config.system);
        sensors.add_sensors(
            SensorFactory::new().from_config(&config.sensors),
            &config.pipeline,
        );
        if sensors.initialize() == 0 {
            return Err(StartupError::NoSensors);
        }

        let communication =
            match CommunicationService::from_config(bus.clone(), &config.communication) {
                Ok(service) if service.start() => Some(service),
                Ok(_) => {
                    warn!("Transport unreachable, running offline");
                    None
                }
                Err(e) => {
                    warn!("{}, running offline", e);
                    None
                }
            };

        let controller = Arc::new(DeviceController::new(bus.clone()));
        controller.register_device(config.devices.fan.id.clone())?;
        controller.register_device(config.devices.alarm.id.clone())?;

        let automation = AutomationEngine::new(bus.clone(), controller.clone());
        for rule in rules_from_config(&config.devices) {
            automation.add_rule(rule)?;
        }
        automation.start_listening();

        info!(
            "homecore started: {} sensors, {} devices, {} rules",
            sensors.sensor_count(),
            controller.device_count(),
            automation.rule_count()
        );

        Ok((
            Self {
                config,
                bus,
                controller,
                automation,
                communication,
            },
            sensors,
        ))
    }

    /// Walk the devices through undo/redo, maintenance and error recovery
    pub fn demonstrate(&self) {
        let fan = self.config.devices.fan.id.as_str();
        let alarm = self.config.devices.alarm.id.as_str();

        info!("Command history: {:?}", self.controller.command_history());
        for result in [self.controller.undo_last(), self.controller.redo_last()] {
            match result {
                Ok(Some(description)) => info!("Replayed: {}", description),
                Ok(None) => {}
                Err(e) => warn!("{}", e),
            }
        }

        let steps = [
            self.controller.start_maintenance(fan),
            self.controller.complete_maintenance(fan),
        ];
        for result in steps {
            if let Err(e) = result {
                warn!("{}", e);
            }
        }

        if let Err(e) = self.controller.activate(alarm) {
            warn!("{}", e);
        }
        if let Err(e) = self.controller.trigger_error(alarm) {
            warn!("{}", e);
        }
        if let Err(e) = self.controller.reset(alarm) {
            warn!("{}", e);
        }
    }

    /// Stop services in reverse start order
    pub fn shutdown(&self) {
        info!("Shutting down");
        self.automation.shutdown();
        if let Some(communication) = &self.communication {
            communication.shutdown();
        }
    }
}

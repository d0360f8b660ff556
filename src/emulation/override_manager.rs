//! Mobile emulation override manager.
//!
//! The browser forgets device-metric overrides on top-level navigation and
//! loses them entirely when the DevTools connection is replaced. This
//! manager listens for both edges and re-applies its metrics: on every
//! (re)connect via `on_connected`, and on every top-level
//! `Page.frameNavigated` event (a frame without a parent).

// ============================================================================
// Imports
// ============================================================================

use std::rc::Rc;

use serde_json::{json, Value};

use crate::client::client::DevToolsClient;
use crate::client::listener::DevToolsEventListener;
use crate::emulation::device_metrics::DeviceMetrics;
use crate::error::Result;

// ============================================================================
// MobileEmulationOverrideManager
// ============================================================================

/// Keeps device-metric overrides applied across navigations and
/// reconnects.
///
/// Holds its metrics immutably and registers with the client only when
/// metrics are present; without metrics it is inert.
pub struct MobileEmulationOverrideManager {
    device_metrics: Option<DeviceMetrics>,
}

impl MobileEmulationOverrideManager {
    /// Creates the manager and, if metrics are present, registers it as a
    /// listener on `client`.
    pub fn new(client: &dyn DevToolsClient, device_metrics: Option<DeviceMetrics>) -> Rc<Self> {
        let manager = Rc::new(Self { device_metrics });
        if manager.device_metrics.is_some() {
            let listener: Rc<dyn DevToolsEventListener> = manager.clone();
            client.add_listener(Rc::downgrade(&listener));
        }
        manager
    }

    /// Returns `true` if the manager carries override metrics.
    #[inline]
    #[must_use]
    pub fn has_override_metrics(&self) -> bool {
        self.device_metrics.is_some()
    }

    /// Returns `true` if the overrides emulate touch input.
    #[inline]
    #[must_use]
    pub fn is_emulating_touch(&self) -> bool {
        self.device_metrics
            .as_ref()
            .is_some_and(|metrics| metrics.touch)
    }

    /// Returns the override metrics, if any.
    #[inline]
    #[must_use]
    pub fn device_metrics(&self) -> Option<&DeviceMetrics> {
        self.device_metrics.as_ref()
    }

    /// Re-applies the overrides immediately.
    pub fn restore_override_metrics(&self, client: &dyn DevToolsClient) -> Result<()> {
        self.apply_override_if_needed(client)
    }

    fn apply_override_if_needed(&self, client: &dyn DevToolsClient) -> Result<()> {
        let Some(metrics) = &self.device_metrics else {
            return Ok(());
        };
        let params = json!({
            "width": metrics.width,
            "height": metrics.height,
            "deviceScaleFactor": metrics.device_scale_factor,
            "mobile": metrics.mobile,
            "fitWindow": metrics.fit_window,
            "textAutosizing": metrics.text_autosizing,
            "fontScaleFactor": metrics.font_scale_factor,
        });
        client.send_command("Page.setDeviceMetricsOverride", params)?;

        if metrics.touch {
            client.send_command(
                "Emulation.setTouchEmulationEnabled",
                json!({"enabled": true}),
            )?;
        }
        Ok(())
    }
}

impl DevToolsEventListener for MobileEmulationOverrideManager {
    fn on_connected(&self, client: &dyn DevToolsClient) -> Result<()> {
        self.apply_override_if_needed(client)
    }

    fn on_event(&self, client: &dyn DevToolsClient, method: &str, params: &Value) -> Result<()> {
        if method == "Page.frameNavigated" {
            // Only a top-level navigation drops the overrides.
            if params.pointer("/frame/parentId").is_none() {
                return self.apply_override_if_needed(client);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Weak;

    use crate::identifiers::CommandId;
    use crate::timeout::Timeout;

    /// Client double that records commands and lets tests fire lifecycle
    /// callbacks by hand.
    #[derive(Default)]
    struct RecorderClient {
        commands: RefCell<Vec<(String, Value)>>,
        listeners: RefCell<Vec<Weak<dyn DevToolsEventListener>>>,
    }

    impl RecorderClient {
        fn trigger_connect(&self) -> Result<()> {
            let listeners = self.listeners.borrow().clone();
            for listener in listeners {
                if let Some(listener) = listener.upgrade() {
                    listener.on_connected(self)?;
                }
            }
            Ok(())
        }

        fn trigger_event(&self, method: &str, params: Value) -> Result<()> {
            let listeners = self.listeners.borrow().clone();
            for listener in listeners {
                if let Some(listener) = listener.upgrade() {
                    listener.on_event(self, method, &params)?;
                }
            }
            Ok(())
        }

        fn methods(&self) -> Vec<String> {
            self.commands
                .borrow()
                .iter()
                .map(|(method, _)| method.clone())
                .collect()
        }
    }

    impl DevToolsClient for RecorderClient {
        fn id(&self) -> &str {
            "recorder"
        }

        fn session_id(&self) -> &str {
            ""
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn connect_if_necessary(&self) -> Result<()> {
            self.trigger_connect()
        }

        fn send_command(&self, method: &str, params: Value) -> Result<()> {
            self.commands
                .borrow_mut()
                .push((method.to_string(), params));
            Ok(())
        }

        fn send_command_with_timeout(
            &self,
            method: &str,
            params: Value,
            _timeout: &Timeout,
        ) -> Result<()> {
            self.send_command(method, params)
        }

        fn send_command_and_get_result(&self, method: &str, params: Value) -> Result<Value> {
            self.send_command(method, params)?;
            Ok(json!({}))
        }

        fn send_command_and_get_result_with_timeout(
            &self,
            method: &str,
            params: Value,
            _timeout: &Timeout,
        ) -> Result<Value> {
            self.send_command_and_get_result(method, params)
        }

        fn send_command_and_ignore_response(&self, method: &str, params: Value) -> Result<()> {
            self.send_command(method, params)
        }

        fn handle_received_events(&self) -> Result<()> {
            Ok(())
        }

        fn handle_events_until(
            &self,
            _is_condition_met: &mut dyn FnMut() -> Result<bool>,
            _timeout: &Timeout,
        ) -> Result<()> {
            Ok(())
        }

        fn next_message_id(&self) -> CommandId {
            CommandId::new(1)
        }

        fn add_listener(&self, listener: Weak<dyn DevToolsEventListener>) {
            self.listeners.borrow_mut().push(listener);
        }
    }

    #[test]
    fn test_without_metrics_stays_inert() {
        let client = RecorderClient::default();
        let manager = MobileEmulationOverrideManager::new(&client, None);
        assert!(!manager.has_override_metrics());
        assert!(!manager.is_emulating_touch());
        assert!(client.listeners.borrow().is_empty());
        client.trigger_connect().expect("connect");
        assert!(client.commands.borrow().is_empty());
    }

    #[test]
    fn test_applies_override_on_connect() {
        let client = RecorderClient::default();
        let metrics = DeviceMetrics::new(1, 2, 3.0, false, true);
        let manager = MobileEmulationOverrideManager::new(&client, Some(metrics));
        assert!(manager.has_override_metrics());
        client.trigger_connect().expect("connect");

        let commands = client.commands.borrow();
        assert_eq!(commands.len(), 1);
        let (method, params) = &commands[0];
        assert_eq!(method, "Page.setDeviceMetricsOverride");
        assert_eq!(params["width"], 1);
        assert_eq!(params["height"], 2);
        assert_eq!(params["deviceScaleFactor"], 3.0);
        assert_eq!(params["mobile"], true);
        assert_eq!(params["fitWindow"], false);
        assert_eq!(params["textAutosizing"], true);
        assert_eq!(params["fontScaleFactor"], 1.0);
        assert!(params.get("touch").is_none());
    }

    #[test]
    fn test_touch_emulation_follows_metrics_override() {
        let client = RecorderClient::default();
        let metrics = DeviceMetrics::new(390, 844, 3.0, true, true);
        let manager = MobileEmulationOverrideManager::new(&client, Some(metrics));
        assert!(manager.is_emulating_touch());
        client.trigger_connect().expect("connect");

        assert_eq!(
            client.methods(),
            vec![
                "Page.setDeviceMetricsOverride",
                "Emulation.setTouchEmulationEnabled"
            ]
        );
        let commands = client.commands.borrow();
        assert_eq!(commands[1].1, json!({"enabled": true}));
    }

    #[test]
    fn test_reapplies_on_top_level_navigation() {
        let client = RecorderClient::default();
        let metrics = DeviceMetrics::new(1, 2, 3.0, false, false);
        let _manager = MobileEmulationOverrideManager::new(&client, Some(metrics));
        client
            .trigger_event("Page.frameNavigated", json!({"frame": {}}))
            .expect("event");
        assert_eq!(client.methods(), vec!["Page.setDeviceMetricsOverride"]);
    }

    #[test]
    fn test_ignores_subframe_navigation() {
        let client = RecorderClient::default();
        let metrics = DeviceMetrics::new(1, 2, 3.0, false, false);
        let _manager = MobileEmulationOverrideManager::new(&client, Some(metrics));
        client
            .trigger_event(
                "Page.frameNavigated",
                json!({"frame": {"parentId": "F248"}}),
            )
            .expect("event");
        client
            .trigger_event("Page.loadEventFired", json!({}))
            .expect("event");
        assert!(client.commands.borrow().is_empty());
    }

    #[test]
    fn test_restore_override_metrics() {
        let client = RecorderClient::default();
        let metrics = DeviceMetrics::new(1, 2, 3.0, false, false);
        let manager = MobileEmulationOverrideManager::new(&client, Some(metrics.clone()));
        manager
            .restore_override_metrics(&client)
            .expect("restore");
        assert_eq!(client.methods(), vec!["Page.setDeviceMetricsOverride"]);
        assert_eq!(manager.device_metrics(), Some(&metrics));
    }
}

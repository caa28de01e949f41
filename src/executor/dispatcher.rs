// Action dispatcher: the single place where an Action becomes a device call.
use std::sync::Arc;

use crate::agent_engine::action::Action;
use crate::device::traits::DeviceControl;
use crate::executor::apps::AppTable;
use crate::executor::coordinator::clamp_to_screen;
use crate::perception::types::DeviceGeometry;

#[derive(Clone)]
pub struct ActionExecutor {
    device: Arc<dyn DeviceControl>,
    apps: Arc<AppTable>,
    swipe_duration_ms: u32,
}

impl ActionExecutor {
    pub fn new(device: Arc<dyn DeviceControl>, apps: AppTable, swipe_duration_ms: u32) -> Self {
        Self {
            device,
            apps: Arc::new(apps),
            swipe_duration_ms,
        }
    }

    pub fn device(&self) -> &Arc<dyn DeviceControl> {
        &self.device
    }

    /// Dispatch one action. Returns `true` when the device call went through
    /// without a transport error; that says nothing about whether the UI reacted.
    /// Loop-control signals (done / wait / failed) make no device call.
    pub async fn execute(&self, action: &Action, geometry: Option<DeviceGeometry>) -> bool {
        let result = match action {
            Action::Tap { x, y } => {
                let (x, y) = clamp_to_screen(*x, *y, geometry);
                self.device.tap(x, y).await
            }
            Action::Swipe { x1, y1, x2, y2 } => {
                self.device
                    .swipe(*x1, *y1, *x2, *y2, self.swipe_duration_ms)
                    .await
            }
            // Focus cannot be verified here; a missed input shows up as lack of progress.
            Action::Input { text } => self.device.input_text(text).await,
            Action::Launch { app } => {
                let package = self.apps.resolve(app);
                tracing::info!(app = %app, package = %package, "launching app");
                self.device.launch(&package).await
            }
            Action::Back => self.device.back().await,
            Action::Home => self.device.home().await,
            Action::Done | Action::Wait | Action::Failed => {
                tracing::debug!(action = action.name(), "control signal, nothing to dispatch");
                return true;
            }
        };

        match result {
            Ok(()) => {
                tracing::info!(action = %action, "action dispatched");
                true
            }
            Err(e) => {
                tracing::warn!(action = %action, error = %e, "action dispatch failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DeviceCall, FakeDevice};

    fn executor(device: Arc<FakeDevice>) -> ActionExecutor {
        ActionExecutor::new(device, AppTable::builtin(), 500)
    }

    #[tokio::test]
    async fn tap_is_clamped_to_geometry() {
        let device = Arc::new(FakeDevice::new(10, 10));
        let exec = executor(device.clone());
        let geo = Some(DeviceGeometry::new(1080, 2400));

        assert!(exec.execute(&Action::Tap { x: 2000, y: -30 }, geo).await);
        assert!(exec.execute(&Action::Tap { x: 100, y: 200 }, geo).await);
        assert_eq!(
            device.calls(),
            vec![DeviceCall::Tap(1080, 0), DeviceCall::Tap(100, 200)]
        );
    }

    #[tokio::test]
    async fn swipe_is_not_clamped() {
        let device = Arc::new(FakeDevice::new(10, 10));
        let exec = executor(device.clone());
        let swipe = Action::Swipe { x1: -10, y1: 2500, x2: 540, y2: 300 };

        assert!(exec.execute(&swipe, Some(DeviceGeometry::new(1080, 2400))).await);
        assert_eq!(device.calls(), vec![DeviceCall::Swipe(-10, 2500, 540, 300, 500)]);
    }

    #[tokio::test]
    async fn launch_resolves_through_app_table() {
        let device = Arc::new(FakeDevice::new(10, 10));
        let exec = executor(device.clone());

        exec.execute(&Action::Launch { app: "settings".into() }, None).await;
        exec.execute(&Action::Launch { app: "com.example.todo".into() }, None).await;
        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::Launch("com.android.settings".into()),
                DeviceCall::Launch("com.example.todo".into()),
            ]
        );
    }

    #[tokio::test]
    async fn control_signals_never_touch_the_device() {
        let device = Arc::new(FakeDevice::new(10, 10));
        let exec = executor(device.clone());
        for action in [Action::Done, Action::Wait, Action::Failed] {
            assert!(exec.execute(&action, None).await);
        }
        assert!(device.calls().is_empty());
    }

    #[tokio::test]
    async fn each_kind_maps_to_one_call() {
        let device = Arc::new(FakeDevice::new(10, 10));
        let exec = executor(device.clone());
        exec.execute(&Action::Input { text: "hello".into() }, None).await;
        exec.execute(&Action::Back, None).await;
        exec.execute(&Action::Home, None).await;
        assert_eq!(
            device.calls(),
            vec![DeviceCall::Input("hello".into()), DeviceCall::Back, DeviceCall::Home]
        );
    }

    #[tokio::test]
    async fn transport_failure_reports_false() {
        let device = Arc::new(FakeDevice::new(10, 10).failing_controls());
        let exec = executor(device.clone());
        assert!(!exec.execute(&Action::Home, None).await);
        assert!(!exec.execute(&Action::Tap { x: 1, y: 1 }, None).await);
        assert_eq!(device.calls().len(), 2);
    }
}

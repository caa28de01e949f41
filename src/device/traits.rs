use async_trait::async_trait;

use crate::device::types::DeviceStatus;
use crate::errors::PhoneClawResult;

/// Remote control primitives exposed by the on-device helper.
/// Every call may fail; callers decide whether a failure is fatal.
#[async_trait]
pub trait DeviceControl: Send + Sync {
    async fn status(&self) -> PhoneClawResult<DeviceStatus>;

    /// Returns the current screen as base64-encoded PNG.
    async fn screenshot(&self) -> PhoneClawResult<String>;

    async fn tap(&self, x: i32, y: i32) -> PhoneClawResult<()>;

    async fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u32) -> PhoneClawResult<()>;

    async fn input_text(&self, text: &str) -> PhoneClawResult<()>;

    async fn back(&self) -> PhoneClawResult<()>;

    async fn home(&self) -> PhoneClawResult<()>;

    async fn launch(&self, package: &str) -> PhoneClawResult<()>;
}

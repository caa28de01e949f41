use serde::{Deserialize, Serialize};

/// Device screen size in physical pixels, as reported by the last good capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGeometry {
    pub width: u32,
    pub height: u32,
}

impl DeviceGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One freshly captured frame. Owned by the step that requested it.
#[derive(Debug, Clone)]
pub struct ScreenState {
    /// Encoded PNG as returned by the device.
    pub image_bytes: Vec<u8>,
    pub image_base64: String,
    pub width: u32,
    pub height: u32,
}

impl ScreenState {
    pub fn geometry(&self) -> DeviceGeometry {
        DeviceGeometry::new(self.width, self.height)
    }
}

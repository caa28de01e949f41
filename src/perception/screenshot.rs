use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;

use crate::device::traits::DeviceControl;
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::perception::types::{DeviceGeometry, ScreenState};

/// Captures frames from the device and remembers the last known screen size.
pub struct ScreenObserver {
    device: Arc<dyn DeviceControl>,
    attempts: u32,
    backoff: Duration,
    geometry: Option<DeviceGeometry>,
}

impl ScreenObserver {
    pub fn new(device: Arc<dyn DeviceControl>, attempts: u32, backoff: Duration) -> Self {
        Self {
            device,
            attempts: attempts.max(1),
            backoff,
            geometry: None,
        }
    }

    /// Geometry from the most recent successful capture, if any.
    pub fn geometry(&self) -> Option<DeviceGeometry> {
        self.geometry
    }

    /// Capture one frame, retrying transient failures with a fixed backoff.
    pub async fn capture(&mut self) -> PhoneClawResult<ScreenState> {
        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match self.capture_once().await {
                Ok(screen) => {
                    self.geometry = Some(screen.geometry());
                    tracing::debug!(
                        attempt,
                        width = screen.width,
                        height = screen.height,
                        bytes = screen.image_bytes.len(),
                        "screen captured"
                    );
                    return Ok(screen);
                }
                Err(e) => {
                    tracing::warn!(attempt, max = self.attempts, error = %e, "capture attempt failed");
                    last_err = Some(e);
                    if attempt < self.attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }
        Err(PhoneClawError::Capture(format!(
            "{} attempts failed, last error: {}",
            self.attempts,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn capture_once(&self) -> PhoneClawResult<ScreenState> {
        let raw = self.device.screenshot().await?;
        decode_screen(raw)
    }
}

/// Decode a base64 PNG (optionally a `data:` URI) and read its dimensions.
pub fn decode_screen(raw: String) -> PhoneClawResult<ScreenState> {
    let image_base64 = match raw.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data.trim().to_string(),
        _ => raw.trim().to_string(),
    };
    let image_bytes = base64::engine::general_purpose::STANDARD.decode(&image_base64)?;
    let (width, height) = image::ImageReader::new(Cursor::new(&image_bytes))
        .with_guessed_format()?
        .into_dimensions()?;

    Ok(ScreenState {
        image_bytes,
        image_base64,
        width,
        height,
    })
}

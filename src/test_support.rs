//! In-memory device and model doubles shared by unit tests.
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;

use crate::device::traits::DeviceControl;
use crate::device::types::DeviceStatus;
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::llm::provider::VisionModel;

pub fn png_base64(width: u32, height: u32) -> String {
    let img = image::RgbImage::new(width, height);
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Tap(i32, i32),
    Swipe(i32, i32, i32, i32, u32),
    Input(String),
    Back,
    Home,
    Launch(String),
}

pub struct FakeDevice {
    png: String,
    accessibility: bool,
    calls: Mutex<Vec<DeviceCall>>,
    screenshot_calls: AtomicU32,
    /// Remaining screenshot failures; `u32::MAX` fails forever.
    screenshot_failures: AtomicU32,
    fail_controls: AtomicBool,
}

impl FakeDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            png: png_base64(width, height),
            accessibility: true,
            calls: Mutex::new(Vec::new()),
            screenshot_calls: AtomicU32::new(0),
            screenshot_failures: AtomicU32::new(0),
            fail_controls: AtomicBool::new(false),
        }
    }

    pub fn failing_screenshots(self, n: u32) -> Self {
        self.set_screenshot_failures(n);
        self
    }

    pub fn without_accessibility(mut self) -> Self {
        self.accessibility = false;
        self
    }

    pub fn failing_controls(self) -> Self {
        self.fail_controls.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_screenshot_failures(&self, n: u32) {
        self.screenshot_failures.store(n, Ordering::SeqCst);
    }

    pub fn screenshot_calls(&self) -> u32 {
        self.screenshot_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: DeviceCall) -> PhoneClawResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail_controls.load(Ordering::SeqCst) {
            return Err(PhoneClawError::Device("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceControl for FakeDevice {
    async fn status(&self) -> PhoneClawResult<DeviceStatus> {
        Ok(DeviceStatus {
            accessibility_enabled: self.accessibility,
        })
    }

    async fn screenshot(&self) -> PhoneClawResult<String> {
        self.screenshot_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.screenshot_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.screenshot_failures.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(PhoneClawError::Device("screenshot timed out".into()));
        }
        Ok(self.png.clone())
    }

    async fn tap(&self, x: i32, y: i32) -> PhoneClawResult<()> {
        self.record(DeviceCall::Tap(x, y))
    }

    async fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u32) -> PhoneClawResult<()> {
        self.record(DeviceCall::Swipe(x1, y1, x2, y2, duration_ms))
    }

    async fn input_text(&self, text: &str) -> PhoneClawResult<()> {
        self.record(DeviceCall::Input(text.to_string()))
    }

    async fn back(&self) -> PhoneClawResult<()> {
        self.record(DeviceCall::Back)
    }

    async fn home(&self) -> PhoneClawResult<()> {
        self.record(DeviceCall::Home)
    }

    async fn launch(&self, package: &str) -> PhoneClawResult<()> {
        self.record(DeviceCall::Launch(package.to_string()))
    }
}

/// Replays scripted replies, then repeats `fallback` forever.
pub struct FakeModel {
    replies: Mutex<VecDeque<PhoneClawResult<String>>>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
    delay: Duration,
}

impl FakeModel {
    pub fn new(fallback: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn reply_err(self, err: PhoneClawError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for FakeModel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, prompt: &str, _image_base64: &str) -> PhoneClawResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

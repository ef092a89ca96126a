//! paperprep-vision
//!
//! Table-image to markup collaborators. The real model lives outside this
//! process and is driven as a command; tests and offline runs use the fake.
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

use paperprep_core::config::VisionSettings;
use paperprep_core::error::{Error, Result};
use paperprep_core::traits::MarkupModel;

/// Runs an external converter with the image path appended as the last
/// argument and takes its stdout as the markup.
#[derive(Debug, Clone)]
pub struct CommandMarkupModel {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandMarkupModel {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::InvalidConfig("vision.command must not be empty".into()))?;
        Ok(Self { program: program.clone(), args: args.to_vec(), timeout: None })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, image: &Path) -> Result<String> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::InferenceUnavailable(format!("failed to start {}: {e}", self.program)))?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output,
                Err(_) => {
                    warn!(program = %self.program, image = %image.display(), ?limit, "markup command timed out");
                    return Err(Error::InferenceUnavailable(format!(
                        "{} timed out after {limit:?} on {}",
                        self.program,
                        image.display()
                    )));
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|e| Error::InferenceUnavailable(format!("{} failed: {e}", self.program)))?;

        if !output.status.success() {
            return Err(Error::InferenceUnavailable(format!("{} exited with {}", self.program, output.status)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Drives `run` from synchronous code: on the caller's multi-thread
    /// runtime when there is one, otherwise on a private current-thread runtime.
    fn run_blocking(&self, image: &Path) -> Result<String> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => handle.block_on(self.run(image)),
            _ => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| Error::InferenceUnavailable(format!("no runtime for {}: {e}", self.program)))?
                .block_on(self.run(image)),
        }
    }
}

impl MarkupModel for CommandMarkupModel {
    fn image_to_markup(&self, image: &Path) -> Result<String> {
        let markup = self.run_blocking(image)?;
        let markup = markup.trim();
        if markup.is_empty() {
            return Err(Error::InferenceUnavailable(format!("empty markup for {}", image.display())));
        }
        debug!(image = %image.display(), chars = markup.len(), "converted figure");
        Ok(markup.to_string())
    }
}

/// Deterministic placeholder markup derived from the image file name.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeMarkupModel;

impl MarkupModel for FakeMarkupModel {
    fn image_to_markup(&self, image: &Path) -> Result<String> {
        if !image.exists() {
            return Err(Error::InferenceUnavailable(format!("image not found: {}", image.display())));
        }
        let name = image.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        Ok(format!("<table><caption>{name}</caption><tr><td>placeholder</td></tr></table>"))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMarkupModel;

impl MarkupModel for DisabledMarkupModel {
    fn image_to_markup(&self, _image: &Path) -> Result<String> {
        Err(Error::InferenceUnavailable("no vision model configured".into()))
    }
}

/// Picks the markup model for the given settings.
///
/// `APP_USE_FAKE_MARKUP=1` (or `vision.use_fake`) selects the fake; a
/// configured command selects the external model; otherwise figures are
/// skipped.
pub fn get_default_model(settings: &VisionSettings) -> Result<Box<dyn MarkupModel>> {
    let use_fake = std::env::var("APP_USE_FAKE_MARKUP")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake || settings.use_fake {
        info!("using fake markup model");
        return Ok(Box::new(FakeMarkupModel));
    }
    if settings.command.is_empty() {
        info!("no vision command configured, figures will be skipped");
        return Ok(Box::new(DisabledMarkupModel));
    }
    let timeout = settings.timeout_secs.map(Duration::from_secs);
    Ok(Box::new(CommandMarkupModel::new(&settings.command)?.with_timeout(timeout)))
}

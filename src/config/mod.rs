//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::render::DEFAULT_PIXEL_BUDGET;
use crate::domain::color::parse_color;
use crate::domain::request::RequestLimits;
use crate::domain::types::{CenterMode, RenderParams};

mod cli;

pub use cli::{CliArgs, Command, FontsArgs, GenerateArgs, Overrides, ServeArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "texttool";
const ENV_PREFIX: &str = "TEXTTOOL";
const DEFAULT_MAX_TASK: u64 = 20;
const DEFAULT_MAX_CHARS_PER_TASK: u64 = 20_000;
const DEFAULT_MAX_IMAGES_PER_TASK: u64 = 1_000;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CATALOG_FILE: &str = "fonts.json";
const DEFAULT_FONT_DIRECTORY: &str = "fonts";
const DEFAULT_FONT_PATH: &str = "fonts/default.ttf";
const DEFAULT_CACHE_DIR: &str = "data/cache";
const DEFAULT_OUTBOX_DIR: &str = "outbox";
const DEFAULT_BACKOFF_MS: u64 = 1_000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub limits: LimitSettings,
    pub fonts: FontSettings,
    pub render: RenderSettings,
    pub workspace: WorkspaceSettings,
    pub worker: WorkerSettings,
    pub delivery: DeliverySettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitSettings {
    /// Capacity of the task queue.
    pub max_task: usize,
    pub max_chars_per_task: usize,
    pub max_images_per_task: usize,
}

impl LimitSettings {
    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            max_chars_per_task: self.max_chars_per_task,
            max_images_per_task: self.max_images_per_task,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontCatalogMode {
    Registry,
    Directory,
}

impl FromStr for FontCatalogMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "registry" => Ok(Self::Registry),
            "directory" => Ok(Self::Directory),
            other => Err(format!("unknown catalog mode `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FontSettings {
    pub mode: FontCatalogMode,
    /// Holds the registry file; registry paths are relative to it.
    pub data_dir: PathBuf,
    pub catalog_file: String,
    pub directory: PathBuf,
    pub default_font: PathBuf,
    pub cache_catalog: bool,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub defaults: RenderParams,
    pub pixel_budget: u64,
}

#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub outbox_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_overrides(&args.overrides),
        Some(Command::Generate(args)) => raw.apply_overrides(&args.overrides),
        Some(Command::Fonts(args)) => raw.apply_overrides(&args.overrides),
        None => raw.apply_overrides(&Overrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    limits: RawLimitSettings,
    fonts: RawFontSettings,
    render: RawRenderSettings,
    workspace: RawWorkspaceSettings,
    worker: RawWorkerSettings,
    delivery: RawDeliverySettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(value) = overrides.max_task {
            self.limits.max_task = Some(value);
        }
        if let Some(value) = overrides.max_chars_per_task {
            self.limits.max_chars_per_task = Some(value);
        }
        if let Some(value) = overrides.max_images_per_task {
            self.limits.max_images_per_task = Some(value);
        }
        if let Some(mode) = overrides.fonts_mode.as_ref() {
            self.fonts.mode = Some(mode.clone());
        }
        if let Some(dir) = overrides.fonts_data_dir.as_ref() {
            self.fonts.data_dir = Some(dir.clone());
        }
        if let Some(dir) = overrides.fonts_directory.as_ref() {
            self.fonts.directory = Some(dir.clone());
        }
        if let Some(path) = overrides.fonts_default_font.as_ref() {
            self.fonts.default_font = Some(path.clone());
        }
        if let Some(dir) = overrides.cache_dir.as_ref() {
            self.workspace.cache_dir = Some(dir.clone());
        }
        if let Some(dir) = overrides.outbox_dir.as_ref() {
            self.delivery.outbox_dir = Some(dir.clone());
        }
        if let Some(backoff) = overrides.backoff_ms {
            self.worker.backoff_ms = Some(backoff);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            limits,
            fonts,
            render,
            workspace,
            worker,
            delivery,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            limits: build_limit_settings(limits)?,
            fonts: build_font_settings(fonts)?,
            render: build_render_settings(render)?,
            workspace: WorkspaceSettings {
                cache_dir: non_empty_path(workspace.cache_dir, DEFAULT_CACHE_DIR),
            },
            worker: WorkerSettings {
                backoff: Duration::from_millis(worker.backoff_ms.unwrap_or(DEFAULT_BACKOFF_MS)),
            },
            delivery: DeliverySettings {
                outbox_dir: non_empty_path(delivery.outbox_dir, DEFAULT_OUTBOX_DIR),
            },
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_limit_settings(limits: RawLimitSettings) -> Result<LimitSettings, LoadError> {
    let max_task = positive_usize(
        limits.max_task.unwrap_or(DEFAULT_MAX_TASK),
        "limits.max_task",
    )?;
    let max_chars_per_task = positive_usize(
        limits
            .max_chars_per_task
            .unwrap_or(DEFAULT_MAX_CHARS_PER_TASK),
        "limits.max_chars_per_task",
    )?;
    let max_images_per_task = positive_usize(
        limits
            .max_images_per_task
            .unwrap_or(DEFAULT_MAX_IMAGES_PER_TASK),
        "limits.max_images_per_task",
    )?;

    Ok(LimitSettings {
        max_task,
        max_chars_per_task,
        max_images_per_task,
    })
}

fn build_font_settings(fonts: RawFontSettings) -> Result<FontSettings, LoadError> {
    let mode = match fonts.mode.as_deref() {
        Some(mode) => mode
            .parse::<FontCatalogMode>()
            .map_err(|reason| LoadError::invalid("fonts.mode", reason))?,
        None => FontCatalogMode::Registry,
    };

    let catalog_file = fonts
        .catalog_file
        .map(|file| file.trim().to_string())
        .filter(|file| !file.is_empty())
        .unwrap_or_else(|| DEFAULT_CATALOG_FILE.to_string());

    Ok(FontSettings {
        mode,
        data_dir: non_empty_path(fonts.data_dir, DEFAULT_DATA_DIR),
        catalog_file,
        directory: non_empty_path(fonts.directory, DEFAULT_FONT_DIRECTORY),
        default_font: non_empty_path(fonts.default_font, DEFAULT_FONT_PATH),
        cache_catalog: fonts.cache_catalog.unwrap_or(true),
    })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let base = RenderParams::default();

    let center_mode = match render.center_mode.as_deref() {
        Some(mode) => mode
            .parse::<CenterMode>()
            .map_err(|reason| LoadError::invalid("render.center_mode", reason))?,
        None => base.center_mode,
    };
    let text_color = match render.text_color.as_deref() {
        Some(color) => parse_color(color)
            .map_err(|err| LoadError::invalid("render.text_color", err.to_string()))?,
        None => base.text_color,
    };
    let bg_color = match render.bg_color.as_deref() {
        Some(color) => parse_color(color)
            .map_err(|err| LoadError::invalid("render.bg_color", err.to_string()))?,
        None => base.bg_color,
    };

    let defaults = RenderParams {
        font_size: positive_u32(render.font_size, base.font_size, "render.font_size")?,
        canvas_height: positive_u32(
            render.canvas_height,
            base.canvas_height,
            "render.canvas_height",
        )?,
        canvas_width: render.canvas_width,
        dpi: positive_u32(render.dpi, base.dpi, "render.dpi")?,
        center_mode,
        x_offset_ratio: finite_ratio(render.x_offset_ratio, base.x_offset_ratio, "render.x_offset_ratio")?,
        y_offset_ratio: finite_ratio(render.y_offset_ratio, base.y_offset_ratio, "render.y_offset_ratio")?,
        padding: render.padding.unwrap_or(base.padding),
        text_color,
        bg_color,
    };

    let pixel_budget = render.pixel_budget.unwrap_or(DEFAULT_PIXEL_BUDGET);
    if pixel_budget == 0 {
        return Err(LoadError::invalid(
            "render.pixel_budget",
            "must be greater than zero",
        ));
    }

    Ok(RenderSettings {
        defaults,
        pixel_budget,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLimitSettings {
    max_task: Option<u64>,
    max_chars_per_task: Option<u64>,
    max_images_per_task: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFontSettings {
    mode: Option<String>,
    data_dir: Option<PathBuf>,
    catalog_file: Option<String>,
    directory: Option<PathBuf>,
    default_font: Option<PathBuf>,
    cache_catalog: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    font_size: Option<u32>,
    canvas_height: Option<u32>,
    canvas_width: Option<u32>,
    dpi: Option<u32>,
    center_mode: Option<String>,
    x_offset_ratio: Option<f32>,
    y_offset_ratio: Option<f32>,
    padding: Option<u32>,
    text_color: Option<String>,
    bg_color: Option<String>,
    pixel_budget: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWorkspaceSettings {
    cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWorkerSettings {
    backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDeliverySettings {
    outbox_dir: Option<PathBuf>,
}

fn positive_usize(value: u64, key: &'static str) -> Result<usize, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    usize::try_from(value)
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))
}

fn positive_u32(value: Option<u32>, default: u32, key: &'static str) -> Result<u32, LoadError> {
    match value.unwrap_or(default) {
        0 => Err(LoadError::invalid(key, "must be greater than zero")),
        value => Ok(value),
    }
}

fn finite_ratio(value: Option<f32>, default: f32, key: &'static str) -> Result<f32, LoadError> {
    let value = value.unwrap_or(default);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LoadError::invalid(key, "must be a finite number"))
    }
}

fn non_empty_path(value: Option<PathBuf>, default: &str) -> PathBuf {
    value
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(default))
}

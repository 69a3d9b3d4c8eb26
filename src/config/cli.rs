use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the texttool binary.
#[derive(Debug, Parser)]
#[command(name = "texttool", version, about = "Render text into PNG images")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TEXTTOOL_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Read host commands from stdin, one per line, and deliver into the outbox.
    Serve(ServeArgs),
    /// Run a single `generate` and wait until queued work is delivered.
    Generate(GenerateArgs),
    /// List the names accepted by `font:<name>`.
    Fonts(FontsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Requester identity the commands are submitted as.
    #[arg(long, default_value = "local", value_name = "ID")]
    pub requester: String,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            overrides: Overrides::default(),
            requester: "local".to_string(),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Requester identity the job is submitted as.
    #[arg(long, default_value = "local", value_name = "ID")]
    pub requester: String,

    /// Directive words followed by the text, e.g. `mode:word font_size:64 hello world`.
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, value_name = "DIRECTIVE")]
    pub directive: Vec<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct FontsArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the task queue capacity.
    #[arg(long = "limits-max-task", value_name = "COUNT")]
    pub max_task: Option<u64>,

    /// Override the per-task character limit.
    #[arg(long = "limits-max-chars-per-task", value_name = "COUNT")]
    pub max_chars_per_task: Option<u64>,

    /// Override the per-task image limit.
    #[arg(long = "limits-max-images-per-task", value_name = "COUNT")]
    pub max_images_per_task: Option<u64>,

    /// Override the font catalog mode (registry|directory).
    #[arg(long = "fonts-mode", value_name = "MODE")]
    pub fonts_mode: Option<String>,

    /// Override the directory holding the font registry.
    #[arg(long = "fonts-data-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub fonts_data_dir: Option<PathBuf>,

    /// Override the directory scanned in directory mode.
    #[arg(long = "fonts-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub fonts_directory: Option<PathBuf>,

    /// Override the last-resort font used in directory mode.
    #[arg(long = "fonts-default-font", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub fonts_default_font: Option<PathBuf>,

    /// Override the root for per-job working directories.
    #[arg(long = "workspace-cache-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub cache_dir: Option<PathBuf>,

    /// Override the directory files are delivered into.
    #[arg(long = "delivery-outbox-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub outbox_dir: Option<PathBuf>,

    /// Override the worker back-off after a panic.
    #[arg(long = "worker-backoff-ms", value_name = "MILLIS")]
    pub backoff_ms: Option<u64>,
}

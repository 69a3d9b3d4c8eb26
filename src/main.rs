use std::{process, sync::Arc};

use texttool::{
    application::{
        command::HostCommand,
        error::AppError,
        generate::TextToolService,
        jobs::{JobContext, TaskService},
        render::GlyphRenderer,
    },
    config::{self, Command, FontsArgs, GenerateArgs, ServeArgs, Settings},
    domain::types::RequesterId,
    infra::{
        error::InfraError, fonts::FontResolver, outbox::OutboxDelivery, telemetry,
        workspace::Workspace,
    },
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        Command::Serve(args) => run_serve(settings, args).await,
        Command::Generate(args) => run_generate(settings, args).await,
        Command::Fonts(args) => run_fonts(settings, args),
    }
}

struct Runtime {
    service: TextToolService,
    tasks: TaskService,
}

fn build_runtime(settings: &Settings) -> Result<Runtime, AppError> {
    let resolver = FontResolver::from_settings(&settings.fonts);
    resolver.ensure_catalog()?;
    std::fs::create_dir_all(&settings.workspace.cache_dir).map_err(InfraError::from)?;

    let ctx = JobContext::new(
        Arc::new(resolver),
        GlyphRenderer::new(settings.render.pixel_budget),
        Arc::new(Workspace::new(&settings.workspace.cache_dir)),
        Arc::new(OutboxDelivery::new(&settings.delivery.outbox_dir)),
    );
    let tasks = TaskService::start(
        ctx.clone(),
        settings.limits.max_task,
        settings.worker.backoff,
    );
    let service = TextToolService::new(
        ctx,
        tasks.queue(),
        settings.render.defaults.clone(),
        settings.limits.request_limits(),
    );

    Ok(Runtime { service, tasks })
}

async fn run_serve(settings: Settings, args: ServeArgs) -> Result<(), AppError> {
    let Runtime { service, tasks } = build_runtime(&settings)?;
    let requester = RequesterId::new(args.requester);
    info!(
        requester = %requester,
        outbox = %settings.delivery.outbox_dir.display(),
        "Reading commands from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = String::new();
    while let Some(line) = lines.next_line().await.map_err(InfraError::from)? {
        // A trailing backslash continues the command on the next line.
        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head);
            pending.push('\n');
            continue;
        }
        pending.push_str(&line);
        let raw = std::mem::take(&mut pending);
        if raw.trim().is_empty() {
            continue;
        }

        if let Err(err) = service.handle(&requester, HostCommand::parse(&raw)).await {
            warn!(requester = %requester, error = %err, "Command could not be answered");
        }
    }

    drop(service);
    tasks.drain().await;
    Ok(())
}

async fn run_generate(settings: Settings, args: GenerateArgs) -> Result<(), AppError> {
    let Runtime { service, tasks } = build_runtime(&settings)?;
    let requester = RequesterId::new(args.requester);
    let raw = args.directive.join(" ");

    let result = service
        .handle(&requester, HostCommand::Generate(raw))
        .await;
    drop(service);
    tasks.drain().await;
    result
}

fn run_fonts(settings: Settings, _args: FontsArgs) -> Result<(), AppError> {
    let resolver = FontResolver::from_settings(&settings.fonts);
    resolver.ensure_catalog()?;

    let names = resolver.list();
    if names.is_empty() {
        println!("no fonts configured");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

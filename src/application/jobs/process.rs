use std::io;
use std::path::PathBuf;
use std::time::Instant;

use metrics::histogram;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::delivery::DeliveryError;
use crate::application::render::{
    FacePair, FaceSource, FontError, GlyphFace, GlyphRenderer, RenderError,
};
use crate::domain::request::{DEFAULT_FONT_NAME, RenderRequest};
use crate::infra::packaging::{self, Deliverable, PackageError};
use crate::infra::raster::{EncodeError, write_png};
use crate::infra::workspace::WorkDir;

use super::context::JobContext;

const SOURCE: &str = "application::jobs::process";

pub(crate) const METRIC_RENDER_MS: &str = "texttool_render_ms";

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("image {index} failed to render: {source}")]
    Render {
        index: usize,
        #[source]
        source: RenderError,
    },
    #[error("image {index} failed to encode: {source}")]
    Encode {
        index: usize,
        #[source]
        source: EncodeError,
    },
    #[error("failed to prepare working directory: {0}")]
    Workspace(#[source] io::Error),
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("render task aborted: {0}")]
    Aborted(String),
}

/// Summary of a delivered job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub images: usize,
    pub delivered: String,
}

/// Render every token, package the rasters and deliver them.
///
/// The working directory and archive are removed on every exit path once
/// delivery has been attempted.
pub async fn process_job(ctx: &JobContext, request: RenderRequest) -> Result<JobOutcome, JobError> {
    let started_at = Instant::now();
    let job_id = request.job_id;
    let requester = request.requester.clone();
    let workdir = ctx
        .workspace
        .create(&requester, request.submitted_at)
        .map_err(JobError::Workspace)?;

    let faces = ctx.faces.clone();
    let renderer = ctx.renderer;
    let (workdir, rendered) = tokio::task::spawn_blocking(move || {
        let rendered = render_tokens(faces.as_ref(), &renderer, &request, &workdir);
        (workdir, rendered)
    })
    .await
    .map_err(|err| JobError::Aborted(err.to_string()))?;
    let rasters = rendered?;

    let render_ms = started_at.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_RENDER_MS).record(render_ms);

    let deliverable = packaging::package(&workdir, &rasters)?;
    deliver(ctx, &requester, &deliverable).await?;
    drop(workdir);

    info!(
        target = SOURCE,
        op = "process_job",
        result = "delivered",
        job_id = %job_id,
        requester = %requester,
        images = rasters.len(),
        render_ms,
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "Job delivered"
    );

    Ok(JobOutcome {
        images: rasters.len(),
        delivered: deliverable.name().to_string(),
    })
}

async fn deliver(
    ctx: &JobContext,
    requester: &crate::domain::types::RequesterId,
    deliverable: &Deliverable,
) -> Result<(), JobError> {
    ctx.delivery
        .send_file(requester, deliverable.path(), deliverable.name())
        .await
        .map_err(JobError::from)
}

/// Rasterize each token of `request` into `workdir`, stopping at the first failure.
pub fn render_tokens(
    faces: &dyn FaceSource,
    renderer: &GlyphRenderer,
    request: &RenderRequest,
    workdir: &WorkDir,
) -> Result<Vec<PathBuf>, JobError> {
    let size = request.params.font_size;
    let primary = faces.load_face(&request.font, size)?;
    let fallback = if request.font == DEFAULT_FONT_NAME {
        None
    } else {
        match faces.load_face(DEFAULT_FONT_NAME, size) {
            Ok(face) => Some(face),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "render_tokens",
                    result = "fallback_unavailable",
                    font = %request.font,
                    error = %err,
                    "Default font unavailable; using the primary font for missing glyphs"
                );
                None
            }
        }
    };

    let primary: &dyn GlyphFace = primary.as_ref();
    let fallback: &dyn GlyphFace = match fallback.as_deref() {
        Some(face) => face,
        None => primary,
    };
    let pair = FacePair::new(primary, fallback);

    let mut rasters = Vec::with_capacity(request.tokens.len());
    for (index, token) in request.tokens.iter().enumerate() {
        let rendered = renderer
            .render(token, pair, &request.params)
            .map_err(|source| JobError::Render { index, source })?;
        let path = workdir.raster_path(index);
        write_png(&rendered.image, rendered.dpi, &path)
            .map_err(|source| JobError::Encode { index, source })?;

        debug!(
            target = SOURCE,
            op = "render_tokens",
            index,
            width = rendered.image.width(),
            height = rendered.image.height(),
            fallback_glyphs = rendered.fallback_glyphs,
            "Image rendered"
        );
        rasters.push(path);
    }
    Ok(rasters)
}

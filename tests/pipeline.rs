use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use texttool::application::command::HostCommand;
use texttool::application::delivery::{Delivery, DeliveryError};
use texttool::application::generate::{Submission, TextToolService};
use texttool::application::jobs::{JobContext, TaskService};
use texttool::application::render::{GlyphFace, GlyphRenderer};
use texttool::domain::request::RequestLimits;
use texttool::domain::types::{RenderParams, RequesterId};
use texttool::infra::fonts::{FontCatalog, FontResolver, LoadedFont};
use texttool::infra::workspace::Workspace;

#[derive(Debug, Clone)]
enum Delivered {
    File { name: String, bytes: Vec<u8> },
    Text(String),
}

#[derive(Debug, Default)]
struct MemoryDelivery {
    items: Mutex<Vec<Delivered>>,
}

impl MemoryDelivery {
    fn items(&self) -> Vec<Delivered> {
        self.items.lock().expect("delivery lock").clone()
    }

    fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.items()
            .into_iter()
            .filter_map(|item| match item {
                Delivered::File { name, bytes } => Some((name, bytes)),
                Delivered::Text(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Delivery for MemoryDelivery {
    async fn send_file(
        &self,
        _requester: &RequesterId,
        path: &Path,
        name: &str,
    ) -> Result<(), DeliveryError> {
        let bytes = tokio::fs::read(path).await?;
        self.items.lock().expect("delivery lock").push(Delivered::File {
            name: name.to_string(),
            bytes,
        });
        Ok(())
    }

    async fn send_text(&self, _requester: &RequesterId, message: &str) -> Result<(), DeliveryError> {
        self.items
            .lock()
            .expect("delivery lock")
            .push(Delivered::Text(message.to_string()));
        Ok(())
    }
}

struct Fixture {
    service: TextToolService,
    tasks: TaskService,
    delivery: Arc<MemoryDelivery>,
    cache: TempDir,
    _fonts: TempDir,
}

fn fixture_font() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fonts/DejaVuSansMono.ttf")
}

fn fixture() -> Fixture {
    let fonts = TempDir::new().expect("fonts dir");
    fs::copy(fixture_font(), fonts.path().join("mono.ttf")).expect("copy font");
    fs::write(
        fonts.path().join("fonts.json"),
        r#"{"default": "mono.ttf", "mono": "mono.ttf"}"#,
    )
    .expect("catalog");
    let resolver = FontResolver::new(FontCatalog::Registry {
        catalog_path: fonts.path().join("fonts.json"),
        base_dir: fonts.path().to_path_buf(),
    });

    let cache = TempDir::new().expect("cache dir");
    let delivery = Arc::new(MemoryDelivery::default());
    let ctx = JobContext::new(
        Arc::new(resolver),
        GlyphRenderer::default(),
        Arc::new(Workspace::new(cache.path())),
        delivery.clone(),
    );
    let tasks = TaskService::start(ctx.clone(), 4, Duration::from_millis(10));
    let service = TextToolService::new(
        ctx,
        tasks.queue(),
        RenderParams::default(),
        RequestLimits {
            max_chars_per_task: 200,
            max_images_per_task: 20,
        },
    );

    Fixture {
        service,
        tasks,
        delivery,
        cache,
        _fonts: fonts,
    }
}

fn requester() -> RequesterId {
    RequesterId::new("integration")
}

#[tokio::test]
async fn single_image_carries_requested_geometry_and_dpi() {
    let fixture = fixture();

    let submission = fixture
        .service
        .generate(
            &requester(),
            "canvas_width:200 canvas_height:80 dpi:144 bg_color:#FFFFFF Hello",
        )
        .await
        .expect("rendered");
    assert!(matches!(submission, Submission::Delivered(_)));

    let files = fixture.delivery.files();
    assert_eq!(files.len(), 1);
    let (name, bytes) = &files[0];
    assert!(name.starts_with("integration_"));
    assert!(name.ends_with("_000.png"));

    let reader = png::Decoder::new(std::io::Cursor::new(bytes.clone()))
        .read_info()
        .expect("png header");
    let info = reader.info();
    assert_eq!((info.width, info.height), (200, 80));
    let dims = info.pixel_dims.expect("pHYs");
    assert_eq!(dims.xppu, 5669);

    let image = image::load_from_memory(bytes).expect("decode").to_rgba8();
    let inked = image.pixels().filter(|pixel| pixel.0[0] < 128).count();
    assert!(inked > 0, "text should leave dark pixels on white");
    assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);

    fixture.tasks.drain().await;
    assert_eq!(fs::read_dir(fixture.cache.path()).expect("ls").count(), 0);
}

#[tokio::test]
async fn derived_width_fits_text_plus_padding() {
    let fixture = fixture();

    fixture
        .service
        .generate(&requester(), "font_size:32 padding:5 font:nonexistent abc")
        .await
        .expect("unknown font falls back to default");

    let face = LoadedFont::open(&fixture_font(), 32.0).expect("fixture loads");
    let text_width = (face.advance('a') * 3.0).floor() as u32;
    assert_eq!(text_width, 57, "monospace advance is 0.602 em");

    let files = fixture.delivery.files();
    let image = image::load_from_memory(&files[0].1).expect("decode");
    assert_eq!(image.width(), text_width + 10);
    assert_eq!(image.height(), 128);
    fixture.tasks.drain().await;
}

#[tokio::test]
async fn multi_token_job_is_queued_and_delivered_as_zip() {
    let fixture = fixture();

    let submission = fixture
        .service
        .generate(&requester(), "mode:token font:mono one|two| |three")
        .await
        .expect("queued");
    assert_eq!(
        submission,
        Submission::Queued {
            pending: 1,
            capacity: 4
        }
    );

    let Fixture {
        service,
        tasks,
        delivery,
        cache,
        _fonts,
    } = fixture;
    drop(service);
    tasks.drain().await;

    let files = delivery.files();
    assert_eq!(files.len(), 1);
    let (name, bytes) = &files[0];
    assert!(name.ends_with(".zip"));

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.clone())).expect("zip");
    assert_eq!(archive.len(), 3);
    let mut names = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).expect("entry");
        assert!(!entry.name().contains('/'));
        let mut png_bytes = Vec::new();
        entry.read_to_end(&mut png_bytes).expect("read entry");
        assert!(png_bytes.starts_with(b"\x89PNG"));
        names.push(entry.name().to_string());
    }
    names.sort();
    assert!(names[0].ends_with("_000.png"));
    assert!(names[2].ends_with("_002.png"));

    assert_eq!(fs::read_dir(cache.path()).expect("ls").count(), 0);
}

#[tokio::test]
async fn host_commands_reply_through_delivery() {
    let fixture = fixture();

    for raw in [
        "texttool font_list",
        "texttool task",
        "texttool generate",
        "texttool generate text_color:#12 hi",
    ] {
        fixture
            .service
            .handle(&requester(), HostCommand::parse(raw))
            .await
            .expect("answered");
    }

    let texts: Vec<String> = fixture
        .delivery
        .items()
        .into_iter()
        .filter_map(|item| match item {
            Delivered::Text(text) => Some(text),
            Delivered::File { .. } => None,
        })
        .collect();
    assert_eq!(texts.len(), 4);
    assert_eq!(texts[0], "- default\n- mono");
    assert_eq!(texts[1], "current queue length: 0/4");
    assert_eq!(texts[2], "no content provided");
    assert!(texts[3].contains("text_color"));
    fixture.tasks.drain().await;
}

#[test]
fn missing_file_is_not_loadable() {
    assert!(!texttool::infra::fonts::is_loadable(Path::new("/nonexistent/font.ttf")));
    assert!(texttool::infra::fonts::is_loadable(&fixture_font()));
    let _ = File::open(fixture_font()).expect("fixture present");
}

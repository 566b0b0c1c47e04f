use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::{Duration, timeout};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use selection_core::app::{SelectionApp, SelectionAppBuilder};
use selection_core::impls::StaticCandidateSource;
use selection_core::{Candidate, DispatchOutcome, SelectionConfig, SelectionRequest};

#[derive(Debug, Deserialize)]
struct ImageParams {
    #[serde(default = "default_size")]
    size: String,
}

fn default_size() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
struct ContactParams {
    tag: String,
}

fn image_selection() -> Candidate {
    Candidate::builder("demo::ImageSelection")
        .supports(|uri| {
            let path = uri.path();
            Ok(uri.scheme() == "file" && (path.ends_with(".png") || path.ends_with(".jpg")))
        })
        .select(|uri, params| {
            let p: ImageParams = serde_json::from_value(Value::Object(params.clone()))?;
            println!("image selected: {} (size={})", uri.path(), p.size);
            Ok(())
        })
        .build()
}

fn contact_selection(tagged: Arc<AtomicU32>) -> Candidate {
    Candidate::builder("demo::ContactSelection")
        .supports(|uri| Ok(uri.scheme() == "crm" && uri.host_str() == Some("contact")))
        .select(move |uri, params| {
            let p: ContactParams = serde_json::from_value(Value::Object(params.clone()))?;
            let n = tagged.fetch_add(1, Ordering::Relaxed) + 1;
            println!("contact {} tagged '{}' (total={n})", uri.path(), p.tag);
            Ok(())
        })
        .build()
}

/// supports を持たない候補。登録はされるが、順番が回ってくると dispatch は失敗する
fn archive_selection() -> Candidate {
    Candidate::builder("demo::ArchiveSelection")
        .select(|uri, _| {
            println!("archive selected: {uri}");
            Ok(())
        })
        .build()
}

/// 候補ではない（suffix が違う）
fn audit_service() -> Candidate {
    Candidate::builder("demo::AuditService").select(|_, _| Ok(())).build()
}

fn load_config() -> SelectionConfig {
    match std::env::args().nth(1) {
        Some(path) => match SelectionConfig::from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(%path, error = %e, "falling back to default config");
                SelectionConfig::default_v1()
            }
        },
        None => SelectionConfig::default_v1(),
    }
}

/// dispatch は同期なので blocking pool で実行し、呼び出し側で timeout をかける
async fn dispatch_with_timeout(app: SelectionApp, request: SelectionRequest, limit: Duration) {
    let uri = request.uri.to_string();
    let task = tokio::task::spawn_blocking(move || app.dispatch_request(&request));

    match timeout(limit, task).await {
        Ok(Ok(Ok(DispatchOutcome::Selected { handler }))) => {
            info!(%uri, %handler, "dispatched");
        }
        Ok(Ok(Ok(DispatchOutcome::NoMatch))) => {
            info!(%uri, "no selection handler matched");
        }
        Ok(Ok(Err(e))) => error!(%uri, error = %e, "dispatch failed"),
        Ok(Err(e)) => error!(%uri, error = %e, "dispatch task panicked"),
        Err(_) => warn!(%uri, ?limit, "dispatch timed out"),
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // (A) 候補を用意（探索の代わりに静的な一覧）
    let tagged = Arc::new(AtomicU32::new(0));
    let source = StaticCandidateSource::new(
        "demo",
        vec![
            image_selection(),
            contact_selection(tagged.clone()),
            audit_service(),
            archive_selection(),
        ],
    );

    // (B) 分類・登録（Image と Contact は必須）
    let app = match SelectionAppBuilder::new()
        .config(load_config())
        .discover(&source)
        .and_then(|b| b.expect_handlers(&["Image", "Contact"]).build())
    {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to build selection app");
            std::process::exit(1);
        }
    };
    println!("registered: {:?}", app.registry().handler_names());

    // (C) リクエストを並行に dispatch
    let requests = [
        SelectionRequest::parse("file:///photos/cat.png").map(|r| r.with_param("size", "large")),
        SelectionRequest::parse("crm://contact/42").map(|r| r.with_param("tag", "vip")),
        SelectionRequest::parse("crm://contact/43").map(|r| r.with_param("tag", "lead")),
        SelectionRequest::parse("file:///docs/report.pdf"),
    ];

    let mut tasks = Vec::new();
    for request in requests {
        match request {
            Ok(request) => tasks.push(tokio::spawn(dispatch_with_timeout(
                app.clone(),
                request,
                Duration::from_secs(2),
            ))),
            Err(e) => error!(error = %e, "invalid uri"),
        }
    }
    for task in tasks {
        if let Err(e) = task.await {
            error!(error = %e, "dispatch task failed");
        }
    }

    println!("contacts tagged: {}", tagged.load(Ordering::Relaxed));

    // (D) teardown
    app.registry().clear();
}

mod answers;
mod api;
mod cloud;
mod config;
mod error;
mod intent;
mod language;
mod pipeline;

use std::sync::Arc;

use tracing::{info, warn};

use crate::answers::AnswerStore;
use crate::api::{build_router, AppState};
use crate::cloud::firestore::FirestoreDocs;
use crate::cloud::gemini::GeminiModel;
use crate::cloud::stt::GoogleStt;
use crate::cloud::tts::GoogleTts;
use crate::cloud::{build_http_client, AnswerDocs};
use crate::config::{AppConfig, IntentBackend};
use crate::intent::{GeminiResolver, IntentResolver, KeywordResolver};
use crate::pipeline::VoicePipeline;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bharatvoice_server=info,axum=info".into()),
        )
        .compact()
        .init();

    let cfg = AppConfig::from_env()?;
    if cfg.google_api_key.is_none() {
        warn!("GOOGLE_API_KEY not set; running in demo mode, cloud calls will degrade");
    }
    std::fs::create_dir_all(&cfg.upload_dir)?;

    let client = build_http_client(&cfg)?;

    let stt = Arc::new(GoogleStt::new(
        client.clone(),
        cfg.stt_base_url.clone(),
        cfg.google_api_key.clone(),
    ));
    let tts = Arc::new(GoogleTts::new(
        client.clone(),
        cfg.tts_base_url.clone(),
        cfg.google_api_key.clone(),
    ));

    let resolver: Arc<dyn IntentResolver> = match cfg.intent_backend {
        IntentBackend::Gemini => Arc::new(GeminiResolver::new(Arc::new(GeminiModel::new(
            client.clone(),
            cfg.gemini_base_url.clone(),
            cfg.gemini_model.clone(),
            cfg.google_api_key.clone(),
        )))),
        IntentBackend::Keyword => Arc::new(KeywordResolver),
    };

    let remote_docs: Option<Arc<dyn AnswerDocs>> =
        match (&cfg.firestore_project, &cfg.google_api_key) {
            (Some(project), Some(_)) => Some(Arc::new(FirestoreDocs::new(
                client,
                cfg.firestore_base_url.clone(),
                project.clone(),
                cfg.google_api_key.clone(),
            ))),
            _ => None,
        };
    let answers = AnswerStore::new(&cfg.answers_path, remote_docs)?;

    let pipeline = Arc::new(VoicePipeline::new(
        stt,
        resolver,
        answers,
        tts,
        cfg.upload_dir.clone(),
        cfg.max_upload_bytes,
    ));
    let state = Arc::new(AppState::new(cfg.clone(), pipeline));

    let app = build_router(state);

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        host = %cfg.host,
        port = cfg.port,
        intent_backend = ?cfg.intent_backend,
        "starting bharatvoice-server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

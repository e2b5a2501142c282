use std::sync::Arc;

use squadmate::config::Settings;
use squadmate::dialogue::DialogueController;
use squadmate::dialogue::store::ConversationStore;
use squadmate::error::Error;
use squadmate::i18n::Translator;
use squadmate::profiles::seed::load_seed_file;
use squadmate::profiles::store::ProfileStore;
use squadmate::storage::LibSqlBackend;
use squadmate::telegram::{TelegramClient, TelegramPoller};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings = Settings::from_env()?;

    eprintln!("🎮 Squadmate v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", settings.database_path.display());
    eprintln!(
        "   Languages: {} (default {})",
        settings.supported_languages.join(", "),
        settings.default_language
    );

    let backend = Arc::new(LibSqlBackend::new_local(&settings.database_path).await?);

    // Seed the games catalog from the bundled JSON; repeat runs are no-ops.
    let seed_entries = load_seed_file(&settings.games_data_path).map_err(Error::Config)?;
    if !seed_entries.is_empty() {
        backend.seed_games(&seed_entries).await?;
    }
    let catalog_size = backend.list_active_games().await?.len();
    eprintln!("   Games catalog: {catalog_size} entries");

    let notifier = Arc::new(TelegramClient::new(settings.bot_token.clone()));
    if let Err(e) = notifier.health_check().await {
        tracing::warn!(error = %e, "Bot API health check failed; polling anyway");
    }

    let translator = Translator::new(&settings.default_language);
    let controller = Arc::new(DialogueController::new(
        backend.clone() as Arc<dyn ProfileStore>,
        backend.clone() as Arc<dyn ConversationStore>,
        notifier,
        translator,
        settings.clone(),
    ));

    let poller = TelegramPoller::new(settings.bot_token);
    poller.run(controller).await;

    Ok(())
}

use std::{process, sync::Arc, time::Duration};

use folio::{
    application::{
        blogs::BlogService,
        error::AppError,
        listing::{IncrementalList, ListHandle, ListState, LoadOutcome, PageSource},
        pagination::PageWindow,
        repos::{BlogsRepo, BlogsWriteRepo},
        seed,
        trigger::VisibilityTrigger,
    },
    config,
    domain::entities::is_listing_ordered,
    infra::{
        client::HttpPageSource,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use futures::stream::TryStreamExt;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const BROWSE_MAX_RETRIES: u32 = 3;
const BROWSE_RETRY_DELAY: Duration = Duration::from_millis(500);

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
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Seed(args) => run_seed(settings, args).await,
        config::Command::Verify(args) => run_verify(settings, args).await,
        config::Command::Browse(args) => run_browse(args).await,
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .require_url()
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let blogs_repo: Arc<dyn BlogsRepo> = repositories;
    let state = HttpState {
        blogs: Arc::new(BlogService::new(blogs_repo)),
    };
    let router = http::build_router(state);

    let addr = settings.server.addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::from(InfraError::Bind { addr, source }))?;
    info!(target = "folio::server", %addr, "listening");

    let grace = settings.server.graceful_shutdown;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(());
        },
    );
    let server = tokio::spawn(async move { server.await });

    // Bound the drain once shutdown has been requested.
    let drained = async {
        if shutdown_rx.await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        joined = server => {
            joined
                .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
                .map_err(|err| AppError::from(InfraError::Io(err)))?;
        }
        () = drained => {
            warn!(
                target = "folio::server",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "folio::server", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "folio::server", error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "folio::server", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!(target = "folio::server", "shutdown requested");
}

async fn run_seed(settings: config::Settings, args: config::SeedArgs) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let writer: &dyn BlogsWriteRepo = &*repositories;

    let report = seed::seed_archive(writer, &args.file).await?;
    info!(
        target = "folio::seed",
        count = report.slugs.len(),
        archive = %args.file.display(),
        "seed complete"
    );
    Ok(())
}

async fn run_verify(settings: config::Settings, args: config::VerifyArgs) -> Result<(), AppError> {
    PageWindow::new(args.page_size, 0).map_err(|err| AppError::validation(err.to_string()))?;
    let repositories = init_repositories(&settings).await?;

    let expected: Vec<_> = repositories.stream_all_blogs().try_collect().await?;
    if !is_listing_ordered(&expected) {
        return Err(AppError::unexpected(
            "stored records are not in strict listing order",
        ));
    }

    let blogs_repo: Arc<dyn BlogsRepo> = repositories.clone();
    let paged = BlogService::new(blogs_repo)
        .collect_all(args.page_size)
        .await?;

    let expected_ids: Vec<i64> = expected.iter().map(|blog| blog.id).collect();
    let paged_ids: Vec<i64> = paged.iter().map(|blog| blog.id).collect();
    if expected_ids != paged_ids {
        return Err(AppError::unexpected(format!(
            "paging with size {} returned {} records in a different order than the {} stored",
            args.page_size,
            paged_ids.len(),
            expected_ids.len()
        )));
    }

    for blog in &expected {
        println!(
            "{:>6}  {}  {:<14}  {}",
            blog.id,
            blog.published_at.date(),
            blog.category,
            blog.slug
        );
    }
    info!(
        target = "folio::verify",
        total = expected.len(),
        page_size = args.page_size,
        "paging reproduces the stored listing"
    );
    Ok(())
}

async fn run_browse(args: config::BrowseArgs) -> Result<(), AppError> {
    let source = HttpPageSource::new(&args.site)
        .map_err(|err| AppError::validation(format!("invalid site: {err}")))?;
    let limit = PageWindow::first(args.page_size).limit();

    let first = source
        .fetch(0, limit)
        .await
        .map_err(|err| AppError::unexpected(format!("failed to load first page: {err}")))?;
    let handle = ListHandle::new(
        Arc::new(source),
        IncrementalList::new(first, limit),
        VisibilityTrigger::default(),
    );

    let mut printed = 0;
    let mut failures = 0;
    loop {
        let items = handle.items().await;
        for blog in &items[printed..] {
            println!("{}  {}  {}", blog.published_at.date(), blog.slug, blog.title);
        }
        printed = items.len();

        if handle.state().await == ListState::Exhausted {
            break;
        }

        match handle.load_more().await {
            LoadOutcome::Failed => {
                failures += 1;
                if failures >= BROWSE_MAX_RETRIES {
                    let message = handle.error().await.unwrap_or_default();
                    return Err(AppError::unexpected(format!(
                        "giving up after {failures} failed loads: {message}"
                    )));
                }
                tokio::time::sleep(BROWSE_RETRY_DELAY).await;
            }
            _ => failures = 0,
        }
    }

    info!(target = "folio::browse", total = printed, "reached the end");
    Ok(())
}

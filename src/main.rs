use std::{process, sync::Arc};

use fundhub::{
    application::{
        contributors::ContributorService,
        error::AppError,
        labels::EnumResolver,
        projects::{ProjectCatalogConfig, ProjectService},
        related::{ContentCollections, ProjectContentService},
        sources::{CollectionSource, ContributorResolver},
        stats::StatsService,
    },
    cache::{CacheBackend, CacheBackendKind, CacheConfig, CachePolicy, MemoryCacheBackend},
    config::{self, CacheSettings, Command, Settings},
    domain::classify::{ClassifyOptions, DisplayOrder},
    infra::{
        error::InfraError, kv::RestKvBackend, payload::PayloadDirectory, telemetry,
        webflow::WebflowCollections,
    },
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
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

    telemetry::init(&settings.logging)?;
    let services = Services::build(&settings)?;

    match cli_args.command {
        Command::Projects => print_json(&services.projects.all_visible_projects().await?),
        Command::Summaries => print_json(&services.projects.project_summaries().await?),
        Command::Project { slug } => print_json(&services.projects.project_by_slug(&slug).await?),
        Command::Buckets => {
            let projects = services.projects.all_visible_projects().await?;
            print_json(&services.projects.classified_buckets(&projects))
        }
        Command::StatusLabel { status_id } => {
            let label = services.projects.resolve_status_label(&status_id).await?;
            println!("{label}");
            Ok(())
        }
        Command::Faqs { slug } => print_json(&services.content.faqs_by_project_slug(&slug).await),
        Command::Updates { slug } => {
            print_json(&services.content.updates_by_project_slug(&slug).await)
        }
        Command::Posts { slug } => print_json(&services.content.posts_by_project_slug(&slug).await),
        Command::Stats => print_json(&services.stats.stats().await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}

struct Services {
    projects: Arc<ProjectService>,
    content: ProjectContentService,
    stats: StatsService,
}

impl Services {
    fn build(settings: &Settings) -> Result<Self, AppError> {
        let cache_config = CacheConfig::from(&settings.cache);
        let cache = build_cache(&settings.cache, &cache_config)?;
        let ttl = cache_config.collection_ttl();

        let projects_collection = settings
            .remote
            .collections
            .projects
            .clone()
            .ok_or_else(|| InfraError::configuration("remote.collections.projects is required"))?;
        let source: Arc<dyn CollectionSource> =
            Arc::new(WebflowCollections::new(&settings.remote)?);
        let labels = Arc::new(EnumResolver::new(source.clone(), cache.clone(), ttl));

        let contributors: Option<Arc<dyn ContributorResolver>> = if settings.contributors.enabled {
            let directory = Arc::new(PayloadDirectory::new(&settings.contributors)?);
            Some(Arc::new(ContributorService::new(directory, cache.clone(), ttl)))
        } else {
            None
        };

        let catalog = ProjectCatalogConfig {
            collection_id: projects_collection,
            page_size: settings.remote.page_size,
            ttl,
            classify: ClassifyOptions {
                order: DisplayOrder::new(settings.display.priority.iter().cloned()),
                fallback_to_open: settings.display.fallback_to_open,
            },
        };
        let projects = Arc::new(
            ProjectService::new(source.clone(), labels, cache.clone(), catalog)
                .with_contributors_opt(contributors),
        );

        let collections = ContentCollections {
            faqs: settings.remote.collections.faqs.clone(),
            updates: settings.remote.collections.updates.clone(),
            posts: settings.remote.collections.posts.clone(),
        };
        let content =
            ProjectContentService::new(source, projects.clone(), cache.clone(), collections, ttl)
                .with_page_size(settings.remote.page_size);

        let stats = StatsService::new(projects.clone(), cache, cache_config.stats_ttl());

        Ok(Self {
            projects,
            content,
            stats,
        })
    }
}

fn build_cache(settings: &CacheSettings, config: &CacheConfig) -> Result<CachePolicy, InfraError> {
    let backend: Option<Arc<dyn CacheBackend>> = match config.backend {
        CacheBackendKind::Memory => Some(Arc::new(MemoryCacheBackend::new(config))),
        CacheBackendKind::Rest => Some(Arc::new(RestKvBackend::new(settings)?)),
        CacheBackendKind::None => None,
    };
    info!(
        target = "fundhub::main",
        backend = config.backend.as_str(),
        "cache configured"
    );
    Ok(CachePolicy::from_backend(backend))
}

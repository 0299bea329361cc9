/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Rendered log pages (terminal or HTML file), live-followed until shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use logview::{
    HtmlSink, LogPager, RefreshOutcome, RenderSink, TerminalMode, TerminalSink, TokioTimer, ViewerConfig,
};
use logview_adapter::{LogSource, LogviewClient};

#[derive(Parser, Debug)]
#[command(name = "logview", version, about = "Paginated viewer for a remote ANSI-colored log")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    /// Overrides `base_url` from the config file
    #[arg(long = "base-url", value_name = "URL")]
    base_url: Option<String>,
    #[arg(long = "page-size", value_name = "LINES")]
    page_size: Option<u32>,
    /// Line offset of the first page
    #[arg(long = "start", value_name = "OFFSET", default_value_t = 0)]
    start: u64,
    /// Keep auto-refreshing until interrupted
    #[arg(long = "follow")]
    follow: bool,
    /// Write an HTML view to this file instead of the terminal
    #[arg(long = "html", value_name = "PATH")]
    html: Option<PathBuf>,
    /// Strip colors from terminal output
    #[arg(long = "plain")]
    plain: bool,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Append diagnostics to this file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_file.as_deref())?;

    let config = resolve_config(&args)?;
    info!(
        base_url = %config.base_url,
        endpoint = %config.endpoint,
        page_size = config.page_size,
        follow = args.follow,
        "configuration loaded"
    );

    if args.dry_run {
        println!(
            "base_url={} endpoint={} page_size={} start={} auto_refresh_ms={}",
            config.base_url, config.endpoint, config.page_size, args.start, config.auto_refresh_ms
        );
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let client = LogviewClient::with_config(config.client_config(), &config.base_url)
        .context("create log client")?
        .with_endpoint(config.endpoint.clone());
    let source: Arc<dyn LogSource> = Arc::new(client);
    let sink = build_sink(&args, &config)?;
    let pager = LogPager::new(
        source,
        sink,
        Arc::new(TokioTimer),
        config.pager_options(args.start),
    );

    if !args.follow {
        return match pager.refresh().await {
            RefreshOutcome::Failed { message } => Err(anyhow!("fetch log window: {message}")),
            outcome => {
                info!(?outcome, "log window rendered");
                Ok(())
            }
        };
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    pager.toggle_auto_refresh().await;
    info!(interval_ms = config.auto_refresh_ms, "following log");

    shutdown.cancelled().await;
    info!("shutdown signal received");
    pager.shutdown();

    Ok(())
}

fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let Some(path) = log_file else {
        builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow!(err))
            .context("initialize tracing subscriber")?;
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .context("log file path must name a file")?;
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    builder
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(Some(guard))
}

fn resolve_config(args: &Cli) -> Result<ViewerConfig> {
    let mut config = match (&args.config_path, &args.base_url) {
        (Some(path), _) => ViewerConfig::from_file(path).context("load config")?,
        (None, Some(base_url)) => ViewerConfig::new(base_url.clone()),
        (None, None) => bail!("either --config or --base-url is required"),
    };

    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }

    config.validate().context("validate config")?;
    Ok(config)
}

fn build_sink(args: &Cli, config: &ViewerConfig) -> Result<Arc<dyn RenderSink>> {
    if let Some(path) = &args.html {
        let title = format!("logview | {}", config.base_url);
        let palette = config.level_palette()?;
        info!(path = %path.display(), "writing html view");
        return Ok(Arc::new(HtmlSink::new(path.clone(), title, palette)));
    }

    let mode = if args.plain {
        TerminalMode::Plain
    } else {
        TerminalMode::Ansi
    };
    Ok(Arc::new(TerminalSink::stdout(mode)))
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}

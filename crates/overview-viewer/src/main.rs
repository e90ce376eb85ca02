use anyhow::{Context, Result};
use overview_viewer::util::{args, config};
use overview_viewer::{render, HttpTransport, Incoming, PollingViewModel};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = args::parse_args()?;
    let mut cfg = config::load_or_default();
    args.apply(&mut cfg);
    cfg.validate()?;

    if args.save_config {
        let path = config::save(&cfg)?;
        tracing::info!(path = %path.display(), "viewer config saved");
        return Ok(());
    }

    let selected = match (&cfg.execution_id, &args.node_id) {
        (Some(exec), Some(node)) => Some((exec.clone(), node.clone())),
        (None, Some(_)) => {
            anyhow::bail!("--node needs an execution id (--execution or execution_id in config)")
        }
        (_, None) => None,
    };

    let transport = HttpTransport::new(&cfg.base_url, cfg.request_timeout())?;
    let (tx, rx) = crossbeam_channel::unbounded::<Incoming>();
    let vm = Arc::new(PollingViewModel::new(Arc::new(transport)).with_notifier(tx));

    let rt = tokio::runtime::Runtime::new().context("tokio runtime")?;
    tracing::info!(
        base_url = %cfg.base_url,
        interval_ms = cfg.poll_interval_ms,
        "overview viewer starting"
    );

    // metadata, polling and the optional node selection run independently
    {
        let vm = Arc::clone(&vm);
        rt.spawn(async move { vm.initialize().await });
    }
    {
        let _guard = rt.enter();
        vm.start_polling(cfg.poll_interval());
    }
    if let Some((exec, node)) = selected {
        let vm = Arc::clone(&vm);
        rt.spawn(async move { vm.fetch_events(&exec, &node).await });
    }
    {
        let vm = Arc::clone(&vm);
        rt.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                vm.stop();
            }
        });
    }

    for inc in rx.iter() {
        println!("{}", render::status_line(&inc));
        if inc.is_stopped() {
            break;
        }
        for line in render::summary(&vm.snapshot()) {
            println!("  {line}");
        }
    }

    rt.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

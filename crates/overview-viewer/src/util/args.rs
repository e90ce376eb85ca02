use crate::util::config::ViewerConfig;
use anyhow::Result;
use std::ffi::OsString;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerArgs {
    pub url: Option<String>,
    pub interval_ms: Option<u64>,
    pub execution_id: Option<String>,
    pub node_id: Option<String>,
    pub save_config: bool,
}

impl ViewerArgs {
    /// Command-line values win over the config file.
    pub fn apply(&self, cfg: &mut ViewerConfig) {
        if let Some(url) = &self.url {
            cfg.base_url = url.clone();
        }
        if let Some(ms) = self.interval_ms {
            cfg.poll_interval_ms = ms;
        }
        if let Some(exec) = &self.execution_id {
            cfg.execution_id = Some(exec.clone());
        }
    }
}

pub fn parse_args() -> Result<ViewerArgs> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ViewerArgs>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = ViewerArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--url" {
            let Some(url) = args.next() else {
                anyhow::bail!("--url expects a base url");
            };
            out.url = Some(url.to_string_lossy().into_owned());
        } else if arg == "--interval-ms" {
            let Some(value) = args.next() else {
                anyhow::bail!("--interval-ms expects milliseconds");
            };
            let value = value.to_string_lossy();
            let ms: u64 = value
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid --interval-ms: {value}"))?;
            if ms == 0 {
                anyhow::bail!("--interval-ms must be greater than zero");
            }
            out.interval_ms = Some(ms);
        } else if arg == "--execution" {
            let Some(exec) = args.next() else {
                anyhow::bail!("--execution expects an execution id");
            };
            out.execution_id = Some(exec.to_string_lossy().into_owned());
        } else if arg == "--node" {
            let Some(node) = args.next() else {
                anyhow::bail!("--node expects a node instance id");
            };
            out.node_id = Some(node.to_string_lossy().into_owned());
        } else if arg == "--save-config" {
            out.save_config = true;
        } else {
            anyhow::bail!("unknown argument: {:?}", arg);
        }
    }

    Ok(out)
}

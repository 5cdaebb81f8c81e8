use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use gridboard_core::CanvasBounds;
use gridboard_layout::PanelId;

/// Store used when neither `--endpoint` nor `--layout-file` is given.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";

/// The dashboard's widgets, in startup order.
pub const DEFAULT_PANELS: [&str; 4] = [
    "widget-tasks",
    "widget-links",
    "widget-reminders",
    "widget-automation",
];

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Base URL of the dashboard backend serving `/api/layout`.
    #[arg(long, global = true, conflicts_with = "layout_file")]
    pub endpoint: Option<String>,

    /// Keep the layout in a local JSON file instead of the backend.
    #[arg(long = "layout-file", global = true)]
    pub layout_file: Option<PathBuf>,

    /// Comma-separated panel ids in startup order.
    #[arg(long, global = true, value_delimiter = ',')]
    pub panels: Vec<String>,

    #[arg(
        long = "timeout",
        global = true,
        default_value_t = DEFAULT_TIMEOUT_SECONDS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_seconds: u64,

    /// Canvas size in pixels used to interpret pointer positions, as WxH.
    #[arg(long, global = true, default_value = "1200x1200", value_parser = parse_canvas)]
    pub canvas: CanvasBounds,
}

/// Where layouts are loaded from and saved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Http { base_url: String },
    File { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct GridboardConfig {
    pub store: StoreTarget,
    pub panels: Vec<PanelId>,
    pub timeout: Duration,
    pub canvas: CanvasBounds,
}

impl From<GlobalArgs> for GridboardConfig {
    fn from(args: GlobalArgs) -> Self {
        let store = match (args.endpoint, args.layout_file) {
            (_, Some(path)) => StoreTarget::File { path },
            (Some(base_url), None) => StoreTarget::Http { base_url },
            (None, None) => StoreTarget::Http {
                base_url: DEFAULT_ENDPOINT.to_string(),
            },
        };
        let panels = if args.panels.is_empty() {
            DEFAULT_PANELS.into_iter().map(PanelId::from).collect()
        } else {
            args.panels
                .into_iter()
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(PanelId::from)
                .collect()
        };
        Self {
            store,
            panels,
            timeout: Duration::from_secs(args.timeout_seconds),
            canvas: args.canvas,
        }
    }
}

/// Parse `WIDTHxHEIGHT` into validated canvas bounds.
pub fn parse_canvas(raw: &str) -> std::result::Result<CanvasBounds, String> {
    let (width, height) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|err| format!("invalid canvas width {width:?}: {err}"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|err| format!("invalid canvas height {height:?}: {err}"))?;
    CanvasBounds::from_size(width, height).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GlobalArgs {
        GlobalArgs {
            endpoint: None,
            layout_file: None,
            panels: Vec::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            canvas: parse_canvas("1200x1200").expect("canvas"),
        }
    }

    #[test]
    fn defaults_target_local_backend_and_dashboard_widgets() {
        let config = GridboardConfig::from(args());
        assert_eq!(
            config.store,
            StoreTarget::Http {
                base_url: DEFAULT_ENDPOINT.to_string()
            }
        );
        let panels: Vec<&str> = config.panels.iter().map(PanelId::as_str).collect();
        assert_eq!(panels, DEFAULT_PANELS);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn layout_file_and_panels_override_defaults() {
        let mut args = args();
        args.layout_file = Some(PathBuf::from("/tmp/layout.json"));
        args.panels = vec!["a".to_string(), " b ".to_string(), String::new()];
        let config = GridboardConfig::from(args);
        assert_eq!(
            config.store,
            StoreTarget::File {
                path: PathBuf::from("/tmp/layout.json")
            }
        );
        assert_eq!(config.panels, vec![PanelId::from("a"), PanelId::from("b")]);
    }

    #[test]
    fn canvas_parser_validates() {
        let canvas = parse_canvas("800X600").expect("canvas");
        assert_eq!((canvas.width(), canvas.height()), (800, 600));
        assert!(parse_canvas("800").is_err());
        assert!(parse_canvas("wide x 600").is_err());
        assert!(parse_canvas("10x600").is_err());
    }
}

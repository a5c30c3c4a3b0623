//! Command-line configuration.
//!
//! Every flag has a default, so a bare `natal-chart` listens on
//! `127.0.0.1:8001` and renders with `natal-chart-render` from `PATH`.
//! Chart theme and canvas size are fixed and deliberately not exposed.

use clap::Parser;

use crate::chart::CommandRenderer;

pub const DEFAULT_BIND: &str = "127.0.0.1:8001";
pub const DEFAULT_RENDERER: &str = "natal-chart-render";

#[derive(Debug, Clone, Parser)]
#[command(name = "natal-chart", version, about = "Natal chart SVG service")]
pub struct Config {
    /// Address to listen on (`host:port`).
    #[arg(long, default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Program that renders a chart: JSON subject on stdin, SVG on stdout.
    #[arg(long, default_value = DEFAULT_RENDERER)]
    pub renderer: String,

    /// Extra argument passed to the renderer program (repeatable).
    #[arg(long = "renderer-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub renderer_args: Vec<String>,
}

impl Config {
    pub fn renderer(&self) -> CommandRenderer {
        CommandRenderer::new(self.renderer.clone(), self.renderer_args.iter().cloned())
    }
}

//! Renderer backed by an external program.
//!
//! The charting library lives outside this process. For every chart the
//! configured program is spawned once and spoken to over stdio:
//!
//! - **stdin**: one JSON document, then EOF:
//!
//!   ```json
//!   {"name":"Ann","lat":40.7128,"lon":-74.006,"utc_dt":"1990-01-15T14:30:00Z",
//!    "theme":"light","width":600,"height":600}
//!   ```
//!
//! - **stdout**: the SVG text, returned to the client unmodified. Output
//!   without an `<svg` element is rejected.
//! - **exit status**: non-zero means failure; stderr becomes the error text.

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::render::{ChartRenderer, ChartSubject, RenderError, RenderOptions, Theme};

#[derive(Clone, Debug)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = String>) -> Self {
        Self { program: program.into(), args: args.into_iter().collect() }
    }
}

#[derive(Serialize)]
struct RenderInput<'a> {
    name: &'a str,
    lat: f64,
    lon: f64,
    utc_dt: String,
    theme: Theme,
    width: u32,
    height: u32,
}

impl<'a> RenderInput<'a> {
    fn new(subject: &'a ChartSubject, options: &RenderOptions) -> Self {
        Self {
            name: &subject.name,
            lat: subject.lat,
            lon: subject.lon,
            utc_dt: subject.utc.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            theme: options.theme,
            width: options.width,
            height: options.height,
        }
    }
}

#[async_trait]
impl ChartRenderer for CommandRenderer {
    async fn render(
        &self,
        subject: &ChartSubject,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        let input = serde_json::to_vec(&RenderInput::new(subject, options))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn { program: self.program.clone(), source })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&input).await {
                // The program may exit without reading; its status tells the story.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!(program = %self.program, "renderer closed stdin early");
                }
                res => res?,
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let svg = String::from_utf8(output.stdout)?;
        if svg.trim().is_empty() {
            return Err(RenderError::Empty);
        }
        if !svg.contains("<svg") {
            return Err(RenderError::NotSvg);
        }
        Ok(svg)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::chart::render::NATAL_CHART_OPTIONS;

    fn subject() -> ChartSubject {
        ChartSubject {
            name: "Ann".to_owned(),
            lat: 40.7128,
            lon: -74.006,
            utc: Utc.with_ymd_and_hms(1990, 1, 15, 14, 30, 0).unwrap(),
        }
    }

    fn sh(script: &str) -> CommandRenderer {
        CommandRenderer::new("sh", ["-c".to_owned(), script.to_owned()])
    }

    #[tokio::test]
    async fn writes_json_input_and_returns_stdout() {
        let out = sh("printf '<svg>'; cat; printf '</svg>'")
            .render(&subject(), &NATAL_CHART_OPTIONS)
            .await
            .unwrap();
        let json = out.strip_prefix("<svg>").and_then(|s| s.strip_suffix("</svg>")).unwrap();
        let input: serde_json::Value = serde_json::from_str(json).unwrap();

        assert_eq!(
            input,
            serde_json::json!({
                "name": "Ann",
                "lat": 40.7128,
                "lon": -74.006,
                "utc_dt": "1990-01-15T14:30:00Z",
                "theme": "light",
                "width": 600,
                "height": 600,
            })
        );
    }

    #[tokio::test]
    async fn svg_is_returned_unmodified() {
        let renderer = sh("cat >/dev/null; printf '<svg>chart</svg>\\n'");
        let svg = renderer.render(&subject(), &NATAL_CHART_OPTIONS).await.unwrap();
        assert_eq!(svg, "<svg>chart</svg>\n");
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr() {
        let err = sh("cat >/dev/null; echo 'ephemeris missing' >&2; exit 3")
            .render(&subject(), &NATAL_CHART_OPTIONS)
            .await
            .unwrap_err();

        match &err {
            RenderError::Failed { status, stderr } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "ephemeris missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("ephemeris missing"));
    }

    #[tokio::test]
    async fn exit_without_reading_stdin_is_reported_by_status() {
        let err = sh("exit 1").render(&subject(), &NATAL_CHART_OPTIONS).await.unwrap_err();
        assert!(matches!(err, RenderError::Failed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn empty_output_is_an_error() {
        let err = sh("cat >/dev/null").render(&subject(), &NATAL_CHART_OPTIONS).await.unwrap_err();
        assert!(matches!(err, RenderError::Empty));
    }

    #[tokio::test]
    async fn output_without_svg_element_is_an_error() {
        let err = sh("cat >/dev/null; echo 'chart unavailable'")
            .render(&subject(), &NATAL_CHART_OPTIONS)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::NotSvg), "{err:?}");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let renderer = CommandRenderer::new("/nonexistent/natal-chart-render", Vec::new());
        let err = renderer.render(&subject(), &NATAL_CHART_OPTIONS).await.unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/natal-chart-render"));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External page tools: poppler's `pdfseparate` and `pdfunite`, and
// Ghostscript's `pdfwrite` device with a `setcolortransfer` prologue.
//
// Every invocation runs under the configured timeout. Children are killed
// when their future is dropped, so a timeout or an aborted run never leaves
// a renderer behind.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use polarity_core::error::{PolarityError, Result};
use polarity_core::{ChannelTransfer, Strategy, ToolConfig, TransferFunction};
use polarity_document::RewriteStats;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{PageTools, collect_page_files};

/// Page tools backed by external programs.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    config: ToolConfig,
}

impl ExternalTools {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Run `program` with `args`; any failure becomes
    /// [`PolarityError::ExternalTool`] with the captured stderr.
    async fn invoke(&self, program: &str, args: Vec<OsString>) -> Result<()> {
        debug!(program, ?args, "Running external tool");
        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| PolarityError::external(program, format!("spawn failed: {err}"), ""))?;

        let output = tokio::time::timeout(self.config.timeout(), child.wait_with_output())
            .await
            .map_err(|_| {
                PolarityError::external(
                    program,
                    format!("timed out after {}s", self.config.timeout_secs),
                    "",
                )
            })?
            .map_err(|err| PolarityError::external(program, format!("wait failed: {err}"), ""))?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map_or_else(|| "terminated by signal".to_string(), |code| format!("exit code {code}"));
            return Err(PolarityError::external(
                program,
                status,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }
        Ok(())
    }
}

impl PageTools for ExternalTools {
    fn strategy(&self) -> Strategy {
        Strategy::External
    }

    #[instrument(skip(self))]
    async fn split(&self, input: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
        self.invoke(&self.config.split, split_args(input, dir)).await?;
        collect_page_files(dir).await
    }

    #[instrument(skip(self, transfer))]
    async fn render(
        &self,
        page: &Path,
        transfer: &TransferFunction,
        output: &Path,
    ) -> Result<RewriteStats> {
        self.invoke(&self.config.render, render_args(page, transfer, output))
            .await?;
        Ok(RewriteStats::default())
    }

    #[instrument(skip_all, fields(inputs = inputs.len()))]
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        self.invoke(&self.config.merge, merge_args(inputs, output))
            .await
    }
}

/// `pdfseparate <input> <dir>/page-%d.pdf`
pub fn split_args(input: &Path, dir: &Path) -> Vec<OsString> {
    vec![
        input.as_os_str().to_owned(),
        dir.join("page-%d.pdf").into_os_string(),
    ]
}

/// `gs` arguments that rewrite `page` through `transfer` into `output`.
pub fn render_args(page: &Path, transfer: &TransferFunction, output: &Path) -> Vec<OsString> {
    let mut output_file = OsString::from("-sOutputFile=");
    output_file.push(output);
    vec![
        "-q".into(),
        "-dNOPAUSE".into(),
        "-dBATCH".into(),
        "-dSAFER".into(),
        "-sDEVICE=pdfwrite".into(),
        "-dTransferFunctionInfo=/Apply".into(),
        output_file,
        "-c".into(),
        transfer_prologue(transfer).into(),
        "-f".into(),
        page.as_os_str().to_owned(),
    ]
}

/// `pdfunite <inputs...> <output>`
pub fn merge_args(inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
    inputs
        .iter()
        .map(|path| path.as_os_str().to_owned())
        .chain(std::iter::once(output.as_os_str().to_owned()))
        .collect()
}

/// PostScript installing `transfer` as the CMYK color transfer.
pub fn transfer_prologue(transfer: &TransferFunction) -> String {
    let procedures: Vec<String> = transfer.channels().iter().map(procedure).collect();
    format!("{} setcolortransfer", procedures.join(" "))
}

fn procedure(curve: &ChannelTransfer) -> String {
    if curve.is_identity() {
        "{}".to_string()
    } else {
        format!(
            "{{{} mul {} add 0 max 1 min}}",
            curve.scale, curve.offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prologue() {
        assert_eq!(
            transfer_prologue(&TransferFunction::default()),
            "{-1 mul 1.2 add 0 max 1 min} {-1 mul 1.2 add 0 max 1 min} \
             {-1 mul 1.2 add 0 max 1 min} {} setcolortransfer"
        );
    }

    #[test]
    fn argument_shapes() {
        let split = split_args(Path::new("book.pdf"), Path::new("/tmp/w"));
        assert_eq!(split, vec![OsString::from("book.pdf"), OsString::from("/tmp/w/page-%d.pdf")]);

        let render = render_args(
            Path::new("page-4.pdf"),
            &TransferFunction::default(),
            Path::new("out-4.pdf"),
        );
        assert!(render.contains(&OsString::from("-sOutputFile=out-4.pdf")));
        assert!(render.contains(&OsString::from("-dTransferFunctionInfo=/Apply")));
        assert_eq!(render.last(), Some(&OsString::from("page-4.pdf")));

        let merge = merge_args(
            &[PathBuf::from("a.pdf"), PathBuf::from("b.pdf")],
            Path::new("out.pdf"),
        );
        assert_eq!(merge, vec![OsString::from("a.pdf"), OsString::from("b.pdf"), OsString::from("out.pdf")]);
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_failure() {
        let tools = ExternalTools::new(ToolConfig {
            split: "polarity-no-such-program".to_string(),
            ..ToolConfig::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let err = tools
            .split(Path::new("book.pdf"), dir.path())
            .await
            .unwrap_err();
        match err {
            PolarityError::ExternalTool { tool, status, .. } => {
                assert_eq!(tool, "polarity-no-such-program");
                assert!(status.starts_with("spawn failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_fatal() {
        let tools = ExternalTools::new(ToolConfig::default());
        let err = tools
            .invoke("sh", vec!["-c".into(), "echo broken page >&2; exit 3".into()])
            .await
            .unwrap_err();
        match err {
            PolarityError::ExternalTool { status, stderr, .. } => {
                assert_eq!(status, "exit code 3");
                assert_eq!(stderr, "broken page");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let tools = ExternalTools::new(ToolConfig {
            timeout_secs: 1,
            ..ToolConfig::default()
        });
        let err = tools
            .invoke("sleep", vec!["5".into()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out after 1s"));
    }
}

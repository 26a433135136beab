use std::path::Path;

use crate::pipeline::Pipeline;
use crate::step::Step;

/// Renders a pipeline as a Dockerfile, one instruction group per step.
///
/// The interpreter installer is a Windows executable, so the image is
/// built on a Windows base with PowerShell as the `RUN` shell. The
/// installer `RUN` wraps install in `try/finally` so the artifact is removed
/// even when the installer fails.
pub struct DockerfileGenerator<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (idx, step) in self.pipeline.steps().iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            out.push_str(&format!("# === {}: {} ===\n", idx + 1, step.name()));
            out.push_str(&self.render_step(step));
        }
        out
    }

    fn render_step(&self, step: &Step) -> String {
        match step {
            Step::Base { image } => format!(
                "FROM {image}\n\
                 SHELL [\"powershell\", \"-Command\", \"$ErrorActionPreference = 'Stop'; $ProgressPreference = 'SilentlyContinue';\"]\n"
            ),
            Step::InstallInterpreter {
                url,
                artifact,
                options,
                ..
            } => {
                let artifact = ps_quote(&artifact.to_string_lossy());
                format!(
                    "RUN try {{ \\\n\
                     \x20     Invoke-WebRequest -Uri {url} -OutFile {artifact}; \\\n\
                     \x20     $p = Start-Process -FilePath {artifact} -ArgumentList {args} -Wait -PassThru; \\\n\
                     \x20     if ($p.ExitCode -ne 0) {{ exit $p.ExitCode }} \\\n\
                     \x20   }} finally {{ \\\n\
                     \x20     Remove-Item -Force -ErrorAction SilentlyContinue {artifact} \\\n\
                     \x20   }}\n",
                    url = ps_quote(url),
                    artifact = artifact,
                    args = ps_quote(&options.args().join(" ")),
                )
            }
            Step::StageManifest { manifest } => {
                let manifest = slash(manifest);
                format!(
                    "WORKDIR {workdir}\nCOPY {manifest} {manifest}\n",
                    workdir = slash(self.pipeline.workdir()),
                )
            }
            Step::InstallDependencies { options } => {
                format!("RUN {} {}\n", options.runtime, options.args().join(" "))
            }
            Step::MaterializeSources => "COPY . .\n".to_owned(),
            Step::Launch { command } => {
                let argv: Vec<String> = command.argv().iter().map(|a| json_quote(a)).collect();
                format!("CMD [{}]\n", argv.join(", "))
            }
        }
    }
}

fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Single-quoted PowerShell literal.
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// JSON string literal for exec-form `CMD`.
fn json_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

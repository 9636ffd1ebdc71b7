use std::{
    fmt,
    path::{Path, PathBuf},
};

use rustyline::DefaultEditor;

use crate::{
    cert_sign_request::{
        dn::{create_profile, OrganizationProfile},
        profile::ProfileRegistry,
        san::{classify, DomainRequest},
        RenderedCsrConfig,
    },
    config::Config,
    error::CsrError,
    openssl::{CryptoTool, Invocation, ToolOutput},
    utils::is_non_empty_file,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Classifying,
    ProfileResolving,
    Rendering,
    KeyResolving,
    Invoking,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug)]
pub struct ProfilePlan {
    pub profile: OrganizationProfile,
    pub interactive: bool,
}

pub fn profile_run(plan: ProfilePlan, workdir: &Path) -> anyhow::Result<PathBuf> {
    let mut profile = plan.profile;
    if plan.interactive {
        let mut rl = DefaultEditor::new()?;
        profile.fill_interactive(&mut rl)?;
    }
    Ok(create_profile(workdir, &profile)?)
}

#[derive(Debug)]
pub struct CsrPlan {
    pub domain: String,
    pub key: Option<PathBuf>,
    pub org: Option<String>,
    pub dry_run: bool,
}

/// Files a CSR run produced (or, for a dry run, would produce).
#[derive(Debug)]
pub struct RunOutcome {
    pub config: PathBuf,
    pub key: PathBuf,
    pub csr: PathBuf,
    pub invocations: Vec<Invocation>,
}

struct CsrRun<'a, T> {
    settings: &'a Config,
    workdir: &'a Path,
    tool: &'a mut T,
    state: RunState,
    invocations: Vec<Invocation>,
}

impl<'a, T: CryptoTool> CsrRun<'a, T> {
    fn advance(&mut self, next: RunState) {
        tracing::debug!("{} -> {}", self.state, next);
        self.state = next;
    }

    /// Runs `invocation` unless this is a dry run; either way it is
    /// recorded in the outcome.
    fn invoke(
        &mut self,
        invocation: Invocation,
        dry_run: bool,
    ) -> Result<Option<ToolOutput>, CsrError> {
        let output = if dry_run {
            None
        } else {
            Some(self.tool.run(&invocation)?)
        };
        self.invocations.push(invocation);
        Ok(output)
    }

    fn execute(&mut self, plan: &CsrPlan) -> Result<RunOutcome, CsrError> {
        self.advance(RunState::Classifying);
        let input = classify(&plan.domain)?;
        if let Some(key) = &plan.key {
            if !is_non_empty_file(key) {
                return Err(CsrError::KeyNotFound { path: key.clone() });
            }
        }
        let request = DomainRequest::from_input(input, self.settings.csr.max_sans)?;
        tracing::info!(
            "request for {} with {} alternative name(s) from {}",
            request.common_name,
            request.sans.iter().filter(|san| !san.is_empty()).count(),
            request.source
        );

        self.advance(RunState::ProfileResolving);
        let profile = ProfileRegistry::scan(self.workdir)?.select(plan.org.as_deref())?;

        self.advance(RunState::Rendering);
        let key_bits = self.settings.csr.key_bits;
        let rendered = RenderedCsrConfig::new(self.workdir, &request, &profile, key_bits);
        rendered.write()?;
        tracing::info!("wrote request config {:?}", rendered.path);

        self.advance(RunState::KeyResolving);
        let stem = request.file_stem();
        let key = match &plan.key {
            Some(key) => {
                let check = Invocation::CheckRsa { key: key.clone() };
                if let Some(output) = self.invoke(check, plan.dry_run)? {
                    if !output.success() {
                        let warning = CsrError::InvalidKey {
                            path: key.clone(),
                            detail: output.stderr.trim().to_owned(),
                        };
                        tracing::warn!("{warning}, continuing with it anyway");
                    }
                }
                key.clone()
            }
            None => {
                let key = self.workdir.join(format!("{stem}.key"));
                let genrsa = Invocation::GenRsa {
                    key: key.clone(),
                    bits: key_bits,
                };
                let step = genrsa.step();
                if let Some(output) = self.invoke(genrsa, plan.dry_run)? {
                    if !output.success() {
                        return Err(CsrError::CsrToolFailed {
                            step,
                            code: output.code,
                            stderr: output.stderr,
                        });
                    }
                    tracing::info!("generated key {key:?}");
                }
                key
            }
        };

        self.advance(RunState::Invoking);
        let csr = self.workdir.join(format!("{stem}.csr"));
        let req = Invocation::Req {
            config: rendered.path.clone(),
            key: key.clone(),
            csr: csr.clone(),
        };
        let step = req.step();
        if let Some(output) = self.invoke(req, plan.dry_run)? {
            if !output.success() {
                return Err(CsrError::CsrToolFailed {
                    step,
                    code: output.code,
                    stderr: output.stderr,
                });
            }
            tracing::info!("wrote request {csr:?}");
        }

        Ok(RunOutcome {
            config: rendered.path,
            key,
            csr,
            invocations: std::mem::take(&mut self.invocations),
        })
    }
}

/// Classify the domain argument, pick the profile, write the request
/// config, then let the crypto tool produce key and CSR. Nothing is
/// written before the input and the profile check out; a failing tool
/// leaves the config in place.
pub fn csr_run<T: CryptoTool>(
    plan: &CsrPlan,
    settings: &Config,
    workdir: &Path,
    tool: &mut T,
) -> Result<RunOutcome, CsrError> {
    let mut run = CsrRun {
        settings,
        workdir,
        tool,
        state: RunState::Idle,
        invocations: Vec::new(),
    };
    match run.execute(plan) {
        Ok(outcome) => {
            run.advance(RunState::Done);
            Ok(outcome)
        }
        Err(err) => {
            tracing::debug!("run failed while {}", run.state);
            run.advance(RunState::Failed);
            Err(err)
        }
    }
}

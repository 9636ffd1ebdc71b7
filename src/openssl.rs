use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::error::CsrError;

/// One call into the openssl command line tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    GenRsa { key: PathBuf, bits: u32 },
    CheckRsa { key: PathBuf },
    Req {
        config: PathBuf,
        key: PathBuf,
        csr: PathBuf,
    },
}

impl Invocation {
    pub fn step(&self) -> &'static str {
        match self {
            Invocation::GenRsa { .. } => "genrsa",
            Invocation::CheckRsa { .. } => "rsa",
            Invocation::Req { .. } => "req",
        }
    }

    pub fn args(&self) -> Vec<OsString> {
        match self {
            Invocation::GenRsa { key, bits } => vec![
                "genrsa".into(),
                "-out".into(),
                key.into(),
                bits.to_string().into(),
            ],
            Invocation::CheckRsa { key } => vec![
                "rsa".into(),
                "-in".into(),
                key.into(),
                "-check".into(),
                "-noout".into(),
            ],
            Invocation::Req { config, key, csr } => vec![
                "req".into(),
                "-new".into(),
                "-config".into(),
                config.into(),
                "-key".into(),
                key.into(),
                "-out".into(),
                csr.into(),
            ],
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self.args();
        let mut first = true;
        for arg in &args {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs openssl steps. Only the exit status is interpreted, the text the
/// tool prints is kept for error messages.
pub trait CryptoTool {
    fn run(&mut self, invocation: &Invocation) -> Result<ToolOutput, CsrError>;
}

pub struct Openssl {
    binary: PathBuf,
}

impl Openssl {
    pub fn new<P: AsRef<Path>>(binary: P) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl CryptoTool for Openssl {
    fn run(&mut self, invocation: &Invocation) -> Result<ToolOutput, CsrError> {
        tracing::debug!("running {:?} {}", self.binary, invocation);
        let output = Command::new(&self.binary)
            .args(invocation.args())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CsrError::ToolSpawn {
                program: self.binary.clone(),
                source,
            })?;
        Ok(ToolOutput {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

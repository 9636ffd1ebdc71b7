use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsrError {
    #[error("invalid input {input:?}: {reason}")]
    InvalidInput { input: String, reason: String },
    #[error(
        "no organization profile (*_gen_config) found in {dir:?}; \
         create one with `csrgen config -o <org>`"
    )]
    NoProfileFound { dir: PathBuf },
    #[error(
        "found several organization profiles ({}); choose one with -o <org>",
        .found.join(", ")
    )]
    AmbiguousProfile { found: Vec<String> },
    #[error("no profile for organization {org:?} at {path:?}")]
    ProfileNotFound { org: String, path: PathBuf },
    #[error(
        "{path:?} lists {count} alternative names after the common name, \
         at most {max} are allowed"
    )]
    TooManyDomains {
        path: PathBuf,
        count: usize,
        max: usize,
    },
    #[error("key file {path:?} does not exist or is empty")]
    KeyNotFound { path: PathBuf },
    #[error("key {path:?} did not pass RSA validation: {detail}")]
    InvalidKey { path: PathBuf, detail: String },
    #[error("openssl {step} failed with {}: {}", describe_code(.code), .stderr.trim())]
    CsrToolFailed {
        step: &'static str,
        code: Option<i32>,
        stderr: String,
    },
    #[error("can't run {program:?}")]
    ToolSpawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("can't access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_owned(),
    }
}

impl CsrError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| CsrError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_resource() {
        let err = CsrError::AmbiguousProfile {
            found: vec!["Acme".into(), "Globex".into()],
        };
        assert!(err.to_string().contains("Acme, Globex"));

        let err = CsrError::CsrToolFailed {
            step: "req",
            code: Some(1),
            stderr: "unable to load key\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "openssl req failed with exit code 1: unable to load key"
        );

        let err = CsrError::KeyNotFound {
            path: "site.key".into(),
        };
        assert!(err.to_string().contains("site.key"));
    }
}

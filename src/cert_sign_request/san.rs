use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::{error::CsrError, utils::is_non_empty_file};

const MAX_DOMAIN_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 63;
/// Alternative names a request may carry after its common name.
pub const MAX_SANS: usize = 100;

/// What the `-d` argument turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub enum DomainInput {
    Single(String),
    File(PathBuf),
}

/// A file wins over a domain: `example.com` is read as a list if a
/// non-empty file of that name exists.
pub fn classify(input: &str) -> Result<DomainInput, CsrError> {
    if input.is_empty() {
        return Err(CsrError::InvalidInput {
            input: input.to_owned(),
            reason: "a domain or a domain list file is required".into(),
        });
    }
    if is_non_empty_file(input) {
        return Ok(DomainInput::File(PathBuf::from(input)));
    }
    if is_valid_domain(input) {
        Ok(DomainInput::Single(input.to_lowercase()))
    } else {
        Err(CsrError::InvalidInput {
            input: input.to_owned(),
            reason: "neither an existing non-empty file nor a valid domain name"
                .into(),
        })
    }
}

/// Dot separated labels of letters, digits and hyphens, an optional
/// trailing dot, 255 characters at most.
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    let name = domain.strip_suffix('.').unwrap_or(domain);
    !name.is_empty() && name.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    (1..=MAX_LABEL_LEN).contains(&label.len())
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        && !label.starts_with('-')
        && !label.ends_with('-')
}

#[derive(Debug, PartialEq, Eq)]
pub enum DomainSource {
    Literal,
    File(PathBuf),
}

impl fmt::Display for DomainSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainSource::Literal => f.write_str("the command line"),
            DomainSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Common name plus alternative names for one run. Blank entries in
/// `sans` come from blank lines in a list file and are skipped when
/// rendering.
#[derive(Debug, PartialEq, Eq)]
pub struct DomainRequest {
    pub common_name: String,
    pub sans: Vec<String>,
    pub source: DomainSource,
}

impl DomainRequest {
    pub fn single(domain: &str) -> Self {
        Self {
            common_name: normalize(domain),
            sans: Vec::new(),
            source: DomainSource::Literal,
        }
    }

    pub fn from_input(
        input: DomainInput,
        max_sans: usize,
    ) -> Result<Self, CsrError> {
        match input {
            DomainInput::Single(domain) => Ok(Self::single(&domain)),
            DomainInput::File(path) => Self::from_file(&path, max_sans),
        }
    }

    /// First line is the common name, every following line one
    /// alternative name. `max_sans` never exceeds [`MAX_SANS`].
    pub fn from_file(path: &Path, max_sans: usize) -> Result<Self, CsrError> {
        let max_sans = max_sans.min(MAX_SANS);
        let data = fs::read_to_string(path).map_err(CsrError::io(path))?;
        let lines = data.lines().collect::<Vec<_>>();
        if lines.len() > max_sans + 1 {
            return Err(CsrError::TooManyDomains {
                path: path.to_path_buf(),
                count: lines.len() - 1,
                max: max_sans,
            });
        }

        let mut lines = lines.into_iter().map(normalize);
        let common_name = lines.next().unwrap_or_default();
        if !is_valid_domain(&common_name) {
            return Err(CsrError::InvalidInput {
                input: path.display().to_string(),
                reason: format!(
                    "first line {common_name:?} is not a valid domain name"
                ),
            });
        }

        let sans = lines.collect::<Vec<_>>();
        if let Some((index, bad)) = sans
            .iter()
            .enumerate()
            .find(|(_, san)| !san.is_empty() && !is_valid_domain(san))
        {
            return Err(CsrError::InvalidInput {
                input: path.display().to_string(),
                reason: format!(
                    "line {} {bad:?} is not a valid domain name",
                    index + 2
                ),
            });
        }

        Ok(Self {
            common_name,
            sans,
            source: DomainSource::File(path.to_path_buf()),
        })
    }

    /// Stem every artifact of the run is named after.
    pub fn file_stem(&self) -> &str {
        self.common_name
            .strip_suffix('.')
            .unwrap_or(&self.common_name)
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().to_lowercase()
}

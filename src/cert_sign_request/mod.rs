use std::{
    fs,
    path::{Path, PathBuf},
};

use self::{
    dn::{OrganizationProfile, DN_SECTION},
    san::DomainRequest,
};
use crate::error::CsrError;

pub mod dn;
pub mod profile;
pub mod san;

pub const CSR_CONFIG_SUFFIX: &str = "_csr_config";

/// OpenSSL `req` configuration for one request.
///
/// Sections are `req`, `req_distinguished_name`, `v3_req` and
/// `alt_names`. `DNS.1` is always the common name; every non-empty SAN
/// after it takes the next number, blank ones are skipped without using
/// one up. The output only depends on the arguments.
pub fn render(
    cn: &str,
    sans: &[String],
    profile: &OrganizationProfile,
    key_bits: u32,
) -> String {
    let mut lines = vec![
        "[ req ]".to_owned(),
        format!("    default_bits = {key_bits}"),
        format!("    distinguished_name = {DN_SECTION}"),
        "    prompt = no".to_owned(),
        "    req_extensions = v3_req".to_owned(),
        format!("[ {DN_SECTION} ]"),
    ];
    lines.extend(profile.dn_lines());
    lines.push(format!("    CN = {cn}"));
    lines.extend([
        "[ v3_req ]".to_owned(),
        "    subjectAltName = @alt_names".to_owned(),
        String::new(),
        "[ alt_names ]".to_owned(),
        format!("    DNS.1 = {cn}"),
    ]);
    lines.extend(
        sans.iter()
            .map(|san| san.trim())
            .filter(|san| !san.is_empty())
            .enumerate()
            .map(|(index, san)| format!("    DNS.{} = {san}", index + 2)),
    );

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCsrConfig {
    pub path: PathBuf,
    pub text: String,
}

impl RenderedCsrConfig {
    /// Render `request` into `<stem>_csr_config` inside `dir`.
    pub fn new(
        dir: &Path,
        request: &DomainRequest,
        profile: &OrganizationProfile,
        key_bits: u32,
    ) -> Self {
        Self {
            path: dir.join(format!("{}{CSR_CONFIG_SUFFIX}", request.file_stem())),
            text: render(&request.common_name, &request.sans, profile, key_bits),
        }
    }

    pub fn write(&self) -> Result<(), CsrError> {
        fs::write(&self.path, &self.text).map_err(CsrError::io(&self.path))
    }
}

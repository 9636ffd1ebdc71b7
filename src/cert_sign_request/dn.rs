use std::{
    fs,
    path::{Path, PathBuf},
};

use rustyline::DefaultEditor;

use crate::{error::CsrError, utils::prompt_field};

pub const DN_SECTION: &str = "req_distinguished_name";
pub const PROFILE_SUFFIX: &str = "_gen_config";

/// Distinguished name fields shared by every request of one organization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrganizationProfile {
    pub country: Option<String>,
    pub locality: Option<String>,
    pub state: Option<String>,
    pub organization: String,
}

impl OrganizationProfile {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            ..Default::default()
        }
    }

    /// `(label, value)` for every field that is set, in config order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("C", self.country.as_deref()),
            ("L", self.locality.as_deref()),
            ("ST", self.state.as_deref()),
            ("O", Some(self.organization.as_str())),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|value| (label, value)))
        .collect()
    }

    /// Lines of the `req_distinguished_name` section, without the header.
    pub fn dn_lines(&self) -> Vec<String> {
        self.fields()
            .into_iter()
            .map(|(label, value)| format!("    {label} = {}", escape_value(value)))
            .collect()
    }

    pub fn to_profile_text(&self) -> String {
        let mut text = format!("[ {DN_SECTION} ]\n");
        for line in self.dn_lines() {
            text.push_str(&line);
            text.push('\n');
        }
        text
    }

    /// Reads `key = value` lines, ignoring section headers and comments.
    /// Long OpenSSL names (`countryName`, ...) are accepted too.
    pub fn parse(text: &str, fallback_org: &str) -> Self {
        let mut profile = Self::default();
        let mut organization = None;
        for line in text.lines().map(str::trim) {
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with(';')
                || line.starts_with('[')
            {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unescape_value(value);
            let value = (!value.is_empty()).then_some(value);
            match key.trim() {
                "C" | "countryName" => profile.country = value,
                "L" | "localityName" => profile.locality = value,
                "ST" | "stateOrProvinceName" => profile.state = value,
                "O" | "organizationName" => organization = value,
                other => tracing::debug!("ignoring profile key {other:?}"),
            }
        }
        profile.organization =
            organization.unwrap_or_else(|| fallback_org.to_owned());
        profile
    }

    pub fn fill_interactive(&mut self, rl: &mut DefaultEditor) -> anyhow::Result<()> {
        if self.country.is_none() {
            self.country = prompt_field(rl, "Country (2 letters, blank to skip) > ")?;
        }
        if self.locality.is_none() {
            self.locality = prompt_field(rl, "Locality/City (blank to skip) > ")?;
        }
        if self.state.is_none() {
            self.state = prompt_field(rl, "State (blank to skip) > ")?;
        }
        Ok(())
    }
}

/// OpenSSL config values expand `$var` and end at `#`, so both are
/// escaped along with the escape and quote characters themselves.
pub fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '$' | '#' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Reverse of [`escape_value`] for a raw value as found after `=`:
/// drops an unescaped trailing `# comment` and unescaped quotes.
pub fn unescape_value(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut quoted = false;
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    value.push(next);
                }
            }
            '"' => quoted = !quoted,
            '#' if !quoted => break,
            c => value.push(c),
        }
    }
    value.trim().to_owned()
}

pub fn profile_path(dir: &Path, organization: &str) -> PathBuf {
    dir.join(format!("{organization}{PROFILE_SUFFIX}"))
}

pub fn read_profile(path: &Path, organization: &str) -> Result<OrganizationProfile, CsrError> {
    let text = fs::read_to_string(path).map_err(CsrError::io(path))?;
    Ok(OrganizationProfile::parse(&text, organization))
}

/// Write `<org>_gen_config` into `dir`, replacing any existing profile.
pub fn create_profile(
    dir: &Path,
    profile: &OrganizationProfile,
) -> Result<PathBuf, CsrError> {
    let org = profile.organization.trim();
    if org.is_empty() || org.contains(['/', '\\']) || org == "." || org == ".." {
        return Err(CsrError::InvalidInput {
            input: profile.organization.clone(),
            reason: "organization name must be non-empty and usable as a file name"
                .into(),
        });
    }
    let path = profile_path(dir, org);
    if path.exists() {
        tracing::info!("overwriting existing profile {path:?}");
    }
    fs::write(&path, profile.to_profile_text()).map_err(CsrError::io(&path))?;
    Ok(path)
}

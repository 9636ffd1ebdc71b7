use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use super::dn::{profile_path, read_profile, OrganizationProfile, PROFILE_SUFFIX};
use crate::error::CsrError;

/// Outcome of looking a profile up by (optional) organization name.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    NoneFound,
    Ambiguous(Vec<String>),
    Missing { org: String, path: PathBuf },
    Resolved { org: String, path: PathBuf },
}

/// Every `<org>_gen_config` file of one directory, keyed by organization.
#[derive(Debug)]
pub struct ProfileRegistry {
    dir: PathBuf,
    profiles: BTreeMap<String, PathBuf>,
}

impl ProfileRegistry {
    pub fn scan(dir: &Path) -> Result<Self, CsrError> {
        let mut profiles = BTreeMap::new();
        for entry in fs::read_dir(dir).map_err(CsrError::io(dir))? {
            let entry = entry.map_err(CsrError::io(dir))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(org) = name.strip_suffix(PROFILE_SUFFIX) else {
                continue;
            };
            if org.is_empty() || !entry.path().is_file() {
                continue;
            }
            profiles.insert(org.to_owned(), entry.path());
        }
        tracing::debug!("found {} profile(s) in {dir:?}", profiles.len());
        Ok(Self {
            dir: dir.to_path_buf(),
            profiles,
        })
    }

    pub fn organizations(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// An explicit organization always has to match a file; without one
    /// the only profile present is used.
    pub fn lookup(&self, org: Option<&str>) -> Resolution {
        if self.profiles.is_empty() {
            return Resolution::NoneFound;
        }
        match org {
            Some(org) => match self.profiles.get(org) {
                Some(path) => Resolution::Resolved {
                    org: org.to_owned(),
                    path: path.clone(),
                },
                None => Resolution::Missing {
                    org: org.to_owned(),
                    path: profile_path(&self.dir, org),
                },
            },
            None if self.profiles.len() == 1 => {
                let (org, path) = self
                    .profiles
                    .iter()
                    .next()
                    .map(|(org, path)| (org.clone(), path.clone()))
                    .unwrap_or_default();
                Resolution::Resolved { org, path }
            }
            None => Resolution::Ambiguous(self.organizations()),
        }
    }

    pub fn select(&self, org: Option<&str>) -> Result<OrganizationProfile, CsrError> {
        match self.lookup(org) {
            Resolution::NoneFound => Err(CsrError::NoProfileFound {
                dir: self.dir.clone(),
            }),
            Resolution::Ambiguous(found) => Err(CsrError::AmbiguousProfile { found }),
            Resolution::Missing { org, path } => {
                Err(CsrError::ProfileNotFound { org, path })
            }
            Resolution::Resolved { org, path } => {
                tracing::info!("using organization profile {path:?}");
                read_profile(&path, &org)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert_sign_request::dn::create_profile;

    #[test]
    fn empty_dir_has_no_profile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("_gen_config"), "O = nobody").unwrap();

        let registry = ProfileRegistry::scan(dir.path()).unwrap();
        assert_eq!(registry.lookup(None), Resolution::NoneFound);
        assert!(matches!(
            registry.select(Some("Acme")),
            Err(CsrError::NoProfileFound { .. })
        ));
    }

    #[test]
    fn single_profile_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let mut acme = OrganizationProfile::new("Acme");
        acme.country = Some("US".into());
        create_profile(dir.path(), &acme).unwrap();

        let registry = ProfileRegistry::scan(dir.path()).unwrap();
        assert_eq!(registry.select(None).unwrap(), acme);
    }

    #[test]
    fn several_profiles_need_an_organization() {
        let dir = tempfile::tempdir().unwrap();
        create_profile(dir.path(), &OrganizationProfile::new("Acme")).unwrap();
        create_profile(dir.path(), &OrganizationProfile::new("Globex")).unwrap();
        let registry = ProfileRegistry::scan(dir.path()).unwrap();

        match registry.select(None) {
            Err(CsrError::AmbiguousProfile { found }) => {
                assert_eq!(found, ["Acme", "Globex"])
            }
            other => panic!("expected AmbiguousProfile, got {other:?}"),
        }
        assert_eq!(registry.select(Some("Globex")).unwrap().organization, "Globex");
        match registry.select(Some("Initech")) {
            Err(CsrError::ProfileNotFound { org, path }) => {
                assert_eq!(org, "Initech");
                assert_eq!(path, dir.path().join("Initech_gen_config"));
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn explicit_organization_must_match_single_profile() {
        let dir = tempfile::tempdir().unwrap();
        create_profile(dir.path(), &OrganizationProfile::new("Acme")).unwrap();
        let registry = ProfileRegistry::scan(dir.path()).unwrap();

        assert!(matches!(
            registry.lookup(Some("Globex")),
            Resolution::Missing { .. }
        ));
    }
}

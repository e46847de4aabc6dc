//! Scope-to-ability compilation

use std::collections::BTreeSet;

use tracing::debug;

use super::scope::ScopeGrant;

/// Compiled set of grants, closed under `manage ⇒ read`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbilitySet {
    grants: BTreeSet<ScopeGrant>,
}

impl AbilitySet {
    /// Compile raw scope strings into abilities.
    ///
    /// Unknown scopes are skipped so that keys carrying scopes introduced by a
    /// newer credential store still authenticate here.
    pub fn compile<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut grants = BTreeSet::new();

        for raw in scopes {
            let raw = raw.as_ref();
            match ScopeGrant::parse(raw) {
                Some(grant) => {
                    grants.insert(grant);
                    if let Some(implied) = grant.implied() {
                        grants.insert(implied);
                    }
                }
                None => debug!(scope = %raw, "Ignoring unrecognised scope"),
            }
        }

        Self { grants }
    }

    pub fn can(&self, grant: &ScopeGrant) -> bool {
        self.grants.contains(grant)
    }

    pub fn grants(&self) -> impl Iterator<Item = &ScopeGrant> {
        self.grants.iter()
    }

    /// Render back to scope strings
    pub fn to_scopes(&self) -> BTreeSet<String> {
        self.grants.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

/// Compile raw scopes into an [`AbilitySet`]
pub fn compile<I, S>(scopes: I) -> AbilitySet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    AbilitySet::compile(scopes)
}

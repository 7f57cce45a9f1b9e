//! Principal model: what the negotiation layer produced and what gets published.
//!
//! `NegotiatedIdentity` is the raw result of the handshake (user + groups).
//! `Principal` is the request-scoped identity assertion handed to the authority,
//! the hooks and finally the handlers.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Prefix applied to group names when they are turned into granted authorities.
pub const ROLE_PREFIX: &str = "ROLE_";

/// Authority granted to every negotiated principal unless configured otherwise.
pub const DEFAULT_GRANTED_AUTHORITY: &str = "ROLE_USER";

/// A group the negotiated user is a member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityGroup {
    pub fqn: String,
    pub sid: Option<String>,
}

impl IdentityGroup {
    pub fn new(fqn: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            sid: None,
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }
}

/// Identity yielded by a completed negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedIdentity {
    pub fqn: String,
    pub sid: Option<String>,
    pub groups: Vec<IdentityGroup>,
    pub guest: bool,
}

impl NegotiatedIdentity {
    pub fn new(fqn: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            sid: None,
            groups: Vec::new(),
            guest: false,
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn with_group(mut self, group: IdentityGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn guest(mut self) -> Self {
        self.guest = true;
        self
    }

    pub fn is_guest(&self) -> bool {
        self.guest
    }
}

/// How a user or group is rendered into role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameFormat {
    #[default]
    Fqn,
    Sid,
    Both,
    None,
}

impl NameFormat {
    fn render(self, fqn: &str, sid: Option<&str>) -> Vec<String> {
        let mut names = Vec::new();
        if matches!(self, Self::Fqn | Self::Both) {
            names.push(fqn.to_string());
        }
        if matches!(self, Self::Sid | Self::Both)
            && let Some(sid) = sid
        {
            names.push(sid.to_string());
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown name format: {0}")]
pub struct UnknownNameFormat(pub String);

impl FromStr for NameFormat {
    type Err = UnknownNameFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fqn" => Ok(Self::Fqn),
            "sid" => Ok(Self::Sid),
            "both" => Ok(Self::Both),
            "none" => Ok(Self::None),
            other => Err(UnknownNameFormat(other.to_string())),
        }
    }
}

/// Knobs controlling identity → principal conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalPolicy {
    pub principal_format: NameFormat,
    pub role_format: NameFormat,
    pub default_granted_authority: Option<String>,
}

impl Default for PrincipalPolicy {
    fn default() -> Self {
        Self {
            principal_format: NameFormat::Fqn,
            role_format: NameFormat::Fqn,
            default_granted_authority: Some(DEFAULT_GRANTED_AUTHORITY.to_string()),
        }
    }
}

/// Validated identity assertion for the current request.
///
/// - `roles` are the raw user/group names rendered with the configured formats.
/// - `authorities` are coarse-grained grants (`ROLE_*`) an authority may extend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<String>,
    roles: Vec<String>,
    authorities: Vec<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sid: None,
            roles: Vec::new(),
            authorities: Vec::new(),
        }
    }

    pub fn from_identity(identity: &NegotiatedIdentity, policy: &PrincipalPolicy) -> Self {
        let sid = identity.sid.as_deref();

        let mut roles = policy.principal_format.render(&identity.fqn, sid);
        for group in &identity.groups {
            roles.extend(policy.role_format.render(&group.fqn, group.sid.as_deref()));
        }

        let mut principal = Self {
            name: identity.fqn.clone(),
            sid: identity.sid.clone(),
            roles,
            authorities: Vec::new(),
        };

        if let Some(default) = &policy.default_granted_authority {
            principal.grant(default.clone());
        }
        for group in &identity.groups {
            principal.grant(group_authority(&group.fqn));
        }

        principal
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.grant(authority.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    fn grant(&mut self, authority: String) {
        if !self.has_authority(&authority) {
            self.authorities.push(authority);
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `Domain Users` → `ROLE_DOMAIN USERS`
pub fn group_authority(group_fqn: &str) -> String {
    format!("{ROLE_PREFIX}{}", group_fqn.to_uppercase())
}

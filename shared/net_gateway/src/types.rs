//! Request and response types for the network gateway

use crate::{NetError, NetResult};

/// The peer side of a security-group rule: a CIDR block or another
/// security group, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulePeer {
    /// Allow traffic to/from an IP range in CIDR notation
    Cidr(String),
    /// Allow traffic to/from members of another security group
    Group(String),
}

impl RulePeer {
    /// Builds a peer from the optional pair callers typically hold.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidArgument`] unless exactly one of `cidr`
    /// and `peer_group` is provided.
    pub fn from_options(cidr: Option<String>, peer_group: Option<String>) -> NetResult<Self> {
        match (cidr, peer_group) {
            (Some(cidr), None) => Ok(Self::Cidr(cidr)),
            (None, Some(group)) => Ok(Self::Group(group)),
            _ => Err(NetError::InvalidArgument(
                "either a CIDR or a peer security group id must be passed, not both".to_string(),
            )),
        }
    }
}

/// Inclusive port range for a security-group rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    /// First port in the range
    pub from: i32,
    /// Last port in the range
    pub to: i32,
}

impl PortRange {
    /// Range covering a single port.
    #[must_use]
    pub const fn single(port: i32) -> Self {
        Self {
            from: port,
            to: port,
        }
    }
}

/// Selection criteria for a security-group lookup.
///
/// At least one criterion must be set; an unconstrained describe is almost
/// always a caller bug.
#[derive(Debug, Clone, Default)]
pub struct SecurityGroupFilter {
    /// Match by group name
    pub names: Vec<String>,
    /// Match by group id
    pub ids: Vec<String>,
    /// Arbitrary provider filters as name/values pairs
    pub filters: Vec<(String, Vec<String>)>,
}

impl SecurityGroupFilter {
    /// Filter matching the given group names.
    #[must_use]
    pub fn by_names<I: IntoIterator<Item = S>, S: Into<String>>(names: I) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Filter matching the given group ids.
    #[must_use]
    pub fn by_ids<I: IntoIterator<Item = S>, S: Into<String>>(ids: I) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> NetResult<()> {
        if self.names.is_empty() && self.ids.is_empty() && self.filters.is_empty() {
            return Err(NetError::InvalidArgument(
                "security group filter needs at least one name, id or filter".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of one security group returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupInfo {
    /// Provider-assigned group id
    pub group_id: String,
    /// Group name
    pub group_name: String,
    /// Free-form description
    pub description: Option<String>,
    /// VPC the group belongs to, when reported
    pub vpc_id: Option<String>,
}

//! Network gateway for security groups and elastic address association
//!
//! Wraps the provider's network API behind a thin gateway: security-group
//! CRUD, ingress/egress rule management with validated rule peers, and
//! elastic IP association.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

mod error;
mod types;

use std::sync::Arc;

use aws_sdk_ec2::{
    error::{ProvideErrorMetadata, SdkError},
    types::{Filter, IpPermission, IpRange, UserIdGroupPair},
    Client as Ec2Client,
};
use client_config::GatewayConfig;

pub use error::{NetError, NetResult};
pub use types::{PortRange, RulePeer, SecurityGroupFilter, SecurityGroupInfo};

/// Gateway over the provider's network API.
pub struct NetworkGateway {
    client: Arc<Ec2Client>,
}

impl NetworkGateway {
    /// Creates a gateway over a pre-configured client.
    #[must_use]
    pub const fn new(client: Arc<Ec2Client>) -> Self {
        Self { client }
    }

    /// Resolves credentials, region and endpoint from `config` and connects.
    pub async fn connect(config: &GatewayConfig) -> Self {
        let sdk_config = config.sdk_config().await;
        Self::new(Arc::new(Ec2Client::new(&sdk_config)))
    }

    /// Creates a security group and returns its provider-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidArgument`] for an empty name or
    /// description, or a provider error when creation fails.
    pub async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: Option<&str>,
    ) -> NetResult<String> {
        require(name, "group name")?;
        require(description, "group description")?;

        let output = self
            .client
            .create_security_group()
            .group_name(name)
            .description(description)
            .set_vpc_id(vpc_id.map(ToString::to_string))
            .send()
            .await
            .map_err(|e| classify(&e, name))?;

        tracing::info!("created security group {name}");
        output
            .group_id()
            .map(ToString::to_string)
            .ok_or(NetError::MissingResponseField("GroupId"))
    }

    /// Deletes a security group by id.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::NotFound`] when no such group exists.
    pub async fn delete_security_group(&self, group_id: &str) -> NetResult<()> {
        require(group_id, "group id")?;
        self.client
            .delete_security_group()
            .group_id(group_id)
            .send()
            .await
            .map_err(|e| classify(&e, group_id))?;
        tracing::info!("deleted security group {group_id}");
        Ok(())
    }

    /// Looks up security groups matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidArgument`] for an unconstrained filter,
    /// [`NetError::NotFound`] when a referenced name or id does not exist.
    pub async fn describe_security_groups(
        &self,
        filter: &SecurityGroupFilter,
    ) -> NetResult<Vec<SecurityGroupInfo>> {
        filter.validate()?;

        let provider_filters: Vec<Filter> = filter
            .filters
            .iter()
            .map(|(name, values)| {
                Filter::builder()
                    .name(name)
                    .set_values(Some(values.clone()))
                    .build()
            })
            .collect();

        let output = self
            .client
            .describe_security_groups()
            .set_group_names((!filter.names.is_empty()).then(|| filter.names.clone()))
            .set_group_ids((!filter.ids.is_empty()).then(|| filter.ids.clone()))
            .set_filters((!provider_filters.is_empty()).then_some(provider_filters))
            .send()
            .await
            .map_err(|e| classify(&e, "security groups"))?;

        Ok(output
            .security_groups()
            .iter()
            .filter_map(|group| {
                Some(SecurityGroupInfo {
                    group_id: group.group_id()?.to_string(),
                    group_name: group.group_name()?.to_string(),
                    description: group.description().map(ToString::to_string),
                    vpc_id: group.vpc_id().map(ToString::to_string),
                })
            })
            .collect())
    }

    /// Adds an inbound rule to a security group.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidArgument`] for empty arguments, or a
    /// provider error when the authorization fails.
    pub async fn authorize_ingress(
        &self,
        group_id: &str,
        protocol: &str,
        ports: PortRange,
        peer: &RulePeer,
    ) -> NetResult<()> {
        require(group_id, "group id")?;
        require(protocol, "protocol")?;
        self.client
            .authorize_security_group_ingress()
            .group_id(group_id)
            .ip_permissions(ip_permission(protocol, ports, peer))
            .send()
            .await
            .map_err(|e| classify(&e, group_id))?;
        Ok(())
    }

    /// Adds an outbound rule to a security group.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidArgument`] for empty arguments, or a
    /// provider error when the authorization fails.
    pub async fn authorize_egress(
        &self,
        group_id: &str,
        protocol: &str,
        ports: PortRange,
        peer: &RulePeer,
    ) -> NetResult<()> {
        require(group_id, "group id")?;
        require(protocol, "protocol")?;
        self.client
            .authorize_security_group_egress()
            .group_id(group_id)
            .ip_permissions(ip_permission(protocol, ports, peer))
            .send()
            .await
            .map_err(|e| classify(&e, group_id))?;
        Ok(())
    }

    /// Removes an inbound rule from a security group.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::NotFound`] when the rule or group does not
    /// exist.
    pub async fn revoke_ingress(
        &self,
        group_id: &str,
        protocol: &str,
        ports: PortRange,
        peer: &RulePeer,
    ) -> NetResult<()> {
        require(group_id, "group id")?;
        require(protocol, "protocol")?;
        self.client
            .revoke_security_group_ingress()
            .group_id(group_id)
            .ip_permissions(ip_permission(protocol, ports, peer))
            .send()
            .await
            .map_err(|e| classify(&e, group_id))?;
        Ok(())
    }

    /// Removes an outbound rule from a security group.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::NotFound`] when the rule or group does not
    /// exist.
    pub async fn revoke_egress(
        &self,
        group_id: &str,
        protocol: &str,
        ports: PortRange,
        peer: &RulePeer,
    ) -> NetResult<()> {
        require(group_id, "group id")?;
        require(protocol, "protocol")?;
        self.client
            .revoke_security_group_egress()
            .group_id(group_id)
            .ip_permissions(ip_permission(protocol, ports, peer))
            .send()
            .await
            .map_err(|e| classify(&e, group_id))?;
        Ok(())
    }

    /// Associates an elastic IP allocation with an instance and returns
    /// the association id.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::NotFound`] when the instance or allocation does
    /// not exist.
    pub async fn associate_address(
        &self,
        instance_id: &str,
        allocation_id: &str,
    ) -> NetResult<String> {
        require(instance_id, "instance id")?;
        require(allocation_id, "allocation id")?;

        let output = self
            .client
            .associate_address()
            .instance_id(instance_id)
            .allocation_id(allocation_id)
            .send()
            .await
            .map_err(|e| classify(&e, instance_id))?;

        tracing::info!("associated address {allocation_id} with instance {instance_id}");
        output
            .association_id()
            .map(ToString::to_string)
            .ok_or(NetError::MissingResponseField("AssociationId"))
    }
}

/// Renders a rule as a single permission entry, the peer deciding whether
/// it carries an IP range or a group reference.
fn ip_permission(protocol: &str, ports: PortRange, peer: &RulePeer) -> IpPermission {
    let builder = IpPermission::builder()
        .ip_protocol(protocol)
        .from_port(ports.from)
        .to_port(ports.to);
    match peer {
        RulePeer::Cidr(cidr) => builder
            .ip_ranges(IpRange::builder().cidr_ip(cidr).build())
            .build(),
        RulePeer::Group(group_id) => builder
            .user_id_group_pairs(UserIdGroupPair::builder().group_id(group_id).build())
            .build(),
    }
}

fn require(value: &str, what: &str) -> NetResult<()> {
    if value.trim().is_empty() {
        return Err(NetError::InvalidArgument(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Maps a provider error to the gateway taxonomy: `*.NotFound` error codes
/// become not-found for `resource`, 5xx upstream, everything else a service
/// error.
fn classify<E>(error: &SdkError<E>, resource: &str) -> NetError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    match error {
        SdkError::ServiceError(service_err) => {
            if service_err
                .err()
                .meta()
                .code()
                .is_some_and(|code| code.ends_with(".NotFound"))
            {
                NetError::NotFound(resource.to_string())
            } else if service_err.raw().status().as_u16() >= 500 {
                NetError::Upstream(format!("{service_err:?}"))
            } else {
                NetError::Service(format!("{service_err:?}"))
            }
        }
        other => NetError::Service(format!("{other:?}")),
    }
}

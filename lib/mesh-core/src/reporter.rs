//! Error side channel between a translator and the approval engine
//!
//! A translator reports policy/target combinations it cannot express (for
//! example two traffic shifts that contradict each other). The approval
//! engine treats the absence of a report as acceptance.

use mesh_api::ClusterObjectRef;
use std::collections::BTreeMap;
use tracing::debug;

/// Capability handed to a translator for the duration of one pass.
/// Reports only ever add errors.
pub trait Reporter {
    /// Report that a TrafficPolicy cannot be applied to a destination
    fn report_traffic_policy(
        &mut self,
        destination: &ClusterObjectRef,
        policy: &ClusterObjectRef,
        err: anyhow::Error,
    );

    /// Report that an AccessPolicy cannot be applied to a destination
    fn report_access_policy(
        &mut self,
        destination: &ClusterObjectRef,
        policy: &ClusterObjectRef,
        err: anyhow::Error,
    );

    /// Report that a FailoverService cannot be applied to a mesh, or to any
    /// mesh when `mesh` is `None`
    fn report_failover_service(
        &mut self,
        mesh: Option<&ClusterObjectRef>,
        failover_service: &ClusterObjectRef,
        err: anyhow::Error,
    );

    /// Report that a VirtualMesh cannot be applied to a mesh
    fn report_virtual_mesh(
        &mut self,
        mesh: &ClusterObjectRef,
        virtual_mesh: &ClusterObjectRef,
        err: anyhow::Error,
    );
}

// (target key, policy key) -> error messages
type ErrorIndex = BTreeMap<(String, String), Vec<String>>;

/// Reporter that records every report for lookup after the translator returns.
/// Constructed fresh for every approval pass.
#[derive(Debug, Default)]
pub struct ApprovalReporter {
    traffic_policies: ErrorIndex,
    access_policies: ErrorIndex,
    virtual_meshes: ErrorIndex,
    failover_services: ErrorIndex,
    // failover service key -> errors that apply to every mesh
    unscoped_failover_services: BTreeMap<String, Vec<String>>,
}

impl ApprovalReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traffic_policy_errors(
        &self,
        destination: &ClusterObjectRef,
        policy: &ClusterObjectRef,
    ) -> &[String] {
        lookup(&self.traffic_policies, destination, policy)
    }

    pub fn access_policy_errors(
        &self,
        destination: &ClusterObjectRef,
        policy: &ClusterObjectRef,
    ) -> &[String] {
        lookup(&self.access_policies, destination, policy)
    }

    pub fn virtual_mesh_errors(
        &self,
        mesh: &ClusterObjectRef,
        virtual_mesh: &ClusterObjectRef,
    ) -> &[String] {
        lookup(&self.virtual_meshes, mesh, virtual_mesh)
    }

    /// Errors for a FailoverService on a mesh, including mesh-independent ones
    pub fn failover_service_errors(
        &self,
        mesh: &ClusterObjectRef,
        failover_service: &ClusterObjectRef,
    ) -> Vec<String> {
        let mut errors = self.unscoped_failover_service_errors(failover_service).to_vec();
        errors.extend_from_slice(lookup(&self.failover_services, mesh, failover_service));
        errors
    }

    /// Mesh-independent errors for a FailoverService
    pub fn unscoped_failover_service_errors(&self, failover_service: &ClusterObjectRef) -> &[String] {
        self.unscoped_failover_services
            .get(&failover_service.key())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of reports received
    pub fn report_count(&self) -> usize {
        [
            &self.traffic_policies,
            &self.access_policies,
            &self.virtual_meshes,
            &self.failover_services,
        ]
        .iter()
        .flat_map(|index| index.values())
        .chain(self.unscoped_failover_services.values())
        .map(Vec::len)
        .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.report_count() == 0
    }
}

impl Reporter for ApprovalReporter {
    fn report_traffic_policy(
        &mut self,
        destination: &ClusterObjectRef,
        policy: &ClusterObjectRef,
        err: anyhow::Error,
    ) {
        debug!(destination = %destination, policy = %policy, "TrafficPolicy reported: {:#}", err);
        record(&mut self.traffic_policies, destination, policy, err);
    }

    fn report_access_policy(
        &mut self,
        destination: &ClusterObjectRef,
        policy: &ClusterObjectRef,
        err: anyhow::Error,
    ) {
        debug!(destination = %destination, policy = %policy, "AccessPolicy reported: {:#}", err);
        record(&mut self.access_policies, destination, policy, err);
    }

    fn report_failover_service(
        &mut self,
        mesh: Option<&ClusterObjectRef>,
        failover_service: &ClusterObjectRef,
        err: anyhow::Error,
    ) {
        debug!(failover_service = %failover_service, "FailoverService reported: {:#}", err);
        match mesh {
            Some(mesh) => record(&mut self.failover_services, mesh, failover_service, err),
            None => self
                .unscoped_failover_services
                .entry(failover_service.key())
                .or_default()
                .push(format!("{:#}", err)),
        }
    }

    fn report_virtual_mesh(
        &mut self,
        mesh: &ClusterObjectRef,
        virtual_mesh: &ClusterObjectRef,
        err: anyhow::Error,
    ) {
        debug!(mesh = %mesh, virtual_mesh = %virtual_mesh, "VirtualMesh reported: {:#}", err);
        record(&mut self.virtual_meshes, mesh, virtual_mesh, err);
    }
}

fn record(
    index: &mut ErrorIndex,
    target: &ClusterObjectRef,
    policy: &ClusterObjectRef,
    err: anyhow::Error,
) {
    index
        .entry((target.key(), policy.key()))
        .or_default()
        .push(format!("{:#}", err));
}

fn lookup<'a>(
    index: &'a ErrorIndex,
    target: &ClusterObjectRef,
    policy: &ClusterObjectRef,
) -> &'a [String] {
    index
        .get(&(target.key(), policy.key()))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

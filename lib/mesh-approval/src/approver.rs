//! Approval pass over one snapshot
//!
//! The pass computes the applied lists every destination and mesh would get,
//! lets the translator dry-run against them, then keeps every candidate the
//! translator did not report. Only status fields are modified.

use crate::failover::validate_failover_service;
use crate::ordering::{sort_by_acceptance, ApprovablePolicy};
use crate::references::{validate_references, ReferenceErrors};
use crate::virtual_mesh::{resolve_mesh_claims, MeshClaims};
use crate::ValidationError;
use mesh_api::{
    AppliedPolicy, ApprovalState, ApprovalStatus, ClusterObjectRef, PolicyStatus,
};
use mesh_core::{selector, ApprovalReporter, ResourceSet, Snapshot, Translator};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

type ErrorsByKey = BTreeMap<String, Vec<ValidationError>>;

/// Candidates for one destination, most established first
#[derive(Debug)]
struct DestinationPlan {
    destination: ClusterObjectRef,
    traffic_policies: Vec<ClusterObjectRef>,
    access_policies: Vec<ClusterObjectRef>,
}

/// Candidates for one mesh, most established first
#[derive(Debug)]
struct MeshPlan {
    mesh: ClusterObjectRef,
    virtual_mesh: Option<ClusterObjectRef>,
    failover_services: Vec<ClusterObjectRef>,
}

/// Decides which policies apply where and records the outcome on status
pub struct Approver<T> {
    translator: T,
}

impl<T: Translator> Approver<T> {
    pub fn new(translator: T) -> Self {
        Self { translator }
    }

    /// Run one approval pass. Never fails: problems are recorded on the
    /// status of the object they concern, internal inconsistencies are logged.
    pub fn approve(&self, snapshot: &mut Snapshot) {
        let reference_errors = validate_references(snapshot);
        let claims = resolve_mesh_claims(snapshot.virtual_meshes.iter().filter(|virtual_mesh| {
            !reference_errors
                .virtual_meshes
                .contains_key(&key_of(*virtual_mesh))
        }));

        // Pending state the translator is dry-run against
        let destination_plans = plan_destinations(snapshot, &reference_errors);
        for plan in &destination_plans {
            write_destination(snapshot, plan, &plan.traffic_policies, &plan.access_policies);
        }

        let mut mesh_plans = plan_meshes(snapshot, &claims);
        for plan in &mesh_plans {
            write_virtual_mesh(snapshot, &plan.mesh, plan.virtual_mesh.as_ref());
        }
        plan_failover_services(snapshot, &reference_errors, &mut mesh_plans);
        for plan in &mesh_plans {
            write_failover_services(snapshot, &plan.mesh, &plan.failover_services);
        }

        let mut reporter = ApprovalReporter::new();
        if let Err(err) = self.translator.translate(snapshot, &mut reporter) {
            error!("internal error: translator dry run failed: {:#}", err);
        }

        reset_statuses(&mut snapshot.traffic_policies, &[&reference_errors.traffic_policies]);
        reset_statuses(&mut snapshot.access_policies, &[&reference_errors.access_policies]);
        reset_statuses(
            &mut snapshot.virtual_meshes,
            &[&reference_errors.virtual_meshes, claims.conflicts()],
        );
        reset_statuses(
            &mut snapshot.failover_services,
            &[&reference_errors.failover_services],
        );

        for plan in &destination_plans {
            let target_key = plan.destination.key();
            let traffic_policies = finalize_target(
                &mut snapshot.traffic_policies,
                &target_key,
                &plan.traffic_policies,
                |policy| reporter.traffic_policy_errors(&plan.destination, policy).to_vec(),
            );
            let access_policies = finalize_target(
                &mut snapshot.access_policies,
                &target_key,
                &plan.access_policies,
                |policy| reporter.access_policy_errors(&plan.destination, policy).to_vec(),
            );
            write_destination(snapshot, plan, &traffic_policies, &access_policies);
        }

        for plan in &mesh_plans {
            let candidates: Vec<ClusterObjectRef> = plan.virtual_mesh.iter().cloned().collect();
            let accepted = finalize_target(
                &mut snapshot.virtual_meshes,
                &plan.mesh.key(),
                &candidates,
                |virtual_mesh| reporter.virtual_mesh_errors(&plan.mesh, virtual_mesh).to_vec(),
            );
            write_virtual_mesh(snapshot, &plan.mesh, accepted.first());
        }

        // FailoverServices depend on the settled traffic policies and virtual meshes
        let failover_errors = revalidate_failover_services(snapshot, &reference_errors);
        for plan in &mesh_plans {
            let candidates: Vec<ClusterObjectRef> = plan
                .failover_services
                .iter()
                .filter(|failover| !failover_errors.contains_key(&failover.key()))
                .cloned()
                .collect();
            let accepted = finalize_target(
                &mut snapshot.failover_services,
                &plan.mesh.key(),
                &candidates,
                |failover| reporter.failover_service_errors(&plan.mesh, failover),
            );
            write_failover_services(snapshot, &plan.mesh, &accepted);
        }

        info!(
            destinations = destination_plans.len(),
            meshes = mesh_plans.len(),
            invalid_references = reference_errors.len(),
            virtual_mesh_conflicts = claims.conflicts().len(),
            translator_reports = reporter.report_count(),
            "Approval pass complete"
        );
    }
}

fn key_of<K: kube::Resource>(object: &K) -> String {
    ClusterObjectRef::from_resource(object).key()
}

/// Reference-valid policies selected by `selects`, in acceptance order
fn candidates<P, F>(
    set: &ResourceSet<P>,
    invalid: &ErrorsByKey,
    target_key: &str,
    selects: F,
) -> Vec<ClusterObjectRef>
where
    P: ApprovablePolicy,
    F: Fn(&P) -> bool,
{
    let mut matched: Vec<&P> = set
        .iter()
        .filter(|policy| !invalid.contains_key(&key_of(*policy)) && selects(*policy))
        .collect();
    sort_by_acceptance(&mut matched, target_key);
    matched
        .into_iter()
        .map(|policy| ClusterObjectRef::from_resource(policy))
        .collect()
}

fn plan_destinations(snapshot: &Snapshot, reference_errors: &ReferenceErrors) -> Vec<DestinationPlan> {
    snapshot
        .destinations
        .iter()
        .map(|destination| {
            let target = ClusterObjectRef::from_resource(destination);
            let target_key = target.key();
            let traffic_policies = candidates(
                &snapshot.traffic_policies,
                &reference_errors.traffic_policies,
                &target_key,
                |policy| selector::matches_destination(&policy.spec.destination_selector, destination),
            );
            let access_policies = candidates(
                &snapshot.access_policies,
                &reference_errors.access_policies,
                &target_key,
                |policy| selector::matches_destination(&policy.spec.destination_selector, destination),
            );
            debug!(
                destination = %target,
                traffic_policies = traffic_policies.len(),
                access_policies = access_policies.len(),
                "Pending policies computed"
            );
            DestinationPlan {
                destination: target,
                traffic_policies,
                access_policies,
            }
        })
        .collect()
}

fn plan_meshes(snapshot: &Snapshot, claims: &MeshClaims) -> Vec<MeshPlan> {
    snapshot
        .meshes
        .iter()
        .map(|mesh| {
            let mesh = ClusterObjectRef::from_resource(mesh);
            let virtual_mesh = claims.claimant(&mesh).cloned();
            MeshPlan {
                mesh,
                virtual_mesh,
                failover_services: Vec::new(),
            }
        })
        .collect()
}

/// Fill in the FailoverServices that are valid against the pending state
fn plan_failover_services(
    snapshot: &Snapshot,
    reference_errors: &ReferenceErrors,
    plans: &mut [MeshPlan],
) {
    let mut invalid = reference_errors.failover_services.clone();
    for failover in snapshot.failover_services.iter() {
        let key = key_of(failover);
        if invalid.contains_key(&key) {
            continue;
        }
        let errors = validate_failover_service(&failover.spec, snapshot);
        if !errors.is_empty() {
            debug!(failover_service = %key, "FailoverService not valid against pending state");
            invalid.insert(key, errors);
        }
    }

    for plan in plans.iter_mut() {
        let mesh = &plan.mesh;
        plan.failover_services = candidates(
            &snapshot.failover_services,
            &invalid,
            &mesh.key(),
            |failover| failover.spec.meshes.contains(mesh),
        );
    }
}

/// Validate FailoverServices against the final state and invalidate failures
fn revalidate_failover_services(snapshot: &mut Snapshot, reference_errors: &ReferenceErrors) -> ErrorsByKey {
    let settled: &Snapshot = snapshot;
    let failover_errors: ErrorsByKey = settled
        .failover_services
        .iter()
        .filter_map(|failover| {
            let key = key_of(failover);
            if reference_errors.failover_services.contains_key(&key) {
                return None;
            }
            let errors = validate_failover_service(&failover.spec, settled);
            (!errors.is_empty()).then_some((key, errors))
        })
        .collect();

    for failover in snapshot.failover_services.iter_mut() {
        let Some(errors) = failover_errors.get(&key_of(&*failover)) else {
            continue;
        };
        debug!(failover_service = %key_of(&*failover), "FailoverService rejected: {} errors", errors.len());
        let generation = failover.generation();
        failover
            .status
            .get_or_insert_with(|| PolicyStatus::accepted(generation))
            .invalidate(errors.iter().map(ToString::to_string));
    }
    failover_errors
}

/// Optimistically accept every policy, then apply the known errors
fn reset_statuses<P: ApprovablePolicy>(set: &mut ResourceSet<P>, invalid: &[&ErrorsByKey]) {
    for policy in set.iter_mut() {
        let key = key_of(&*policy);
        let mut status = PolicyStatus::accepted(policy.generation());
        for errors in invalid {
            if let Some(errors) = errors.get(&key) {
                status.invalidate(errors.iter().map(ToString::to_string));
            }
        }
        if status.state == ApprovalState::Invalid {
            debug!(policy = %key, kind = %P::kind(&()), "Policy invalid: {}", status.errors.join("; "));
        }
        *policy.status_mut() = Some(status);
    }
}

/// Walk the candidates of one target in order. Candidates without reported
/// errors are accepted with the next acceptance order; the rest are rejected
/// for the target and globally.
fn finalize_target<P, F>(
    set: &mut ResourceSet<P>,
    target_key: &str,
    candidates: &[ClusterObjectRef],
    errors_for: F,
) -> Vec<ClusterObjectRef>
where
    P: ApprovablePolicy,
    F: Fn(&ClusterObjectRef) -> Vec<String>,
{
    let mut accepted = Vec::new();
    let mut next_order: u32 = 0;

    for reference in candidates {
        let errors = errors_for(reference);
        let policy = match set.find_mut(reference) {
            Ok(policy) => policy,
            Err(err) => {
                error!("internal error: {}", err);
                continue;
            }
        };
        let generation = policy.generation();
        let status = policy
            .status_mut()
            .get_or_insert_with(|| PolicyStatus::accepted(generation));

        if errors.is_empty() {
            debug!(policy = %reference, target = target_key, order = next_order, "Policy accepted");
            status.approvals.insert(
                target_key.to_string(),
                ApprovalStatus {
                    acceptance_order: next_order,
                    state: ApprovalState::Accepted,
                    errors: Vec::new(),
                },
            );
            next_order += 1;
            accepted.push(reference.clone());
        } else {
            debug!(policy = %reference, target = target_key, "Policy rejected: {}", errors.join("; "));
            status.state = ApprovalState::Invalid;
            for message in &errors {
                if !status.errors.contains(message) {
                    status.errors.push(message.clone());
                }
            }
            status.approvals.insert(
                target_key.to_string(),
                ApprovalStatus {
                    acceptance_order: 0,
                    state: ApprovalState::Invalid,
                    errors,
                },
            );
        }
    }
    accepted
}

fn applied_list<P: ApprovablePolicy>(
    set: &ResourceSet<P>,
    references: &[ClusterObjectRef],
) -> Vec<AppliedPolicy<P::Spec>> {
    references
        .iter()
        .filter_map(|reference| match set.find(reference) {
            Ok(policy) => Some(AppliedPolicy {
                reference: reference.clone(),
                spec: policy.spec().clone(),
                observed_generation: policy.generation(),
            }),
            Err(err) => {
                error!("internal error: {}", err);
                None
            }
        })
        .collect()
}

fn write_destination(
    snapshot: &mut Snapshot,
    plan: &DestinationPlan,
    traffic_policies: &[ClusterObjectRef],
    access_policies: &[ClusterObjectRef],
) {
    let applied_traffic_policies = applied_list(&snapshot.traffic_policies, traffic_policies);
    let applied_access_policies = applied_list(&snapshot.access_policies, access_policies);

    match snapshot.destinations.find_mut(&plan.destination) {
        Ok(destination) => {
            let generation = destination.metadata.generation.unwrap_or(0);
            let status = destination.status.get_or_insert_with(Default::default);
            status.observed_generation = generation;
            status.applied_traffic_policies = applied_traffic_policies;
            status.applied_access_policies = applied_access_policies;
        }
        Err(err) => error!("internal error: {}", err),
    }
}

fn write_virtual_mesh(
    snapshot: &mut Snapshot,
    mesh: &ClusterObjectRef,
    virtual_mesh: Option<&ClusterObjectRef>,
) {
    let applied = virtual_mesh.and_then(|virtual_mesh| {
        applied_list(&snapshot.virtual_meshes, std::slice::from_ref(virtual_mesh)).pop()
    });

    match snapshot.meshes.find_mut(mesh) {
        Ok(mesh) => {
            let generation = mesh.metadata.generation.unwrap_or(0);
            let status = mesh.status.get_or_insert_with(Default::default);
            status.observed_generation = generation;
            status.applied_virtual_mesh = applied;
        }
        Err(err) => error!("internal error: {}", err),
    }
}

fn write_failover_services(
    snapshot: &mut Snapshot,
    mesh: &ClusterObjectRef,
    failover_services: &[ClusterObjectRef],
) {
    let applied = applied_list(&snapshot.failover_services, failover_services);

    match snapshot.meshes.find_mut(mesh) {
        Ok(mesh) => {
            let generation = mesh.metadata.generation.unwrap_or(0);
            let status = mesh.status.get_or_insert_with(Default::default);
            status.observed_generation = generation;
            status.applied_failover_services = applied;
        }
        Err(err) => error!("internal error: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use mesh_api::networking::{AccessPolicySpec, TrafficPolicySpec};
    use mesh_api::selectors::{KubeServiceRefs, ServiceSelector};
    use mesh_core::NoopTranslator;

    fn status<P: ApprovablePolicy>(set: &ResourceSet<P>, name: &str) -> PolicyStatus {
        set.find(&object_ref(name))
            .expect("policy in snapshot")
            .status()
            .cloned()
            .expect("status written")
    }

    fn approval(status: &PolicyStatus, target: &str) -> ApprovalStatus {
        status
            .approval_for(&object_ref(target).key())
            .cloned()
            .expect("approval for target")
    }

    fn applied_traffic_policies(snapshot: &Snapshot, destination: &str) -> Vec<String> {
        snapshot
            .destinations
            .find(&object_ref(destination))
            .unwrap()
            .applied_traffic_policies()
            .iter()
            .map(|applied| applied.reference.name.clone())
            .collect()
    }

    fn applied_virtual_mesh(snapshot: &Snapshot, mesh: &str) -> Option<String> {
        snapshot
            .meshes
            .find(&object_ref(mesh))
            .unwrap()
            .status
            .as_ref()
            .and_then(|status| status.applied_virtual_mesh.as_ref())
            .map(|applied| applied.reference.name.clone())
    }

    fn applied_failover_services(snapshot: &Snapshot, mesh: &str) -> Vec<String> {
        snapshot
            .meshes
            .find(&object_ref(mesh))
            .unwrap()
            .status
            .as_ref()
            .map(|status| {
                status
                    .applied_failover_services
                    .iter()
                    .map(|applied| applied.reference.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn single_destination_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.meshes.insert(mesh("istio-east", "east"));
        snapshot.clusters.insert(cluster("east"));
        snapshot
            .destinations
            .insert(destination("ms1", service_ref("reviews", "east"), "istio-east"));
        snapshot
    }

    /// Every status the approver writes, serialized
    fn statuses(snapshot: &Snapshot) -> serde_json::Value {
        serde_json::json!({
            "trafficPolicies": snapshot.traffic_policies.iter().map(|p| &p.status).collect::<Vec<_>>(),
            "accessPolicies": snapshot.access_policies.iter().map(|p| &p.status).collect::<Vec<_>>(),
            "virtualMeshes": snapshot.virtual_meshes.iter().map(|p| &p.status).collect::<Vec<_>>(),
            "failoverServices": snapshot.failover_services.iter().map(|p| &p.status).collect::<Vec<_>>(),
            "destinations": snapshot.destinations.iter().map(|d| &d.status).collect::<Vec<_>>(),
            "meshes": snapshot.meshes.iter().map(|m| &m.status).collect::<Vec<_>>(),
        })
    }

    /// Two federated meshes, outlier detection on both reviews services and a
    /// FailoverService across them
    fn failover_snapshot() -> Snapshot {
        let mut snapshot = two_cluster_snapshot();
        snapshot
            .virtual_meshes
            .insert(virtual_mesh("vm1", &["istio-east", "istio-west"]));
        snapshot.traffic_policies.insert(outlier_policy(
            "outliers",
            vec![service_ref("reviews", "east"), service_ref("reviews", "west")],
        ));
        snapshot.failover_services.insert(failover_service(
            "reviews-failover",
            &["istio-east", "istio-west"],
            vec![service_ref("reviews", "east"), service_ref("reviews", "west")],
        ));
        snapshot
    }

    #[test]
    fn test_matching_policies_accepted_in_key_order() {
        let mut snapshot = single_destination_snapshot();
        snapshot.traffic_policies.insert(match_all_traffic_policy("tp2"));
        snapshot.traffic_policies.insert(match_all_traffic_policy("tp1"));

        Approver::new(NoopTranslator).approve(&mut snapshot);

        let tp1 = status(&snapshot.traffic_policies, "tp1");
        let tp2 = status(&snapshot.traffic_policies, "tp2");
        assert_eq!(tp1.state, ApprovalState::Accepted);
        assert_eq!(tp2.state, ApprovalState::Accepted);
        assert_eq!(approval(&tp1, "ms1").acceptance_order, 0);
        assert_eq!(approval(&tp2, "ms1").acceptance_order, 1);
        assert_eq!(applied_traffic_policies(&snapshot, "ms1"), vec!["tp1", "tp2"]);
    }

    #[test]
    fn test_reported_policy_is_dropped() {
        let mut snapshot = single_destination_snapshot();
        snapshot.traffic_policies.insert(match_all_traffic_policy("tp1"));
        snapshot.traffic_policies.insert(match_all_traffic_policy("tp2"));
        let translator =
            FlaggingTranslator::default().traffic_policy("ms1", "tp1", "conflicting retry policy");

        Approver::new(translator).approve(&mut snapshot);

        let tp1 = status(&snapshot.traffic_policies, "tp1");
        assert_eq!(tp1.state, ApprovalState::Invalid);
        assert_eq!(tp1.errors, vec!["conflicting retry policy"]);
        let tp1_ms1 = approval(&tp1, "ms1");
        assert_eq!(tp1_ms1.state, ApprovalState::Invalid);
        assert_eq!(tp1_ms1.errors, vec!["conflicting retry policy"]);

        let tp2 = status(&snapshot.traffic_policies, "tp2");
        assert_eq!(tp2.state, ApprovalState::Accepted);
        assert_eq!(approval(&tp2, "ms1").acceptance_order, 0);
        assert_eq!(applied_traffic_policies(&snapshot, "ms1"), vec!["tp2"]);
    }

    #[test]
    fn test_report_only_affects_its_target() {
        let mut snapshot = two_cluster_snapshot();
        snapshot.traffic_policies.insert(match_all_traffic_policy("tp1"));
        let translator =
            FlaggingTranslator::default().traffic_policy("reviews-east", "tp1", "unsupported");

        Approver::new(translator).approve(&mut snapshot);

        let tp1 = status(&snapshot.traffic_policies, "tp1");
        assert_eq!(tp1.state, ApprovalState::Invalid);
        assert_eq!(approval(&tp1, "reviews-east").state, ApprovalState::Invalid);
        assert_eq!(approval(&tp1, "reviews-west").state, ApprovalState::Accepted);
        assert!(applied_traffic_policies(&snapshot, "reviews-east").is_empty());
        assert_eq!(applied_traffic_policies(&snapshot, "reviews-west"), vec!["tp1"]);
    }

    #[test]
    fn test_reported_access_policy_is_dropped_for_its_destination() {
        let mut snapshot = two_cluster_snapshot();
        snapshot
            .access_policies
            .insert(access_policy("ap0", AccessPolicySpec::default()));
        snapshot
            .access_policies
            .insert(access_policy("ap1", AccessPolicySpec::default()));
        let translator =
            FlaggingTranslator::default().access_policy("reviews-east", "ap0", "identity not routable");

        Approver::new(translator).approve(&mut snapshot);

        let ap0 = status(&snapshot.access_policies, "ap0");
        assert_eq!(ap0.state, ApprovalState::Invalid);
        assert_eq!(ap0.errors, vec!["identity not routable"]);
        let ap0_east = approval(&ap0, "reviews-east");
        assert_eq!(ap0_east.state, ApprovalState::Invalid);
        assert_eq!(ap0_east.errors, vec!["identity not routable"]);
        assert_eq!(approval(&ap0, "reviews-west").state, ApprovalState::Accepted);

        let ap1 = status(&snapshot.access_policies, "ap1");
        assert_eq!(ap1.state, ApprovalState::Accepted);
        let ap1_east = approval(&ap1, "reviews-east");
        assert_eq!(ap1_east.state, ApprovalState::Accepted);
        assert_eq!(ap1_east.acceptance_order, 0);

        let applied = |name: &str| -> Vec<String> {
            snapshot
                .destinations
                .find(&object_ref(name))
                .unwrap()
                .status
                .as_ref()
                .unwrap()
                .applied_access_policies
                .iter()
                .map(|applied| applied.reference.name.clone())
                .collect()
        };
        assert_eq!(applied("reviews-east"), vec!["ap1"]);
        assert_eq!(applied("reviews-west"), vec!["ap0", "ap1"]);

        // Translator reports must not leak into traffic policies
        assert!(applied_traffic_policies(&snapshot, "reviews-east").is_empty());
    }

    #[test]
    fn test_virtual_mesh_conflict_cites_winner() {
        let mut snapshot = Snapshot::default();
        snapshot.meshes.insert(mesh("a", "east"));
        snapshot.meshes.insert(mesh("b", "west"));
        snapshot.virtual_meshes.insert(virtual_mesh("vm1", &["a"]));
        snapshot.virtual_meshes.insert(virtual_mesh("vm2", &["a", "b"]));

        Approver::new(NoopTranslator).approve(&mut snapshot);

        let vm1 = status(&snapshot.virtual_meshes, "vm1");
        assert_eq!(vm1.state, ApprovalState::Accepted);
        assert_eq!(approval(&vm1, "a").state, ApprovalState::Accepted);

        let vm2 = status(&snapshot.virtual_meshes, "vm2");
        assert_eq!(vm2.state, ApprovalState::Invalid);
        assert_eq!(
            vm2.errors,
            vec!["mesh a.mesh-system is already claimed by VirtualMesh vm1.mesh-system"]
        );
        assert!(vm2.approvals.is_empty());

        assert_eq!(applied_virtual_mesh(&snapshot, "a").as_deref(), Some("vm1"));
        assert_eq!(applied_virtual_mesh(&snapshot, "b"), None);
    }

    #[test]
    fn test_accepted_virtual_mesh_is_not_displaced() {
        let mut snapshot = Snapshot::default();
        snapshot.meshes.insert(mesh("a", "east"));
        snapshot.virtual_meshes.insert(virtual_mesh("vm1", &["a"]));

        let approver = Approver::new(NoopTranslator);
        approver.approve(&mut snapshot);

        snapshot.virtual_meshes.insert(virtual_mesh("vm0", &["a"]));
        approver.approve(&mut snapshot);

        assert_eq!(status(&snapshot.virtual_meshes, "vm1").state, ApprovalState::Accepted);
        assert_eq!(status(&snapshot.virtual_meshes, "vm0").state, ApprovalState::Invalid);
        assert_eq!(applied_virtual_mesh(&snapshot, "a").as_deref(), Some("vm1"));
    }

    #[test]
    fn test_accepted_policy_keeps_its_order() {
        let mut snapshot = single_destination_snapshot();
        snapshot.traffic_policies.insert(match_all_traffic_policy("tp-b"));

        let approver = Approver::new(NoopTranslator);
        approver.approve(&mut snapshot);

        snapshot.traffic_policies.insert(match_all_traffic_policy("tp-a"));
        approver.approve(&mut snapshot);

        let first = status(&snapshot.traffic_policies, "tp-b");
        let second = status(&snapshot.traffic_policies, "tp-a");
        assert_eq!(approval(&first, "ms1").acceptance_order, 0);
        assert_eq!(approval(&second, "ms1").acceptance_order, 1);
        assert_eq!(applied_traffic_policies(&snapshot, "ms1"), vec!["tp-b", "tp-a"]);
    }

    #[test]
    fn test_approve_is_idempotent() {
        let mut snapshot = failover_snapshot();
        snapshot.traffic_policies.insert(match_all_traffic_policy("tp1"));
        snapshot.traffic_policies.insert(match_all_traffic_policy("tp2"));
        snapshot
            .access_policies
            .insert(access_policy("ap1", AccessPolicySpec::default()));
        snapshot.virtual_meshes.insert(virtual_mesh("vm2", &["istio-west"]));
        let translator = FlaggingTranslator::default()
            .traffic_policy("reviews-west", "tp1", "conflicting retry policy");
        let approver = Approver::new(translator);

        approver.approve(&mut snapshot);
        let first = statuses(&snapshot);
        approver.approve(&mut snapshot);
        let second = statuses(&snapshot);

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_dangling_reference_invalidates_policy() {
        let mut snapshot = single_destination_snapshot();
        snapshot.traffic_policies.insert(traffic_policy(
            "tp-ghost",
            TrafficPolicySpec {
                destination_selector: vec![ServiceSelector::KubeServiceRefs(KubeServiceRefs {
                    services: vec![service_ref("reviews", "east"), service_ref("ghost", "east")],
                })],
                ..Default::default()
            },
        ));

        Approver::new(NoopTranslator).approve(&mut snapshot);

        let ghost = status(&snapshot.traffic_policies, "tp-ghost");
        assert_eq!(ghost.state, ApprovalState::Invalid);
        assert_eq!(ghost.errors, vec!["Destination ghost.bookinfo.east not found"]);
        assert!(ghost.approvals.is_empty());
        assert!(applied_traffic_policies(&snapshot, "ms1").is_empty());
    }

    #[test]
    fn test_access_policies_applied_per_destination() {
        let mut snapshot = two_cluster_snapshot();
        snapshot.access_policies.insert(access_policy(
            "allow-east",
            AccessPolicySpec {
                destination_selector: vec![ServiceSelector::KubeServiceRefs(KubeServiceRefs {
                    services: vec![service_ref("reviews", "east")],
                })],
                ..Default::default()
            },
        ));

        Approver::new(NoopTranslator).approve(&mut snapshot);

        let allow = status(&snapshot.access_policies, "allow-east");
        assert_eq!(allow.state, ApprovalState::Accepted);
        assert_eq!(allow.approvals.len(), 1);
        let east = snapshot.destinations.find(&object_ref("reviews-east")).unwrap();
        let west = snapshot.destinations.find(&object_ref("reviews-west")).unwrap();
        assert_eq!(east.status.as_ref().unwrap().applied_access_policies.len(), 1);
        assert!(west.status.as_ref().unwrap().applied_access_policies.is_empty());
    }

    #[test]
    fn test_failover_service_accepted_on_each_mesh() {
        let mut snapshot = failover_snapshot();

        Approver::new(NoopTranslator).approve(&mut snapshot);

        let failover = status(&snapshot.failover_services, "reviews-failover");
        assert_eq!(failover.state, ApprovalState::Accepted, "{:?}", failover.errors);
        assert_eq!(approval(&failover, "istio-east").state, ApprovalState::Accepted);
        assert_eq!(approval(&failover, "istio-west").state, ApprovalState::Accepted);
        assert_eq!(applied_failover_services(&snapshot, "istio-east"), vec!["reviews-failover"]);
        assert_eq!(applied_failover_services(&snapshot, "istio-west"), vec!["reviews-failover"]);
    }

    #[test]
    fn test_failover_service_requires_outlier_detection() {
        let mut snapshot = failover_snapshot();
        snapshot.traffic_policies = Default::default();

        Approver::new(NoopTranslator).approve(&mut snapshot);

        let failover = status(&snapshot.failover_services, "reviews-failover");
        assert_eq!(failover.state, ApprovalState::Invalid);
        assert!(failover.errors.contains(
            &"backing service reviews.bookinfo.east has no applied TrafficPolicy with outlier detection"
                .to_string()
        ));
        assert!(applied_failover_services(&snapshot, "istio-east").is_empty());
    }

    #[test]
    fn test_failover_service_needs_settled_virtual_mesh() {
        let mut snapshot = failover_snapshot();
        let translator =
            FlaggingTranslator::default().virtual_mesh("istio-east", "vm1", "no shared root");

        Approver::new(translator).approve(&mut snapshot);

        assert_eq!(applied_virtual_mesh(&snapshot, "istio-east"), None);
        let failover = status(&snapshot.failover_services, "reviews-failover");
        assert_eq!(failover.state, ApprovalState::Invalid);
        assert!(failover
            .errors
            .contains(&"mesh istio-east.mesh-system is not grouped into a VirtualMesh".to_string()));
    }

    #[test]
    fn test_meshless_failover_report_rejects_every_mesh() {
        let mut snapshot = failover_snapshot();
        let translator = FlaggingTranslator::default().failover_service(
            None,
            "reviews-failover",
            "no east-west gateway",
        );

        Approver::new(translator).approve(&mut snapshot);

        let failover = status(&snapshot.failover_services, "reviews-failover");
        assert_eq!(failover.state, ApprovalState::Invalid);
        assert_eq!(failover.errors, vec!["no east-west gateway"]);
        assert_eq!(approval(&failover, "istio-east").state, ApprovalState::Invalid);
        assert_eq!(approval(&failover, "istio-west").state, ApprovalState::Invalid);
        assert!(applied_failover_services(&snapshot, "istio-west").is_empty());
    }

    #[test]
    fn test_translator_failure_does_not_reject() {
        let mut snapshot = single_destination_snapshot();
        snapshot.traffic_policies.insert(match_all_traffic_policy("tp1"));
        let translator = FlaggingTranslator {
            fail: true,
            ..Default::default()
        };

        Approver::new(translator).approve(&mut snapshot);

        let tp1 = status(&snapshot.traffic_policies, "tp1");
        assert_eq!(tp1.state, ApprovalState::Accepted);
        assert!(tp1.errors.is_empty());
    }

    #[test]
    fn test_observed_generation_follows_spec() {
        let mut snapshot = single_destination_snapshot();
        let mut policy = match_all_traffic_policy("tp1");
        policy.metadata.generation = Some(4);
        snapshot.traffic_policies.insert(policy);

        Approver::new(NoopTranslator).approve(&mut snapshot);

        assert_eq!(status(&snapshot.traffic_policies, "tp1").observed_generation, 4);
        let ms1 = snapshot.destinations.find(&object_ref("ms1")).unwrap();
        let ms1_status = ms1.status.as_ref().unwrap();
        assert_eq!(ms1_status.observed_generation, 1);
        assert_eq!(ms1_status.applied_traffic_policies[0].observed_generation, 4);
    }
}

// src/resolver/engine.rs

//! Dependency resolver implementation
//!
//! Resolution runs in two phases. Traversal walks the requirement queue
//! breadth-first, asking the repository for candidates and growing the
//! diagnostic graph over every alternative it finds. Selection then
//! searches those alternatives for one version per name that satisfies
//! every requirement of the chosen packages, backtracking to the next
//! alternative when a choice leads to a conflict.
//!
//! Each `name:version` pair has its dependencies expanded at most once,
//! which bounds traversal on circular dependency chains.

use crate::error::{Error, Result};
use crate::metadata::Candidate;
use crate::observer::{BagEvent, Observer};
use crate::repository::PackageRepository;
use crate::requirement::Requirement;
use crate::version::VersionConstraint;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

use super::conflict::{Conflict, ROOT_REQUIRER};
use super::graph::{NodeId, ResolutionGraph};
use super::plan::ResolutionPlan;
use super::selection::SelectionPolicy;

/// Distinct candidate versions of one name with their graph nodes
type Alternatives = Vec<(NodeId, Candidate)>;

/// A constraint together with the node that declared it (`None` for roots)
type Imposed = (Option<NodeId>, VersionConstraint);

/// Why a branch of the selection search was abandoned
enum DeadEnd {
    /// No version of `name` satisfies every constraint imposed on it
    Conflict { name: String, constraints: Vec<Imposed> },
    /// A chosen package requires a name the repository does not know
    Unreachable(Requirement),
}

/// One branch of the selection search
#[derive(Clone, Default)]
struct Branch<'s> {
    queue: VecDeque<Requirement>,
    chosen: HashMap<&'s str, (NodeId, &'s Candidate)>,
    imposed: HashMap<&'s str, Vec<Imposed>>,
}

/// Resolver discovering the transitive closure of requirements
pub struct Resolver<'r, R: PackageRepository + ?Sized> {
    repo: &'r R,
    policy: SelectionPolicy,
}

impl<'r, R: PackageRepository + ?Sized> Resolver<'r, R> {
    /// Create a resolver over `repo` using the default selection policy
    pub fn new(repo: &'r R) -> Self {
        Self {
            repo,
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Resolve `seeds` and everything they transitively depend on
    ///
    /// Returns one candidate per name the chosen packages need, roots
    /// first, together with the diagnostic graph. Whether resolution
    /// succeeds does not depend on the order of `seeds`. On failure the
    /// error carries the graph with no node marked selected.
    pub fn discover(&self, seeds: &[Requirement], observer: &dyn Observer) -> Result<ResolutionPlan> {
        let mut graph = ResolutionGraph::new();
        let mut order: Vec<String> = Vec::new();
        let mut alternatives: HashMap<String, Alternatives> = HashMap::new();
        let mut expanded: HashSet<String> = HashSet::new();

        let mut roots = VecDeque::new();
        for seed in seeds {
            seed.validate()?;
            // Roots never carry a parent, whatever the caller passed in
            roots.push_back(Requirement::new(seed.name.clone(), seed.constraint.clone()));
        }

        let mut queue = roots.clone();
        while let Some(req) = queue.pop_front() {
            observer.notify(&BagEvent::Requested {
                requirement: req.to_string(),
            });

            let found = self.repo.find_candidates(&req.name, &req.constraint)?;
            if found.is_empty() && !self.repo.name_exists(&req.name)? {
                if req.is_root() {
                    return Err(unreachable(&req, graph));
                }
                // Only fatal if a chosen package ends up needing it
                debug!("{} is not in the bag", req);
                continue;
            }

            observer.notify(&BagEvent::CandidatesFound {
                name: req.name.clone(),
                versions: found.iter().map(|c| c.version().to_string()).collect(),
            });

            let known = alternatives.entry(req.name.clone()).or_insert_with(|| {
                order.push(req.name.clone());
                Vec::new()
            });

            for candidate in found {
                let node = graph.ensure_node(candidate.name(), candidate.version());
                if let Some(parent) = req.parent {
                    graph.add_edge(parent, node);
                }

                if expanded.insert(candidate.key()) {
                    for dep in candidate.dependencies() {
                        queue.push_back(dep.clone().with_parent(node));
                    }
                }

                if !known.iter().any(|(id, _)| *id == node) {
                    known.push((node, candidate));
                }
            }
        }

        // Different requirements may list the same versions in different
        // orders; charge order is the one the selection policy sees
        for known in alternatives.values_mut() {
            known.sort_by_key(|(_, candidate)| candidate.id);
        }

        debug!(
            "Traversal visited {} name(s), {} node(s), {} edge(s)",
            order.len(),
            graph.node_count(),
            graph.edge_count()
        );

        let branch = Branch {
            queue: roots,
            ..Branch::default()
        };
        let chosen = match self.search(branch, &alternatives) {
            Ok(done) => done.chosen,
            Err(DeadEnd::Unreachable(req)) => return Err(unreachable(&req, graph)),
            Err(DeadEnd::Conflict { name, constraints }) => {
                let conflict = self.conflict_for(&name, &constraints, &graph)?;
                observer.notify(&BagEvent::Conflict {
                    package: conflict.package().to_string(),
                    detail: conflict.to_string(),
                });
                return Err(Error::ImpossibleConfiguration {
                    conflicts: vec![conflict],
                    graph: Box::new(graph),
                });
            }
        };

        let mut resolved = Vec::with_capacity(chosen.len());
        for name in &order {
            let Some(&(node, candidate)) = chosen.get(name.as_str()) else {
                debug!("{} is only required by rejected alternatives", name);
                continue;
            };
            graph.mark_selected(node);
            observer.notify(&BagEvent::Selected {
                name: candidate.name().to_string(),
                version: candidate.version().to_string(),
            });
            resolved.push(candidate.clone());
        }

        observer.notify(&BagEvent::Finished {
            operation: "discover",
            count: resolved.len(),
        });

        Ok(ResolutionPlan { resolved, graph })
    }

    /// Drain the branch queue, choosing a version for every name it meets
    ///
    /// Each choice tries the alternatives in policy order and returns the
    /// first branch that completes. When all of them fail, the failure of
    /// the most preferred one is reported.
    fn search<'s>(
        &self,
        mut branch: Branch<'s>,
        alternatives: &'s HashMap<String, Alternatives>,
    ) -> std::result::Result<Branch<'s>, DeadEnd> {
        while let Some(req) = branch.queue.pop_front() {
            let Some((name, known)) = alternatives.get_key_value(&req.name) else {
                return Err(DeadEnd::Unreachable(req));
            };
            let name = name.as_str();

            let imposed = branch.imposed.entry(name).or_default();
            imposed.push((req.parent, req.constraint.clone()));

            if let Some((_, current)) = branch.chosen.get(name) {
                if req.constraint.matches(current.version()) {
                    continue;
                }
                return Err(DeadEnd::Conflict {
                    name: name.to_string(),
                    constraints: imposed.clone(),
                });
            }

            let viable: Vec<&Candidate> = known
                .iter()
                .map(|(_, candidate)| candidate)
                .filter(|candidate| req.constraint.matches(candidate.version()))
                .collect();

            let mut first_failure = None;
            for pick in self.policy.rank(&viable) {
                let Some(&(node, _)) = known.iter().find(|(_, c)| c.version() == pick.version()) else {
                    continue;
                };

                let mut next = branch.clone();
                next.chosen.insert(name, (node, pick));
                next.queue
                    .extend(pick.dependencies().iter().map(|dep| dep.clone().with_parent(node)));

                match self.search(next, alternatives) {
                    Ok(done) => return Ok(done),
                    Err(dead) => {
                        debug!("Backtracking from {}", pick.key());
                        first_failure.get_or_insert(dead);
                    }
                }
            }

            return Err(first_failure.unwrap_or(DeadEnd::Conflict {
                name: name.to_string(),
                constraints: vec![(req.parent, req.constraint)],
            }));
        }

        Ok(branch)
    }

    fn conflict_for(&self, name: &str, constraints: &[Imposed], graph: &ResolutionGraph) -> Result<Conflict> {
        let requirer_label = |requirer: &Option<NodeId>| {
            requirer
                .and_then(|node| graph.node_by_id(node))
                .map(|n| n.key())
                .unwrap_or_else(|| ROOT_REQUIRER.to_string())
        };

        if let [(requirer, constraint)] = constraints {
            let available = self
                .repo
                .find_candidates(name, &VersionConstraint::Any)?
                .iter()
                .map(|c| c.version().to_string())
                .collect();
            return Ok(Conflict::UnsatisfiableConstraint {
                package: name.to_string(),
                available,
                required_constraint: constraint.to_string(),
                required_by: requirer_label(requirer),
            });
        }

        Ok(Conflict::ConflictingConstraints {
            package: name.to_string(),
            constraints: constraints
                .iter()
                .map(|(requirer, constraint)| (requirer_label(requirer), constraint.to_string()))
                .collect(),
        })
    }

    /// Direct dependencies of the candidate `requirement` selects
    ///
    /// Shallow lookup: no graph is built, so the returned requirements carry
    /// no parent.
    pub fn requirements_for(&self, requirement: &Requirement) -> Result<Vec<Requirement>> {
        requirement.validate()?;
        let found = self
            .repo
            .find_candidates(&requirement.name, &requirement.constraint)?;
        let refs: Vec<&Candidate> = found.iter().collect();

        match self.policy.select_alternative(&refs) {
            Some(candidate) => Ok(candidate.dependencies().to_vec()),
            None if !self.repo.name_exists(&requirement.name)? => Err(Error::NotInBag {
                name: requirement.name.clone(),
                graph: Box::default(),
            }),
            None => {
                let root = [(None, requirement.constraint.clone())];
                let conflict = self.conflict_for(&requirement.name, &root, &ResolutionGraph::new())?;
                Err(Error::ImpossibleConfiguration {
                    conflicts: vec![conflict],
                    graph: Box::default(),
                })
            }
        }
    }
}

/// Failure for a requirement whose name is unknown to the repository
fn unreachable(req: &Requirement, graph: ResolutionGraph) -> Error {
    match req.parent.and_then(|parent| graph.node_by_id(parent)).map(|n| n.key()) {
        Some(required_by) => Error::TransitiveDependencyUnreachable {
            name: req.name.clone(),
            required_by,
            graph: Box::new(graph),
        },
        None => Error::NotInBag {
            name: req.name.clone(),
            graph: Box::new(graph),
        },
    }
}

/// Resolve `seeds` against `repo` with the default selection policy
pub fn discover<R: PackageRepository + ?Sized>(
    repo: &R,
    seeds: &[Requirement],
    observer: &dyn Observer,
) -> Result<ResolutionPlan> {
    Resolver::new(repo).discover(seeds, observer)
}

//! Dependency ordering and cycle detection for link edges.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use super::{BuildUnit, ComposeError, LinkEdge};

/// Tracks the visitation state of a unit during the walk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Order units so each dependency precedes its consumers.
///
/// Units are walked in registration order and dependencies in declaration
/// order, so the result is deterministic.
pub(crate) fn link_order<'a, 'l>(
    units: &'a IndexMap<String, BuildUnit>,
    links: &'l IndexSet<LinkEdge>,
) -> Result<Vec<&'a BuildUnit>, ComposeError> {
    let mut deps: HashMap<&'l str, Vec<&'l str>> = HashMap::new();
    for edge in links {
        deps.entry(edge.consumer())
            .or_default()
            .push(edge.dependency());
    }

    let mut walker = OrderWalker::new(&deps);
    for name in units.keys() {
        if let Some(cycle) = walker.visit(name.as_str()) {
            return Err(ComposeError::CircularLink { cycle });
        }
    }
    Ok(walker
        .order
        .into_iter()
        .filter_map(|name| units.get(name.as_str()))
        .collect())
}

/// Depth-first walk state, keyed by owned unit name.
struct OrderWalker<'d, 'l> {
    deps: &'d HashMap<&'l str, Vec<&'l str>>,
    stack: Vec<String>,
    states: HashMap<String, VisitState>,
    order: Vec<String>,
}

impl<'d, 'l> OrderWalker<'d, 'l> {
    fn new(deps: &'d HashMap<&'l str, Vec<&'l str>>) -> Self {
        Self {
            deps,
            stack: Vec::new(),
            states: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn visit(&mut self, node: &str) -> Option<Vec<String>> {
        match self.states.get(node) {
            Some(VisitState::Visited) => return None,
            Some(VisitState::Visiting) => {
                let idx = self
                    .stack
                    .iter()
                    .position(|n| n == node)
                    .unwrap_or_else(|| {
                        debug_assert!(false, "visiting node must be on the stack");
                        0
                    });
                let mut cycle: Vec<String> = self.stack.iter().skip(idx).cloned().collect();
                cycle.push(node.to_owned());
                return Some(canonicalize_cycle(cycle));
            }
            None => {
                self.states.insert(node.to_owned(), VisitState::Visiting);
            }
        }

        self.stack.push(node.to_owned());
        let deps = self.deps;
        for &dep in deps.get(node).into_iter().flatten() {
            if let Some(cycle) = self.visit(dep) {
                return Some(cycle);
            }
        }
        self.stack.pop();
        self.states.insert(node.to_owned(), VisitState::Visited);
        self.order.push(node.to_owned());
        None
    }
}

/// Rotate a closed cycle so it starts at its smallest name.
fn canonicalize_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        *slot = first;
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn units(names: &[&str]) -> IndexMap<String, BuildUnit> {
        names
            .iter()
            .map(|name| {
                let unit = BuildUnit::new(
                    (*name).to_owned(),
                    vec![Utf8PathBuf::from(format!("{name}.c"))],
                    Vec::new(),
                );
                ((*name).to_owned(), unit)
            })
            .collect()
    }

    fn links(pairs: &[(&str, &str)]) -> IndexSet<LinkEdge> {
        pairs
            .iter()
            .map(|(c, d)| LinkEdge::new((*c).to_owned(), (*d).to_owned()))
            .collect()
    }

    fn names<'a>(order: &[&'a BuildUnit]) -> Vec<&'a str> {
        order.iter().map(|u| u.name()).collect()
    }

    #[rstest]
    fn dependencies_precede_consumers() {
        let units = units(&["firmware", "crypto", "hal"]);
        let links = links(&[("firmware", "crypto"), ("crypto", "hal")]);
        let order = link_order(&units, &links).expect("order");
        assert_eq!(names(&order), ["hal", "crypto", "firmware"]);
    }

    #[rstest]
    fn unlinked_units_keep_registration_order() {
        let units = units(&["b", "a", "c"]);
        let order = link_order(&units, &IndexSet::new()).expect("order");
        assert_eq!(names(&order), ["b", "a", "c"]);
    }

    #[rstest]
    fn order_outlives_the_link_set() {
        let units = units(&["app", "lib"]);
        let order = {
            let links = links(&[("app", "lib")]);
            link_order(&units, &links).expect("order")
        };
        assert_eq!(names(&order), ["lib", "app"]);
    }

    #[rstest]
    fn shared_dependency_appears_once() {
        let units = units(&["app", "net", "crypto"]);
        let links = links(&[("app", "crypto"), ("app", "net"), ("net", "crypto")]);
        let order = link_order(&units, &links).expect("order");
        assert_eq!(names(&order), ["crypto", "net", "app"]);
    }

    #[rstest]
    fn cycle_is_reported_from_smallest_name() {
        let units = units(&["c", "a", "b"]);
        let links = links(&[("c", "a"), ("a", "b"), ("b", "c")]);
        let err = link_order(&units, &links).expect_err("cycle");
        match err {
            ComposeError::CircularLink { cycle } => {
                assert_eq!(cycle, ["a", "b", "c", "a"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    fn canonicalize_cycle_rotates_smallest_node() {
        let cycle = vec!["c".to_owned(), "a".to_owned(), "b".to_owned(), "c".to_owned()];
        assert_eq!(canonicalize_cycle(cycle), ["a", "b", "c", "a"]);
    }
}

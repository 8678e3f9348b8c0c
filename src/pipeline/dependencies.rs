use super::Step;
use std::collections::{HashMap, HashSet, VecDeque};

/// Resolves step dependencies for filtering
pub struct DependencyResolver {
    /// Map of step -> steps it depends on
    deps: HashMap<Step, &'static [Step]>,
    /// Map of step -> steps that depend on it
    reverse_deps: HashMap<Step, HashSet<Step>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let mut deps = HashMap::new();
        let mut reverse_deps: HashMap<Step, HashSet<Step>> = HashMap::new();

        for step in Step::ALL {
            deps.insert(step, step.dependencies());
            for dep in step.dependencies() {
                reverse_deps.entry(*dep).or_default().insert(step);
            }
        }

        Self { deps, reverse_deps }
    }

    /// Given a set of requested steps, add everything they depend on.
    /// Returns steps in execution order (parents before children)
    pub fn resolve_includes(&self, requested: &[Step]) -> Vec<Step> {
        let mut included: HashSet<Step> = HashSet::new();
        let mut queue: VecDeque<Step> = requested.iter().copied().collect();

        while let Some(step) = queue.pop_front() {
            if !included.insert(step) {
                continue;
            }
            if let Some(step_deps) = self.deps.get(&step) {
                queue.extend(step_deps.iter().copied());
            }
        }

        Self::ordered(&included)
    }

    /// Given a set of steps to exclude, drop them and everything that
    /// depends on them, directly or not
    pub fn resolve_excludes(&self, excluded: &[Step]) -> Vec<Step> {
        let mut dropped: HashSet<Step> = HashSet::new();
        let mut queue: VecDeque<Step> = excluded.iter().copied().collect();

        while let Some(step) = queue.pop_front() {
            if !dropped.insert(step) {
                continue;
            }
            if let Some(children) = self.reverse_deps.get(&step) {
                queue.extend(children.iter().copied());
            }
        }

        let remaining: HashSet<Step> = Step::ALL
            .iter()
            .copied()
            .filter(|s| !dropped.contains(s))
            .collect();
        Self::ordered(&remaining)
    }

    /// All steps in execution order
    pub fn all_steps_ordered(&self) -> Vec<Step> {
        Step::ALL.to_vec()
    }

    /// `Step::ALL` is already topologically sorted; keep its order
    fn ordered(set: &HashSet<Step>) -> Vec<Step> {
        Step::ALL.iter().copied().filter(|s| set.contains(s)).collect()
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_accidents_includes_parents() {
        let resolver = DependencyResolver::new();
        let steps = resolver.resolve_includes(&[Step::Accidents]);

        assert_eq!(steps, Step::ALL.to_vec());
    }

    #[test]
    fn test_resolve_locations() {
        let resolver = DependencyResolver::new();
        let steps = resolver.resolve_includes(&[Step::Locations]);
        assert_eq!(steps, vec![Step::Preprocess, Step::Airports, Step::Locations]);
    }

    #[test]
    fn test_exclude_drops_dependants() {
        let resolver = DependencyResolver::new();
        let steps = resolver.resolve_excludes(&[Step::DayPeriods]);

        assert!(!steps.contains(&Step::DayPeriods));
        assert!(!steps.contains(&Step::Weather));
        assert!(!steps.contains(&Step::Accidents));
        assert!(steps.contains(&Step::Locations));
        assert!(steps.contains(&Step::WeatherConditions));
    }
}

use crate::pipeline::{DependencyResolver, Step};
use anyhow::{bail, Result};
use tracing::info;

fn parse_steps(names: &[String]) -> Result<Vec<Step>> {
    names.iter().map(|name| name.parse::<Step>()).collect()
}

fn names(steps: &[Step]) -> Vec<&'static str> {
    steps.iter().map(Step::name).collect()
}

/// Resolves which steps to run based on include/exclude filters
pub fn resolve_steps(include: Option<Vec<String>>, exclude: Option<Vec<String>>) -> Result<Vec<Step>> {
    let resolver = DependencyResolver::new();

    match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            let requested = parse_steps(&include_list)?;
            let steps = resolver.resolve_includes(&requested);
            info!(
                "including {} steps (with dependencies): {:?}",
                steps.len(),
                names(&steps)
            );
            Ok(steps)
        }
        (None, Some(exclude_list)) => {
            let excluded = parse_steps(&exclude_list)?;
            let steps = resolver.resolve_excludes(&excluded);
            info!(
                "{} steps left after excluding {:?}: {:?}",
                steps.len(),
                exclude_list,
                names(&steps)
            );
            Ok(steps)
        }
        (None, None) => Ok(resolver.all_steps_ordered()),
    }
}

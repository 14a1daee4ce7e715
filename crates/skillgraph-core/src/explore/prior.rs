//! Heuristic priors for newly expanded search nodes

use crate::graph::{Node, NodeAttrs};

const PROJECT_BASE_PRIOR: f64 = 2.0;
const PREFERRED_LANGUAGE_BONUS: f64 = 2.0;
const CHANGE_SET_PRIOR: f64 = 0.5;
const DEFAULT_PRIOR: f64 = 1.0;

/// Prior for the graph node behind a new child
///
/// Popular projects and projects written in a preferred language are
/// explored first. Individual change-sets start below the default.
pub fn heuristic_prior(node: &Node, preferred_languages: &[String]) -> f64 {
    match &node.attrs {
        NodeAttrs::Project(project) => {
            let mut prior = PROJECT_BASE_PRIOR + (project.stars as f64).ln_1p();
            if preferred_languages
                .iter()
                .any(|lang| project.languages.contains_key(lang))
            {
                prior += PREFERRED_LANGUAGE_BONUS;
            }
            prior
        }
        NodeAttrs::ChangeSet(_) => CHANGE_SET_PRIOR,
        _ => DEFAULT_PRIOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ChangeSetAttrs, PersonAttrs, ProjectAttrs};

    fn preferred() -> Vec<String> {
        vec!["Python".to_string(), "Java".to_string()]
    }

    #[test]
    fn test_plain_project_prior_is_base() {
        let node = Node::project(ProjectAttrs {
            name: "bob/tool".into(),
            languages: [("Rust".to_string(), 100)].into_iter().collect(),
            ..Default::default()
        });
        assert_eq!(heuristic_prior(&node, &preferred()), 2.0);
    }

    #[test]
    fn test_popular_preferred_project() {
        let node = Node::project(ProjectAttrs {
            name: "bob/ml".into(),
            languages: [("Python".to_string(), 100)].into_iter().collect(),
            stars: 99,
            ..Default::default()
        });
        let expected = 2.0 + 100f64.ln() + 2.0;
        assert!((heuristic_prior(&node, &preferred()) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_other_kinds() {
        let cs = Node::change_set("abc", ChangeSetAttrs::default());
        assert_eq!(heuristic_prior(&cs, &preferred()), 0.5);

        let person = Node::person(PersonAttrs {
            login: "bob".into(),
            ..Default::default()
        });
        assert_eq!(heuristic_prior(&person, &preferred()), 1.0);
        assert_eq!(heuristic_prior(&Node::artifact("a.py"), &[]), 1.0);
    }
}

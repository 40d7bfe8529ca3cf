//! Goal prompt rendering.
//!
//! Goal texts are minijinja templates over the workspace: every binding is
//! exposed under its own name as its `str()` rendering, so `{{ __z }}` shows
//! the metavar an earlier goal published.

use anyhow::{Context, Result};
use minijinja::{Environment, UndefinedBehavior};
use tracing::warn;

use crate::core::workspace::Workspace;

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

/// Render `template` against the workspace.
///
/// A template that fails to render (for example, it names a metavar no goal
/// has published yet) is shown verbatim.
pub fn render_goal_text(template: &str, workspace: &Workspace) -> String {
    match environment().render_str(template, workspace.template_context()) {
        Ok(rendered) => rendered,
        Err(err) => {
            warn!(error = %err, "goal text failed to render; showing it verbatim");
            template.to_string()
        }
    }
}

/// Check that `template` parses.
pub fn validate_template(template: &str) -> Result<()> {
    environment()
        .template_from_str(template)
        .map(|_| ())
        .with_context(|| format!("invalid goal text template {template:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Value;

    #[test]
    fn published_metavars_are_interpolated() {
        let mut ws = Workspace::new();
        ws.publish("z", Value::str("q"));
        assert_eq!(
            render_goal_text("Double the value of variable '{{ __z }}'.", &ws),
            "Double the value of variable 'q'."
        );
    }

    #[test]
    fn values_render_with_str() {
        let mut ws = Workspace::new();
        ws.define("xs", Value::list(vec![Value::str("a")]));
        assert_eq!(render_goal_text("{{ xs }}", &ws), "['a']");
    }

    #[test]
    fn missing_metavar_falls_back_to_raw_text() {
        let ws = Workspace::new();
        let template = "Update '{{ __dic }}'.";
        assert_eq!(render_goal_text(template, &ws), template);
    }

    #[test]
    fn plain_text_is_untouched() {
        let ws = Workspace::new();
        let text = "Output |* * *| without the bars.";
        assert_eq!(render_goal_text(text, &ws), text);
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(validate_template("{{ __z }}").is_ok());
        assert!(validate_template("{{ __z ").is_err());
    }
}

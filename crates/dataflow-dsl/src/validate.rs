//! Semantic checks on composed task definitions.
//!
//! The parser only enforces the grammar. [`validate_task`] walks the parsed
//! tree and reports what the grammar cannot express: labels and app names
//! must identify one element each, transitions must target a defined label,
//! and every sequence after the first must be labeled to be reachable.
//!
//! Problems are collected rather than raised so a definition can be fixed
//! in one pass.

use indexmap::IndexMap;

use crate::{
    ast::{FlowNode, SplitNode, TaskAppNode, TaskNode, TransitionNode},
    error::{Diagnostic, ErrorCode},
    span::{Span, Spanned},
    visitor::TaskVisitor,
};

/// Check a parsed task, returning every problem found.
///
/// Errors come first in the order they are found, followed by warnings.
/// Splits of a single flow are reported as warnings.
pub fn validate_task(task: &TaskNode) -> Vec<Diagnostic> {
    let mut validator = TaskValidator::default();
    task.accept(&mut validator);
    log::trace!(problems = validator.problems.len(); "Validated task definition");

    let (mut problems, warnings): (Vec<_>, Vec<_>) = validator
        .problems
        .into_iter()
        .partition(|diag| diag.severity().is_error());
    problems.extend(warnings);
    problems
}

#[derive(Debug, Default)]
struct TaskValidator {
    /// Labels defined so far and where.
    labels: IndexMap<String, Span>,
    /// Names of unlabeled apps and where they first appear.
    app_names: IndexMap<String, Span>,
    /// Label transitions, resolved once the whole tree was seen.
    label_transitions: Vec<(Spanned<String>, Span)>,
    problems: Vec<Diagnostic>,
}

impl TaskValidator {
    fn check_label(&mut self, label: &Spanned<String>) {
        let name = label.as_str();
        if let Some(first) = self.labels.get(name) {
            self.problems.push(
                ErrorCode::E159
                    .diagnostic(label.span(), &[])
                    .with_secondary_label(*first, "first defined here"),
            );
            return;
        }
        if let Some(app) = self.app_names.get(name) {
            self.problems.push(
                ErrorCode::E164
                    .diagnostic(label.span(), &[])
                    .with_secondary_label(*app, "app without a label"),
            );
        }
        self.labels.insert(name.to_string(), label.span());
    }

    fn check_app(&mut self, app: &TaskAppNode) {
        if let Some(label) = &app.label {
            self.check_label(label);
            return;
        }
        let name = app.name();
        if let Some(label) = self.labels.get(name) {
            self.problems.push(
                ErrorCode::E165
                    .diagnostic(app.name.span(), &[])
                    .with_secondary_label(*label, "label defined here"),
            );
        } else if let Some(first) = self.app_names.get(name) {
            self.problems.push(
                ErrorCode::E166
                    .diagnostic(app.name.span(), &[])
                    .with_secondary_label(*first, "first used here"),
            );
        } else {
            self.app_names.insert(name.to_string(), app.name.span());
        }
    }
}

impl TaskVisitor for TaskValidator {
    fn pre_visit_sequence(&mut self, first: &FlowNode, sequence_number: usize) -> bool {
        if sequence_number > 0 && first.label().is_none() {
            let start = first.span.start();
            self.problems
                .push(ErrorCode::E158.diagnostic(Span::new(start..start), &[]));
        }
        true
    }

    fn visit_split(&mut self, split: &SplitNode) {
        if let Some(label) = &split.label {
            self.check_label(label);
        }
        if split.flows.len() == 1 {
            self.problems.push(
                Diagnostic::warning(ErrorCode::E167.format(&[]))
                    .with_code(ErrorCode::E167)
                    .with_label(split.span, ErrorCode::E167.description())
                    .with_help("run the flow without the surrounding '<' and '>'"),
            );
        }
    }

    fn visit_task_app(&mut self, task_app: &TaskAppNode) {
        self.check_app(task_app);
    }

    fn visit_transition(&mut self, transition: &TransitionNode) {
        if let Some(label) = transition.target_label() {
            self.label_transitions
                .push((label.clone(), transition.span));
        } else if let Some(app) = transition.target_app()
            && !transition.is_special_transition()
        {
            self.check_app(app);
        }
    }

    fn end_visit(&mut self) {
        for (label, transition) in std::mem::take(&mut self.label_transitions) {
            if !self.labels.contains_key(label.as_str()) {
                let start = transition.start();
                self.problems.push(
                    ErrorCode::E160
                        .diagnostic(Span::new(start..start), &[])
                        .with_secondary_label(label.span(), "no element has this label"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Severity, parse_task};

    fn problems(dsl: &str) -> Vec<(ErrorCode, usize)> {
        let task = parse_task(None, dsl, true, false).unwrap();
        validate_task(&task)
            .iter()
            .filter(|diag| diag.severity().is_error())
            .map(|diag| (diag.code().unwrap(), diag.position().unwrap()))
            .collect()
    }

    #[test]
    fn test_valid_definitions() {
        for dsl in [
            "appA",
            "appA;foo: appB",
            "appA 0->:label1 && appB\nlabel1: appC",
            "appC && goo: appC",
            "<<appA || x: appA> || appB>",
            "t1: timestamp 'FAILED'->t2: timestamp && t3: timestamp",
            "appA 'x'->$END 'y'->$END 'z'->$FAIL",
        ] {
            assert!(problems(dsl).is_empty(), "for {dsl}");
        }
    }

    #[test]
    fn test_secondary_sequences_need_labels() {
        assert_eq!(problems("appA;appB"), vec![(ErrorCode::E158, 5)]);
        assert_eq!(problems("appA;foo: appB\nappC"), vec![(ErrorCode::E158, 15)]);
    }

    #[test]
    fn test_annotated_problem() {
        let err = parse_task(None, "appA;appB", false, true).unwrap_err();
        assert_eq!(
            err.annotated(),
            "158E:(pos 5): secondary sequences must have labels or are unreachable\nappA;appB\n     ^"
        );

        let err = parse_task(None, "appA;foo: appB\nappC", false, true).unwrap_err();
        assert_eq!(
            err.annotated(),
            "158E:(pos 15): secondary sequences must have labels or are unreachable\nappC\n^"
        );
    }

    #[test]
    fn test_duplicate_names() {
        assert_eq!(problems("appA && appA"), vec![(ErrorCode::E166, 8)]);
        assert_eq!(problems("appA 'foo' -> appA"), vec![(ErrorCode::E166, 14)]);
        assert_eq!(
            problems(
                "<<jdbchdfs-local && spark-client || spark-cluster && spark-cluster> \
                 && timestamp || spark-yarn>"
            ),
            vec![(ErrorCode::E166, 53)]
        );
    }

    #[test]
    fn test_label_clashes() {
        assert_eq!(problems("appA 'foo' -> appA: appB"), vec![(ErrorCode::E164, 14)]);
        assert_eq!(
            problems("label1: appA 'foo' -> label1: appB"),
            vec![(ErrorCode::E159, 22)]
        );
        assert_eq!(problems("label1: appA 'foo' -> label1"), vec![(ErrorCode::E165, 22)]);
        assert_eq!(problems("foo: <a || b> && foo: c"), vec![(ErrorCode::E159, 17)]);
    }

    #[test]
    fn test_duplicate_label_cites_both_positions() {
        let task = parse_task(None, "label1: appA 'foo' -> label1: appB", true, false).unwrap();
        let diags = validate_task(&task);
        let spans: Vec<_> = diags[0].labels().iter().map(|l| l.span().start()).collect();
        assert_eq!(spans, vec![22, 0]);
    }

    #[test]
    fn test_undefined_labels() {
        assert_eq!(problems("aa 'foo'->:split && bb && cc"), vec![(ErrorCode::E160, 3)]);
        assert_eq!(
            problems("<aa 'foo'->:split && bb && cc || dd>"),
            vec![(ErrorCode::E160, 4)]
        );
        assert_eq!(
            problems("aa 1->:x 2->:y && bb"),
            vec![(ErrorCode::E160, 3), (ErrorCode::E160, 9)]
        );
    }

    #[test]
    fn test_single_flow_split_is_a_warning() {
        let task = parse_task(None, "<AppA> && AppB", true, false).unwrap();
        let diags = validate_task(&task);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity(), Severity::Warning);
        assert_eq!(diags[0].code(), Some(ErrorCode::E167));

        assert!(parse_task(None, "<AppA> && AppB", true, true).is_ok());
    }

    #[test]
    fn test_warnings_follow_errors() {
        let task = parse_task(None, "<AppA> && AppB && AppB", true, false).unwrap();
        let codes: Vec<_> = validate_task(&task)
            .iter()
            .map(|diag| diag.code())
            .collect();
        assert_eq!(codes, vec![Some(ErrorCode::E166), Some(ErrorCode::E167)]);
    }
}

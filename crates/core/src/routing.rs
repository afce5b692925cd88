//! Branch-aware next-step resolution.
//!
//! Templates encode branching as data: a multiple-choice question may carry a
//! sparse table mapping chosen option ids to target question ids. This module
//! is the only place that table is consulted, so the session state machine
//! stays branch-agnostic.

use crate::model::{AnswerValue, Question, QuestionId, QuestionType, Template};

/// How the next step was resolved for a question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStepResolution {
    /// No branch applies; follow the template's array order.
    Default,
    /// A branch override points at this question.
    BranchTo(QuestionId),
}

/// Resolves a branch override for the given question and recorded answer.
///
/// Returns `BranchTo` only when every link in the chain holds: the question
/// is multiple-choice with a branch table, the answer resolves to a known
/// option id, that option id appears in the table, and the target question
/// exists in the template. Every miss degrades to `Default` — an authoring
/// mistake must not strand a session mid-way.
#[must_use]
pub fn resolve_next_step(
    template: &Template,
    question: &Question,
    answer: Option<&AnswerValue>,
) -> NextStepResolution {
    if question.kind() != QuestionType::MultipleChoice || question.branches().is_empty() {
        return NextStepResolution::Default;
    }
    let Some(answer) = answer else {
        return NextStepResolution::Default;
    };
    let Some(option_id) = question.resolve_option(answer) else {
        return NextStepResolution::Default;
    };
    let Some(branch) = question
        .branches()
        .iter()
        .find(|branch| branch.option_id() == option_id)
    else {
        return NextStepResolution::Default;
    };
    if template.contains(branch.target()) {
        NextStepResolution::BranchTo(branch.target().clone())
    } else {
        NextStepResolution::Default
    }
}

/// The id of the question that follows `question`, honoring branch overrides,
/// or `None` at the end of the path.
#[must_use]
pub fn next_question_id(
    template: &Template,
    question: &Question,
    answer: Option<&AnswerValue>,
) -> Option<QuestionId> {
    match resolve_next_step(template, question, answer) {
        NextStepResolution::BranchTo(id) => Some(id),
        NextStepResolution::Default => template.default_next(question.id()).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Branch, OptionId, QuestionOption, TemplateId};
    use crate::time::fixed_now;

    fn branching_template() -> Template {
        let options = vec![
            QuestionOption::new(OptionId::new("opt-a"), "Option A", "A"),
            QuestionOption::new(OptionId::new("opt-b"), "Option B", "B"),
        ];
        let q1 = Question::multiple_choice(QuestionId::new("q1"), "Pick one", options)
            .unwrap()
            .with_branches(vec![Branch::new(
                OptionId::new("opt-a"),
                QuestionId::new("q3"),
            )])
            .unwrap();
        let q2 = Question::free_text(QuestionId::new("q2"), "Elaborate").unwrap();
        let q3 = Question::free_text(QuestionId::new("q3"), "Anything else?").unwrap();

        Template::new(
            TemplateId::new("t1"),
            "Branching",
            None,
            vec![q1, q2, q3],
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn branch_overrides_default_order() {
        let template = branching_template();
        let q1 = template.question(&QuestionId::new("q1")).unwrap();

        let resolved = resolve_next_step(&template, q1, Some(&AnswerValue::text("A")));
        assert_eq!(resolved, NextStepResolution::BranchTo(QuestionId::new("q3")));

        let next = next_question_id(&template, q1, Some(&AnswerValue::text("A")));
        assert_eq!(next, Some(QuestionId::new("q3")));
    }

    #[test]
    fn unmatched_option_falls_back_to_default() {
        let template = branching_template();
        let q1 = template.question(&QuestionId::new("q1")).unwrap();

        // "B" resolves to an option, but no branch keys on it.
        let next = next_question_id(&template, q1, Some(&AnswerValue::text("B")));
        assert_eq!(next, Some(QuestionId::new("q2")));
    }

    #[test]
    fn unresolvable_value_falls_back_to_default() {
        let template = branching_template();
        let q1 = template.question(&QuestionId::new("q1")).unwrap();

        let next = next_question_id(&template, q1, Some(&AnswerValue::text("stale")));
        assert_eq!(next, Some(QuestionId::new("q2")));

        let next = next_question_id(&template, q1, None);
        assert_eq!(next, Some(QuestionId::new("q2")));
    }

    #[test]
    fn dangling_branch_target_falls_back_to_default() {
        let options = vec![QuestionOption::new(OptionId::new("opt-a"), "A", "A")];
        let q1 = Question::multiple_choice(QuestionId::new("q1"), "Pick", options)
            .unwrap()
            .with_branches(vec![Branch::new(
                OptionId::new("opt-a"),
                QuestionId::new("deleted"),
            )])
            .unwrap();
        let q2 = Question::free_text(QuestionId::new("q2"), "Next").unwrap();
        let template = Template::new(
            TemplateId::new("t1"),
            "Dangling",
            None,
            vec![q1, q2],
            fixed_now(),
        )
        .unwrap();

        let q1 = template.question(&QuestionId::new("q1")).unwrap();
        let resolved = resolve_next_step(&template, q1, Some(&AnswerValue::text("A")));
        assert_eq!(resolved, NextStepResolution::Default);

        let next = next_question_id(&template, q1, Some(&AnswerValue::text("A")));
        assert_eq!(next, Some(QuestionId::new("q2")));
    }

    #[test]
    fn checkbox_answers_never_branch() {
        let options = vec![
            QuestionOption::new(OptionId::new("opt-a"), "A", "A"),
            QuestionOption::new(OptionId::new("opt-b"), "B", "B"),
        ];
        let q1 = Question::checkbox(QuestionId::new("q1"), "Pick some", options).unwrap();
        let q2 = Question::free_text(QuestionId::new("q2"), "Next").unwrap();
        let template = Template::new(
            TemplateId::new("t1"),
            "Checkbox",
            None,
            vec![q1, q2],
            fixed_now(),
        )
        .unwrap();

        let q1 = template.question(&QuestionId::new("q1")).unwrap();
        let answer = AnswerValue::selections(["A"]);
        assert_eq!(
            resolve_next_step(&template, q1, Some(&answer)),
            NextStepResolution::Default
        );
    }

    #[test]
    fn last_question_has_no_next() {
        let template = branching_template();
        let q3 = template.question(&QuestionId::new("q3")).unwrap();
        assert_eq!(
            next_question_id(&template, q3, Some(&AnswerValue::text("done"))),
            None
        );
    }
}

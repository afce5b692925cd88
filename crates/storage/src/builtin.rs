//! Stock assessment templates installed by the seed binary.
//!
//! These mirror the screens the platform ships with out of the box so a fresh
//! database has something to run before any authoring happens.

use chrono::{DateTime, Utc};

use wellness_core::Error;
use wellness_core::model::{
    Branch, OptionId, Question, QuestionId, QuestionOption, SliderScale, Template, TemplateId,
};

fn option(id: &str, label: &str) -> QuestionOption {
    QuestionOption::new(OptionId::new(id), label, id)
}

fn frequency_options() -> Vec<QuestionOption> {
    vec![
        option("not-at-all", "Not at all"),
        option("several-days", "Several days"),
        option("more-than-half", "More than half the days"),
        option("nearly-every-day", "Nearly every day"),
    ]
}

fn phq9(now: DateTime<Utc>) -> Result<Template, Error> {
    let questions = vec![
        Question::multiple_choice(
            QuestionId::new("phq_q1"),
            "Over the last 2 weeks, how often have you been bothered by having little \
             interest or pleasure in doing things?",
            frequency_options(),
        )?,
        Question::multiple_choice(
            QuestionId::new("phq_q2"),
            "Over the last 2 weeks, how often have you been bothered by feeling down, \
             depressed, or hopeless?",
            frequency_options(),
        )?,
        Question::slider(
            QuestionId::new("phq_q3"),
            "On a scale of 1-10, how difficult have these problems made it for you to do \
             your work, take care of things at home, or get along with other people?",
            SliderScale::new(1.0, 10.0, 1.0)?
                .with_labels("Not difficult at all", "Extremely difficult"),
        )?,
        Question::checkbox(
            QuestionId::new("phq_q4"),
            "Which of the following symptoms have you experienced recently? \
             (Select all that apply)",
            vec![
                option("sleep", "Trouble falling or staying asleep"),
                option("energy", "Feeling tired or having little energy"),
                option("appetite", "Poor appetite or overeating"),
                option("concentration", "Trouble concentrating"),
            ],
        )?,
        Question::free_text(
            QuestionId::new("phq_q5"),
            "Please describe any specific thoughts or situations that have been bothering \
             you recently.",
        )?,
    ];

    Ok(Template::new(
        TemplateId::new("phq-9-assessment"),
        "Depression Assessment (PHQ-9)",
        Some("A standard screening tool to assess severity of depressive symptoms.".into()),
        questions,
        now,
    )?)
}

fn gad7(now: DateTime<Utc>) -> Result<Template, Error> {
    let questions = vec![
        Question::multiple_choice(
            QuestionId::new("gad_q1"),
            "Over the last 2 weeks, how often have you been bothered by feeling nervous, \
             anxious, or on edge?",
            frequency_options(),
        )?,
        // Screening gate: patients who report no panic attack skip the
        // describe-it question.
        Question::multiple_choice(
            QuestionId::new("gad_q2"),
            "Have you experienced a sudden panic attack (intense fear/discomfort) in the \
             last week?",
            vec![option("yes", "Yes"), option("no", "No")],
        )?
        .with_required(true)?
        .with_branches(vec![Branch::new(
            OptionId::new("no"),
            QuestionId::new("gad_q4"),
        )])?,
        Question::free_text(
            QuestionId::new("gad_q3"),
            "Describe the situation where the panic attack occurred. What were you \
             thinking at that moment?",
        )?,
        Question::checkbox(
            QuestionId::new("gad_q4"),
            "Which of the following physical symptoms do you experience when anxious? \
             (Select all that apply)",
            vec![
                option("restlessness", "Restlessness"),
                option("fatigue", "Fatigue"),
                option("concentration", "Difficulty concentrating"),
                option("irritability", "Irritability"),
                option("tension", "Muscle tension"),
                option("sleep", "Sleep disturbance"),
            ],
        )?,
        Question::free_text(
            QuestionId::new("gad_q5"),
            "What strategies have you tried to manage your worry so far?",
        )?,
    ];

    Ok(Template::new(
        TemplateId::new("gad-7-assessment"),
        "Anxiety Screening (GAD-7)",
        Some("Screening for Generalized Anxiety Disorder and panic symptoms.".into()),
        questions,
        now,
    )?)
}

fn stress_coping(now: DateTime<Utc>) -> Result<Template, Error> {
    let questions = vec![
        Question::slider(
            QuestionId::new("stress_q1"),
            "Rate your overall stress level today.",
            SliderScale::new(1.0, 10.0, 1.0)?.with_labels("Relaxed", "Overwhelmed"),
        )?,
        Question::checkbox(
            QuestionId::new("stress_q2"),
            "Identify your primary sources of stress right now. (Select all that apply)",
            vec![
                option("work", "Work/Career"),
                option("finances", "Finances"),
                option("health", "Health"),
                option("relationships", "Relationships"),
                option("future", "Future Uncertainty"),
            ],
        )?,
        Question::multiple_choice(
            QuestionId::new("stress_q3"),
            "Do you feel you have adequate support to handle these stressors?",
            vec![
                option("strong", "Yes, I have a strong support system"),
                option("some", "I have some support but could use more"),
                option("none", "No, I feel I am handling this alone"),
            ],
        )?,
        Question::free_text(
            QuestionId::new("stress_q4"),
            "What is one small thing you can do today to reduce this stress?",
        )?,
    ];

    Ok(Template::new(
        TemplateId::new("stress-coping-assessment"),
        "Stress & Coping Assessment",
        Some("Evaluate your current stress levels and support system.".into()),
        questions,
        now,
    )?)
}

/// The stock templates, stamped with the given creation time.
///
/// # Errors
///
/// Returns `wellness_core::Error` if a template fails validation; the stock
/// data is known-good, so an error here means the domain rules changed
/// underneath it.
pub fn builtin_templates(now: DateTime<Utc>) -> Result<Vec<Template>, Error> {
    Ok(vec![phq9(now)?, gad7(now)?, stress_coping(now)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wellness_core::model::QuestionType;
    use wellness_core::time::fixed_now;

    #[test]
    fn builtins_validate() {
        let templates = builtin_templates(fixed_now()).unwrap();
        assert_eq!(templates.len(), 3);
        for template in &templates {
            assert!(!template.is_empty());
            assert_eq!(template.version(), 1);
        }
    }

    #[test]
    fn gad7_panic_gate_branches_past_description() {
        let templates = builtin_templates(fixed_now()).unwrap();
        let gad7 = templates
            .iter()
            .find(|t| t.id().as_str() == "gad-7-assessment")
            .unwrap();

        let gate = gad7.question(&QuestionId::new("gad_q2")).unwrap();
        assert_eq!(gate.kind(), QuestionType::MultipleChoice);
        assert!(gate.required());
        assert_eq!(gate.branches().len(), 1);
        assert!(gad7.contains(gate.branches()[0].target()));
    }
}

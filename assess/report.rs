//! Text rendering of an [`Assessment`] for the terminal.

use crate::advice::Advice;
use crate::model::Verdict;
use crate::pipeline::Assessment;
use crate::settings::ContactDetails;

pub const ELIGIBLE_HEADLINE: &str = "Congratulations! You are eligible for the Credit Scheme.";
pub const INELIGIBLE_HEADLINE: &str = "Sorry, you are not currently eligible for the credit scheme.";
pub const TIPS_HEADING: &str = "Tips to Improve Your Creditworthiness:";

/// The instruction shown to eligible applicants.
pub fn contact_instruction(contact: &ContactDetails) -> String {
    format!(
        "Please call {} or send \"Ready\" to {} to continue your application.",
        contact.phone, contact.email
    )
}

pub fn render_assessment(assessment: &Assessment, contact: &ContactDetails) -> String {
    match assessment.verdict {
        Verdict::Credible => format!(
            "{ELIGIBLE_HEADLINE}\n{}\n",
            contact_instruction(contact)
        ),
        Verdict::AtRisk => {
            let advice = assessment
                .advice
                .as_ref()
                .map(render_advice)
                .unwrap_or_default();
            format!("{INELIGIBLE_HEADLINE}\n{advice}")
        }
    }
}

pub fn render_advice(advice: &Advice) -> String {
    let lines: Vec<String> = match advice {
        Advice::Tips(tips) => std::iter::once(TIPS_HEADING.to_string())
            .chain(tips.iter().map(|tip| format!("  - {tip}")))
            .collect(),
        Advice::Encouragement {
            message,
            resource_title,
            resource_url,
        } => vec![
            message.to_string(),
            format!("{resource_title}: {resource_url}"),
        ],
    };
    lines.iter().map(|line| format!("{line}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::{ENCOURAGEMENT, RESOURCE_URL, Tip};
    use crate::applicant::{Applicant, EducationLevel, YesNo};
    use crate::features::build_features;
    use crate::rates::StateRates;

    fn assessment(verdict: Verdict, advice: Option<Advice>) -> Assessment {
        let applicant = Applicant {
            school_attended: YesNo::Yes,
            education_level: EducationLevel::Primary,
            training_attended: YesNo::Yes,
            vocational_training: YesNo::No,
            plot_count: 2,
            has_fishery: YesNo::Yes,
            crop_count: 3,
            state: "oyo".to_string(),
        };
        Assessment {
            verdict,
            rates: StateRates::DEFAULT,
            features: build_features(&applicant, &StateRates::DEFAULT).unwrap(),
            advice,
        }
    }

    #[test]
    fn credible_shows_contact_details() {
        let text = render_assessment(
            &assessment(Verdict::Credible, None),
            &ContactDetails::default(),
        );
        assert!(text.starts_with(ELIGIBLE_HEADLINE));
        assert!(text.contains("+234 905 460 9925"));
        assert!(text.contains("Creditforfarmers@gmail.com"));
    }

    #[test]
    fn at_risk_lists_tips_in_order() {
        let advice = Advice::Tips(vec![Tip::Literacy, Tip::SavingsGroup]);
        let text = render_assessment(
            &assessment(Verdict::AtRisk, Some(advice)),
            &ContactDetails::default(),
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], INELIGIBLE_HEADLINE);
        assert_eq!(lines[1], TIPS_HEADING);
        assert_eq!(lines[2], format!("  - {}", Tip::Literacy.message()));
        assert_eq!(lines[3], format!("  - {}", Tip::SavingsGroup.message()));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn encouragement_includes_resource_link() {
        let advice = Advice::Encouragement {
            message: ENCOURAGEMENT,
            resource_title: "Watch",
            resource_url: RESOURCE_URL,
        };
        let text = render_advice(&advice);
        assert!(text.contains(ENCOURAGEMENT));
        assert!(text.contains(RESOURCE_URL));
        assert!(!text.contains(TIPS_HEADING));
    }
}

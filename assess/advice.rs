//! # Advice Engine
//!
//! Rule-based improvement tips for applicants who were not found eligible.
//! Each rule is checked independently in a fixed order and contributes at most
//! one tip. When no rule fires, the applicant gets a generic encouragement and
//! a link to an external resource.

use crate::applicant::{Applicant, EducationLevel, YesNo};
use crate::rates::StateRates;
use std::fmt;

/// Education tiers at or below this one trigger the literacy tip.
pub const LOW_EDUCATION_TIER: u8 = EducationLevel::Primary.tier();
/// Fewer plots than this triggers the plot tip.
pub const MIN_PLOTS: u32 = 2;
/// Fewer crop types than this triggers the diversification tip.
pub const MIN_CROPS: u32 = 3;
/// A state social-group rate below this triggers the savings-group tip.
pub const LOW_SOCIAL_GROUP_RATE: f64 = 0.05;

pub const ENCOURAGEMENT: &str =
    "Keep working on your farm and stay active — your eligibility may improve soon.";
pub const RESOURCE_TITLE: &str = "Watch Now: Improving Your Farm Credit Worthiness";
pub const RESOURCE_URL: &str =
    "https://www.youtube.com/watch?v=kP3-yV8BmVw&ab_channel=NCBA%27sCattlementoCattlemen";

/// A single improvement suggestion. Variant order is rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tip {
    Literacy,
    AgriculturalTraining,
    MorePlots,
    CropDiversity,
    SecondaryIncome,
    SavingsGroup,
}

impl Tip {
    pub fn message(self) -> &'static str {
        match self {
            Tip::Literacy => "Consider enrolling in a literacy or vocational training program.",
            Tip::AgriculturalTraining => {
                "Attending agricultural training can improve your productivity and eligibility."
            }
            Tip::MorePlots => {
                "Increasing the number of plots cultivated may boost your agricultural output."
            }
            Tip::CropDiversity => {
                "Try to diversify your crops — planting 3 or more types improves resilience and income."
            }
            Tip::SecondaryIncome => {
                "Adding a secondary activity like fishery or livestock could increase your income streams."
            }
            Tip::SavingsGroup => {
                "Join a local social or savings group in your area to strengthen your financial support network."
            }
        }
    }
}

impl fmt::Display for Tip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advice {
    /// One to six tips in rule order.
    Tips(Vec<Tip>),
    /// No rule fired.
    Encouragement {
        message: &'static str,
        resource_title: &'static str,
        resource_url: &'static str,
    },
}

impl Advice {
    /// The tips, empty for the encouragement fallback.
    pub fn tips(&self) -> &[Tip] {
        match self {
            Advice::Tips(tips) => tips,
            Advice::Encouragement { .. } => &[],
        }
    }
}

/// Applies every rule to the applicant and their state's rates.
pub fn advise(applicant: &Applicant, rates: &StateRates) -> Advice {
    let rules: [(bool, Tip); 6] = [
        (
            applicant.education_level.tier() <= LOW_EDUCATION_TIER,
            Tip::Literacy,
        ),
        (
            applicant.training_attended == YesNo::No,
            Tip::AgriculturalTraining,
        ),
        (applicant.plot_count < MIN_PLOTS, Tip::MorePlots),
        (applicant.crop_count < MIN_CROPS, Tip::CropDiversity),
        (applicant.has_fishery == YesNo::No, Tip::SecondaryIncome),
        (
            rates.social_group_rate < LOW_SOCIAL_GROUP_RATE,
            Tip::SavingsGroup,
        ),
    ];

    let tips: Vec<Tip> = rules
        .into_iter()
        .filter_map(|(fires, tip)| fires.then_some(tip))
        .collect();

    if tips.is_empty() {
        Advice::Encouragement {
            message: ENCOURAGEMENT,
            resource_title: RESOURCE_TITLE,
            resource_url: RESOURCE_URL,
        }
    } else {
        Advice::Tips(tips)
    }
}

//! Four-step tailored trip questionnaire.
//!
//! The client holds the state and posts it back on every transition; the
//! server only validates presence of the answers each step needs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidateEmail;

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Budget,
    Standard,
    Premium,
    Luxury,
}

impl BudgetTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetTier::Budget => "budget",
            BudgetTier::Standard => "standard",
            BudgetTier::Premium => "premium",
            BudgetTier::Luxury => "luxury",
        }
    }

    /// Upper bound on the per-person price, `None` when unbounded.
    pub fn max_per_person(&self) -> Option<f64> {
        match self {
            BudgetTier::Budget => Some(1500.0),
            BudgetTier::Standard => Some(3500.0),
            BudgetTier::Premium => Some(7000.0),
            BudgetTier::Luxury => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct WizardAnswers {
    pub destinations: Vec<String>,
    pub surprise_me: bool,
    pub start_date: Option<NaiveDate>,
    pub duration_days: u32,
    pub adults: u32,
    pub children: u32,
    pub budget: Option<BudgetTier>,
    pub interests: Vec<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
}

impl WizardAnswers {
    pub fn wanted_destinations(&self) -> impl Iterator<Item = &str> {
        self.destinations
            .iter()
            .map(|destination| destination.trim())
            .filter(|destination| !destination.is_empty())
    }

    pub fn travelers(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WizardState {
    pub step: u8,
    #[serde(default)]
    pub answers: WizardAnswers,
}

/// A required answer the current step lacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MissingAnswer {
    pub step: u8,
    pub field: &'static str,
    pub error: &'static str,
}

fn missing(step: u8, field: &'static str) -> MissingAnswer {
    MissingAnswer {
        step,
        field,
        error: "required",
    }
}

/// Answers step `step` still needs.
pub fn check_step(step: u8, answers: &WizardAnswers) -> Vec<MissingAnswer> {
    let mut problems = Vec::new();
    match step {
        1 => {
            if !answers.surprise_me && answers.wanted_destinations().next().is_none() {
                problems.push(missing(step, "destinations"));
            }
        }
        2 => {
            if answers.start_date.is_none() {
                problems.push(missing(step, "start_date"));
            }
            if answers.duration_days == 0 {
                problems.push(missing(step, "duration_days"));
            }
            if answers.adults < 1 {
                problems.push(missing(step, "adults"));
            }
        }
        3 => {
            if answers.budget.is_none() {
                problems.push(missing(step, "budget"));
            }
            if answers.interests.iter().all(|interest| interest.trim().is_empty()) {
                problems.push(missing(step, "interests"));
            }
        }
        4 => {
            if answers.name.trim().is_empty() {
                problems.push(missing(step, "name"));
            }
            if answers.email.trim().is_empty() {
                problems.push(missing(step, "email"));
            } else if !answers.email.trim().validate_email() {
                problems.push(MissingAnswer {
                    step,
                    field: "email",
                    error: "email",
                });
            }
            if answers.phone.trim().is_empty() {
                problems.push(missing(step, "phone"));
            }
        }
        _ => {}
    }
    problems
}

/// Steps outside `1..=4` are pulled back into range.
pub fn clamp_step(step: u8) -> u8 {
    step.clamp(FIRST_STEP, LAST_STEP)
}

/// Validate the current step, then move forward (at most to the last step).
pub fn advance(state: WizardState) -> Result<WizardState, Vec<MissingAnswer>> {
    let step = clamp_step(state.step);
    let problems = check_step(step, &state.answers);
    if !problems.is_empty() {
        return Err(problems);
    }
    Ok(WizardState {
        step: (step + 1).min(LAST_STEP),
        answers: state.answers,
    })
}

/// Move back one step (at least to the first) without validation.
pub fn back(state: WizardState) -> WizardState {
    WizardState {
        step: clamp_step(state.step).saturating_sub(1).max(FIRST_STEP),
        answers: state.answers,
    }
}

/// Every step's problems, in step order.
pub fn check_all(answers: &WizardAnswers) -> Vec<MissingAnswer> {
    (FIRST_STEP..=LAST_STEP)
        .flat_map(|step| check_step(step, answers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_answers() -> WizardAnswers {
        WizardAnswers {
            destinations: vec!["Bali".into()],
            start_date: NaiveDate::from_ymd_opt(2026, 11, 2),
            duration_days: 6,
            adults: 2,
            budget: Some(BudgetTier::Standard),
            interests: vec!["beaches".into()],
            name: "Ana Costa".into(),
            email: "ana@example.com".into(),
            phone: "+351 900 000 000".into(),
            ..WizardAnswers::default()
        }
    }

    #[test]
    fn advance_requires_current_step_answers() {
        let state = WizardState {
            step: 1,
            answers: WizardAnswers::default(),
        };
        let problems = advance(state).unwrap_err();
        assert_eq!(problems, vec![missing(1, "destinations")]);
    }

    #[test]
    fn surprise_me_satisfies_destination_step() {
        let state = WizardState {
            step: 1,
            answers: WizardAnswers {
                surprise_me: true,
                ..WizardAnswers::default()
            },
        };
        assert_eq!(advance(state).unwrap().step, 2);
    }

    #[test]
    fn dates_step_lists_every_gap() {
        let fields: Vec<_> = check_step(2, &WizardAnswers::default())
            .into_iter()
            .map(|problem| problem.field)
            .collect();
        assert_eq!(fields, vec!["start_date", "duration_days", "adults"]);
    }

    #[test]
    fn advance_caps_at_last_step_and_back_floors_at_first() {
        let last = WizardState {
            step: LAST_STEP,
            answers: complete_answers(),
        };
        assert_eq!(advance(last).unwrap().step, LAST_STEP);

        let first = WizardState {
            step: FIRST_STEP,
            answers: WizardAnswers::default(),
        };
        assert_eq!(back(first).step, FIRST_STEP);

        let third = WizardState {
            step: 3,
            answers: WizardAnswers::default(),
        };
        assert_eq!(back(third).step, 2);
    }

    #[test]
    fn contact_step_checks_email_format() {
        let answers = WizardAnswers {
            email: "not-an-email".into(),
            ..complete_answers()
        };
        let problems = check_step(4, &answers);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].error, "email");
    }

    #[test]
    fn complete_answers_pass_every_step() {
        assert!(check_all(&complete_answers()).is_empty());
        assert_eq!(check_all(&WizardAnswers::default()).len(), 9);
    }

    #[test]
    fn traveler_count_saturates() {
        let answers = WizardAnswers {
            adults: u32::MAX,
            children: 1,
            ..complete_answers()
        };
        assert_eq!(answers.travelers(), u32::MAX);
    }
}

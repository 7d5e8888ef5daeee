//! Ranking catalogue packages against wizard answers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::wizard::WizardAnswers;
use crate::modules::packages::models::Package;
use crate::utils::text::contains_ci;

pub const MAX_MATCHES: usize = 12;
const DURATION_TOLERANCE: u32 = 2;

const DESTINATION_SCORE: u32 = 50;
const DURATION_SCORE: u32 = 25;
const BUDGET_SCORE: u32 = 20;
const INTEREST_SCORE: u32 = 5;
const MAX_INTEREST_SCORE: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackageMatch {
    pub package_id: String,
    pub destination_id: String,
    pub title: String,
    pub slug: String,
    pub destination_name: String,
    pub duration_days: u32,
    pub price: f64,
    pub currency: String,
    pub image_url: String,
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Price for one traveller, splitting group prices across the party.
pub fn per_person_price(package: &Package, travelers: u32) -> f64 {
    let unit = package.price_unit.to_lowercase();
    if unit.is_empty() || unit.contains("person") || unit.contains("pax") {
        package.price
    } else {
        package.price / f64::from(travelers.max(1))
    }
}

fn matches_destination(package: &Package, wanted: &str) -> bool {
    [
        package.destination_name.as_str(),
        package.country.as_str(),
        package.region.as_str(),
        package.title.as_str(),
    ]
    .into_iter()
    .any(|field| !field.is_empty() && (contains_ci(field, wanted) || contains_ci(wanted, field)))
}

fn interest_hits(package: &Package, interests: &[String]) -> usize {
    interests
        .iter()
        .map(|interest| interest.trim())
        .filter(|interest| !interest.is_empty())
        .filter(|interest| {
            package
                .tags
                .iter()
                .chain(&package.activities)
                .chain(&package.highlights)
                .any(|field| contains_ci(field, interest))
                || contains_ci(&package.package_type, interest)
                || contains_ci(&package.ideal_for, interest)
        })
        .count()
}

fn score(package: &Package, answers: &WizardAnswers) -> Option<(u32, Vec<String>)> {
    let mut total = 0;
    let mut reasons = Vec::new();

    let wanted: Vec<&str> = answers.wanted_destinations().collect();
    if let Some(destination) = wanted.iter().find(|wanted| matches_destination(package, wanted)) {
        total += DESTINATION_SCORE;
        reasons.push(format!("destination matches {destination}"));
    } else if !wanted.is_empty() && !answers.surprise_me {
        return None;
    }

    if answers.duration_days > 0 && package.duration_days > 0 {
        let gap = package.duration_days.abs_diff(answers.duration_days);
        if gap <= DURATION_TOLERANCE {
            total += DURATION_SCORE - gap * 5;
            reasons.push(format!("{} days", package.duration_days));
        }
    }

    if let Some(tier) = answers.budget {
        let price = per_person_price(package, answers.travelers());
        if tier.max_per_person().map_or(true, |max| price <= max) {
            total += BUDGET_SCORE;
            reasons.push(format!("fits the {} budget", tier.as_str()));
        }
    }

    let hits = interest_hits(package, &answers.interests) as u32;
    if hits > 0 {
        total += (hits * INTEREST_SCORE).min(MAX_INTEREST_SCORE);
        reasons.push(format!("{hits} matching interests"));
    }

    Some((total, reasons))
}

/// Published packages ordered by score then price. Zero scores are dropped
/// unless the traveller asked to be surprised.
pub fn rank(packages: Vec<Package>, answers: &WizardAnswers) -> Vec<PackageMatch> {
    let mut matches: Vec<PackageMatch> = packages
        .into_iter()
        .filter(|package| package.published)
        .filter_map(|package| {
            let (score, reasons) = score(&package, answers)?;
            if score == 0 && !answers.surprise_me {
                return None;
            }
            Some(PackageMatch {
                package_id: package.id,
                destination_id: package.destination_id,
                title: package.title,
                slug: package.slug,
                destination_name: package.destination_name,
                duration_days: package.duration_days,
                price: package.price,
                currency: package.currency,
                image_url: package.image_url,
                score,
                reasons,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal))
    });
    matches.truncate(MAX_MATCHES);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::tailored::wizard::BudgetTier;

    fn package(title: &str, destination: &str, days: u32, price: f64) -> Package {
        Package {
            id: title.to_lowercase(),
            title: title.into(),
            destination_name: destination.into(),
            duration_days: days,
            price,
            published: true,
            ..Package::default()
        }
    }

    fn answers() -> WizardAnswers {
        WizardAnswers {
            destinations: vec!["bali".into()],
            duration_days: 6,
            adults: 2,
            budget: Some(BudgetTier::Standard),
            interests: vec!["beach".into()],
            ..WizardAnswers::default()
        }
    }

    #[test]
    fn destination_is_required_unless_surprised() {
        let packages = vec![
            package("Bali Classic", "Bali", 6, 1200.0),
            package("Paris Lights", "Paris", 6, 1200.0),
        ];
        let ranked = rank(packages.clone(), &answers());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title, "Bali Classic");

        let surprised = WizardAnswers {
            surprise_me: true,
            ..answers()
        };
        assert_eq!(rank(packages, &surprised).len(), 2);
    }

    #[test]
    fn closer_duration_and_budget_rank_higher() {
        let ranked = rank(
            vec![
                package("Bali Long", "Bali", 12, 900.0),
                package("Bali Exact", "Bali", 6, 1400.0),
                package("Bali Pricey", "Bali", 6, 9000.0),
                package("Bali Near", "Bali", 8, 1000.0),
            ],
            &answers(),
        );
        let titles: Vec<_> = ranked.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Bali Exact", "Bali Near", "Bali Pricey", "Bali Long"]);
    }

    #[test]
    fn group_prices_are_split_per_person() {
        let mut group = package("Bali Villa", "Bali", 6, 6000.0);
        group.price_unit = "per group".into();
        assert_eq!(per_person_price(&group, 4), 1500.0);
        assert_eq!(per_person_price(&package("x", "y", 1, 800.0), 4), 800.0);
    }

    #[test]
    fn drafts_are_never_matched() {
        let mut draft = package("Bali Draft", "Bali", 6, 1000.0);
        draft.published = false;
        assert!(rank(vec![draft], &answers()).is_empty());
    }

    #[test]
    fn interests_add_to_the_score() {
        let mut beachy = package("Bali Beach", "Bali", 6, 1000.0);
        beachy.tags = vec!["Beach".into()];
        let plain = package("Bali Temples", "Bali", 6, 1000.0);
        let ranked = rank(vec![plain, beachy], &answers());
        assert_eq!(ranked[0].title, "Bali Beach");
        assert!(ranked[0].score > ranked[1].score);
    }
}

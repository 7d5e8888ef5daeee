//! Completion of partially filled package skeletons.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::models::{ItineraryDay, Package};
use crate::import::normalize_id;
use crate::utils::text::{slugify, truncate_words};

const SEO_TITLE_MAX: usize = 60;
const SEO_DESCRIPTION_MAX: usize = 155;

/// Turns skeleton packages into complete ones. Results are not persisted.
#[async_trait]
pub trait PackageCompleter: Send + Sync {
    async fn complete(&self, skeletons: Vec<Package>) -> anyhow::Result<Vec<Package>>;

    fn name(&self) -> &'static str;
}

/// Deterministic completion from the fields the skeleton already has.
#[derive(Debug, Clone)]
pub struct TemplateCompleter {
    currency: String,
}

impl TemplateCompleter {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn fill(&self, mut package: Package) -> Package {
        package.destination_id = normalize_id(&package.destination_id);
        package.title = package.title.trim().to_string();

        if package.duration_days == 0 && package.nights > 0 {
            package.duration_days = package.nights + 1;
        }
        if package.nights == 0 && package.duration_days > 1 {
            package.nights = package.duration_days - 1;
        }
        if package.duration.is_empty() && package.duration_days > 0 {
            package.duration = format!("{}N/{}D", package.nights, package.duration_days);
        }

        let place = first_non_empty(&[&package.destination_name, &package.country, &package.title])
            .to_string();
        if package.title.is_empty() && !place.is_empty() {
            package.title = match package.duration_days {
                0 => format!("{place} Getaway"),
                days => format!("{place} {days}-Day Getaway"),
            };
        }
        if package.slug.is_empty() {
            package.slug = slugify(&package.title);
        }
        if package.currency.is_empty() {
            package.currency = self.currency.clone();
        }
        if package.price_unit.is_empty() {
            package.price_unit = "per person".to_string();
        }

        if package.overview.is_empty() {
            let kind = match package.package_type.trim() {
                "" => "holiday".to_string(),
                kind => kind.to_lowercase(),
            };
            package.overview = match package.duration_days {
                0 => format!("Discover {place} on a {kind} package planned end to end."),
                days => format!("Discover {place} on a {days}-day {kind} package planned end to end."),
            };
            if let Some(first) = package.highlights.first() {
                package.overview.push_str(&format!(" Highlights include {}.", first.to_lowercase()));
            }
        }
        if package.description.is_empty() {
            package.description = package.overview.clone();
        }

        if package.day_wise_itinerary.is_empty() && package.duration_days > 0 {
            package.day_wise_itinerary = template_days(&place, package.duration_days);
        }
        if package.itinerary_summary.is_empty() && !package.day_wise_itinerary.is_empty() {
            package.itinerary_summary = package
                .day_wise_itinerary
                .iter()
                .map(|day| day.title.as_str())
                .collect::<Vec<_>>()
                .join(" → ");
        }

        if package.seo_title.is_empty() {
            let label = match package.duration.as_str() {
                "" => package.title.clone(),
                duration => format!("{} ({duration})", package.title),
            };
            package.seo_title = truncate_words(&label, SEO_TITLE_MAX);
        }
        if package.seo_description.is_empty() {
            package.seo_description = truncate_words(&package.overview, SEO_DESCRIPTION_MAX);
        }
        if package.seo_keywords.is_empty() {
            let mut keywords = BTreeSet::new();
            for value in [&package.destination_name, &package.country, &package.package_type] {
                if !value.trim().is_empty() {
                    keywords.insert(value.trim().to_lowercase());
                }
            }
            if !place.is_empty() {
                keywords.insert(format!("{} tour package", place.to_lowercase()));
            }
            package.seo_keywords = keywords.into_iter().collect::<Vec<_>>().join(", ");
        }

        package
    }
}

fn first_non_empty<'a>(values: &[&'a String]) -> &'a str {
    values
        .iter()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

fn template_days(place: &str, days: u32) -> Vec<ItineraryDay> {
    (1..=days)
        .map(|day| {
            let (title, description) = if day == 1 {
                (
                    format!("Arrival in {place}"),
                    "Meet and greet on arrival, transfer to the hotel and settle in.".to_string(),
                )
            } else if day == days {
                (
                    "Departure".to_string(),
                    "Check out and transfer to the airport for the onward journey.".to_string(),
                )
            } else {
                (
                    format!("Explore {place}"),
                    "A full day of sightseeing and experiences.".to_string(),
                )
            };
            ItineraryDay {
                day,
                title,
                description,
                ..ItineraryDay::default()
            }
        })
        .collect()
}

#[async_trait]
impl PackageCompleter for TemplateCompleter {
    async fn complete(&self, skeletons: Vec<Package>) -> anyhow::Result<Vec<Package>> {
        Ok(skeletons.into_iter().map(|package| self.fill(package)).collect())
    }

    fn name(&self) -> &'static str {
        "template"
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    packages: &'a [Package],
}

#[derive(Deserialize)]
struct CompletionResponse {
    packages: Vec<Package>,
}

/// Proxies completion to an HTTP endpoint, then fills whatever the endpoint
/// left empty with the template completer.
pub struct RemoteCompleter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    fallback: TemplateCompleter,
}

impl RemoteCompleter {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
        fallback: TemplateCompleter,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build generator http client")?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            fallback,
        })
    }
}

#[async_trait]
impl PackageCompleter for RemoteCompleter {
    async fn complete(&self, skeletons: Vec<Package>) -> anyhow::Result<Vec<Package>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&CompletionRequest {
                packages: &skeletons,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response: CompletionResponse = request
            .send()
            .await
            .context("generator request")?
            .error_for_status()
            .context("generator status")?
            .json()
            .await
            .context("generator body")?;

        if response.packages.len() != skeletons.len() {
            anyhow::bail!(
                "generator returned {} packages for {} skeletons",
                response.packages.len(),
                skeletons.len()
            );
        }
        tracing::debug!(count = response.packages.len(), "remote completion received");
        self.fallback.complete(response.packages).await
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_derived_fields() {
        let completer = TemplateCompleter::new("USD");
        let package = completer.fill(Package {
            destination_id: " dxb001 ".into(),
            title: "Dubai Escape".into(),
            destination_name: "Dubai".into(),
            country: "UAE".into(),
            package_type: "Family".into(),
            duration_days: 4,
            ..Package::default()
        });

        assert_eq!(package.destination_id, "DXB001");
        assert_eq!(package.slug, "dubai-escape");
        assert_eq!(package.nights, 3);
        assert_eq!(package.duration, "3N/4D");
        assert_eq!(package.currency, "USD");
        assert_eq!(package.day_wise_itinerary.len(), 4);
        assert_eq!(package.day_wise_itinerary[0].title, "Arrival in Dubai");
        assert_eq!(package.day_wise_itinerary[3].title, "Departure");
        assert!(package.overview.contains("4-day family package"));
        assert_eq!(package.seo_title, "Dubai Escape (3N/4D)");
        assert_eq!(package.seo_keywords, "dubai, dubai tour package, family, uae");
    }

    #[test]
    fn keeps_supplied_values() {
        let completer = TemplateCompleter::new("USD");
        let package = completer.fill(Package {
            title: "Bali Bliss".into(),
            slug: "bali".into(),
            currency: "EUR".into(),
            overview: "Custom".into(),
            nights: 6,
            ..Package::default()
        });

        assert_eq!(package.slug, "bali");
        assert_eq!(package.currency, "EUR");
        assert_eq!(package.overview, "Custom");
        assert_eq!(package.duration_days, 7);
        assert_eq!(package.duration, "6N/7D");
    }

    #[tokio::test]
    async fn template_completes_every_skeleton() {
        let completer = TemplateCompleter::new("INR");
        let out = completer
            .complete(vec![Package::default(), Package::default()])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|p| p.currency == "INR"));
    }
}

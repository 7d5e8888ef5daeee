//! Reconciles workbook rows against the packages already stored.
//!
//! A package row is a duplicate iff its normalized `Destination_ID` matches
//! the normalized ID of a stored package. Child sheets join onto package rows
//! by the same normalized key.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tripdesk_db::Repository;
use utoipa::ToSchema;

use super::sheets::{SheetRow, Workbook};
use super::ImportError;
use crate::modules::packages::models::{BookingPolicy, Faq, GuestReview, ItineraryDay, Package};
use crate::utils::text::slugify;

pub const DESTINATIONS: &str = "Destinations";
pub const PACKAGES: &str = "Packages_Master";
pub const ITINERARY: &str = "Itinerary";
pub const INCLUSIONS: &str = "Inclusions_Exclusions";
pub const REVIEWS: &str = "Reviews";
pub const POLICIES: &str = "Policies";
pub const FAQS: &str = "FAQs";

const KEY: &str = "Destination_ID";
const CHILD_SHEETS: [&str; 5] = [ITINERARY, INCLUSIONS, REVIEWS, POLICIES, FAQS];

pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Leading run of ASCII letters of a package ID, or the whole ID when it
/// does not start with a letter.
pub fn destination_code(id: &str) -> String {
    let id = normalize_id(id);
    let prefix: String = id.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if prefix.is_empty() {
        id
    } else {
        prefix
    }
}

/// Normalized IDs of the stored packages.
pub fn existing_ids(packages: &[Package]) -> HashSet<String> {
    packages
        .iter()
        .map(|package| normalize_id(&package.destination_id))
        .filter(|id| !id.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackageRef {
    pub destination_id: String,
    pub title: String,
    /// Spreadsheet row, absent for JSON package lists
    pub row: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RejectedRow {
    pub row: usize,
    pub destination_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportFailure {
    pub destination_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub new_packages: Vec<(Option<usize>, Package)>,
    pub duplicates: Vec<PackageRef>,
    pub rejected: Vec<RejectedRow>,
    pub orphan_rows: usize,
}

/// What a preview reports back.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    pub new_count: usize,
    pub duplicate_count: usize,
    pub rejected_count: usize,
    pub orphan_rows: usize,
    pub new_packages: Vec<PackageRef>,
    pub duplicates: Vec<PackageRef>,
    pub rejected: Vec<RejectedRow>,
}

/// What a commit reports back.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    pub created: Vec<PackageRef>,
    pub failed: Vec<ImportFailure>,
    pub duplicates: Vec<PackageRef>,
    pub rejected: Vec<RejectedRow>,
    pub orphan_rows: usize,
}

impl ImportPlan {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            new_count: self.new_packages.len(),
            duplicate_count: self.duplicates.len(),
            rejected_count: self.rejected.len(),
            orphan_rows: self.orphan_rows,
            new_packages: self
                .new_packages
                .iter()
                .map(|(row, package)| package_ref(package, *row))
                .collect(),
            duplicates: self.duplicates.clone(),
            rejected: self.rejected.clone(),
        }
    }
}

fn package_ref(package: &Package, row: Option<usize>) -> PackageRef {
    PackageRef {
        destination_id: package.destination_id.clone(),
        title: package.title.clone(),
        row,
    }
}

/// Classify every `Packages_Master` row of `workbook`.
pub fn plan_workbook(
    workbook: &Workbook,
    existing: &HashSet<String>,
    default_currency: &str,
) -> Result<ImportPlan, ImportError> {
    if !workbook.has_sheet(PACKAGES) {
        return Err(ImportError::MissingSheet(PACKAGES));
    }

    let destinations: HashMap<String, &SheetRow> = workbook
        .rows(DESTINATIONS)
        .iter()
        .filter_map(|row| Some((normalize_id(row.text("Destination_Code")?), row)))
        .collect();

    let children: HashMap<&str, HashMap<String, Vec<&SheetRow>>> = CHILD_SHEETS
        .iter()
        .map(|sheet| (*sheet, group_by_key(workbook.rows(sheet))))
        .collect();

    let mut plan = ImportPlan::default();
    let mut seen = HashSet::new();

    for row in workbook.rows(PACKAGES) {
        let id = row.text(KEY).map(normalize_id);
        let title = row.text("Title");

        let id = match (id, title) {
            (Some(id), Some(_)) => id,
            (id, _) => {
                plan.rejected.push(RejectedRow {
                    row: row.number,
                    destination_id: id,
                    reason: "Destination_ID and Title are required".to_string(),
                });
                continue;
            }
        };

        // Stored IDs are duplicates on every row; repeats only matter for new IDs.
        let repeated = !seen.insert(id.clone());
        if existing.contains(&id) {
            let title = row.string("Title");
            plan.duplicates.push(PackageRef {
                destination_id: id,
                title,
                row: Some(row.number),
            });
            continue;
        }
        if repeated {
            plan.rejected.push(RejectedRow {
                row: row.number,
                destination_id: Some(id),
                reason: "Destination_ID appears more than once in this file".to_string(),
            });
            continue;
        }

        let mut package = package_from_row(row, &id, default_currency);
        if let Some(destination) = destinations.get(&destination_code(&id)) {
            fill_from_destination(&mut package, destination);
        }
        attach_children(&mut package, &id, &children);
        plan.new_packages.push((Some(row.number), package));
    }

    plan.orphan_rows = children
        .values()
        .flat_map(|groups| groups.iter())
        .filter(|(key, _)| !seen.contains(*key))
        .map(|(_, rows)| rows.len())
        .sum();

    tracing::debug!(
        new = plan.new_packages.len(),
        duplicates = plan.duplicates.len(),
        rejected = plan.rejected.len(),
        orphans = plan.orphan_rows,
        "workbook reconciled"
    );
    Ok(plan)
}

/// Classify an already-structured package list (the JSON import path).
pub fn plan_packages(packages: Vec<Package>, existing: &HashSet<String>) -> ImportPlan {
    let mut plan = ImportPlan::default();
    let mut seen = HashSet::new();

    for (index, mut package) in packages.into_iter().enumerate() {
        let id = normalize_id(&package.destination_id);
        if id.is_empty() || package.title.trim().is_empty() {
            plan.rejected.push(RejectedRow {
                row: index + 1,
                destination_id: Some(id).filter(|id| !id.is_empty()),
                reason: "destination_id and title are required".to_string(),
            });
            continue;
        }
        let repeated = !seen.insert(id.clone());
        package.destination_id = id.clone();
        if existing.contains(&id) {
            plan.duplicates.push(package_ref(&package, None));
            continue;
        }
        if repeated {
            plan.rejected.push(RejectedRow {
                row: index + 1,
                destination_id: Some(id),
                reason: "destination_id appears more than once in this list".to_string(),
            });
            continue;
        }
        plan.new_packages.push((None, package));
    }
    plan
}

/// Insert every new package independently. Failures are collected; packages
/// written before a failure stay written.
pub async fn commit(repo: &Repository<Package>, plan: ImportPlan) -> ImportReport {
    let mut report = ImportReport {
        created: Vec::new(),
        failed: Vec::new(),
        duplicates: plan.duplicates,
        rejected: plan.rejected,
        orphan_rows: plan.orphan_rows,
    };

    for (row, mut package) in plan.new_packages {
        let now = Utc::now();
        package.id = String::new();
        package.created_at = now;
        package.updated_at = now;
        if package.slug.is_empty() {
            package.slug = slugify(&package.title);
        }

        match repo.create(package.clone()).await {
            Ok(saved) => report.created.push(package_ref(&saved, row)),
            Err(err) => {
                tracing::warn!(destination_id = %package.destination_id, error = %err, "package import failed");
                report.failed.push(ImportFailure {
                    destination_id: package.destination_id,
                    error: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        created = report.created.len(),
        failed = report.failed.len(),
        duplicates = report.duplicates.len(),
        "package import committed"
    );
    report
}

fn group_by_key(rows: &[SheetRow]) -> HashMap<String, Vec<&SheetRow>> {
    let mut groups: HashMap<String, Vec<&SheetRow>> = HashMap::new();
    for row in rows {
        if let Some(key) = row.text(KEY) {
            groups.entry(normalize_id(key)).or_default().push(row);
        }
    }
    groups
}

fn package_from_row(row: &SheetRow, id: &str, default_currency: &str) -> Package {
    let duration_days = row.whole("Duration_Days").unwrap_or_default();
    let nights = row
        .whole("Nights")
        .unwrap_or_else(|| duration_days.saturating_sub(1));

    Package {
        destination_id: id.to_string(),
        title: row.string("Title"),
        slug: row.text("Slug").map(str::to_string).unwrap_or_else(|| slugify(&row.string("Title"))),
        destination_name: row.string("Destination_Name"),
        country: row.string("Country"),
        region: row.string("Region"),
        package_type: row.string("Package_Type"),
        duration: row.string("Duration"),
        duration_days,
        nights,
        price: row.number("Price").unwrap_or_default(),
        original_price: row.number("Original_Price"),
        currency: row
            .text("Currency")
            .unwrap_or(default_currency)
            .to_uppercase(),
        price_unit: row.text("Price_Unit").unwrap_or("per person").to_string(),
        overview: row.string("Overview"),
        description: row.string("Description"),
        highlights: row.list("Highlights"),
        itinerary_summary: row.string("Itinerary_Summary"),
        activities: row.list("Activities"),
        best_time_to_visit: row.string("Best_Time_To_Visit"),
        ideal_for: row.string("Ideal_For"),
        hotel_category: row.string("Hotel_Category"),
        transport: row.string("Transport"),
        meals: row.string("Meals"),
        start_city: row.string("Start_City"),
        end_city: row.string("End_City"),
        min_group_size: row.whole("Min_Group_Size"),
        max_group_size: row.whole("Max_Group_Size"),
        image_url: row.string("Image_URL"),
        gallery: row.list("Gallery"),
        tags: row.list("Tags"),
        rating: row.number("Rating"),
        review_count: row.whole("Review_Count").unwrap_or_default(),
        seo_title: row.string("SEO_Title"),
        seo_description: row.string("SEO_Description"),
        seo_keywords: row.string("SEO_Keywords"),
        featured: row.flag("Featured").unwrap_or(false),
        published: row.flag("Published").unwrap_or(true),
        cancellation_policy: row.string("Cancellation_Policy"),
        ..Package::default()
    }
}

fn fill_from_destination(package: &mut Package, destination: &SheetRow) {
    let fill = |field: &mut String, column: &str| {
        if field.is_empty() {
            *field = destination.string(column);
        }
    };
    fill(&mut package.destination_name, "Destination_Name");
    fill(&mut package.country, "Country");
    fill(&mut package.region, "Region");
    fill(&mut package.best_time_to_visit, "Best_Time_To_Visit");
}

fn attach_children(
    package: &mut Package,
    id: &str,
    children: &HashMap<&str, HashMap<String, Vec<&SheetRow>>>,
) {
    let rows = |sheet: &str| {
        children
            .get(sheet)
            .and_then(|groups| groups.get(id))
            .cloned()
            .unwrap_or_default()
    };

    let mut days: BTreeMap<u32, ItineraryDay> = BTreeMap::new();
    for (index, row) in rows(ITINERARY).into_iter().enumerate() {
        let day = row.whole("Day").unwrap_or(index as u32 + 1);
        days.insert(
            day,
            ItineraryDay {
                day,
                title: row.string("Title"),
                description: row.string("Description"),
                meals: row.string("Meals"),
                accommodation: row.string("Accommodation"),
            },
        );
    }
    package.day_wise_itinerary = days.into_values().collect();

    for row in rows(INCLUSIONS) {
        if let Some(item) = row.text("Inclusion") {
            package.inclusions.push(item.to_string());
        }
        if let Some(item) = row.text("Exclusion") {
            package.exclusions.push(item.to_string());
        }
        let typed = row.text("Type").map(str::to_ascii_lowercase);
        match (typed.as_deref(), row.text("Item")) {
            (Some(kind), Some(item)) if kind.starts_with("incl") => {
                package.inclusions.push(item.to_string())
            }
            (Some(kind), Some(item)) if kind.starts_with("excl") => {
                package.exclusions.push(item.to_string())
            }
            _ => {}
        }
    }

    package.guest_reviews = rows(REVIEWS)
        .into_iter()
        .map(|row| GuestReview {
            name: row.string("Guest_Name"),
            rating: row.number("Rating").unwrap_or_default().clamp(0.0, 5.0),
            comment: row.string("Comment"),
            date: row.string("Date"),
        })
        .collect();
    if !package.guest_reviews.is_empty() {
        if package.rating.is_none() {
            let total: f64 = package.guest_reviews.iter().map(|review| review.rating).sum();
            let average = total / package.guest_reviews.len() as f64;
            package.rating = Some((average * 10.0).round() / 10.0);
        }
        if package.review_count == 0 {
            package.review_count = package.guest_reviews.len() as u32;
        }
    }

    package.booking_policies = rows(POLICIES)
        .into_iter()
        .map(|row| BookingPolicy {
            policy_type: row.string("Policy_Type"),
            description: row.string("Description"),
        })
        .collect();

    package.faqs = rows(FAQS)
        .into_iter()
        .map(|row| Faq {
            question: row.string("Question"),
            answer: row.string("Answer"),
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tripdesk_db::memory::InMemoryStore;

    use super::*;

    fn workbook() -> Workbook {
        Workbook::from_json(&json!({
            "Destinations": [
                {"Destination_Code": "DXB", "Destination_Name": "Dubai", "Country": "UAE", "Region": "Middle East"}
            ],
            "Packages_Master": [
                {"Destination_ID": "dxb001", "Title": "Dubai Escape", "Duration_Days": 5, "Price": "1,299"},
                {"Destination_ID": "DXB002 ", "Title": "Dubai Luxe", "Duration_Days": 4},
                {"Destination_ID": "DXB001", "Title": "Dubai Again"},
                {"Destination_ID": "", "Title": "No id"},
                {"Destination_ID": "BKK001", "Title": ""}
            ],
            "Itinerary": [
                {"Destination_ID": "DXB001", "Day": 2, "Title": "Desert safari"},
                {"Destination_ID": "DXB001", "Day": 1, "Title": "Arrival"},
                {"Destination_ID": "ZZZ999", "Day": 1, "Title": "Nowhere"}
            ],
            "Inclusions_Exclusions": [
                {"Destination_ID": "DXB001", "Type": "Inclusion", "Item": "Breakfast"},
                {"Destination_ID": "DXB001", "Type": "Exclusion", "Item": "Visa"}
            ],
            "Reviews": [
                {"Destination_ID": "dxb001", "Guest_Name": "Asha", "Rating": 5, "Comment": "Great"},
                {"Destination_ID": "DXB001", "Guest_Name": "Ravi", "Rating": 4}
            ],
            "FAQs": [
                {"Destination_ID": "QQQ1", "Question": "?", "Answer": "!"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn destination_code_is_leading_letters() {
        assert_eq!(destination_code("dxb-7n-001"), "DXB");
        assert_eq!(destination_code("  BKK002"), "BKK");
        assert_eq!(destination_code("123-X"), "123-X");
    }

    #[test]
    fn classifies_rows_and_joins_children() {
        let existing = HashSet::from(["DXB002".to_string()]);
        let plan = plan_workbook(&workbook(), &existing, "USD").unwrap();

        assert_eq!(plan.new_packages.len(), 1);
        let (row, package) = &plan.new_packages[0];
        assert_eq!(*row, Some(2));
        assert_eq!(package.destination_id, "DXB001");
        assert_eq!(package.price, 1299.0);
        assert_eq!(package.nights, 4);
        assert_eq!(package.currency, "USD");
        assert_eq!(package.destination_name, "Dubai");
        assert_eq!(package.country, "UAE");
        let days: Vec<u32> = package.day_wise_itinerary.iter().map(|d| d.day).collect();
        assert_eq!(days, vec![1, 2]);
        assert_eq!(package.inclusions, vec!["Breakfast"]);
        assert_eq!(package.exclusions, vec!["Visa"]);
        assert_eq!(package.review_count, 2);
        assert_eq!(package.rating, Some(4.5));

        assert_eq!(plan.duplicates.len(), 1);
        assert_eq!(plan.duplicates[0].destination_id, "DXB002");
        assert_eq!(plan.duplicates[0].row, Some(3));

        let rejected_rows: Vec<usize> = plan.rejected.iter().map(|r| r.row).collect();
        assert_eq!(rejected_rows, vec![4, 5, 6]);

        assert_eq!(plan.orphan_rows, 2);
    }

    #[test]
    fn every_row_of_a_stored_id_is_a_duplicate() {
        let workbook = Workbook::from_json(&json!({
            "Packages_Master": [
                {"Destination_ID": "DXB1", "Title": "Dubai"},
                {"Destination_ID": "dxb1", "Title": "Dubai again"}
            ]
        }))
        .unwrap();
        let existing = HashSet::from(["DXB1".to_string()]);
        let plan = plan_workbook(&workbook, &existing, "USD").unwrap();

        assert!(plan.new_packages.is_empty());
        assert!(plan.rejected.is_empty());
        let rows: Vec<Option<usize>> = plan.duplicates.iter().map(|d| d.row).collect();
        assert_eq!(rows, vec![Some(2), Some(3)]);

        let packages = vec![
            Package {
                destination_id: "DXB1".into(),
                title: "Dubai".into(),
                ..Package::default()
            },
            Package {
                destination_id: " dxb1".into(),
                title: "Dubai again".into(),
                ..Package::default()
            },
        ];
        let plan = plan_packages(packages, &existing);
        assert_eq!(plan.duplicates.len(), 2);
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn lowercase_headers_still_classify() {
        let workbook = Workbook::from_json(&json!({
            "packages_master": [{"destination_id": "goa7", "title": "Goa Beaches", "price": 450}]
        }))
        .unwrap();
        let plan = plan_workbook(&workbook, &HashSet::new(), "USD").unwrap();
        assert_eq!(plan.new_packages.len(), 1);
        assert!(plan.rejected.is_empty());
        assert_eq!(plan.new_packages[0].1.price, 450.0);
    }

    #[test]
    fn missing_master_sheet_is_an_error() {
        let workbook = Workbook::from_json(&json!({"Itinerary": []})).unwrap();
        let err = plan_workbook(&workbook, &HashSet::new(), "USD").unwrap_err();
        assert!(matches!(err, ImportError::MissingSheet(PACKAGES)));
    }

    #[test]
    fn package_list_plan_normalizes_ids() {
        let packages = vec![
            Package {
                destination_id: " mle001".into(),
                title: "Maldives".into(),
                ..Package::default()
            },
            Package {
                destination_id: "MLE001".into(),
                title: "Maldives again".into(),
                ..Package::default()
            },
            Package {
                destination_id: "goa01".into(),
                title: "Goa".into(),
                ..Package::default()
            },
        ];
        let existing = HashSet::from(["GOA01".to_string()]);
        let plan = plan_packages(packages, &existing);

        assert_eq!(plan.new_packages.len(), 1);
        assert_eq!(plan.new_packages[0].1.destination_id, "MLE001");
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.duplicates[0].destination_id, "GOA01");
    }

    #[tokio::test]
    async fn commit_writes_new_packages_only() {
        let repo: Repository<Package> = Repository::new(Arc::new(InMemoryStore::new()));
        repo.create(Package {
            destination_id: "dxb002".into(),
            title: "Stored".into(),
            ..Package::default()
        })
        .await
        .unwrap();

        let stored = repo.list().await.unwrap();
        let plan = plan_workbook(&workbook(), &existing_ids(&stored), "USD").unwrap();
        let report = commit(&repo, plan).await;

        assert_eq!(report.created.len(), 1);
        assert!(report.failed.is_empty());
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(report.created[0].destination_id, "DXB001");
    }
}

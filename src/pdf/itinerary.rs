//! Composition of the customer itinerary document.

use tripdesk_kernel::settings::BrandSettings;

use super::layout::{
    line_height, Colour, FontStyle, Page, PageFlow, CONTENT_WIDTH, MARGIN, PAGE_HEIGHT, PAGE_WIDTH,
};
use crate::modules::itineraries::models::CustomerItinerary;
use crate::modules::packages::models::{BookingPolicy, Faq, Package};

const BODY: f32 = 10.0;
const SUBHEAD: f32 = 12.0;
const TITLE: f32 = 18.0;

const STANDARD_POLICIES: [(&str, &str); 3] = [
    (
        "Payment",
        "The advance confirms the booking. The balance is due before departure.",
    ),
    (
        "Cancellation",
        "Cancellation charges depend on how close to departure the trip is cancelled and on supplier terms.",
    ),
    (
        "Travel documents",
        "Travellers are responsible for valid passports, visas and insurance.",
    ),
];

fn money(amount: f64, currency: &str) -> String {
    let currency = if currency.trim().is_empty() { "USD" } else { currency.trim() };
    format!("{currency} {amount:.2}")
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value.trim()
    }
}

/// Lay out the six fixed sections. `package` supplies policies and FAQs
/// when the itinerary was built from a catalogue package.
pub fn compose(
    itinerary: &CustomerItinerary,
    package: Option<&Package>,
    brand: &BrandSettings,
) -> Vec<Page> {
    let mut flow = PageFlow::new();

    cover(&mut flow, itinerary, brand);

    flow.section();
    logistics(&mut flow, itinerary);

    flow.section();
    day_by_day(&mut flow, itinerary);

    flow.section();
    inclusions(&mut flow, itinerary);

    flow.section();
    policies(&mut flow, package);

    flow.section();
    call_to_action(&mut flow, itinerary, brand);

    flow.finish(&format!("{} | {}", brand.company_name, itinerary.reference))
}

fn cover(flow: &mut PageFlow, itinerary: &CustomerItinerary, brand: &BrandSettings) {
    flow.rect_at(0.0, 0.0, PAGE_WIDTH, 110.0, Colour::BRAND);
    flow.text_at(MARGIN, 30.0, 14.0, FontStyle::Bold, Colour::WHITE, &brand.company_name);
    flow.text_at(MARGIN, 62.0, 12.0, FontStyle::Regular, Colour::WHITE, "Travel Itinerary");
    flow.text_at(MARGIN, 78.0, 28.0, FontStyle::Bold, Colour::WHITE, or_dash(&itinerary.destination));

    let days = itinerary.day_count();
    if days > 0 {
        let nights = days.saturating_sub(1);
        let label = format!("{nights} Nights / {days} Days");
        flow.text_at(MARGIN, 92.0, 12.0, FontStyle::Regular, Colour::WHITE, &label);
    }

    flow.advance(130.0);
    flow.paragraph("Prepared for", BODY, FontStyle::Regular, Colour::MUTED, 0.0);
    flow.paragraph(or_dash(&itinerary.customer_name), TITLE, FontStyle::Bold, Colour::BLACK, 0.0);
    flow.spacer(6.0);
    flow.key_value("Reference", or_dash(&itinerary.reference), BODY);
    flow.key_value("Travel dates", &date_range(itinerary), BODY);
    flow.key_value("Status", itinerary.status.as_str(), BODY);
}

fn date_range(itinerary: &CustomerItinerary) -> String {
    match (itinerary.start_date, itinerary.end_date) {
        (Some(start), Some(end)) => format!("{} to {}", start.format("%d %b %Y"), end.format("%d %b %Y")),
        (Some(start), None) => format!("From {}", start.format("%d %b %Y")),
        _ => "To be confirmed".to_string(),
    }
}

fn logistics(flow: &mut PageFlow, itinerary: &CustomerItinerary) {
    flow.heading("Trip Logistics", TITLE);
    flow.key_value("Dates", &date_range(itinerary), BODY);
    let travelers = match itinerary.children {
        0 => format!("{} adults", itinerary.adults),
        children => format!("{} adults, {children} children", itinerary.adults),
    };
    flow.key_value("Travellers", &travelers, BODY);
    flow.key_value("Transport", or_dash(&itinerary.transport), BODY);
    flow.spacer(6.0);

    flow.paragraph("Accommodation", SUBHEAD, FontStyle::Bold, Colour::BLACK, 0.0);
    flow.spacer(2.0);
    if itinerary.hotels.is_empty() {
        flow.paragraph("Hotel details will be shared on confirmation.", BODY, FontStyle::Regular, Colour::MUTED, 0.0);
    }
    for hotel in &itinerary.hotels {
        let label = or_dash(&hotel.city).to_string();
        let mut value = format!("{} ({} nights)", or_dash(&hotel.name), hotel.nights);
        if !hotel.room_type.trim().is_empty() {
            value.push_str(&format!(", {}", hotel.room_type.trim()));
        }
        flow.key_value(&label, &value, BODY);
    }
    flow.spacer(6.0);

    let rows = 3.0 * line_height(SUBHEAD) + 8.0;
    flow.ensure(rows + line_height(SUBHEAD));
    flow.paragraph("Cost Summary", SUBHEAD, FontStyle::Bold, Colour::BLACK, 0.0);
    flow.spacer(2.0);
    let top = flow.cursor();
    flow.rect_at(MARGIN, top, CONTENT_WIDTH, rows, Colour::PANEL);
    flow.spacer(4.0);
    flow.key_value("Total cost", &money(itinerary.total_cost, &itinerary.currency), SUBHEAD);
    flow.key_value("Advance paid", &money(itinerary.advance_paid, &itinerary.currency), SUBHEAD);
    flow.key_value("Balance due", &money(itinerary.balance_due, &itinerary.currency), SUBHEAD);
}

fn day_by_day(flow: &mut PageFlow, itinerary: &CustomerItinerary) {
    flow.heading("Day-by-Day Itinerary", TITLE);
    if itinerary.days.is_empty() {
        flow.paragraph("The detailed day plan will follow.", BODY, FontStyle::Regular, Colour::MUTED, 0.0);
        return;
    }

    for day in &itinerary.days {
        flow.ensure(line_height(SUBHEAD) + 2.0 * line_height(BODY));
        let title = format!("Day {}: {}", day.day, or_dash(&day.title));
        flow.paragraph(&title, SUBHEAD, FontStyle::Bold, Colour::BRAND, 0.0);
        if !day.description.trim().is_empty() {
            flow.paragraph(&day.description, BODY, FontStyle::Regular, Colour::BLACK, 0.0);
        }
        let mut extras = Vec::new();
        if !day.meals.trim().is_empty() {
            extras.push(format!("Meals: {}", day.meals.trim()));
        }
        if !day.accommodation.trim().is_empty() {
            extras.push(format!("Stay: {}", day.accommodation.trim()));
        }
        if !extras.is_empty() {
            flow.paragraph(&extras.join("   "), 9.0, FontStyle::Regular, Colour::MUTED, 0.0);
        }
        flow.spacer(4.0);
    }
}

fn inclusions(flow: &mut PageFlow, itinerary: &CustomerItinerary) {
    flow.heading("Inclusions & Exclusions", TITLE);
    flow.paragraph("Included", SUBHEAD, FontStyle::Bold, Colour::BLACK, 0.0);
    flow.spacer(1.0);
    if itinerary.inclusions.is_empty() {
        flow.paragraph("As discussed with your travel consultant.", BODY, FontStyle::Regular, Colour::MUTED, 0.0);
    }
    flow.bullets(&itinerary.inclusions, BODY);
    flow.spacer(6.0);

    flow.paragraph("Not included", SUBHEAD, FontStyle::Bold, Colour::BLACK, 0.0);
    flow.spacer(1.0);
    if itinerary.exclusions.is_empty() {
        flow.paragraph("Anything not listed as included.", BODY, FontStyle::Regular, Colour::MUTED, 0.0);
    }
    flow.bullets(&itinerary.exclusions, BODY);
}

fn policies(flow: &mut PageFlow, package: Option<&Package>) {
    flow.heading("Policies & FAQ", TITLE);

    let package_policies: &[BookingPolicy] = package.map(|p| p.booking_policies.as_slice()).unwrap_or(&[]);
    if package_policies.is_empty() {
        for (kind, text) in STANDARD_POLICIES {
            flow.paragraph(kind, SUBHEAD, FontStyle::Bold, Colour::BLACK, 0.0);
            flow.paragraph(text, BODY, FontStyle::Regular, Colour::BLACK, 0.0);
            flow.spacer(3.0);
        }
    }
    for policy in package_policies {
        flow.paragraph(or_dash(&policy.policy_type), SUBHEAD, FontStyle::Bold, Colour::BLACK, 0.0);
        flow.paragraph(&policy.description, BODY, FontStyle::Regular, Colour::BLACK, 0.0);
        flow.spacer(3.0);
    }
    if let Some(cancellation) = package
        .map(|p| p.cancellation_policy.trim())
        .filter(|text| !text.is_empty())
    {
        flow.paragraph("Cancellation", SUBHEAD, FontStyle::Bold, Colour::BLACK, 0.0);
        flow.paragraph(cancellation, BODY, FontStyle::Regular, Colour::BLACK, 0.0);
        flow.spacer(3.0);
    }

    let faqs: &[Faq] = package.map(|p| p.faqs.as_slice()).unwrap_or(&[]);
    if !faqs.is_empty() {
        flow.spacer(4.0);
        flow.paragraph("Frequently Asked Questions", SUBHEAD, FontStyle::Bold, Colour::BRAND, 0.0);
        flow.spacer(2.0);
    }
    for faq in faqs {
        flow.ensure(2.0 * line_height(BODY));
        flow.paragraph(&format!("Q. {}", faq.question), BODY, FontStyle::Bold, Colour::BLACK, 0.0);
        flow.paragraph(&format!("A. {}", faq.answer), BODY, FontStyle::Regular, Colour::BLACK, 0.0);
        flow.spacer(2.0);
    }
}

fn call_to_action(flow: &mut PageFlow, itinerary: &CustomerItinerary, brand: &BrandSettings) {
    flow.rect_at(0.0, PAGE_HEIGHT / 2.0 - 60.0, PAGE_WIDTH, 120.0, Colour::BRAND);
    flow.advance(PAGE_HEIGHT / 2.0 - 60.0 - MARGIN + 20.0);

    let white = Colour::WHITE;
    flow.paragraph("Ready to travel?", 24.0, FontStyle::Bold, white, 0.0);
    flow.spacer(4.0);
    let line = format!(
        "Confirm your trip to {} by paying the balance of {}.",
        or_dash(&itinerary.destination),
        money(itinerary.balance_due, &itinerary.currency)
    );
    flow.paragraph(&line, SUBHEAD, FontStyle::Regular, white, 0.0);
    flow.spacer(8.0);

    flow.paragraph(&brand.company_name, SUBHEAD, FontStyle::Bold, white, 0.0);
    for contact in [&brand.phone, &brand.email, &brand.website] {
        if !contact.trim().is_empty() {
            flow.paragraph(contact, BODY, FontStyle::Regular, white, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::modules::itineraries::models::HotelStay;
    use crate::modules::packages::models::ItineraryDay;

    fn brand() -> BrandSettings {
        BrandSettings {
            company_name: "TripDesk Travels".into(),
            phone: "+1 555 0100".into(),
            email: "hello@tripdesk.test".into(),
            website: String::new(),
        }
    }

    fn itinerary(days: u32) -> CustomerItinerary {
        CustomerItinerary {
            reference: "TD-0001".into(),
            customer_name: "Meera Nair".into(),
            destination: "Bali".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 5, 7),
            adults: 2,
            hotels: vec![HotelStay {
                city: "Ubud".into(),
                name: "Jungle Retreat".into(),
                nights: 3,
                room_type: "Pool villa".into(),
            }],
            days: (1..=days)
                .map(|day| ItineraryDay {
                    day,
                    title: format!("Stop {day}"),
                    description: "Temples, rice terraces and a long lunch. ".repeat(6),
                    ..ItineraryDay::default()
                })
                .collect(),
            inclusions: vec!["Breakfast".into()],
            total_cost: 3000.0,
            advance_paid: 1000.0,
            balance_due: 2000.0,
            currency: "USD".into(),
            ..CustomerItinerary::default()
        }
    }

    fn all_text(pages: &[Page]) -> Vec<String> {
        pages
            .iter()
            .flat_map(|page| page.text())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn produces_one_page_per_section_for_short_trips() {
        let pages = compose(&itinerary(3), None, &brand());
        assert_eq!(pages.len(), 6);

        let text = all_text(&pages);
        assert!(text.iter().any(|t| t == "Meera Nair"));
        assert!(text.iter().any(|t| t == "USD 2000.00"));
        assert!(text.iter().any(|t| t == "Day 3: Stop 3"));
        assert!(text.iter().any(|t| t == "Page 6 of 6"));
        assert!(text.iter().any(|t| t == "Payment"));
    }

    #[test]
    fn long_day_plans_spill_across_pages() {
        let pages = compose(&itinerary(25), None, &brand());
        assert!(pages.len() > 6);
        let text = all_text(&pages);
        assert!(text.iter().any(|t| t == "Day 25: Stop 25"));
    }

    #[test]
    fn package_policies_replace_standard_terms() {
        let package = Package {
            booking_policies: vec![BookingPolicy {
                policy_type: "Refunds".into(),
                description: "Refunds within 14 days.".into(),
            }],
            faqs: vec![Faq {
                question: "Is a visa needed?".into(),
                answer: "Visa on arrival.".into(),
            }],
            ..Package::default()
        };
        let pages = compose(&itinerary(2), Some(&package), &brand());
        let text = all_text(&pages);
        assert!(text.iter().any(|t| t == "Refunds"));
        assert!(text.iter().any(|t| t == "Q. Is a visa needed?"));
        assert!(!text.iter().any(|t| t == "Payment"));
    }
}

//! Customer itinerary PDFs.
//!
//! [`itinerary::compose`] lays the document out as pages of draw operations;
//! [`render::render`] turns those pages into PDF bytes.

pub mod itinerary;
pub mod layout;
pub mod render;

use tripdesk_kernel::settings::BrandSettings;

use crate::modules::itineraries::models::CustomerItinerary;
use crate::modules::packages::models::Package;
pub use render::PdfError;

/// Compose and render in one step.
pub fn itinerary_pdf(
    itinerary: &CustomerItinerary,
    package: Option<&Package>,
    brand: &BrandSettings,
) -> Result<Vec<u8>, PdfError> {
    let pages = itinerary::compose(itinerary, package, brand);
    let title = format!("{} itinerary {}", brand.company_name, itinerary.reference);
    render::render(title.trim(), &pages)
}

/// `itinerary-<reference>.pdf`, restricted to filename-safe characters.
pub fn file_name(itinerary: &CustomerItinerary) -> String {
    let key = if itinerary.reference.trim().is_empty() {
        itinerary.id.as_str()
    } else {
        itinerary.reference.trim()
    };
    let safe: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    format!("itinerary-{safe}.pdf")
}

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tripdesk(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tripdesk").unwrap();
    cmd.env("TRIPDESK_CONFIG_DIR", config_dir.path())
        .env("TRIPDESK_ENV", "local")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn import_previews_a_json_workbook() {
    let dir = TempDir::new().unwrap();
    let workbook = dir.path().join("packages.json");
    fs::write(
        &workbook,
        r#"{
            "Destinations": [{"Destination_Code": "DXB", "Destination_Name": "Dubai", "Country": "UAE"}],
            "Packages_Master": [
                {"Destination_ID": "dxb001", "Title": "Dubai Escape", "Duration_Days": 5, "Price": 1299},
                {"Destination_ID": "DXB001", "Title": "Repeated", "Duration_Days": 3, "Price": 899},
                {"Destination_ID": "", "Title": "No id"}
            ],
            "Itinerary": [{"Destination_ID": "DXB001", "Day": 1, "Title": "Arrival"}]
        }"#,
    )
    .unwrap();

    tripdesk(&dir)
        .arg("import")
        .arg(&workbook)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"new_count\": 1"))
        .stdout(predicate::str::contains("\"rejected_count\": 2"))
        .stdout(predicate::str::contains("DXB001"));
}

#[test]
fn import_rejects_unreadable_files() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("bogus.xlsx");
    fs::write(&bogus, b"not a spreadsheet").unwrap();

    tripdesk(&dir)
        .arg("import")
        .arg(&bogus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("spreadsheet"));
}

#[test]
fn renders_an_itinerary_to_pdf() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("trip.json");
    let output = dir.path().join("trip.pdf");
    fs::write(
        &input,
        r#"{
            "reference": "TD-20260101-ABC123",
            "customer_name": "Asha Rao",
            "customer_email": "asha@example.com",
            "destination": "Bali",
            "start_date": "2026-03-01",
            "end_date": "2026-03-03",
            "adults": 2,
            "days": [
                {"day": 1, "title": "Arrival", "description": "Transfer to Ubud."},
                {"day": 2, "title": "Temples", "description": "Tanah Lot at sunset."}
            ],
            "total_cost": 2400,
            "advance_paid": 600
        }"#,
    )
    .unwrap();

    tripdesk(&dir)
        .arg("render-itinerary")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn lists_module_collections() {
    let dir = TempDir::new().unwrap();

    tripdesk(&dir)
        .arg("collections")
        .assert()
        .success()
        .stdout(predicate::str::contains("packages\tpackages"))
        .stdout(predicate::str::contains("customer_itineraries"))
        .stdout(predicate::str::contains("users"));
}

//! Content hashes decide whether a product embedding is recomputed.

use materials_core::common::utils::generate_content_hash;

#[test]
fn identical_text_produces_same_hash() {
    let text1 = "Frontrock MAX E\nManufacturer: ROCKWOOL";
    let text2 = "Frontrock MAX E\nManufacturer: ROCKWOOL";

    assert_eq!(generate_content_hash(text1), generate_content_hash(text2));
}

#[test]
fn case_insensitive_hash() {
    let text1 = "Kőzetgyapot Homlokzati Hőszigetelő Lemez";
    let text2 = "KŐZETGYAPOT HOMLOKZATI HŐSZIGETELŐ LEMEZ";

    assert_eq!(generate_content_hash(text1), generate_content_hash(text2));
}

#[test]
fn punctuation_and_whitespace_ignored() {
    let text1 = "Bulk density: 90 kg/m³";
    let text2 = "Bulk   density  90 kg m³";

    assert_eq!(generate_content_hash(text1), generate_content_hash(text2));
}

#[test]
fn changed_spec_value_changes_hash() {
    let text1 = "Thermal conductivity (λ): 0.036 W/(m·K)";
    let text2 = "Thermal conductivity (λ): 0.035 W/(m·K)";

    assert_ne!(generate_content_hash(text1), generate_content_hash(text2));
}

#[test]
fn negative_temperature_changes_hash() {
    let text1 = "Service temperature: -20 °C to 80 °C";
    let text2 = "Service temperature: 20 °C to 80 °C";

    assert_ne!(generate_content_hash(text1), generate_content_hash(text2));
}

#[test]
fn hash_format_is_valid() {
    let hash = generate_content_hash("Baumit StarContact");

    // SHA256 hash should be 64 hex characters
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

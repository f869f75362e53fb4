use cosmic_launch_game::{Catalog, CatalogError, Credits, DestinationId, GameConfig};

#[test]
fn stock_catalog_matches_published_table() {
    let catalog = Catalog::standard();
    let rows: Vec<_> = catalog
        .list()
        .iter()
        .map(|d| (d.id, d.strike_probability, d.payout_multiplier))
        .collect();
    assert_eq!(
        rows,
        vec![
            (DestinationId::Mercury, 0.70, 0.05),
            (DestinationId::Venus, 0.60, 0.10),
            (DestinationId::Earth, 0.50, 0.20),
            (DestinationId::Mars, 0.40, 0.15),
            (DestinationId::Jupiter, 0.02, 5.0),
            (DestinationId::Saturn, 0.05, 3.0),
            (DestinationId::Uranus, 0.10, 1.5),
            (DestinationId::Neptune, 0.07, 2.5),
        ]
    );
}

#[test]
fn profit_labels_agree_with_multipliers() {
    for dest in Catalog::standard().list() {
        let label = format!("{:.2}x", 1.0 + dest.payout_multiplier);
        assert_eq!(dest.profit_label, label, "{}", dest.id);
        assert!(!dest.tagline.is_empty());
    }
}

#[test]
fn catalog_serializes_as_lowercase_array_and_back() {
    let catalog = Catalog::standard();
    let json = serde_json::to_string(&catalog).unwrap();
    assert!(json.starts_with('['));
    assert!(json.contains(r#""id":"neptune""#));
    let parsed: Catalog = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, catalog);
}

#[test]
fn deserializing_an_invalid_catalog_fails() {
    let dup = r#"[
        {"id": "earth", "strike_probability": 0.5, "payout_multiplier": 0.2},
        {"id": "earth", "strike_probability": 0.4, "payout_multiplier": 0.3}
    ]"#;
    assert_eq!(
        Catalog::from_json(dup),
        Err(CatalogError::DuplicateId(DestinationId::Earth))
    );
    assert!(serde_json::from_str::<Catalog>(dup).is_err());
    assert_eq!(Catalog::from_json("[]"), Err(CatalogError::Empty));
}

#[test]
fn names_parse_case_insensitively() {
    assert_eq!("  SATURN ".parse::<DestinationId>(), Ok(DestinationId::Saturn));
    assert_eq!(
        "pluto".parse::<DestinationId>(),
        Err(CatalogError::UnknownName("pluto".to_string()))
    );
}

#[test]
fn config_json_shape_round_trips() {
    let cfg = GameConfig::default();
    let json = serde_json::to_value(&cfg).unwrap();
    assert_eq!(json["starting_balance"], 100_000);
    assert_eq!(json["timings"]["settle_ms"], 1_200);
    let back: GameConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, cfg);
    assert_eq!(back.bet_options[0], Credits::from_whole(10));
}

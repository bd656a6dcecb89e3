use super::{treatment_marker, Catalog, CatalogError, PestEntry, PestList, NO_PEST};

fn recommendation<'c>(
    catalog: &'c Catalog,
    crop: &str,
    pest: &str,
) -> Result<&'c str, CatalogError> {
    let (_, entry) = catalog.resolve(crop, pest)?;
    Ok(entry.recommendation.as_str())
}

fn pest(name: &str, recommendation: &str) -> PestEntry {
    PestEntry {
        name: name.to_string(),
        recommendation: recommendation.to_string(),
    }
}

#[test]
fn builtin_catalog_lists_crops_in_authored_order() {
    let catalog = Catalog::load().expect("builtin catalog should load");
    let crops = catalog.crop_names().collect::<Vec<_>>();
    assert_eq!(crops, vec!["Naranjos", "Aguacates", "Cafetos"]);
    assert_eq!(catalog.default_crop().name, "Naranjos");
}

#[test]
fn every_crop_offers_no_pest_first_with_empty_recommendation() {
    let catalog = Catalog::load().expect("builtin catalog should load");
    for crop in catalog.crops() {
        let first = crop.pests.first();
        assert_eq!(first.name, NO_PEST, "crop {}", crop.name);
        assert!(first.recommendation.is_empty(), "crop {}", crop.name);
        assert_eq!(crop.pests.names().next(), Some(NO_PEST));
        assert_eq!(
            crop.pests.names().filter(|name| *name == NO_PEST).count(),
            1
        );
        assert_eq!(
            recommendation(&catalog, &crop.name, NO_PEST).expect("sentinel should resolve"),
            ""
        );
    }
}

#[test]
fn every_pest_recommendation_is_tagged_with_its_crop() {
    let catalog = Catalog::load().expect("builtin catalog should load");
    for crop in catalog.crops() {
        let marker = format!("TRATAMIENTO {}:", crop.name.to_uppercase());
        for entry in crop.pests.iter().filter(|entry| !entry.is_none()) {
            let text =
                recommendation(&catalog, &crop.name, &entry.name).expect("pest should resolve");
            assert!(!text.is_empty());
            assert!(text.starts_with(&marker), "{} / {}", crop.name, entry.name);
        }
    }
}

#[test]
fn pest_lists_are_scoped_to_their_crop() {
    let catalog = Catalog::load().expect("builtin catalog should load");
    assert!(catalog.contains("Naranjos", "Piojo Rojo"));
    assert!(!catalog.contains("Aguacates", "Piojo Rojo"));

    let err = recommendation(&catalog, "Aguacates", "Piojo Rojo")
        .expect_err("pest from another crop should fail");
    assert!(matches!(err, CatalogError::UnknownPest { .. }));
    assert_eq!(
        err.to_string(),
        "unknown pest 'Piojo Rojo' for crop 'Aguacates'"
    );
}

#[test]
fn lookups_accept_loose_spelling_and_none_alias() {
    let catalog = Catalog::load().expect("builtin catalog should load");
    let (crop, entry) = catalog
        .resolve("naranjos", "mosca de la FRUTA")
        .expect("loose spelling should resolve");
    assert_eq!(crop.name, "Naranjos");
    assert_eq!(entry.name, "Mosca de la fruta");

    let (_, none) = catalog
        .resolve("Cafetos", "none")
        .expect("none alias should resolve");
    assert_eq!(none.name, NO_PEST);
}

#[test]
fn unknown_crop_is_a_typed_error() {
    let catalog = Catalog::load().expect("builtin catalog should load");
    let err = catalog
        .crop("Olivos")
        .expect_err("unknown crop should fail");
    assert!(matches!(err, CatalogError::UnknownCrop(ref crop) if crop == "Olivos"));
}

#[test]
fn pest_list_requires_sentinel_first() {
    let err = PestList::new(
        "Olivos",
        vec![
            pest("Mosca del olivo", "TRATAMIENTO OLIVOS: Spinosad."),
            pest(NO_PEST, ""),
        ],
    )
    .expect_err("sentinel must lead");
    assert!(err.to_string().contains("must list 'Ninguna' first"));

    let err = PestList::new("Olivos", Vec::new()).expect_err("empty list should fail");
    assert!(err.to_string().contains("no pest entries"));
}

#[test]
fn pest_list_rejects_sentinel_recommendation_and_duplicates() {
    let err = PestList::new("Olivos", vec![pest(NO_PEST, "algo")])
        .expect_err("sentinel recommendation should fail");
    assert!(err.to_string().contains("has a recommendation"));

    let err = PestList::new(
        "Olivos",
        vec![
            pest(NO_PEST, ""),
            pest("Repilo", "TRATAMIENTO OLIVOS: Cobre."),
            pest("repilo", "TRATAMIENTO OLIVOS: Cobre."),
        ],
    )
    .expect_err("duplicate pest should fail");
    assert!(err.to_string().contains("more than once"));
}

#[test]
fn pest_list_requires_crop_marker_on_recommendations() {
    let err = PestList::new(
        "Olivos",
        vec![pest(NO_PEST, ""), pest("Repilo", "Cobre en otoño.")],
    )
    .expect_err("untagged recommendation should fail");
    let message = err.to_string();
    assert!(message.contains("must start with 'TRATAMIENTO OLIVOS:'"));

    let err = PestList::new("Olivos", vec![pest(NO_PEST, ""), pest("Repilo", "")])
        .expect_err("empty recommendation should fail");
    assert!(err.to_string().contains("TRATAMIENTO OLIVOS:"));
}

#[test]
fn from_toml_rejects_empty_and_duplicate_crops() {
    let err = Catalog::from_toml("").expect_err("empty catalog should fail");
    assert!(err.to_string().contains("at least one crop"));

    let raw = r#"
[[crops]]
name = "Olivos"
[[crops.pests]]
name = "Ninguna"

[[crops]]
name = "olivos"
[[crops.pests]]
name = "Ninguna"
"#;
    let err = Catalog::from_toml(raw).expect_err("duplicate crop should fail");
    assert!(err.to_string().contains("duplicate crop 'olivos'"));
}

#[test]
fn from_toml_reports_parse_errors() {
    let err = Catalog::from_toml("crops = 3").expect_err("bad toml should fail");
    assert!(matches!(err, CatalogError::Toml(_)));
}

#[test]
fn treatment_marker_upper_cases_non_ascii_crops() {
    assert_eq!(treatment_marker("Limón"), "TRATAMIENTO LIMÓN:");
}

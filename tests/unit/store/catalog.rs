use super::*;

#[test]
fn builtin_catalog_has_nine_unique_products() {
    let c = Catalog::builtin();
    assert_eq!(c.len(), 9);
    assert!(Catalog::new(c.products().to_vec()).is_ok());
    let blazer = c.get("1").unwrap();
    assert_eq!(blazer.title, "Classic Black Blazer");
    assert_eq!(blazer.price, Money::from_cents(19999));
    assert!(blazer.image.starts_with("https://images.unsplash.com/"));
    assert!(c.get("10").is_none());
}

#[test]
fn categories_are_distinct_in_first_seen_order() {
    let c = Catalog::builtin();
    assert_eq!(
        c.categories(),
        vec!["Blazers", "Dresses", "Jackets", "Sweaters", "Coats"]
    );
    let dresses: Vec<&str> = c.by_category("Dresses").map(|p| p.id.as_str()).collect();
    assert_eq!(dresses, vec!["2", "6", "8"]);
}

#[test]
fn json_uses_decimal_prices_and_camel_case() {
    let json = r#"[
        {"id": "a", "title": "Tee", "price": 19.99, "description": "", "category": "Tops",
         "image": "tee.png", "sizes": ["M"]},
        {"id": "b", "title": "Cap", "price": 5, "description": "", "category": "Hats",
         "image": "cap.png"}
    ]"#;
    let c = Catalog::from_json(json).unwrap();
    assert_eq!(c.get("a").unwrap().price.cents(), 1999);
    assert_eq!(c.get("b").unwrap().price.cents(), 500);
    assert!(c.get("b").unwrap().sizes.is_empty());

    let back = serde_json::to_value(c.get("a").unwrap()).unwrap();
    assert_eq!(back["price"], serde_json::json!(19.99));
}

#[test]
fn rejects_duplicates_negative_prices_and_bad_json() {
    let dup = r#"[
        {"id": "a", "title": "x", "price": 1, "description": "", "category": "c", "image": "i"},
        {"id": "a", "title": "y", "price": 1, "description": "", "category": "c", "image": "i"}
    ]"#;
    assert!(matches!(
        Catalog::from_json(dup),
        Err(TryOnError::Validation(_))
    ));
    let neg = r#"[{"id": "a", "title": "x", "price": -1, "description": "", "category": "c", "image": "i"}]"#;
    assert!(matches!(Catalog::from_json(neg), Err(TryOnError::Serde(_))));
    assert!(matches!(Catalog::from_json("{"), Err(TryOnError::Serde(_))));
}

#[test]
fn money_formats_and_rounds() {
    assert_eq!(Money::from_cents(44999).to_string(), "$449.99");
    assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    assert_eq!(Money::from_decimal(0.1 + 0.2).unwrap().cents(), 30);
    assert!(Money::from_decimal(f64::NAN).is_err());
}

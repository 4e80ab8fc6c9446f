// src/locations/properties.rs
//! Флейворные свойства локаций. Ядро их не интерпретирует — это полезная
//! нагрузка для игровых систем.

use super::LocationKind;
use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};
use std::collections::BTreeMap;

const GOODS: [&str; 8] = [
    "furs", "salt", "tobacco", "coffee", "ammunition", "flour", "whiskey", "tools",
];
const SEASONS: [&str; 4] = ["spring", "summer", "autumn", "winter"];
const ORDERS: [&str; 3] = ["Franciscan", "Jesuit", "Dominican"];

pub fn flavor_properties(kind: LocationKind, rng: &mut impl Rng) -> BTreeMap<String, Value> {
    let mut props = BTreeMap::new();
    match kind {
        LocationKind::Town => {
            props.insert("population".into(), json!(rng.gen_range(150..2500)));
            props.insert("has_sheriff".into(), json!(rng.gen_bool(0.6)));
            props.insert("has_bank".into(), json!(rng.gen_bool(0.3)));
        }
        LocationKind::Fort => {
            props.insert("garrison".into(), json!(rng.gen_range(20..150)));
            props.insert("cannons".into(), json!(rng.gen_range(0..6)));
        }
        LocationKind::TradingPost => {
            let goods: Vec<&str> = GOODS.choose_multiple(rng, 3).copied().collect();
            props.insert("goods".into(), json!(goods));
            props.insert("price_modifier".into(), json!(rng.gen_range(80..130)));
        }
        LocationKind::Mission => {
            props.insert("order".into(), json!(ORDERS.choose(rng).copied().unwrap_or("Franciscan")));
            props.insert("converts".into(), json!(rng.gen_range(10..300)));
            props.insert("has_infirmary".into(), json!(rng.gen_bool(0.5)));
        }
        LocationKind::Roadhouse => {
            props.insert("beds".into(), json!(rng.gen_range(2..16)));
            props.insert("stables".into(), json!(rng.gen_bool(0.7)));
        }
        LocationKind::Cave => {
            props.insert("depth".into(), json!(rng.gen_range(1..6)));
            props.insert("danger".into(), json!(rng.gen_range(1..=5)));
            props.insert("has_water".into(), json!(rng.gen_bool(0.25)));
        }
        LocationKind::CaravanCamp => {
            props.insert("wagons".into(), json!(rng.gen_range(3..20)));
            props.insert("season".into(), json!(SEASONS.choose(rng).copied().unwrap_or("summer")));
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn every_kind_gets_properties() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for kind in LocationKind::ORDER {
            assert!(!flavor_properties(kind, &mut rng).is_empty(), "{kind} has no properties");
        }
    }

    #[test]
    fn trading_post_goods_are_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let props = flavor_properties(LocationKind::TradingPost, &mut rng);
        let goods = props["goods"].as_array().expect("goods array");
        assert_eq!(goods.len(), 3);
        assert_ne!(goods[0], goods[1]);
        assert_ne!(goods[1], goods[2]);
        assert_ne!(goods[0], goods[2]);
    }
}

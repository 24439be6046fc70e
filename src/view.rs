//! Plain-text rendering of the dashboard and of a single plant.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::models::Plant;

/// One block per plant, in the order given (the store lists newest first).
/// Status is recomputed from `now` on every call.
pub fn dashboard(plants: &[Plant], now: DateTime<Utc>) -> String {
    if plants.is_empty() {
        return "No se encontraron plantas\n".to_string();
    }
    let mut out = String::new();
    for plant in plants {
        let status = plant.watering_status(now);
        let marker = if status.is_urgent() { "!!" } else { "  " };
        let _ = writeln!(out, "{} {} ({})", marker, plant.name, plant.scientific_name);
        let _ = writeln!(out, "   {}", status.message());
        let _ = writeln!(out, "   ID: {}", plant_id(plant));
    }
    out
}

pub fn plant_ids(plants: &[Plant]) -> String {
    plants
        .iter()
        .map(|p| format!("{}, '{}'\n", plant_id(p), p.name))
        .collect()
}

pub fn detail(plant: &Plant, now: DateTime<Utc>) -> String {
    let status = plant.watering_status(now);
    let mut out = String::new();
    let _ = writeln!(out, "Nombre: '{}'", plant.name);
    let _ = writeln!(out, "Nombre científico: '{}'", plant.scientific_name);
    let _ = writeln!(out, "Familia: '{}'", plant.family);
    let _ = writeln!(out, "Imagen: {}", plant.image.as_deref().unwrap_or("-"));
    match plant.watering_interval {
        Some(days) => {
            let _ = writeln!(out, "Riego cada: {} días", days);
        }
        None => {
            let _ = writeln!(out, "Riego cada: -");
        }
    }
    if let Some(last) = plant.last_watered {
        let _ = writeln!(out, "Último riego: {}", last.to_rfc3339());
    }
    let _ = writeln!(out, "Estado: {}{}", status.message(), if status.is_urgent() { " (urgente)" } else { "" });
    let _ = writeln!(out, "ID: '{}'", plant_id(plant));

    let _ = writeln!(out, "Consejos:");
    if !plant.has_advice() {
        let _ = writeln!(out, "  Sin información adicional.");
    }
    for (label, value) in [
        ("Sol", &plant.sunlight),
        ("Suelo", &plant.soil),
        ("Cosecha", &plant.harvest),
        ("Notas", &plant.notes),
    ] {
        if let Some(value) = value {
            let _ = writeln!(out, "  {}: {}", label, value);
        }
    }
    out
}

fn plant_id(plant: &Plant) -> String {
    plant.id.map(|id| id.to_hex()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use mongodb::bson::oid::ObjectId;

    use super::*;

    fn plant(name: &str, interval: Option<u32>, last: Option<DateTime<Utc>>) -> Plant {
        Plant {
            id: Some(ObjectId::new()),
            user_id: "ana".into(),
            name: name.into(),
            scientific_name: "Ocimum basilicum".into(),
            family: "Lamiaceae".into(),
            image: None,
            watering_interval: interval,
            last_watered: last,
            sunlight: None,
            soil: None,
            harvest: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn dashboard_marks_urgent_plants() {
        let now = Utc.with_ymd_and_hms(2026, 5, 10, 8, 0, 0).unwrap();
        let plants = vec![
            plant("Albahaca", Some(2), Some(now - Duration::days(3))),
            plant("Cactus", Some(10), Some(now - Duration::days(1))),
            plant("Sin datos", None, None),
        ];
        let out = dashboard(&plants, now);
        assert!(out.contains("!! Albahaca"));
        assert!(out.contains("¡Regar hoy!"));
        assert!(out.contains("   Cactus"));
        assert!(out.contains("Próximo riego: 2026-05-19"));
        assert!(out.contains("Información faltante"));
    }

    #[test]
    fn empty_dashboard() {
        assert_eq!(dashboard(&[], Utc::now()), "No se encontraron plantas\n");
    }

    #[test]
    fn detail_lists_advice_or_placeholder() {
        let now = Utc::now();
        let mut p = plant("Albahaca", Some(5), Some(now));
        assert!(detail(&p, now).contains("Sin información adicional."));

        p.sunlight = Some("8".into());
        p.notes = Some("Pellizcar las flores".into());
        let out = detail(&p, now);
        assert!(out.contains("  Sol: 8"));
        assert!(out.contains("  Notas: Pellizcar las flores"));
        assert!(!out.contains("Suelo"));
        assert!(!out.contains("Sin información adicional."));
    }

    #[test]
    fn ids_listing() {
        let p = plant("Menta", None, None);
        assert_eq!(plant_ids(&[p.clone()]), format!("{}, 'Menta'\n", p.id.unwrap().to_hex()));
    }
}

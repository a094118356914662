//! Category catalog.
//!
//! A read-only table built once at startup and shared behind an `Arc`. It only
//! decorates alert responses and validates the category key of new alerts.

use serde::Serialize;

/// One entry of the catalog, with its stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub key: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
}

impl Category {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    entries: Vec<Category>,
}

impl CategoryCatalog {
    /// Builds a catalog from explicit entries. Later duplicates of a key are dropped.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Category>,
    {
        let mut unique: Vec<Category> = Vec::new();
        for entry in entries {
            if !unique.iter().any(|existing| existing.key == entry.key) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    /// The categories shipped with the service.
    pub fn builtin() -> Self {
        Self::new([
            Category::new(
                "traffic_accident",
                "Accidente de tráfico",
                "Colisiones vehiculares, choques, volcamientos",
                "car_crash",
                "#DC2626",
            ),
            Category::new(
                "road_closure",
                "Cierre de vía",
                "Vías cerradas temporalmente por construcción o eventos",
                "remove_road",
                "#EA580C",
            ),
            Category::new(
                "traffic_jam",
                "Congestión vehicular",
                "Tráfico lento o detenido",
                "traffic_jam",
                "#F59E0B",
            ),
            Category::new(
                "road_hazard",
                "Peligro en la vía",
                "Obstáculos, baches, derrumbes, objetos en la vía",
                "warning",
                "#EAB308",
            ),
            Category::new(
                "flooding",
                "Inundación",
                "Vías inundadas o con acumulación de agua",
                "flood",
                "#06B6D4",
            ),
            Category::new(
                "construction",
                "Obra en construcción",
                "Trabajos de construcción o mantenimiento vial",
                "construction",
                "#6B7280",
            ),
            Category::new(
                "police",
                "Presencia policial",
                "Controles policiales, retenes",
                "local_police",
                "#3B82F6",
            ),
            Category::new(
                "emergency",
                "Emergencia",
                "Ambulancias, bomberos, situaciones de emergencia",
                "e911_emergency",
                "#EF4444",
            ),
            Category::new(
                "public_event",
                "Evento público",
                "Manifestaciones, eventos deportivos, conciertos",
                "event",
                "#8B5CF6",
            ),
            Category::new(
                "other",
                "Otro",
                "Otras situaciones no categorizadas",
                "other_admissions",
                "#64748B",
            ),
        ])
    }

    pub fn get(&self, key: &str) -> Option<&Category> {
        self.entries.iter().find(|category| category.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All categories in declaration order.
    pub fn all(&self) -> &[Category] {
        &self.entries
    }

    /// `(key, name)` pairs suitable for select inputs.
    pub fn choices(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|category| (category.key.as_str(), category.name.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

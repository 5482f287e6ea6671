use serde::Serialize;
use sqlx::FromRow;
use std::collections::BTreeMap;

/// Asset row returned from point lookups on the image table
///
/// Every column is nullable in the table; callers decide whether a row with
/// missing content or filename is usable.
#[derive(Debug, Clone, Default, FromRow)]
pub struct AssetRow {
    pub content: Option<Vec<u8>>,
    pub filename: Option<String>,
    pub klassifikation_1: Option<String>,
    pub klassifikation_2: Option<String>,
    /// ISO 8601 rendering of the assignment date, e.g. `2024-03-01T09:30:00`
    pub datum_zuord_ok: Option<String>,
    pub final_cnt_fk_inp_belege_all: Option<i64>,
    pub final_cnt_fk_kon_person: Option<i64>,
}

impl AssetRow {
    /// Classification columns as a JSON-ready map, skipping NULLs
    pub fn metadata(&self) -> BTreeMap<String, serde_json::Value> {
        let mut map = BTreeMap::new();
        let mut put = |key: &str, value: Option<serde_json::Value>| {
            if let Some(v) = value {
                map.insert(key.to_string(), v);
            }
        };
        put("klassifikation1", self.klassifikation_1.clone().map(Into::into));
        put("klassifikation2", self.klassifikation_2.clone().map(Into::into));
        put("datum_zuord_ok", self.datum_zuord_ok.clone().map(Into::into));
        put(
            "final_cnt_fk_inp_belege_all",
            self.final_cnt_fk_inp_belege_all.map(Into::into),
        );
        put(
            "final_cnt_fk_kon_person",
            self.final_cnt_fk_kon_person.map(Into::into),
        );
        map
    }
}

/// Parameters for inserting a new image
#[derive(Debug, Clone)]
pub struct InsertAssetParams {
    pub content: Vec<u8>,
    pub filename: String,
    pub klassifikation_1: String,
    pub klassifikation_2: String,
}

/// Identity of a freshly inserted image
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InsertedAsset {
    pub id: i64,
    pub filename: String,
}

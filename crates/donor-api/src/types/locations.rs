//! Wilaya and commune payloads.

use donor_core::{Commune, CommuneDetails, Wilaya};
use serde::Deserialize;

use super::common::{non_blank, IdValue, NamedRef};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WilayaDto {
    pub id: IdValue,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub wilaya_name: Option<String>,
    #[serde(default)]
    pub code: Option<IdValue>,
}

impl WilayaDto {
    pub fn into_wilaya(self) -> Result<Wilaya, String> {
        let id = self
            .id
            .as_i64()
            .ok_or_else(|| "wilaya id is not numeric".to_string())?;
        let name = non_blank(self.name)
            .or_else(|| non_blank(self.wilaya_name))
            .ok_or_else(|| format!("wilaya {} has no name", id))?;
        Ok(Wilaya {
            id,
            name,
            code: self.code.and_then(IdValue::into_string),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommuneDto {
    pub id: IdValue,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub commune_name: Option<String>,
    #[serde(default)]
    pub wilaya_id: Option<IdValue>,
    #[serde(default)]
    pub wilaya: Option<NamedRef>,
}

impl CommuneDto {
    fn parts(self) -> Result<(i64, String, Option<i64>, Option<String>), String> {
        let id = self
            .id
            .as_i64()
            .ok_or_else(|| "commune id is not numeric".to_string())?;
        let name = non_blank(self.name)
            .or_else(|| non_blank(self.commune_name))
            .ok_or_else(|| format!("commune {} has no name", id))?;
        let wilaya_id = self
            .wilaya_id
            .as_ref()
            .and_then(IdValue::as_i64)
            .or_else(|| self.wilaya.as_ref().and_then(NamedRef::id));
        let wilaya_name = self.wilaya.as_ref().and_then(NamedRef::name);
        Ok((id, name, wilaya_id, wilaya_name))
    }

    /// Convert a listing entry; `wilaya_id` is the wilaya that was queried
    /// and fills in when the entry omits it.
    pub fn into_commune(self, wilaya_id: i64) -> Result<Commune, String> {
        let (id, name, own_wilaya, _) = self.parts()?;
        Ok(Commune {
            id,
            name,
            wilaya_id: own_wilaya.unwrap_or(wilaya_id),
        })
    }

    pub fn into_details(self) -> Result<CommuneDetails, String> {
        let (id, name, wilaya_id, wilaya_name) = self.parts()?;
        let wilaya_id = wilaya_id.ok_or_else(|| format!("commune {} has no wilaya", id))?;
        Ok(CommuneDetails {
            id,
            name,
            wilaya_id,
            wilaya_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wilaya_code_as_number() {
        let dto: WilayaDto =
            serde_json::from_value(json!({"id": "16", "name": "Alger", "code": 16})).unwrap();
        let wilaya = dto.into_wilaya().unwrap();
        assert_eq!(wilaya.id, 16);
        assert_eq!(wilaya.code.as_deref(), Some("16"));
    }

    #[test]
    fn test_commune_details_with_embedded_wilaya() {
        let dto: CommuneDto = serde_json::from_value(json!({
            "id": 3101,
            "name": "Oran",
            "wilaya": {"id": 31, "name": "Oran"}
        }))
        .unwrap();
        let details = dto.into_details().unwrap();
        assert_eq!(details.wilaya_id, 31);
        assert_eq!(details.wilaya_name.as_deref(), Some("Oran"));
    }

    #[test]
    fn test_commune_details_needs_wilaya() {
        let dto: CommuneDto = serde_json::from_value(json!({"id": 1, "name": "X"})).unwrap();
        assert!(dto.into_details().is_err());
    }

    #[test]
    fn test_listing_entry_inherits_wilaya() {
        let dto: CommuneDto = serde_json::from_value(json!({"id": 1601, "name": "Bab El Oued"})).unwrap();
        assert_eq!(dto.into_commune(16).unwrap().wilaya_id, 16);
    }
}

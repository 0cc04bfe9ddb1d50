//! User listing records.

use donor_core::{CommuneRef, UserRecord};
use serde::Deserialize;
use serde_json::Value;

use super::common::{blood_type, date, first_id, non_blank, IdValue, NamedRef};

/// Pagination for `GET /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl UserQuery {
    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        pairs
    }
}

/// A record from `GET /users` as sent.
///
/// Identity keys (`id`, `userId`, `_id`) and profile keys appear under
/// several names; each is kept separately and resolved in
/// [`UserDto::into_record`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDto {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default)]
    pub user_id: Option<IdValue>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<IdValue>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, rename = "donorNIN")]
    pub donor_nin: Option<String>,
    #[serde(default)]
    pub donor_tel: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub blood_type: Option<Value>,
    #[serde(default)]
    pub donor_blood_type: Option<Value>,
    #[serde(default)]
    pub wilaya_id: Option<IdValue>,
    #[serde(default)]
    pub wilaya: Option<NamedRef>,
    #[serde(default)]
    pub commune_id: Option<IdValue>,
    #[serde(default)]
    pub commune: Option<NamedRef>,
    #[serde(default)]
    pub donor_birth_date: Option<String>,
    #[serde(default)]
    pub donor_last_donation_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub donor_notes: Option<String>,
}

impl UserDto {
    pub fn into_record(self) -> Result<UserRecord, String> {
        let id = first_id([self.id, self.user_id, self.underscore_id])
            .ok_or_else(|| "user record without an id".to_string())?;

        let name = non_blank(self.name).or_else(|| {
            let full = [self.first_name, self.last_name]
                .into_iter()
                .flatten()
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            non_blank(Some(full))
        });

        let commune = self.commune.as_ref().and_then(|c| {
            let id = c.id().or_else(|| self.commune_id.as_ref().and_then(IdValue::as_i64))?;
            Some(CommuneRef {
                id,
                name: c.name(),
                wilaya_id: c.wilaya_id(),
            })
        });

        Ok(UserRecord {
            id,
            email: non_blank(self.email),
            name,
            national_id: non_blank(self.donor_nin.map(|nin| nin.trim().to_string())),
            phone: non_blank(self.donor_tel).or_else(|| non_blank(self.phone_number)),
            blood_type: blood_type(self.blood_type.as_ref())
                .or_else(|| blood_type(self.donor_blood_type.as_ref())),
            wilaya_id: self
                .wilaya_id
                .as_ref()
                .and_then(IdValue::as_i64)
                .or_else(|| self.wilaya.as_ref().and_then(NamedRef::id)),
            wilaya_name: self.wilaya.as_ref().and_then(NamedRef::name),
            commune_id: self
                .commune_id
                .as_ref()
                .and_then(IdValue::as_i64)
                .or_else(|| commune.as_ref().map(|c| c.id)),
            commune,
            birth_date: date(self.donor_birth_date.as_deref()),
            last_donation_date: date(self.donor_last_donation_date.as_deref()),
            notes: non_blank(self.notes).or_else(|| non_blank(self.donor_notes)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use donor_core::BloodType;
    use serde_json::json;

    #[test]
    fn test_full_record() {
        let dto: UserDto = serde_json::from_value(json!({
            "userId": "u-1",
            "email": "amina@example.com",
            "firstName": "Amina",
            "lastName": "Benali",
            "donorNIN": "123456789012345",
            "donorTel": "0551234567",
            "bloodType": 8,
            "wilaya": {"id": 16, "name": "Alger"},
            "commune": {"id": 1601, "name": "Bab El Oued", "wilayaId": 16},
            "donorBirthDate": "1995-06-01T00:00:00",
            "donorLastDonationDate": null
        }))
        .unwrap();

        let record = dto.into_record().unwrap();
        assert_eq!(record.id, "u-1");
        assert_eq!(record.name.as_deref(), Some("Amina Benali"));
        assert_eq!(record.blood_type, Some(BloodType::ONegative));
        assert_eq!(record.wilaya_id, Some(16));
        assert_eq!(record.wilaya_name.as_deref(), Some("Alger"));
        assert_eq!(record.commune_id, Some(1601));
        assert_eq!(record.commune.unwrap().wilaya_id, Some(16));
        assert_eq!(record.birth_date, NaiveDate::from_ymd_opt(1995, 6, 1));
        assert_eq!(record.last_donation_date, None);
    }

    #[test]
    fn test_commune_id_only() {
        let dto: UserDto = serde_json::from_value(json!({
            "_id": 5,
            "communeId": "3101",
            "bloodType": "A+"
        }))
        .unwrap();
        let record = dto.into_record().unwrap();
        assert_eq!(record.id, "5");
        assert_eq!(record.commune_id, Some(3101));
        assert_eq!(record.commune, None);
        assert_eq!(record.blood_type, Some(BloodType::APositive));
    }

    #[test]
    fn test_record_without_id_rejected() {
        let dto: UserDto = serde_json::from_value(json!({"email": "x@y.dz"})).unwrap();
        assert!(dto.into_record().is_err());
    }
}

//! StatusRecord <-> model mapper

use presence_core::{DomainError, StatusRecord, SubjectId};

use crate::models::StatusModel;

/// Convert StatusModel to StatusRecord; a blank subject column is rejected
impl TryFrom<StatusModel> for StatusRecord {
    type Error = DomainError;

    fn try_from(model: StatusModel) -> Result<Self, Self::Error> {
        Ok(StatusRecord {
            id: model.id,
            subject_id: SubjectId::new(model.subject_id)?,
            online: model.online,
            last_activity_at: model.last_activity_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_model_to_record() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let model = StatusModel {
            id: Uuid::new_v4(),
            subject_id: "u1".to_string(),
            online: true,
            last_activity_at: Some(at),
        };
        let id = model.id;

        let record = StatusRecord::try_from(model).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.subject_id.as_str(), "u1");
        assert!(record.online);
        assert_eq!(record.last_activity_at, Some(at));
    }

    #[test]
    fn test_blank_subject_rejected() {
        let model = StatusModel {
            id: Uuid::new_v4(),
            subject_id: "  ".to_string(),
            online: false,
            last_activity_at: None,
        };

        assert!(StatusRecord::try_from(model).unwrap_err().is_validation());
    }
}

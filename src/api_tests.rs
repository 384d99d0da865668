#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::api::{is_grid_aligned, ConditionScore, DailySession, SessionId, TimeSlot, UserId};
    use uuid::Uuid;

    #[test]
    fn test_condition_score_accepts_valid_range() {
        for value in 1..=7u8 {
            let score = ConditionScore::new(value).expect("score in range");
            assert_eq!(score.value(), value);
        }
    }

    #[test]
    fn test_condition_score_rejects_out_of_range() {
        assert!(ConditionScore::new(0).is_err());
        assert!(ConditionScore::new(8).is_err());
        assert!(ConditionScore::new(255).is_err());
    }

    #[test]
    fn test_condition_score_rejected_in_json() {
        let err = serde_json::from_str::<ConditionScore>("9");
        assert!(err.is_err());

        let score: ConditionScore = serde_json::from_str("5").unwrap();
        assert_eq!(score.value(), 5);
    }

    #[test]
    fn test_session_active_requires_start_without_end() {
        let mut session = DailySession {
            id: SessionId::random(),
            user_id: UserId::new(Uuid::new_v4()),
            date: Utc::now().date_naive(),
            start_time: None,
            end_time: None,
        };
        assert!(!session.is_active());

        session.start_time = Some(Utc::now());
        assert!(session.is_active());

        session.end_time = Some(Utc::now());
        assert!(!session.is_active());
    }

    #[test]
    fn test_grid_alignment() {
        let aligned = Utc.with_ymd_and_hms(2025, 9, 3, 9, 45, 0).unwrap();
        assert!(is_grid_aligned(aligned));

        let off_grid = Utc.with_ymd_and_hms(2025, 9, 3, 9, 46, 0).unwrap();
        assert!(!is_grid_aligned(off_grid));

        let mid_second = Utc.with_ymd_and_hms(2025, 9, 3, 9, 45, 30).unwrap();
        assert!(!is_grid_aligned(mid_second));
    }

    #[test]
    fn test_time_slot_json_round_trip() {
        let slot = TimeSlot {
            user_id: UserId::new(Uuid::new_v4()),
            session_id: SessionId::random(),
            slot_time: Utc.with_ymd_and_hms(2025, 9, 3, 10, 15, 0).unwrap(),
            activity: Some("writing".to_string()),
            condition_score: Some(ConditionScore::new(5).unwrap()),
        };

        let json = serde_json::to_string(&slot).unwrap();
        let back: TimeSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(slot, back);
    }

    #[test]
    fn test_ids_display_as_uuid() {
        let raw = Uuid::new_v4();
        assert_eq!(UserId::new(raw).to_string(), raw.to_string());
        assert_eq!(SessionId::new(raw).to_string(), raw.to_string());
    }
}

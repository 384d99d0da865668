//! Diesel schema definitions for the planner tables.

diesel::table! {
    daily_sessions (id) {
        id -> Uuid,
        user_id -> Uuid,
        date -> Date,
        start_time -> Nullable<Timestamptz>,
        end_time -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    time_slots (session_id, slot_time) {
        session_id -> Uuid,
        user_id -> Uuid,
        slot_time -> Timestamptz,
        activity -> Nullable<Text>,
        condition_score -> Nullable<Int2>,
    }
}

diesel::table! {
    push_subscriptions (user_id) {
        user_id -> Uuid,
        subscription -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(time_slots -> daily_sessions (session_id));

diesel::allow_tables_to_appear_in_same_query!(daily_sessions, time_slots, push_subscriptions);

diesel::table! {
    availability_rules (id) {
        id -> Uuid,
        owner_id -> Uuid,
        day_of_week -> SmallInt,
        start_time -> Time,
        end_time -> Time,
        duration_minutes -> Integer,
        buffer_minutes -> Integer,
        price -> Double,
        currency -> Text,
        is_active -> Bool,
    }
}

diesel::table! {
    bookings (id) {
        id -> Uuid,
        rule_id -> Uuid,
        owner_id -> Uuid,
        client_name -> Text,
        starts_at -> Timestamptz,
        duration_minutes -> Integer,
        price_at_booking -> Double,
        currency_at_booking -> Text,
        status -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(availability_rules, bookings);

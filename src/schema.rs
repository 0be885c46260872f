table! {
    category (id) {
        id -> Int4,
        name -> Varchar,
        description -> Nullable<Text>,
    }
}

table! {
    comment (id) {
        id -> Int4,
        post_id -> Int4,
        creator_id -> Int4,
        content -> Text,
        published -> Timestamp,
        updated -> Nullable<Timestamp>,
    }
}

table! {
    group_ (id) {
        id -> Int4,
        name -> Varchar,
        description -> Nullable<Text>,
        creator_id -> Int4,
        published -> Timestamp,
    }
}

table! {
    group_member (id) {
        id -> Int4,
        group_id -> Int4,
        user_id -> Int4,
        published -> Timestamp,
    }
}

table! {
    message (id) {
        id -> Int4,
        recipient_id -> Int4,
        content -> Text,
        published -> Timestamp,
    }
}

table! {
    post (id) {
        id -> Int4,
        creator_id -> Int4,
        content -> Text,
        media_url -> Nullable<Text>,
        category -> Varchar,
        score -> Int4,
        published -> Timestamp,
        updated -> Nullable<Timestamp>,
    }
}

table! {
    post_vote (id) {
        id -> Int4,
        post_id -> Int4,
        user_id -> Int4,
        score -> Int2,
        published -> Timestamp,
    }
}

table! {
    user_ (id) {
        id -> Int4,
        name -> Varchar,
        password_encrypted -> Text,
        email -> Nullable<Text>,
        verified -> Bool,
        verify_code -> Nullable<Text>,
        verify_code_expiry -> Nullable<Timestamp>,
        accept_messages -> Bool,
        published -> Timestamp,
        updated -> Nullable<Timestamp>,
    }
}

joinable!(comment -> post (post_id));
joinable!(comment -> user_ (creator_id));
joinable!(group_ -> user_ (creator_id));
joinable!(group_member -> group_ (group_id));
joinable!(group_member -> user_ (user_id));
joinable!(message -> user_ (recipient_id));
joinable!(post -> user_ (creator_id));
joinable!(post_vote -> post (post_id));
joinable!(post_vote -> user_ (user_id));

allow_tables_to_appear_in_same_query!(
  category,
  comment,
  group_,
  group_member,
  message,
  post,
  post_vote,
  user_,
);

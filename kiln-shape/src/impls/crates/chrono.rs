use chrono::{DateTime, FixedOffset, Utc};

impl_shaped_for_scalar! {
    DateTime<Utc> => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
}
